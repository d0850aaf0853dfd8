//! Shared fixtures for the service tests: collaborators that remember what
//! they were asked to do.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Mutex;

use gameforge::config::ForgeConfig;
use gameforge::core::interfaces::{GatewayResult, LedgerError, LedgerResult};
use gameforge::core::{
    MemoryStorage, NotificationGateway, PointsLedger, PostingRef, Storage, StorageError, StorageResult,
};
use gameforge::ForgeService;

pub const BOOTSTRAP: &str =
    "The theme for the game show is: space. The location this game show takes place is: Mars.";

/// Everything a gateway call can be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Announce(String),
    DirectMessage { host: String, text: String },
    Staff(String),
    Proposal { number: u64, posting: PostingRef },
    OfficialRule { number: u64, posting: PostingRef },
    Update { posting: PostingRef, content: String },
    VotingOpened(PostingRef),
    VotingClosed(PostingRef),
}

#[derive(Debug, Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<Sent>>,
    postings: AtomicU64,
}

impl RecordingGateway {
    pub async fn sent(&self) -> Vec<Sent> {
        self.sent.lock().await.clone()
    }

    pub async fn announcements(&self) -> Vec<String> {
        self.sent()
            .await
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Announce(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn staff_alerts(&self) -> Vec<String> {
        self.sent()
            .await
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Staff(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub async fn messages_to(&self, host: &str) -> Vec<String> {
        self.sent()
            .await
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::DirectMessage { host: to, text } if to == host => Some(text),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, sent: Sent) {
        self.sent.lock().await.push(sent);
    }

    fn posting(&self) -> PostingRef {
        PostingRef::new(format!("msg-{}", self.postings.fetch_add(1, Ordering::Relaxed) + 1))
    }
}

#[async_trait]
impl NotificationGateway for RecordingGateway {
    async fn announce(&self, text: &str) -> GatewayResult<()> {
        self.record(Sent::Announce(text.to_string())).await;
        Ok(())
    }

    async fn direct_message(&self, host_id: &str, text: &str) -> GatewayResult<()> {
        self.record(Sent::DirectMessage { host: host_id.to_string(), text: text.to_string() }).await;
        Ok(())
    }

    async fn alert_staff(&self, text: &str) -> GatewayResult<()> {
        self.record(Sent::Staff(text.to_string())).await;
        Ok(())
    }

    async fn post_proposal(&self, number: u64, _content: &str) -> GatewayResult<PostingRef> {
        let posting = self.posting();
        self.record(Sent::Proposal { number, posting: posting.clone() }).await;
        Ok(posting)
    }

    async fn post_official_rule(&self, number: u64, _content: &str) -> GatewayResult<PostingRef> {
        let posting = self.posting();
        self.record(Sent::OfficialRule { number, posting: posting.clone() }).await;
        Ok(posting)
    }

    async fn update_posting(&self, posting: &PostingRef, content: &str) -> GatewayResult<()> {
        self.record(Sent::Update { posting: posting.clone(), content: content.to_string() }).await;
        Ok(())
    }

    async fn enable_voting_controls(&self, posting: &PostingRef) -> GatewayResult<()> {
        self.record(Sent::VotingOpened(posting.clone())).await;
        Ok(())
    }

    async fn disable_voting_controls(&self, posting: &PostingRef) -> GatewayResult<()> {
        self.record(Sent::VotingClosed(posting.clone())).await;
        Ok(())
    }
}

/// Ledger that accepts or refuses every credit
#[derive(Debug, Default)]
pub struct RecordingLedger {
    refuse: bool,
    credits: Mutex<Vec<(String, u32)>>,
}

impl RecordingLedger {
    pub fn refusing() -> Self {
        Self { refuse: true, ..Self::default() }
    }

    pub async fn credits(&self) -> Vec<(String, u32)> {
        self.credits.lock().await.clone()
    }
}

#[async_trait]
impl PointsLedger for RecordingLedger {
    async fn credit_points(&self, host_id: &str, amount: u32) -> LedgerResult<()> {
        if self.refuse {
            return Err(LedgerError::UnknownAccount(host_id.to_string()));
        }
        self.credits.lock().await.push((host_id.to_string(), amount));
        Ok(())
    }
}

/// Memory store whose writes can be made to fail
#[derive(Debug, Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    fail_writes: AtomicBool,
}

impl FlakyStorage {
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        self.inner.put(key, data).await
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.inner.get(key).await
    }
}

pub struct TestEnv {
    pub service: ForgeService,
    pub storage: Arc<MemoryStorage>,
    pub gateway: Arc<RecordingGateway>,
    pub ledger: Arc<RecordingLedger>,
    pub config: ForgeConfig,
}

pub fn config() -> ForgeConfig {
    ForgeConfig { time_zone: "UTC".to_string(), ..ForgeConfig::default() }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub async fn env_with(storage: Arc<MemoryStorage>, ledger: RecordingLedger) -> TestEnv {
    let gateway = Arc::new(RecordingGateway::default());
    let ledger = Arc::new(ledger);
    let config = config();
    let service = ForgeService::load(
        storage.clone() as Arc<dyn Storage>,
        gateway.clone(),
        ledger.clone(),
        &config,
    )
    .await
    .unwrap();

    TestEnv { service, storage, gateway, ledger, config }
}

/// A second service over the same store, as a separate process would have
pub async fn service_over(storage: Arc<dyn Storage>, gateway: Arc<RecordingGateway>) -> ForgeService {
    ForgeService::load(storage, gateway, Arc::new(RecordingLedger::default()), &config())
        .await
        .unwrap()
}

pub async fn env() -> TestEnv {
    env_with(Arc::new(MemoryStorage::new()), RecordingLedger::default()).await
}
