//! Collaborator adapters for running without a chat platform: every
//! notification and ledger credit is written to the log.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use gameforge_core::interfaces::{GatewayResult, LedgerResult};
use gameforge_core::{NotificationGateway, PointsLedger, PostingRef};

/// Gateway that logs what it would have sent
#[derive(Debug, Default)]
pub struct LoggingGateway {
    postings: AtomicU64,
}

impl LoggingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_posting(&self, prefix: &str, number: u64) -> PostingRef {
        let sequence = self.postings.fetch_add(1, Ordering::Relaxed) + 1;
        PostingRef::new(format!("{}-{}-{}", prefix, number, sequence))
    }
}

#[async_trait]
impl NotificationGateway for LoggingGateway {
    async fn announce(&self, text: &str) -> GatewayResult<()> {
        info!(target: "gameforge::announce", "{}", text);
        Ok(())
    }

    async fn direct_message(&self, host_id: &str, text: &str) -> GatewayResult<()> {
        info!(target: "gameforge::dm", "to {}: {}", host_id, text);
        Ok(())
    }

    async fn alert_staff(&self, text: &str) -> GatewayResult<()> {
        info!(target: "gameforge::staff", "{}", text);
        Ok(())
    }

    async fn post_proposal(&self, number: u64, content: &str) -> GatewayResult<PostingRef> {
        let posting = self.next_posting("proposal", number);
        info!(target: "gameforge::post", "[{}] {}", posting, content);
        Ok(posting)
    }

    async fn post_official_rule(&self, number: u64, content: &str) -> GatewayResult<PostingRef> {
        let posting = self.next_posting("rule", number);
        info!(target: "gameforge::post", "[{}] {}", posting, content);
        Ok(posting)
    }

    async fn update_posting(&self, posting: &PostingRef, content: &str) -> GatewayResult<()> {
        info!(target: "gameforge::post", "[{} updated] {}", posting, content);
        Ok(())
    }

    async fn enable_voting_controls(&self, posting: &PostingRef) -> GatewayResult<()> {
        info!(target: "gameforge::post", "[{}] voting open", posting);
        Ok(())
    }

    async fn disable_voting_controls(&self, posting: &PostingRef) -> GatewayResult<()> {
        info!(target: "gameforge::post", "[{}] voting closed", posting);
        Ok(())
    }
}

/// Ledger that only logs credits
#[derive(Debug, Default)]
pub struct LoggingLedger;

#[async_trait]
impl PointsLedger for LoggingLedger {
    async fn credit_points(&self, host_id: &str, amount: u32) -> LedgerResult<()> {
        info!(target: "gameforge::ledger", "credit {} points to {}", amount, host_id);
        Ok(())
    }
}
