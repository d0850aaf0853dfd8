//! The coordinating service: sole owner of the rulebook.
//!
//! Every command locks the rulebook, reloads the latest snapshot, mutates it,
//! persists it and then delivers the queued notices with the lock released.
//! The snapshot in storage is the source of truth, so a long-running
//! scheduler and one-shot commands can share it. A failed save is returned
//! to the caller and nothing is delivered. Delivery failures are logged (and
//! reported to the affected host where it makes sense); they never undo the
//! mutation.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use gameforge_config::{ConfigError, ForgeConfig};
use gameforge_core::{JsonStorage, NotificationGateway, PointsLedger, Storage, StorageError};
use gameforge_governance::{
    CastOutcome, GovernanceError, Notice, Phase, ProposalDraft, Rearm, Rulebook, ScheduleKind, Verdict, VoteChoice,
};
use gameforge_reputation::{ActionKind, HostId, LeaderboardPage};

/// Errors surfaced by service commands
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error("Snapshot error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for service commands
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Owns the rulebook and its collaborators
pub struct ForgeService {
    rulebook: Mutex<Rulebook>,
    storage: Arc<dyn Storage>,
    gateway: Arc<dyn NotificationGateway>,
    ledger: Arc<dyn PointsLedger>,
    snapshot_key: String,
    zone: Tz,
}

impl ForgeService {
    /// Load the snapshot (or start a fresh game if there is none)
    pub async fn load(
        storage: Arc<dyn Storage>,
        gateway: Arc<dyn NotificationGateway>,
        ledger: Arc<dyn PointsLedger>,
        config: &ForgeConfig,
    ) -> ServiceResult<Self> {
        let zone = config.zone()?;
        let rulebook = match storage.try_get_json::<Rulebook>(&config.snapshot_key).await? {
            Some(rulebook) => {
                info!(
                    "Loaded rulebook snapshot: phase {}, {} hosts, {} open proposals",
                    rulebook.phase(),
                    rulebook.hosts().len(),
                    rulebook.proposals().len()
                );
                rulebook
            }
            None => {
                info!("No snapshot under {}, starting a new game", config.snapshot_key);
                Rulebook::new()
            }
        };

        Ok(Self {
            rulebook: Mutex::new(rulebook),
            storage,
            gateway,
            ledger,
            snapshot_key: config.snapshot_key.clone(),
            zone,
        })
    }

    /// Run a mutation, persist, and deliver what it produced
    async fn apply<T, F>(&self, now: DateTime<Utc>, mutation: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Rulebook) -> Result<T, GovernanceError>,
    {
        self.apply_if_changed(now, |book| mutation(book).map(|value| (value, true))).await
    }

    /// Like [`apply`](Self::apply), but the mutation reports whether it
    /// changed anything; an unchanged rulebook is not written back.
    async fn apply_if_changed<T, F>(&self, now: DateTime<Utc>, mutation: F) -> ServiceResult<T>
    where
        F: FnOnce(&mut Rulebook) -> Result<(T, bool), GovernanceError>,
    {
        let (outcome, notices) = {
            let mut rulebook = self.rulebook.lock().await;
            self.refresh(&mut rulebook).await?;
            let before = rulebook.clone();

            let outcome = mutation(&mut rulebook);
            if let Some(phase) = rulebook.take_requested_transition() {
                rulebook.transition_to(phase, now);
            }
            let notices = rulebook.drain_notices();

            if let Ok((_, changed)) = &outcome {
                if *changed || !notices.is_empty() {
                    if let Err(e) = self.persist(&rulebook).await {
                        *rulebook = before;
                        return Err(e);
                    }
                }
            }
            (outcome, notices)
        };

        self.dispatch(notices).await;
        Ok(outcome?.0)
    }

    /// Replace the in-memory rulebook with the stored snapshot, if there is one
    async fn refresh(&self, rulebook: &mut Rulebook) -> ServiceResult<()> {
        if let Some(latest) = self.storage.try_get_json::<Rulebook>(&self.snapshot_key).await? {
            *rulebook = latest;
        }
        Ok(())
    }

    async fn persist(&self, rulebook: &Rulebook) -> ServiceResult<()> {
        match self.storage.put_json(&self.snapshot_key, rulebook).await {
            Ok(()) => {
                debug!("Saved rulebook snapshot");
                Ok(())
            }
            Err(e) => {
                error!("Failed to save rulebook snapshot: {}", e);
                Err(e.into())
            }
        }
    }

    /// Lock the rulebook for a read, picking up changes other processes saved
    async fn current(&self) -> tokio::sync::MutexGuard<'_, Rulebook> {
        let mut rulebook = self.rulebook.lock().await;
        if let Err(e) = self.refresh(&mut rulebook).await {
            warn!("Could not reload rulebook snapshot, serving cached state: {}", e);
        }
        rulebook
    }

    // ---- Commands ----

    pub async fn add_host(&self, id: HostId, name: &str) -> ServiceResult<()> {
        self.apply(Utc::now(), |book| book.add_host(id, name)).await
    }

    pub async fn remove_host(&self, id: &HostId) -> ServiceResult<()> {
        self.apply(Utc::now(), |book| book.remove_host(id).map(|_| ())).await
    }

    pub async fn set_custom_color(&self, id: &HostId, color: u32) -> ServiceResult<()> {
        self.apply(Utc::now(), |book| book.set_custom_color(id, color)).await
    }

    /// Credit a host for taking part in discussion
    pub async fn record_discussion(&self, id: &HostId) -> ServiceResult<()> {
        self.apply(Utc::now(), |book| book.reward_host(id, ActionKind::Discuss)).await
    }

    pub async fn submit_proposal(&self, proposer: &HostId, draft: ProposalDraft) -> ServiceResult<u64> {
        let now = Utc::now();
        self.apply(now, |book| book.submit_proposal(proposer, draft, now)).await
    }

    pub async fn edit_proposal(&self, editor: &HostId, number: u64, description: &str) -> ServiceResult<()> {
        self.apply(Utc::now(), |book| book.edit_proposal(editor, number, description)).await
    }

    pub async fn cast_vote(&self, voter: &HostId, number: u64, choice: VoteChoice) -> ServiceResult<CastOutcome> {
        self.apply(Utc::now(), |book| book.cast_vote(voter, number, choice)).await
    }

    /// Judge a proposal ahead of the phase change. A transition it triggers
    /// is scheduled from `now`.
    pub async fn judge_early(&self, number: u64, now: DateTime<Utc>) -> ServiceResult<Verdict> {
        self.apply(now, |book| book.judge_early(number)).await
    }

    pub async fn set_curated_topics(&self, topics: Vec<String>) -> ServiceResult<()> {
        self.apply(Utc::now(), |book| {
            book.set_curated_topics(topics);
            Ok(())
        })
        .await
    }

    /// Force a phase change
    pub async fn transition_to(&self, phase: Phase, now: DateTime<Utc>) -> ServiceResult<()> {
        self.apply(now, |book| {
            book.transition_to(phase, now);
            Ok(())
        })
        .await
    }

    /// Run whatever the schedule says is due. Nothing is written when
    /// nothing ran.
    pub async fn tick(&self, now: DateTime<Utc>) -> ServiceResult<Vec<ScheduleKind>> {
        let zone = self.zone;
        self.apply_if_changed(now, |book| {
            let ran = book.run_due(now, zone);
            let changed = !ran.is_empty();
            Ok((ran, changed))
        })
        .await
    }

    /// Reconcile the schedule after startup
    pub async fn rearm(&self, now: DateTime<Utc>) -> ServiceResult<Rearm> {
        let zone = self.zone;
        self.apply_if_changed(now, |book| {
            let had_reset = book.schedule().daily_reset_entry().is_some();
            let rearm = book.rearm(now, zone);
            let changed = !had_reset || !rearm.missed.is_empty() || rearm.overdue_reset;
            Ok((rearm, changed))
        })
        .await
    }

    // ---- Queries ----

    pub async fn status(&self) -> String {
        self.current().await.status()
    }

    pub async fn phase(&self) -> Phase {
        self.current().await.phase()
    }

    pub async fn leaderboard(&self, page: usize) -> LeaderboardPage {
        self.current().await.leaderboard(page)
    }

    pub async fn profile(&self, id: &HostId) -> ServiceResult<String> {
        Ok(self.current().await.profile(id)?)
    }

    /// A copy of the current state
    pub async fn snapshot(&self) -> Rulebook {
        self.current().await.clone()
    }

    // ---- Delivery ----

    async fn dispatch(&self, notices: Vec<Notice>) {
        let mut queue: VecDeque<Notice> = notices.into();

        while let Some(notice) = queue.pop_front() {
            match notice {
                Notice::Announce(text) => {
                    if let Err(e) = self.gateway.announce(&text).await {
                        warn!("Failed to send announcement: {}", e);
                    }
                }
                Notice::DirectMessage { host, text } => {
                    if let Err(e) = self.gateway.direct_message(host.as_str(), &text).await {
                        warn!("Failed to message host {}: {}", host, e);
                    }
                }
                Notice::AlertStaff(text) => {
                    if let Err(e) = self.gateway.alert_staff(&text).await {
                        warn!("Failed to alert staff: {}", e);
                    }
                }
                Notice::PostProposal { number, content } => {
                    match self.gateway.post_proposal(number, &content).await {
                        Ok(posting) => {
                            let mut rulebook = self.current().await;
                            match rulebook.attach_posting(number, posting) {
                                Ok(()) => {
                                    queue.extend(rulebook.drain_notices());
                                    if let Err(e) = self.persist(&rulebook).await {
                                        warn!("Posting of proposal #{} was not saved: {}", number, e);
                                    }
                                }
                                Err(e) => warn!("Posted proposal #{} but could not record it: {}", number, e),
                            }
                        }
                        Err(e) => error!("Failed to post proposal #{}: {}", number, e),
                    }
                }
                Notice::PostOfficialRule { number, content } => {
                    match self.gateway.post_official_rule(number, &content).await {
                        Ok(posting) => {
                            let mut rulebook = self.current().await;
                            match rulebook.attach_official_posting(number, posting) {
                                Ok(()) => {
                                    if let Err(e) = self.persist(&rulebook).await {
                                        warn!("Posting of official rule #{} was not saved: {}", number, e);
                                    }
                                }
                                Err(e) => warn!("Posted official rule #{} but could not record it: {}", number, e),
                            }
                        }
                        Err(e) => error!("Failed to post official rule #{}: {}", number, e),
                    }
                }
                Notice::UpdatePosting { posting, content } => {
                    if let Err(e) = self.gateway.update_posting(&posting, &content).await {
                        warn!("Failed to update posting {}: {}", posting, e);
                    }
                }
                Notice::EnableVotingControls(posting) => {
                    if let Err(e) = self.gateway.enable_voting_controls(&posting).await {
                        warn!("Failed to enable voting on {}: {}", posting, e);
                    }
                }
                Notice::DisableVotingControls(posting) => {
                    if let Err(e) = self.gateway.disable_voting_controls(&posting).await {
                        warn!("Failed to disable voting on {}: {}", posting, e);
                    }
                }
                Notice::CreditPoints { host, amount } => {
                    if let Err(e) = self.ledger.credit_points(host.as_str(), amount).await {
                        error!("Failed to credit {} points to {}: {}", amount, host, e);
                        let text = format!(
                            "You earned {} points, but you are not in the points database yet. \
                             Ask staff to add you and credit them manually.",
                            amount
                        );
                        if let Err(e) = self.gateway.direct_message(host.as_str(), &text).await {
                            warn!("Failed to message host {}: {}", host, e);
                        }
                    }
                }
            }
        }
    }
}
