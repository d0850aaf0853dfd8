//! Time-driven work: phase changes and the daily reset.
//!
//! The schedule itself lives in the rulebook snapshot; this loop only wakes
//! up on a fixed tick and asks the service to run whatever is due. Every
//! change is saved as it happens, so shutting down writes nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::service::{ForgeService, ServiceResult};

/// Drives a [`ForgeService`]'s schedule
pub struct PhaseScheduler {
    service: Arc<ForgeService>,
    tick: Duration,
}

impl PhaseScheduler {
    pub fn new(service: Arc<ForgeService>, tick: Duration) -> Self {
        Self { service, tick }
    }

    /// Re-arm the persisted schedule, then loop until `shutdown` fires
    pub async fn run(&self, shutdown: CancellationToken) -> ServiceResult<()> {
        info!("Phase scheduler starting");

        let rearm = self.service.rearm(Utc::now()).await?;
        for missed in &rearm.missed {
            warn!("Missed {:?} due at {}; not replayed", missed.kind, missed.due);
        }
        for entry in &rearm.pending {
            info!("Pending {:?} at {}", entry.kind, entry.due);
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.tick) => {
                    match self.service.tick(Utc::now()).await {
                        Ok(ran) if !ran.is_empty() => info!("Ran scheduled work: {:?}", ran),
                        Ok(_) => debug!("Nothing due"),
                        Err(e) => error!("Scheduler tick failed: {}", e),
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("Phase scheduler shutting down");
                    break;
                }
            }
        }

        info!("Phase scheduler stopped");
        Ok(())
    }
}
