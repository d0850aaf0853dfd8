//! Core GameForge module
//!
//! This module provides the pieces every other GameForge crate leans on:
//! snapshot storage, the collaborator interfaces the rulebook engine talks
//! through, and time helpers.

pub mod storage;
pub mod interfaces;
pub mod utils;

// Re-export key components
pub use storage::{Storage, JsonStorage, StorageResult, StorageError, FileStorage, MemoryStorage};
pub use interfaces::{NotificationGateway, PointsLedger, PostingRef, GatewayError, LedgerError};

/// Initialize tracing for GameForge.
///
/// `RUST_LOG` wins over `default_level` when it is set. Calling this twice is
/// harmless; the second call is ignored.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
