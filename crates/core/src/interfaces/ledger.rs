use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by the external points ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The host has no account in the ledger
    #[error("No ledger account for {0}")]
    UnknownAccount(String),

    /// The ledger could not be reached
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The community points economy that level rewards pay into.
///
/// Credits are best-effort: callers report failures to the host and move on.
#[async_trait]
pub trait PointsLedger: Send + Sync {
    /// Credit `amount` points to the account owned by `host_id`
    async fn credit_points(&self, host_id: &str, amount: u32) -> LedgerResult<()>;
}
