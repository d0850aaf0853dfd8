//! Collaborator seams of the rulebook engine.
//!
//! The engine never talks to a chat platform or a points database directly;
//! it goes through these traits so the adapters can be swapped or faked.

pub mod notification;
pub mod ledger;

// Re-export all interfaces for easier access
pub use notification::{NotificationGateway, PostingRef, GatewayError, GatewayResult};
pub use ledger::{PointsLedger, LedgerError, LedgerResult};
