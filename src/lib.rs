//! GameForge
//!
//! A community game-design-by-committee engine: hosts propose rule changes,
//! vote on them, and a fixed two-phase cycle turns approved proposals into
//! the game's official rulebook.

pub mod service;
pub mod scheduler;
pub mod gateway;

pub use service::{ForgeService, ServiceError, ServiceResult};
pub use scheduler::PhaseScheduler;
pub use gateway::{LoggingGateway, LoggingLedger};

/// Re-export the member crates for easy access
pub use gameforge_config as config;
pub use gameforge_core as core;
pub use gameforge_governance as governance;
pub use gameforge_reputation as reputation;
