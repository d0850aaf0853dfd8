//! Host reputation for GameForge
//!
//! Hosts earn XP for taking part in the rule-making process. XP turns into
//! levels, levels unlock badges, ledger points, custom colours and a larger
//! voting multiplier. Every mutation returns the [`HostEvent`]s it caused so
//! the caller decides how (and whether) to tell the host.

use thiserror::Error;

pub mod xp;
pub mod badge;
pub mod host;
pub mod leaderboard;

pub use xp::{ActionKind, Milestone, LevelReward};
pub use badge::Badge;
pub use host::{Host, HostId, HostEvent, Privileges, LevelProgress};
pub use leaderboard::{LeaderboardEntry, LeaderboardPage, HOSTS_PER_PAGE};

/// Errors that can occur in reputation operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReputationError {
    #[error("Host {0} has not unlocked custom colours yet")]
    PrivilegeLocked(HostId),

    #[error("Invalid colour: {0:#x}")]
    InvalidColor(u32),

    #[error("Invalid host name: {0:?}")]
    InvalidName(String),
}

/// Result type for reputation operations
pub type ReputationResult<T> = Result<T, ReputationError>;

/// Render a fixed-width text progress bar such as `[▇▇▇———]50%`
pub fn progress_bar(current: u64, total: u64, width: usize) -> String {
    let total = total.max(1);
    let current = current.min(total);
    let percent = (current * 100 + total / 2) / total;
    let filled = ((current as f64 / total as f64) * width as f64).round() as usize;
    let filled = filled.min(width);

    format!(
        "[{}{}]{}%",
        "▇".repeat(filled),
        "—".repeat(width - filled),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 100, 20), "[————————————————————]0%");
        assert_eq!(progress_bar(50, 100, 20), "[▇▇▇▇▇▇▇▇▇▇——————————]50%");
        assert_eq!(progress_bar(100, 100, 20), "[▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇▇]100%");
        assert_eq!(progress_bar(33, 100, 20), "[▇▇▇▇▇▇▇—————————————]33%");
    }

    #[test]
    fn test_progress_bar_clamps() {
        assert_eq!(progress_bar(150, 100, 4), "[▇▇▇▇]100%");
        assert_eq!(progress_bar(5, 0, 3), "[▇▇▇]100%");
        assert_eq!(progress_bar(1, 1, 0), "[]100%");
    }
}
