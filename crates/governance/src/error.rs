use thiserror::Error;

use gameforge_core::StorageError;
use gameforge_reputation::{HostId, ReputationError};

use crate::phase::Phase;

/// Error types for governance operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// Malformed proposal text or payload
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    /// The first new official rule has to set up the game show
    #[error("The first new official rule must include the phrases: {}", .0.join(", "))]
    MissingBootstrapPhrases(Vec<String>),

    /// Starting rules and unknown rules cannot be modified or removed
    #[error("Official rule #{number} cannot be changed, only rules #{first}-#{last} can")]
    TargetNotModifiable { number: u64, first: u64, last: u64 },

    /// The action is not allowed in the current phase
    #[error("Not allowed during the {phase} phase: {reason}")]
    WrongPhase { phase: Phase, reason: String },

    #[error("Official rule not found: #{0}")]
    OfficialRuleNotFound(u64),

    #[error("Proposal not found: #{0}")]
    ProposalNotFound(u64),

    #[error("Host not found: {0}")]
    HostNotFound(HostId),

    #[error("Host already exists: {0}")]
    HostAlreadyExists(HostId),

    /// Only the proposer may touch their proposal
    #[error("Host {host} is not the proposer of proposal #{number}")]
    NotProposer { host: HostId, number: u64 },

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Reputation error: {0}")]
    ReputationError(#[from] ReputationError),
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
