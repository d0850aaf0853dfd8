//! Governance module for GameForge
//!
//! Hosts propose changes to the game's rulebook, vote on them, and at every
//! phase boundary the judgement engine decides which proposals become
//! official. This crate holds that whole lifecycle as a synchronous aggregate;
//! it does no I/O of its own.

pub mod error;
pub mod rule;
pub mod voting;
pub mod judgement;
pub mod draft;
pub mod topic;
pub mod phase;
pub mod notice;
pub mod rulebook;

pub use error::{GovernanceError, GovernanceResult};
pub use rule::{VoteChoice, Vote, ProposalKind, Proposal, OfficialRule, DiscardedRule, Resolution};
pub use voting::{cast_vote, CastOutcome, Tally};
pub use judgement::{judge, Judgement, Verdict};
pub use draft::ProposalDraft;
pub use phase::{Phase, Schedule, ScheduleEntry, ScheduleKind, Rearm, phase_length};
pub use notice::Notice;
pub use rulebook::{Rulebook, NUM_STARTING_RULES};
