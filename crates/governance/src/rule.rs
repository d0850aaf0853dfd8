//! The rule taxonomy: proposals in flight, official rules and the discard archive.

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use gameforge_core::PostingRef;
use gameforge_reputation::HostId;

/// A host's opinion of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteChoice {
    Approve,
    Disapprove,
    NoOpinion,
}

impl VoteChoice {
    pub const ALL: [VoteChoice; 3] = [VoteChoice::Approve, VoteChoice::Disapprove, VoteChoice::NoOpinion];
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VoteChoice::Approve => "Approve",
            VoteChoice::Disapprove => "Disapprove",
            VoteChoice::NoOpinion => "No Opinion",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for VoteChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "approve" | "yes" => Ok(VoteChoice::Approve),
            "disapprove" | "no" => Ok(VoteChoice::Disapprove),
            "noopinion" | "abstain" => Ok(VoteChoice::NoOpinion),
            other => Err(format!("unknown vote choice: {}", other)),
        }
    }
}

/// One host's vote on a proposal.
///
/// `weight` is the caster's voting multiplier when the vote was first cast
/// and counts as that many votes in every tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: HostId,
    pub choice: VoteChoice,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// What a proposal does to the rulebook if accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProposalKind {
    /// Append a new official rule
    Create,
    /// Replace the text of official rule `target`
    Modify { target: u64 },
    /// Strike official rule `target`
    Remove { target: u64 },
}

impl ProposalKind {
    /// The official rule this proposal acts on, if any
    pub fn target(&self) -> Option<u64> {
        match self {
            ProposalKind::Create => None,
            ProposalKind::Modify { target } | ProposalKind::Remove { target } => Some(*target),
        }
    }
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProposalKind::Create => f.write_str("Creation"),
            ProposalKind::Modify { .. } => f.write_str("Modification"),
            ProposalKind::Remove { .. } => f.write_str("Removal"),
        }
    }
}

/// A rule change awaiting judgement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub number: u64,
    pub kind: ProposalKind,
    pub description: String,
    pub proposer: HostId,
    #[serde(default)]
    pub votes: Vec<Vote>,
    #[serde(default)]
    pub posting: Option<PostingRef>,
    /// 24-bit RGB display colour
    pub color: u32,
    #[serde(default)]
    pub judgement_time: Option<DateTime<Utc>>,
}

impl Proposal {
    /// Find the vote `voter` has cast, if any
    pub fn vote_of(&self, voter: &HostId) -> Option<&Vote> {
        self.votes.iter().find(|vote| &vote.voter == voter)
    }

    /// The votes expanded to one (voter, choice) pair per unit of weight
    pub fn vote_records(&self) -> Vec<(HostId, VoteChoice)> {
        self.votes
            .iter()
            .flat_map(|vote| {
                std::iter::repeat((vote.voter.clone(), vote.choice)).take(vote.weight as usize)
            })
            .collect()
    }

    /// Plain-text card for the proposal posting
    pub fn render(&self, proposer_name: &str) -> String {
        let label = match self.kind {
            ProposalKind::Create => "Rule To Create".to_string(),
            ProposalKind::Modify { target } => format!("New Text For Rule #{}", target),
            ProposalKind::Remove { target } => format!("Reason To Remove Rule #{}", target),
        };
        format!(
            "{}) Proposed Rule {}\n{}: {}\nProposer: {}",
            self.number, self.kind, label, self.description, proposer_name
        )
    }
}

/// A rule of the game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficialRule {
    /// Stable identifier, never reused or shifted by removals
    pub number: u64,
    pub description: String,
    pub proposer: HostId,
    #[serde(default)]
    pub posting: Option<PostingRef>,
}

impl OfficialRule {
    /// Text of the official rule posting
    pub fn render(&self) -> String {
        format!("{}) {}", self.number, self.description)
    }

    /// Text left in the posting of a removed rule
    pub fn render_removed(number: u64) -> String {
        format!("{}) [REMOVED]", number)
    }
}

/// How a proposal left circulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Accepted,
    Rejected,
}

/// Frozen copy of a proposal that has been judged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedRule {
    #[serde(flatten)]
    pub proposal: Proposal,
    pub resolution: Resolution,
}

impl DiscardedRule {
    pub fn number(&self) -> u64 {
        self.proposal.number
    }
}
