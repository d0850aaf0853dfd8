//! What a host asks for when proposing, before it becomes a numbered proposal

use crate::phase::Phase;
use crate::rule::ProposalKind;

/// Every new official rule must include these until the starting rules are
/// outnumbered
pub const REQUIRED_FIRST_RULE_PHRASES: [&str; 2] = [
    "The theme for the game show is:",
    "The location this game show takes place is:",
];

pub const NAME_PHRASE: &str = "The name of the game will be ";
pub const DESCRIPTION_PHRASE: &str = "The description of the game will be ";
pub const FINALIZE_RULES_PHRASE: &str = "The official rules are finalized";

/// A proposal as submitted by a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalDraft {
    /// A new rule, optionally tied to one of the challenges
    Create { description: String, for_challenge: Option<u32> },
    Modify { target: u64, description: String },
    Remove { target: u64, reason: String },
    /// Name the game (brainstorming only)
    GameName { name: String },
    /// Describe the game (brainstorming only)
    GameDescription { text: String },
    /// Declare the rulebook complete
    FinalizeRules,
}

impl ProposalDraft {
    /// Why the draft cannot be submitted in `phase`, if it cannot
    pub fn phase_restriction(&self, phase: Phase) -> Option<&'static str> {
        if phase == Phase::Voting {
            return Some("proposals are closed while voting, discuss and vote on the existing ones");
        }
        match (self, phase) {
            (ProposalDraft::GameName { .. }, Phase::Proposing) => {
                Some("the game can only be named while brainstorming")
            }
            (ProposalDraft::GameDescription { .. }, Phase::Proposing) => {
                Some("the game can only be described while brainstorming")
            }
            (
                ProposalDraft::Create { .. } | ProposalDraft::Modify { .. } | ProposalDraft::Remove { .. },
                Phase::Brainstorming,
            ) => Some("rules cannot be proposed while brainstorming"),
            _ => None,
        }
    }

    pub fn kind(&self) -> ProposalKind {
        match self {
            ProposalDraft::Modify { target, .. } => ProposalKind::Modify { target: *target },
            ProposalDraft::Remove { target, .. } => ProposalKind::Remove { target: *target },
            ProposalDraft::Create { .. }
            | ProposalDraft::GameName { .. }
            | ProposalDraft::GameDescription { .. }
            | ProposalDraft::FinalizeRules => ProposalKind::Create,
        }
    }

    /// The text the proposal will carry
    pub fn description(&self) -> String {
        match self {
            ProposalDraft::Create { description, for_challenge: Some(n) } => {
                format!("For Challenge #{}: {}", n, description.trim())
            }
            ProposalDraft::Create { description, for_challenge: None } => description.trim().to_string(),
            ProposalDraft::Modify { description, .. } => description.trim().to_string(),
            ProposalDraft::Remove { reason, .. } => reason.trim().to_string(),
            ProposalDraft::GameName { name } => format!("{}{}", NAME_PHRASE, name.trim()),
            ProposalDraft::GameDescription { text } => format!("{}{}", DESCRIPTION_PHRASE, text.trim()),
            ProposalDraft::FinalizeRules => FINALIZE_RULES_PHRASE.to_string(),
        }
    }

    /// The user-supplied text, empty if the host left it blank
    pub fn supplied_text(&self) -> &str {
        match self {
            ProposalDraft::Create { description, .. } | ProposalDraft::Modify { description, .. } => description,
            ProposalDraft::Remove { reason, .. } => reason,
            ProposalDraft::GameName { name } => name,
            ProposalDraft::GameDescription { text } => text,
            ProposalDraft::FinalizeRules => FINALIZE_RULES_PHRASE,
        }
    }

    /// Only plain rule creations have to set up the game show
    pub fn needs_bootstrap_phrases(&self) -> bool {
        matches!(self, ProposalDraft::Create { .. })
    }
}

/// The game name carried by an accepted naming rule
pub fn extract_name(description: &str) -> Option<String> {
    extract_after(description, NAME_PHRASE)
}

/// The game description carried by an accepted description rule
pub fn extract_description(description: &str) -> Option<String> {
    extract_after(description, DESCRIPTION_PHRASE)
}

fn extract_after(description: &str, phrase: &str) -> Option<String> {
    description
        .find(phrase)
        .map(|start| description[start + phrase.len()..].trim().to_string())
        .filter(|value| !value.is_empty())
}
