use std::fmt;
use serde::{Serialize, Deserialize};

/// Badges a host can hold. Duplicate grants are kept and pay out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Badge {
    FirstSteps,
    Contributor,
    MajorContributor,
    Ruler,
    RuleLeader,
    TheContestant,
    UltimateVoter,
    UltimateProposer,
    UltimateRuleForger,
}

impl Badge {
    /// Human readable badge title
    pub fn title(self) -> &'static str {
        match self {
            Badge::FirstSteps => "First Steps",
            Badge::Contributor => "Contributor",
            Badge::MajorContributor => "Major Contributor",
            Badge::Ruler => "Ruler",
            Badge::RuleLeader => "Rule Leader",
            Badge::TheContestant => "The Contestant",
            Badge::UltimateVoter => "Ultimate Voter",
            Badge::UltimateProposer => "Ultimate Proposer",
            Badge::UltimateRuleForger => "Ultimate Rule Forger",
        }
    }

    /// Chances at being picked as a contestant that come with the badge
    pub fn contestant_chances(self) -> u32 {
        match self {
            Badge::FirstSteps => 1,
            Badge::Contributor => 2,
            Badge::MajorContributor => 3,
            Badge::Ruler => 5,
            Badge::RuleLeader => 8,
            Badge::TheContestant => 10,
            Badge::UltimateVoter | Badge::UltimateProposer | Badge::UltimateRuleForger => 3,
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
