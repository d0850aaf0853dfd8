//! XP reward tables and the level curve.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::badge::Badge;

/// Things a host can be rewarded (or penalised) for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Submitting a proposal
    Propose,
    /// First proposal of the local day
    DailyPropose,
    /// Casting a first vote on a proposal
    Vote,
    /// Having a proposal accepted into the rulebook
    CreateOfficialRule,
    /// Having a proposal thrown out by a landslide
    ProposeDisapprovedRule,
    /// Taking part in discussion
    Discuss,
}

impl ActionKind {
    pub const ALL: [ActionKind; 6] = [
        ActionKind::Propose,
        ActionKind::DailyPropose,
        ActionKind::Vote,
        ActionKind::CreateOfficialRule,
        ActionKind::ProposeDisapprovedRule,
        ActionKind::Discuss,
    ];

    /// Signed XP granted each time the action is rewarded
    pub fn xp_reward(self) -> i64 {
        match self {
            ActionKind::Propose => 10,
            ActionKind::DailyPropose => 15,
            ActionKind::Vote => 2,
            ActionKind::CreateOfficialRule => 50,
            ActionKind::ProposeDisapprovedRule => -10,
            ActionKind::Discuss => 1,
        }
    }

    /// The one-time milestone attached to this action, if any
    pub fn milestone(self) -> Option<Milestone> {
        match self {
            ActionKind::Propose => Some(Milestone {
                count: 50,
                xp: 150,
                badge: Badge::UltimateProposer,
            }),
            ActionKind::Vote => Some(Milestone {
                count: 100,
                xp: 100,
                badge: Badge::UltimateVoter,
            }),
            ActionKind::CreateOfficialRule => Some(Milestone {
                count: 25,
                xp: 250,
                badge: Badge::UltimateRuleForger,
            }),
            ActionKind::DailyPropose
            | ActionKind::ProposeDisapprovedRule
            | ActionKind::Discuss => None,
        }
    }

    /// Phrase used in reward messages ("for voting", ...)
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::Propose => "proposing a rule",
            ActionKind::DailyPropose => "your first proposal today",
            ActionKind::Vote => "voting",
            ActionKind::CreateOfficialRule => "creating an official rule",
            ActionKind::ProposeDisapprovedRule => "proposing a heavily disapproved rule",
            ActionKind::Discuss => "discussing",
        }
    }

    /// Whether rewarding this action should stay silent
    pub fn is_quiet(self) -> bool {
        matches!(self, ActionKind::Discuss)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Reaching `count` of an action grants `xp` and `badge` once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Milestone {
    pub count: u32,
    pub xp: i64,
    pub badge: Badge,
}

/// XP needed to go from level `level - 1` to `level`, for the first levels
const LEVEL_XP_REQUIREMENTS: [u64; 5] = [10, 20, 35, 55, 80];

/// Added to the level-5 increment once per block of five levels past 5
pub const LEVEL_XP_REQUIREMENT_MULTIPLIER: u64 = 25;

/// XP needed to climb from `level - 1` to `level`. Level 0 costs nothing.
pub fn increment_xp(level: u32) -> u64 {
    match level {
        0 => 0,
        1..=5 => LEVEL_XP_REQUIREMENTS[(level - 1) as usize],
        _ => {
            let last = LEVEL_XP_REQUIREMENTS[LEVEL_XP_REQUIREMENTS.len() - 1];
            last + LEVEL_XP_REQUIREMENT_MULTIPLIER * (u64::from((level - 6) / 5) + 1)
        }
    }
}

/// Total XP a host must hold to be at `level`
pub fn total_xp_for_level(level: u32) -> u64 {
    (1..=level).map(increment_xp).sum()
}

/// What reaching a level hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelReward {
    Badge(Badge),
    Points(u32),
    VotingMultiplier(u32),
    CustomProposalColor,
    CustomRoleColor,
}

/// Rewards attached to reaching exactly `level`
pub fn level_rewards(level: u32) -> &'static [LevelReward] {
    use LevelReward::*;

    match level {
        1 => &[Badge(crate::Badge::FirstSteps)],
        5 => &[CustomProposalColor],
        8 => &[Points(1)],
        10 => &[Badge(crate::Badge::Contributor)],
        15 => &[Points(1)],
        20 => &[Badge(crate::Badge::MajorContributor)],
        25 => &[CustomRoleColor],
        35 => &[Points(2)],
        50 => &[Badge(crate::Badge::Ruler)],
        75 => &[Points(3)],
        100 => &[Badge(crate::Badge::RuleLeader), VotingMultiplier(2)],
        150 => &[Points(5)],
        200 => &[Badge(crate::Badge::TheContestant), Points(8), VotingMultiplier(3)],
        _ => &[],
    }
}
