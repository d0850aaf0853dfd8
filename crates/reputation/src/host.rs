//! The host entity and its XP / leveling state machine.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::badge::Badge;
use crate::xp::{self, ActionKind, LevelReward};
use crate::{progress_bar, ReputationError, ReputationResult};

/// Identifier of a host (the participant's platform user id)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HostId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Cosmetic privileges unlocked by leveling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Privileges {
    /// May pick the colour of their own proposals
    pub custom_proposal_color: bool,
    /// May pick a role colour matching their proposals
    pub custom_role_color: bool,
}

/// Something that happened to a host as a result of an XP mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The action's configured reward was applied
    XpRewarded { action: ActionKind, amount: i64 },
    /// A flat XP bonus was granted (milestones)
    XpGranted { amount: i64 },
    LeveledUp { level: u32 },
    MilestoneReached { action: ActionKind, count: u32 },
    BadgeEarned { badge: Badge, chances: u32 },
    /// Points owed to the host in the external ledger
    PointsEarned { amount: u32 },
    VotingMultiplierRaised { multiplier: u32 },
    CustomProposalColorUnlocked,
    CustomRoleColorUnlocked,
}

impl HostEvent {
    /// Plain-text message telling the host about this event, if it is worth telling
    pub fn message(&self) -> Option<String> {
        let text = match self {
            HostEvent::XpRewarded { action, .. } if action.is_quiet() => return None,
            HostEvent::XpRewarded { action, amount } if *amount >= 0 => {
                format!("🎉 You got +{} XP for {}! 🎊", amount, action.verb())
            }
            HostEvent::XpRewarded { action, amount } => {
                format!("☹️ You got {} XP for {}... 🤷", amount, action.verb())
            }
            HostEvent::XpGranted { amount } => format!("🎉 You got +{} XP 🎊", amount),
            HostEvent::LeveledUp { level } => {
                format!("🎉 You leveled up! You are now level {} in GameForge 🎊", level)
            }
            HostEvent::MilestoneReached { action, count } => {
                format!("🎉 You reached the milestone of {} for {}! 🎊", count, action.verb())
            }
            HostEvent::BadgeEarned { badge, chances } => format!(
                "🎉 You got the {} badge and {} chance(s) to be a contestant! 🎊",
                badge, chances
            ),
            HostEvent::PointsEarned { amount } => {
                format!("🎉 You have received {} points! 🎊", amount)
            }
            HostEvent::VotingMultiplierRaised { multiplier } => format!(
                "🎉 Your voting multiplier has increased! Your vote will now count for {} votes 🎊",
                multiplier
            ),
            HostEvent::CustomProposalColorUnlocked => {
                "🎉 You can now choose the colour of your proposals 🎊".to_string()
            }
            HostEvent::CustomRoleColorUnlocked => {
                "🎉 You have gained a custom role colour that matches your proposal colour 🎊".to_string()
            }
        };
        Some(text)
    }
}

/// Where a host stands between their current and next level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    /// XP earned since reaching the current level
    pub into_level: u64,
    /// XP the next level costs in total
    pub level_span: u64,
}

impl LevelProgress {
    /// XP still missing for the next level
    pub fn remaining(&self) -> u64 {
        self.level_span.saturating_sub(self.into_level)
    }
}

/// A participant of the rule-making process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    #[serde(default)]
    pub xp: u64,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub has_proposed_today: bool,
    /// How many times each action has been rewarded
    #[serde(default)]
    pub action_counts: BTreeMap<ActionKind, u32>,
    #[serde(default)]
    pub contestant_chances: u32,
    #[serde(default)]
    pub badges: Vec<Badge>,
    /// 24-bit RGB colour used for the host's proposals
    #[serde(default)]
    pub custom_color: Option<u32>,
    #[serde(default)]
    pub privileges: Privileges,
    #[serde(default = "default_voting_multiplier")]
    pub voting_multiplier: u32,
}

fn default_voting_multiplier() -> u32 {
    1
}

impl Host {
    /// Create a fresh level-0 host
    pub fn new(id: impl Into<HostId>, name: impl Into<String>) -> ReputationResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ReputationError::InvalidName(name));
        }

        Ok(Self {
            id: id.into(),
            name,
            xp: 0,
            level: 0,
            has_proposed_today: false,
            action_counts: ActionKind::ALL.iter().map(|action| (*action, 0)).collect(),
            contestant_chances: 0,
            badges: Vec::new(),
            custom_color: None,
            privileges: Privileges::default(),
            voting_multiplier: 1,
        })
    }

    /// Number of times `action` has been rewarded
    pub fn times(&self, action: ActionKind) -> u32 {
        self.action_counts.get(&action).copied().unwrap_or(0)
    }

    /// Voting weight, never below one
    pub fn vote_weight(&self) -> u32 {
        self.voting_multiplier.max(1)
    }

    /// Reward the host for `action`: bump its counter, apply its XP, pay the
    /// daily proposal bonus and any milestone reached.
    pub fn reward_xp_for(&mut self, action: ActionKind) -> Vec<HostEvent> {
        let mut events = Vec::new();
        self.reward_into(action, &mut events);
        events
    }

    fn reward_into(&mut self, action: ActionKind, events: &mut Vec<HostEvent>) {
        let count = {
            let counter = self.action_counts.entry(action).or_insert(0);
            *counter += 1;
            *counter
        };

        let amount = action.xp_reward();
        debug!("Rewarding {} for {} ({} XP)", self.name, action, amount);
        events.push(HostEvent::XpRewarded { action, amount });
        self.give_xp_into(amount, events);

        if action == ActionKind::Propose && !self.has_proposed_today {
            self.has_proposed_today = true;
            self.reward_into(ActionKind::DailyPropose, events);
        }

        if let Some(milestone) = action.milestone() {
            if count == milestone.count {
                events.push(HostEvent::MilestoneReached { action, count });
                events.push(HostEvent::XpGranted { amount: milestone.xp });
                self.give_xp_into(milestone.xp, events);
                self.give_badge_into(milestone.badge, events);
            }
        }
    }

    /// Add (or with a negative amount, remove) XP and level up as far as the
    /// new total allows. XP bottoms out at zero; levels are never lost.
    pub fn give_xp(&mut self, amount: i64) -> Vec<HostEvent> {
        let mut events = Vec::new();
        self.give_xp_into(amount, &mut events);
        events
    }

    fn give_xp_into(&mut self, amount: i64, events: &mut Vec<HostEvent>) {
        self.xp = if amount >= 0 {
            self.xp.saturating_add(amount.unsigned_abs())
        } else {
            self.xp.saturating_sub(amount.unsigned_abs())
        };

        while self.xp >= xp::total_xp_for_level(self.level + 1) {
            self.level += 1;
            debug!("{} reached level {}", self.name, self.level);
            events.push(HostEvent::LeveledUp { level: self.level });

            for reward in xp::level_rewards(self.level) {
                self.apply_level_reward(*reward, events);
            }
        }
    }

    fn apply_level_reward(&mut self, reward: LevelReward, events: &mut Vec<HostEvent>) {
        match reward {
            LevelReward::Badge(badge) => self.give_badge_into(badge, events),
            LevelReward::Points(amount) => events.push(HostEvent::PointsEarned { amount }),
            LevelReward::VotingMultiplier(multiplier) => {
                self.voting_multiplier = multiplier;
                events.push(HostEvent::VotingMultiplierRaised { multiplier });
            }
            LevelReward::CustomProposalColor => {
                self.privileges.custom_proposal_color = true;
                events.push(HostEvent::CustomProposalColorUnlocked);
            }
            LevelReward::CustomRoleColor => {
                self.privileges.custom_role_color = true;
                events.push(HostEvent::CustomRoleColorUnlocked);
            }
        }
    }

    /// Grant a badge and the contestant chances that come with it
    pub fn give_badge(&mut self, badge: Badge) -> Vec<HostEvent> {
        let mut events = Vec::new();
        self.give_badge_into(badge, &mut events);
        events
    }

    fn give_badge_into(&mut self, badge: Badge, events: &mut Vec<HostEvent>) {
        let chances = badge.contestant_chances();
        self.badges.push(badge);
        self.contestant_chances += chances;
        events.push(HostEvent::BadgeEarned { badge, chances });
    }

    /// Clear the once-a-day proposal bonus flag
    pub fn reset_daily_proposal(&mut self) {
        self.has_proposed_today = false;
    }

    /// Pick the colour used for this host's proposals
    pub fn set_custom_color(&mut self, color: u32) -> ReputationResult<()> {
        if !self.privileges.custom_proposal_color {
            return Err(ReputationError::PrivilegeLocked(self.id.clone()));
        }
        if color > 0xFF_FFFF {
            return Err(ReputationError::InvalidColor(color));
        }
        self.custom_color = Some(color);
        Ok(())
    }

    /// Progress from the current level towards the next
    pub fn progress(&self) -> LevelProgress {
        let floor = xp::total_xp_for_level(self.level);
        LevelProgress {
            into_level: self.xp.saturating_sub(floor),
            level_span: xp::increment_xp(self.level + 1),
        }
    }

    /// Plain-text profile card
    pub fn profile(&self) -> String {
        let progress = self.progress();
        format!(
            "{}\nXP: {}\nLevel: {}\nProgress to Next Level: {}\n{} XP Needed",
            self.name,
            self.xp,
            self.level,
            progress_bar(progress.into_level, progress.level_span, 15),
            progress.remaining()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn host() -> Host {
        Host::new("1", "Alice").unwrap()
    }

    fn count<F: Fn(&HostEvent) -> bool>(events: &[HostEvent], f: F) -> usize {
        events.iter().filter(|e| f(e)).count()
    }

    #[test]
    fn test_new_host_defaults() {
        let host = host();
        assert_eq!(host.level, 0);
        assert_eq!(host.xp, 0);
        assert_eq!(host.voting_multiplier, 1);
        assert_eq!(host.times(ActionKind::Vote), 0);
        assert!(Host::new("2", "   ").is_err());
    }

    #[test]
    fn test_vote_reward() {
        let mut host = host();
        let events = host.reward_xp_for(ActionKind::Vote);

        assert_eq!(host.times(ActionKind::Vote), 1);
        assert_eq!(host.xp, 2);
        assert_eq!(events[0], HostEvent::XpRewarded { action: ActionKind::Vote, amount: 2 });
    }

    #[test]
    fn test_daily_propose_bonus_once_per_day() {
        let mut host = host();

        host.reward_xp_for(ActionKind::Propose);
        assert_eq!(host.xp, 25);
        assert!(host.has_proposed_today);
        assert_eq!(host.times(ActionKind::DailyPropose), 1);

        host.reward_xp_for(ActionKind::Propose);
        assert_eq!(host.xp, 35);
        assert_eq!(host.times(ActionKind::DailyPropose), 1);

        host.reset_daily_proposal();
        host.reward_xp_for(ActionKind::Propose);
        assert_eq!(host.times(ActionKind::DailyPropose), 2);
        assert_eq!(host.xp, 60);
    }

    #[test]
    fn test_negative_reward_saturates() {
        let mut host = host();
        host.reward_xp_for(ActionKind::ProposeDisapprovedRule);
        assert_eq!(host.xp, 0);
        assert_eq!(host.times(ActionKind::ProposeDisapprovedRule), 1);

        host.give_xp(30);
        let level = host.level;
        host.give_xp(-25);
        assert_eq!(host.xp, 5);
        assert_eq!(host.level, level);
    }

    #[test]
    fn test_cascade_to_level_seven_fires_each_reward_once() {
        let mut host = host();
        let needed = xp::total_xp_for_level(7);
        let events = host.give_xp(needed as i64);

        assert_eq!(host.level, 7);
        for level in 1..=7 {
            assert_eq!(count(&events, |e| *e == HostEvent::LeveledUp { level }), 1);
        }
        assert_eq!(
            count(&events, |e| matches!(e, HostEvent::BadgeEarned { badge: Badge::FirstSteps, .. })),
            1
        );
        assert_eq!(count(&events, |e| *e == HostEvent::CustomProposalColorUnlocked), 1);
        assert!(host.privileges.custom_proposal_color);
        assert_eq!(host.contestant_chances, 1);
    }

    #[test]
    fn test_one_short_of_level() {
        let mut host = host();
        host.give_xp(9);
        assert_eq!(host.level, 0);
        host.give_xp(1);
        assert_eq!(host.level, 1);
    }

    #[test]
    fn test_voting_multiplier_at_level_100_and_200() {
        let mut host = host();
        host.give_xp(xp::total_xp_for_level(100) as i64);
        assert_eq!(host.voting_multiplier, 2);
        assert!(host.badges.contains(&Badge::RuleLeader));

        let events = host.give_xp((xp::total_xp_for_level(200) - host.xp) as i64);
        assert_eq!(host.level, 200);
        assert_eq!(host.voting_multiplier, 3);
        assert!(events.contains(&HostEvent::PointsEarned { amount: 8 }));
    }

    #[test]
    fn test_points_levels() {
        let mut host = host();
        let events = host.give_xp(xp::total_xp_for_level(15) as i64);
        let points: u32 = events
            .iter()
            .filter_map(|e| match e {
                HostEvent::PointsEarned { amount } => Some(*amount),
                _ => None,
            })
            .sum();
        assert_eq!(points, 2);
    }

    #[test]
    fn test_vote_milestone_only_fires_own_badge() {
        let mut host = host();
        host.action_counts.insert(ActionKind::Vote, 99);

        let events = host.reward_xp_for(ActionKind::Vote);
        assert!(events.contains(&HostEvent::MilestoneReached { action: ActionKind::Vote, count: 100 }));
        assert_eq!(host.badges.iter().filter(|b| **b == Badge::UltimateVoter).count(), 1);
        assert!(!host.badges.contains(&Badge::UltimateProposer));
        assert!(!host.badges.contains(&Badge::UltimateRuleForger));

        // Passing the milestone again does nothing extra
        let events = host.reward_xp_for(ActionKind::Vote);
        assert!(!events.iter().any(|e| matches!(e, HostEvent::MilestoneReached { .. })));
    }

    #[test]
    fn test_duplicate_badges_accumulate_chances() {
        let mut host = host();
        host.give_badge(Badge::Contributor);
        host.give_badge(Badge::Contributor);
        assert_eq!(host.contestant_chances, 4);
        assert_eq!(host.badges.len(), 2);
    }

    #[test]
    fn test_custom_color_requires_privilege() {
        let mut host = host();
        assert_eq!(
            host.set_custom_color(0x00ff00),
            Err(ReputationError::PrivilegeLocked(HostId::new("1")))
        );

        host.give_xp(xp::total_xp_for_level(5) as i64);
        assert!(host.set_custom_color(0x1cc347).is_ok());
        assert_eq!(host.custom_color, Some(0x1cc347));
        assert_eq!(host.set_custom_color(0x1_000_000), Err(ReputationError::InvalidColor(0x1_000_000)));
    }

    #[test]
    fn test_progress_and_profile() {
        let mut host = host();
        host.give_xp(15);
        let progress = host.progress();
        assert_eq!(host.level, 1);
        assert_eq!(progress.into_level, 5);
        assert_eq!(progress.level_span, 20);
        assert_eq!(progress.remaining(), 15);

        let card = host.profile();
        assert!(card.starts_with("Alice\nXP: 15\nLevel: 1"));
        assert!(card.ends_with("15 XP Needed"));
    }

    #[test]
    fn test_event_messages() {
        assert!(HostEvent::XpRewarded { action: ActionKind::Discuss, amount: 1 }.message().is_none());
        let msg = HostEvent::XpRewarded { action: ActionKind::ProposeDisapprovedRule, amount: -10 }
            .message()
            .unwrap();
        assert!(msg.contains("-10 XP"));
    }

    #[test]
    fn test_serde_fills_missing_fields() {
        let host: Host = serde_json::from_str(r#"{"id":"7","name":"Bo"}"#).unwrap();
        assert_eq!(host.voting_multiplier, 1);
        assert_eq!(host.level, 0);
        assert!(host.action_counts.is_empty());
    }

    proptest! {
        #[test]
        fn prop_level_matches_xp(amounts in proptest::collection::vec(0i64..500, 1..20)) {
            let mut host = host();
            for amount in amounts {
                host.give_xp(amount);
            }
            prop_assert!(host.xp >= xp::total_xp_for_level(host.level));
            prop_assert!(host.xp < xp::total_xp_for_level(host.level + 1));
        }
    }
}
