//! Phases of the rule-making cycle and the persisted schedule table that
//! drives them.

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Deserialize};
use tracing::debug;

use gameforge_core::utils::next_local_midnight;

/// Time between two phase changes
pub fn phase_length() -> Duration {
    Duration::days(2)
}

/// Phase of the cycle. `Brainstorming` only happens once, before the game
/// has a name and description; afterwards the cycle alternates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Brainstorming,
    Proposing,
    Voting,
}

impl Phase {
    /// The phase that follows this one
    pub fn next(self) -> Phase {
        match self {
            Phase::Brainstorming | Phase::Voting => Phase::Proposing,
            Phase::Proposing => Phase::Voting,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "brainstorming" => Ok(Phase::Brainstorming),
            "proposing" => Ok(Phase::Proposing),
            "voting" => Ok(Phase::Voting),
            other => Err(format!("unknown phase: {}", other)),
        }
    }
}

/// Work that can be scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleKind {
    EnterProposing,
    EnterVoting,
    /// Clear every host's daily proposal bonus flag
    DailyReset,
}

impl ScheduleKind {
    pub fn is_phase_change(self) -> bool {
        matches!(self, ScheduleKind::EnterProposing | ScheduleKind::EnterVoting)
    }

    /// The phase entered when this entry fires
    pub fn target_phase(self) -> Option<Phase> {
        match self {
            ScheduleKind::EnterProposing => Some(Phase::Proposing),
            ScheduleKind::EnterVoting => Some(Phase::Voting),
            ScheduleKind::DailyReset => None,
        }
    }

    pub fn entering(phase: Phase) -> Option<ScheduleKind> {
        match phase {
            Phase::Proposing => Some(ScheduleKind::EnterProposing),
            Phase::Voting => Some(ScheduleKind::EnterVoting),
            Phase::Brainstorming => None,
        }
    }
}

/// A single piece of scheduled work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub due: DateTime<Utc>,
    pub kind: ScheduleKind,
}

/// What re-arming the schedule after a restart found
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rearm {
    /// Entries still in the future, soonest first
    pub pending: Vec<ScheduleEntry>,
    /// Phase changes that should have happened while the process was down.
    /// They are dropped, never replayed.
    pub missed: Vec<ScheduleEntry>,
    /// A daily reset was overdue and must run now
    pub overdue_reset: bool,
}

/// Table of scheduled work, persisted with the rulebook.
///
/// Holds at most one phase change and at most one daily reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    /// The pending phase change, if any
    pub fn phase_entry(&self) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.kind.is_phase_change())
    }

    pub fn daily_reset_entry(&self) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|entry| entry.kind == ScheduleKind::DailyReset)
    }

    /// Schedule a phase change, superseding any pending one
    pub fn arm_phase(&mut self, kind: ScheduleKind, due: DateTime<Utc>) {
        self.cancel_phase();
        debug!("Scheduled {:?} at {}", kind, due);
        self.entries.push(ScheduleEntry { due, kind });
        self.sort();
    }

    pub fn cancel_phase(&mut self) {
        self.entries.retain(|entry| !entry.kind.is_phase_change());
    }

    /// Schedule the next daily reset at the local midnight after `now`
    pub fn arm_daily_reset(&mut self, now: DateTime<Utc>, zone: Tz) {
        self.entries.retain(|entry| entry.kind != ScheduleKind::DailyReset);
        let due = next_local_midnight(now, zone);
        debug!("Scheduled daily reset at {}", due);
        self.entries.push(ScheduleEntry { due, kind: ScheduleKind::DailyReset });
        self.sort();
    }

    /// Remove and return every entry due at or before `now`, oldest first
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduleEntry> {
        let (due, pending): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|entry| entry.due <= now);
        self.entries = pending;
        due
    }

    /// Sort the table out after a restart: keep future entries, drop missed
    /// phase changes and report an overdue daily reset.
    pub fn rearm(&mut self, now: DateTime<Utc>) -> Rearm {
        let mut rearm = Rearm::default();
        for entry in self.take_due(now) {
            if entry.kind.is_phase_change() {
                rearm.missed.push(entry);
            } else {
                rearm.overdue_reset = true;
            }
        }
        rearm.pending = self.entries.clone();
        rearm
    }

    /// When the next entry is due
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.first().map(|entry| entry.due)
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|entry| entry.due);
    }
}
