//! The judgement engine.
//!
//! Deciding a proposal's fate is a pure function of its weighted tally and
//! the number of hosts. All ratio tests are done by cross-multiplication so
//! no floating point is involved.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::voting::Tally;

/// An exact fraction used as a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

impl Ratio {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self { numerator, denominator }
    }

    /// `part / whole > self`, with `whole > 0`
    fn exceeded_by(&self, part: u64, whole: u64) -> bool {
        u128::from(part) * u128::from(self.denominator) > u128::from(self.numerator) * u128::from(whole)
    }
}

/// Approval needed to accept a proposal before the deadline
pub const EARLY_APPROVE_RATIO: Ratio = Ratio::new(2, 3);
/// Approval needed to accept a proposal at the deadline
pub const APPROVE_RATIO: Ratio = Ratio::new(1, 2);
/// Share of the hosts that must have voted
pub const VOTE_HOST_RATIO: Ratio = Ratio::new(1, 2);
/// Approve votes an early acceptance needs at minimum
pub const MIN_EARLY_APPROVE_VOTES: u64 = 3;
/// At or below this approval a rejected proposal penalises its proposer
pub const AWFUL_APPROVE_RATIO: Ratio = Ratio::new(1, 5);

/// The fate of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Becomes (or changes) an official rule
    Official,
    /// Thrown out, the rulebook is unchanged
    Discarded,
    /// Left open; only early judgements produce this
    Pending,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of judging one proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,
    /// The proposal was discarded with approval at or below [`AWFUL_APPROVE_RATIO`]
    pub severe_disapproval: bool,
}

/// Approval ratio test. With no decisive votes the approval counts as unanimous.
fn approval_exceeds(tally: &Tally, ratio: Ratio) -> bool {
    match tally.decisive() {
        0 => ratio.exceeded_by(1, 1),
        decisive => ratio.exceeded_by(tally.approve, decisive),
    }
}

/// Whether more than half of the hosts have voted
pub fn enough_participation(tally: &Tally, host_count: usize) -> bool {
    u128::from(tally.total()) * u128::from(VOTE_HOST_RATIO.denominator)
        > u128::from(VOTE_HOST_RATIO.numerator) * host_count as u128
}

/// Decide a proposal's fate.
///
/// Early judgements only ever accept or leave the proposal pending. Final
/// judgements always decide.
pub fn judge(tally: &Tally, host_count: usize, is_early: bool) -> Judgement {
    let participation = enough_participation(tally, host_count);

    let verdict = if is_early {
        if approval_exceeds(tally, EARLY_APPROVE_RATIO)
            && participation
            && tally.approve >= MIN_EARLY_APPROVE_VOTES
        {
            Verdict::Official
        } else {
            Verdict::Pending
        }
    } else if approval_exceeds(tally, APPROVE_RATIO) && participation {
        Verdict::Official
    } else {
        Verdict::Discarded
    };

    let severe_disapproval = verdict == Verdict::Discarded && !approval_exceeds(tally, AWFUL_APPROVE_RATIO);

    Judgement { verdict, severe_disapproval }
}
