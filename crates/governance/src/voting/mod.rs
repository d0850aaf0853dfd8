//! Vote casting and tallying

use serde::{Serialize, Deserialize};
use tracing::debug;

use gameforge_reputation::HostId;
use crate::rule::{Proposal, Vote, VoteChoice};

/// What a cast did to the proposal's votes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// The host had not voted before; a new weighted vote was added
    First,
    /// The host's existing vote now carries the new choice
    Changed { previous: VoteChoice },
}

/// Record `voter`'s `choice` on `proposal`.
///
/// A first vote carries `weight`. Changing a vote rewrites its choice and
/// keeps the weight it was cast with.
pub fn cast_vote(proposal: &mut Proposal, voter: &HostId, choice: VoteChoice, weight: u32) -> CastOutcome {
    if let Some(vote) = proposal.votes.iter_mut().find(|vote| &vote.voter == voter) {
        let previous = vote.choice;
        vote.choice = choice;
        debug!("Host {} changed vote on #{} from {} to {}", voter, proposal.number, previous, choice);
        return CastOutcome::Changed { previous };
    }

    proposal.votes.push(Vote {
        voter: voter.clone(),
        choice,
        weight: weight.max(1),
    });
    debug!("Host {} voted {} on #{} (weight {})", voter, choice, proposal.number, weight.max(1));
    CastOutcome::First
}

/// Weighted vote counts of a proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub approve: u64,
    pub disapprove: u64,
    pub no_opinion: u64,
}

impl Tally {
    pub fn of(proposal: &Proposal) -> Self {
        Self::from_votes(&proposal.votes)
    }

    pub fn from_votes(votes: &[Vote]) -> Self {
        votes.iter().fold(Tally::default(), |mut tally, vote| {
            let weight = u64::from(vote.weight);
            match vote.choice {
                VoteChoice::Approve => tally.approve += weight,
                VoteChoice::Disapprove => tally.disapprove += weight,
                VoteChoice::NoOpinion => tally.no_opinion += weight,
            }
            tally
        })
    }

    /// Every vote cast, opinions or not
    pub fn total(&self) -> u64 {
        self.approve + self.disapprove + self.no_opinion
    }

    /// Votes that took a side
    pub fn decisive(&self) -> u64 {
        self.approve + self.disapprove
    }

    /// Footer line shown under a proposal while it is being voted on
    pub fn summary(&self, host_count: usize) -> String {
        let percent = if host_count == 0 {
            0
        } else {
            (self.total() * 100 + host_count as u64 / 2) / host_count as u64
        };
        format!(
            "{}👍 {}🤷 {}👎 {}% Hosts Voted",
            self.approve, self.no_opinion, self.disapprove, percent
        )
    }
}
