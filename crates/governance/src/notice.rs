//! Outbound side effects produced by rulebook mutations.
//!
//! The rulebook never talks to collaborators itself. Every mutation queues
//! notices that the owning service delivers once the mutation is complete.

use gameforge_core::PostingRef;
use gameforge_reputation::{Host, HostEvent, HostId};

/// One thing the outside world needs to hear about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Public announcement
    Announce(String),
    /// Private message to a host
    DirectMessage { host: HostId, text: String },
    /// Message for the staff feed
    AlertStaff(String),
    /// Publish a new proposal; the returned posting is attached to it
    PostProposal { number: u64, content: String },
    /// Publish a new official rule; the returned posting is attached to it
    PostOfficialRule { number: u64, content: String },
    UpdatePosting { posting: PostingRef, content: String },
    EnableVotingControls(PostingRef),
    DisableVotingControls(PostingRef),
    /// Pay points into the host's ledger account
    CreditPoints { host: HostId, amount: u32 },
}

/// Turn host events into direct messages and ledger credits
pub fn host_notices(host: &Host, events: &[HostEvent]) -> Vec<Notice> {
    let mut notices = Vec::new();
    for event in events {
        if let HostEvent::PointsEarned { amount } = event {
            notices.push(Notice::CreditPoints { host: host.id.clone(), amount: *amount });
        }
        if let Some(text) = event.message() {
            notices.push(Notice::DirectMessage { host: host.id.clone(), text });
        }
    }
    notices
}
