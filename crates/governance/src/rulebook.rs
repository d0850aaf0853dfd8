//! The rulebook aggregate.
//!
//! `Rulebook` owns every official rule, open proposal, archived proposal and
//! host, plus the phase and its schedule. It is the unit of persistence.
//! Mutations are synchronous; side effects are queued as [`Notice`]s and
//! drained by the owner once the mutation is complete.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use gameforge_core::PostingRef;
use gameforge_reputation::{ActionKind, Host, HostId, LeaderboardPage};

use crate::draft::{self, ProposalDraft, DESCRIPTION_PHRASE, NAME_PHRASE, REQUIRED_FIRST_RULE_PHRASES};
use crate::error::{GovernanceError, GovernanceResult};
use crate::judgement::{self, Verdict};
use crate::notice::{host_notices, Notice};
use crate::phase::{phase_length, Phase, Rearm, Schedule, ScheduleKind};
use crate::rule::{DiscardedRule, OfficialRule, Proposal, ProposalKind, Resolution, VoteChoice};
use crate::topic;
use crate::voting::{self, CastOutcome, Tally};

/// Official rules the game starts with. They can never be modified or removed.
pub const NUM_STARTING_RULES: u64 = 5;

/// The whole state of one GameForge game
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rulebook {
    #[serde(default)]
    official_rules: Vec<OfficialRule>,
    #[serde(default)]
    proposals: Vec<Proposal>,
    #[serde(default)]
    discarded_rules: Vec<DiscardedRule>,
    #[serde(default)]
    hosts: Vec<Host>,
    #[serde(default)]
    phase: Phase,
    /// When the pending phase change is due
    #[serde(default)]
    phase_change_time: Option<DateTime<Utc>>,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// Hand-picked discussion topics, preferred over generated ones
    #[serde(default)]
    curated_topics: Vec<String>,
    #[serde(default)]
    schedule: Schedule,

    #[serde(skip)]
    outbox: Vec<Notice>,
    #[serde(skip)]
    requested_phase: Option<Phase>,
}

impl Rulebook {
    /// A fresh game in the brainstorming phase
    pub fn new() -> Self {
        Self::default()
    }

    pub fn official_rules(&self) -> &[OfficialRule] {
        &self.official_rules
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn discarded_rules(&self) -> &[DiscardedRule] {
        &self.discarded_rules
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_change_time(&self) -> Option<DateTime<Utc>> {
        self.phase_change_time
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn game_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn game_description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn host(&self, id: &HostId) -> GovernanceResult<&Host> {
        self.hosts
            .iter()
            .find(|host| &host.id == id)
            .ok_or_else(|| GovernanceError::HostNotFound(id.clone()))
    }

    pub fn proposal(&self, number: u64) -> GovernanceResult<&Proposal> {
        self.proposals
            .iter()
            .find(|proposal| proposal.number == number)
            .ok_or(GovernanceError::ProposalNotFound(number))
    }

    pub fn official_rule(&self, number: u64) -> GovernanceResult<&OfficialRule> {
        self.official_rules
            .iter()
            .find(|rule| rule.number == number)
            .ok_or(GovernanceError::OfficialRuleNotFound(number))
    }

    /// Take every notice queued since the last drain
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.outbox)
    }

    /// A phase change a judgement asked for, to be performed by the owner
    pub fn take_requested_transition(&mut self) -> Option<Phase> {
        self.requested_phase.take()
    }

    // ---- Hosts ----

    /// Register a new host
    pub fn add_host(&mut self, id: HostId, name: &str) -> GovernanceResult<()> {
        if self.hosts.iter().any(|host| host.id == id) {
            return Err(GovernanceError::HostAlreadyExists(id));
        }

        let host = Host::new(id, name)?;
        info!("Added host {} ({})", host.name, host.id);
        self.outbox.push(Notice::Announce(format!("Welcome {}, GameForge's newest host!", host.name)));
        self.hosts.push(host);
        Ok(())
    }

    /// Administrative removal of a host. Their proposals and votes stay.
    pub fn remove_host(&mut self, id: &HostId) -> GovernanceResult<Host> {
        let index = self
            .hosts
            .iter()
            .position(|host| &host.id == id)
            .ok_or_else(|| GovernanceError::HostNotFound(id.clone()))?;
        let host = self.hosts.remove(index);
        info!("Removed host {} ({})", host.name, host.id);
        Ok(host)
    }

    pub fn set_custom_color(&mut self, id: &HostId, color: u32) -> GovernanceResult<()> {
        let host = self.host_mut(id)?;
        host.set_custom_color(color)?;
        debug!("Host {} now proposes in {:#08x}", id, color);
        Ok(())
    }

    /// Reward a host for an action that happened outside the rulebook (e.g. discussion)
    pub fn reward_host(&mut self, id: &HostId, action: ActionKind) -> GovernanceResult<()> {
        self.host(id)?;
        self.reward(id, action);
        Ok(())
    }

    /// Clear every host's daily proposal bonus flag
    pub fn reset_daily_proposals(&mut self) {
        for host in &mut self.hosts {
            host.reset_daily_proposal();
        }
        info!("Reset daily proposals for {} hosts", self.hosts.len());
    }

    pub fn leaderboard(&self, page: usize) -> LeaderboardPage {
        LeaderboardPage::build(&self.hosts, page)
    }

    pub fn profile(&self, id: &HostId) -> GovernanceResult<String> {
        Ok(self.host(id)?.profile())
    }

    fn host_mut(&mut self, id: &HostId) -> GovernanceResult<&mut Host> {
        self.hosts
            .iter_mut()
            .find(|host| &host.id == id)
            .ok_or_else(|| GovernanceError::HostNotFound(id.clone()))
    }

    fn host_name(&self, id: &HostId) -> String {
        self.hosts
            .iter()
            .find(|host| &host.id == id)
            .map(|host| host.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Proposal card with its running tally
    fn voting_card(&self, number: u64) -> String {
        match self.proposal(number) {
            Ok(proposal) => format!(
                "{}\n{}",
                proposal.render(&self.host_name(&proposal.proposer)),
                Tally::of(proposal).summary(self.hosts.len())
            ),
            Err(_) => String::new(),
        }
    }

    /// Apply an action reward and queue what the host should hear about it
    fn reward(&mut self, id: &HostId, action: ActionKind) {
        match self.hosts.iter_mut().find(|host| &host.id == id) {
            Some(host) => {
                let events = host.reward_xp_for(action);
                self.outbox.extend(host_notices(host, &events));
            }
            None => warn!("Cannot reward {} for {}: no such host", id, action),
        }
    }

    // ---- Proposals ----

    /// Number the next proposal gets: one past the last open or archived one
    pub fn next_proposal_number(&self) -> u64 {
        let last_open = self.proposals.iter().map(|p| p.number).max().unwrap_or(0);
        let last_discarded = self.discarded_rules.iter().map(|d| d.number()).max().unwrap_or(0);
        last_open.max(last_discarded) + 1
    }

    /// Number the next official rule gets
    pub fn next_official_number(&self) -> u64 {
        let highest = self.official_rules.iter().map(|r| r.number).max().unwrap_or(0);
        highest.max(self.official_rules.len() as u64) + 1
    }

    /// Submit a new proposal and return its number
    pub fn submit_proposal(
        &mut self,
        proposer: &HostId,
        draft: ProposalDraft,
        now: DateTime<Utc>,
    ) -> GovernanceResult<u64> {
        let host = self.host(proposer)?;
        let (proposer_name, custom_color) = (host.name.clone(), host.custom_color);

        if let Some(reason) = draft.phase_restriction(self.phase) {
            return Err(GovernanceError::WrongPhase { phase: self.phase, reason: reason.to_string() });
        }
        if draft.supplied_text().trim().is_empty() {
            return Err(GovernanceError::InvalidProposal("the proposal text is empty".to_string()));
        }

        let description = draft.description();
        if draft.needs_bootstrap_phrases() {
            self.check_bootstrap_phrases(&description)?;
        }
        let kind = draft.kind();
        if let Some(target) = kind.target() {
            self.check_changeable(target)?;
        }

        let number = self.next_proposal_number();
        let proposal = Proposal {
            number,
            kind,
            description,
            proposer: proposer.clone(),
            votes: Vec::new(),
            posting: None,
            color: custom_color.unwrap_or_else(|| rand::thread_rng().gen_range(0..=0xFF_FFFF)),
            judgement_time: None,
        };

        info!("Host {} proposed #{} ({}) at {}", proposer, number, kind, now);
        self.outbox.push(Notice::PostProposal { number, content: proposal.render(&proposer_name) });
        self.outbox.push(Notice::AlertStaff(format!("Proposal #{} has been submitted by {}", number, proposer_name)));
        self.proposals.push(proposal);

        self.reward(proposer, ActionKind::Propose);
        Ok(number)
    }

    fn check_bootstrap_phrases(&self, description: &str) -> GovernanceResult<()> {
        let new_rules = (self.official_rules.len() as u64).saturating_sub(NUM_STARTING_RULES);
        if new_rules == 0 && !REQUIRED_FIRST_RULE_PHRASES.iter().all(|phrase| description.contains(phrase)) {
            return Err(GovernanceError::MissingBootstrapPhrases(
                REQUIRED_FIRST_RULE_PHRASES.iter().map(|p| p.to_string()).collect(),
            ));
        }
        Ok(())
    }

    fn check_changeable(&self, target: u64) -> GovernanceResult<()> {
        if target <= NUM_STARTING_RULES || self.official_rule(target).is_err() {
            let last = self.official_rules.iter().map(|r| r.number).max().unwrap_or(0);
            return Err(GovernanceError::TargetNotModifiable {
                number: target,
                first: NUM_STARTING_RULES + 1,
                last,
            });
        }
        Ok(())
    }

    /// Record where the gateway published a proposal
    pub fn attach_posting(&mut self, number: u64, posting: PostingRef) -> GovernanceResult<()> {
        let proposal = self
            .proposals
            .iter_mut()
            .find(|proposal| proposal.number == number)
            .ok_or(GovernanceError::ProposalNotFound(number))?;
        proposal.posting = Some(posting.clone());

        if self.phase == Phase::Voting {
            self.outbox.push(Notice::EnableVotingControls(posting));
        }
        Ok(())
    }

    /// Record where the gateway published an official rule
    pub fn attach_official_posting(&mut self, number: u64, posting: PostingRef) -> GovernanceResult<()> {
        let rule = self
            .official_rules
            .iter_mut()
            .find(|rule| rule.number == number)
            .ok_or(GovernanceError::OfficialRuleNotFound(number))?;
        rule.posting = Some(posting);
        Ok(())
    }

    /// Let a proposer reword their own proposal outside of voting
    pub fn edit_proposal(&mut self, editor: &HostId, number: u64, description: &str) -> GovernanceResult<()> {
        if self.phase == Phase::Voting {
            return Err(GovernanceError::WrongPhase {
                phase: self.phase,
                reason: "proposals cannot be edited while they are voted on".to_string(),
            });
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(GovernanceError::InvalidProposal("the proposal text is empty".to_string()));
        }

        let proposal = self.proposal(number)?;
        if &proposal.proposer != editor {
            return Err(GovernanceError::NotProposer { host: editor.clone(), number });
        }
        let proposer_name = self.host_name(editor);

        let Some(proposal) = self.proposals.iter_mut().find(|p| p.number == number) else {
            return Err(GovernanceError::ProposalNotFound(number));
        };
        proposal.description = description.to_string();
        if let Some(posting) = proposal.posting.clone() {
            let content = proposal.render(&proposer_name);
            self.outbox.push(Notice::UpdatePosting { posting, content });
        }
        self.outbox.push(Notice::Announce(format!(
            "Proposed Rule #{} has edited their proposal description.",
            number
        )));
        debug!("Proposal #{} edited by {}", number, editor);
        Ok(())
    }

    // ---- Voting and judgement ----

    /// Cast or change a host's vote. Only a first vote earns XP.
    pub fn cast_vote(&mut self, voter: &HostId, number: u64, choice: VoteChoice) -> GovernanceResult<CastOutcome> {
        let weight = self.host(voter)?.vote_weight();

        let proposal = self
            .proposals
            .iter_mut()
            .find(|proposal| proposal.number == number)
            .ok_or(GovernanceError::ProposalNotFound(number))?;
        let outcome = voting::cast_vote(proposal, voter, choice, weight);

        let update = self.proposal(number)?.posting.clone().map(|posting| Notice::UpdatePosting {
            content: self.voting_card(number),
            posting,
        });
        self.outbox.extend(update);

        if outcome == CastOutcome::First {
            self.reward(voter, ActionKind::Vote);
        }
        Ok(outcome)
    }

    /// Judge a proposal early: accept it if it already clearly passes
    pub fn judge_early(&mut self, number: u64) -> GovernanceResult<Verdict> {
        self.judge_proposal(number, true)
    }

    /// Judge one open proposal and apply the result
    pub fn judge_proposal(&mut self, number: u64, is_early: bool) -> GovernanceResult<Verdict> {
        let proposal = self.proposal(number)?;
        let tally = Tally::of(proposal);
        let judgement = judgement::judge(&tally, self.hosts.len(), is_early);
        debug!(
            "Judged #{}: {:?} (approve {}, disapprove {}, total {}, hosts {}, early {})",
            number, judgement.verdict, tally.approve, tally.disapprove, tally.total(), self.hosts.len(), is_early
        );

        if judgement.verdict == Verdict::Pending {
            return Ok(Verdict::Pending);
        }

        let index = self
            .proposals
            .iter()
            .position(|p| p.number == number)
            .ok_or(GovernanceError::ProposalNotFound(number))?;
        let proposal = self.proposals.remove(index);

        let verdict = match judgement.verdict {
            Verdict::Official => self.promote(proposal, &tally),
            _ => {
                if judgement.severe_disapproval {
                    self.reward(&proposal.proposer, ActionKind::ProposeDisapprovedRule);
                }
                self.discard(proposal, &tally);
                Verdict::Discarded
            }
        };
        info!("Proposal #{} is {}", number, verdict);
        Ok(verdict)
    }

    /// Apply an accepted proposal to the rulebook and archive it
    fn promote(&mut self, proposal: Proposal, tally: &Tally) -> Verdict {
        if self.phase == Phase::Brainstorming && self.completes_bootstrap(&proposal.description) {
            info!("Game has a name and a description, requesting the proposing phase");
            self.requested_phase = Some(Phase::Proposing);
        }

        match proposal.kind {
            ProposalKind::Create => {
                let number = self.next_official_number();
                let rule = OfficialRule {
                    number,
                    description: proposal.description.clone(),
                    proposer: proposal.proposer.clone(),
                    posting: None,
                };
                if let Some(name) = draft::extract_name(&rule.description) {
                    self.name = Some(name);
                }
                if let Some(description) = draft::extract_description(&rule.description) {
                    self.description = Some(description);
                }
                self.outbox.push(Notice::PostOfficialRule { number, content: rule.render() });
                self.outbox.push(Notice::Announce(format!(
                    "Proposed Rule #{} has become official rule #{}.",
                    proposal.number, number
                )));
                self.official_rules.push(rule);
            }
            ProposalKind::Modify { target } => {
                let Some(index) = self.official_rules.iter().position(|rule| rule.number == target) else {
                    warn!("Proposal #{} modifies official rule #{} which no longer exists", proposal.number, target);
                    self.discard(proposal, tally);
                    return Verdict::Discarded;
                };
                let rule = &mut self.official_rules[index];
                rule.description = proposal.description.clone();
                if let Some(posting) = rule.posting.clone() {
                    self.outbox.push(Notice::UpdatePosting { posting, content: rule.render() });
                }
                self.outbox.push(Notice::Announce(format!(
                    "Proposed Rule #{} has modified Official Rule #{}.",
                    proposal.number, target
                )));
                self.outbox.push(Notice::AlertStaff(format!("Official Rule #{} Modified", target)));
            }
            ProposalKind::Remove { target } => {
                let Some(index) = self.official_rules.iter().position(|rule| rule.number == target) else {
                    warn!("Proposal #{} removes official rule #{} which no longer exists", proposal.number, target);
                    self.discard(proposal, tally);
                    return Verdict::Discarded;
                };
                let rule = self.official_rules.remove(index);
                if let Some(posting) = rule.posting {
                    self.outbox.push(Notice::UpdatePosting {
                        posting,
                        content: OfficialRule::render_removed(target),
                    });
                }
                self.outbox.push(Notice::Announce(format!(
                    "Proposed Rule #{} has removed Official Rule #{}.",
                    proposal.number, target
                )));
                self.outbox.push(Notice::AlertStaff(format!("Official Rule #{} Removed", target)));
            }
        }

        self.close_posting(&proposal, tally, Verdict::Official);
        let proposer = proposal.proposer.clone();
        self.discarded_rules.push(DiscardedRule { proposal, resolution: Resolution::Accepted });
        self.reward(&proposer, ActionKind::CreateOfficialRule);
        Verdict::Official
    }

    /// Archive a rejected proposal
    fn discard(&mut self, proposal: Proposal, tally: &Tally) {
        self.outbox.push(Notice::Announce(format!("Proposed Rule #{} has been discarded.", proposal.number)));
        self.close_posting(&proposal, tally, Verdict::Discarded);
        self.discarded_rules.push(DiscardedRule { proposal, resolution: Resolution::Rejected });
    }

    /// Stamp the final verdict on a proposal posting and lock its votes
    fn close_posting(&mut self, proposal: &Proposal, tally: &Tally, verdict: Verdict) {
        let Some(posting) = proposal.posting.clone() else {
            return;
        };
        let banner = match verdict {
            Verdict::Official => "✅ APPROVED",
            _ => "❌ DISCARDED",
        };
        let content = format!(
            "{} {}) Rule {}\n{}\n{}",
            banner,
            proposal.number,
            proposal.kind,
            proposal.description,
            tally.summary(self.hosts.len())
        );
        self.outbox.push(Notice::UpdatePosting { posting: posting.clone(), content });
        self.outbox.push(Notice::DisableVotingControls(posting));
    }

    /// Naming the game and describing it are the two steps that end brainstorming
    fn completes_bootstrap(&self, description: &str) -> bool {
        let has_rule_with = |phrase: &str| self.official_rules.iter().any(|rule| rule.description.contains(phrase));
        (description.contains(NAME_PHRASE) && has_rule_with(DESCRIPTION_PHRASE))
            || (description.contains(DESCRIPTION_PHRASE) && has_rule_with(NAME_PHRASE))
    }

    // ---- Phases ----

    pub fn set_curated_topics(&mut self, topics: Vec<String>) {
        self.curated_topics = topics.into_iter().filter(|t| !t.trim().is_empty()).collect();
    }

    /// Move to `next` and schedule the mirror transition.
    ///
    /// Entering `Proposing` judges every open proposal, newest first, and picks
    /// a new topic. Entering `Voting` opens every proposal for votes.
    pub fn transition_to(&mut self, next: Phase, now: DateTime<Utc>) {
        info!("Phase change: {} -> {}", self.phase, next);
        self.phase = next;

        match next {
            Phase::Proposing => {
                let numbers: Vec<u64> = self.proposals.iter().rev().map(|p| p.number).collect();
                info!("Judging {} proposals", numbers.len());
                for number in numbers {
                    if let Err(e) = self.judge_proposal(number, false) {
                        warn!("Failed to judge proposal #{}: {}", number, e);
                    }
                }

                self.topic = topic::select_topic(&self.official_rules, &self.curated_topics, &mut rand::thread_rng());
                self.outbox.push(Notice::Announce(format!(
                    "It is now the Proposing phase\n\
                     - Check out the new official rules\n\
                     - Discuss what you want to add to the game next\n\
                     - Propose that addition to the game\n\n\
                     Question(s) To Consider: {}",
                    self.topic
                )));
            }
            Phase::Voting => {
                let mut opened = Vec::new();
                for proposal in self.proposals.iter().rev() {
                    if let Some(posting) = proposal.posting.clone() {
                        opened.push(Notice::UpdatePosting {
                            posting: posting.clone(),
                            content: self.voting_card(proposal.number),
                        });
                        opened.push(Notice::EnableVotingControls(posting));
                    }
                }
                self.outbox.extend(opened);
                self.outbox.push(Notice::Announce(
                    "It is now the Voting phase\n\
                     - Look at all the rules that have been proposed\n\
                     - Discuss in the proposal threads what you think about the rules\n\
                     - Vote on the existing proposed rules\n\
                     - Discuss what rules should be added next"
                        .to_string(),
                ));
            }
            Phase::Brainstorming => {
                self.schedule.cancel_phase();
                self.phase_change_time = None;
                self.outbox.push(Notice::Announce("It is now the Brainstorming phase".to_string()));
                return;
            }
        }

        let due = now + phase_length();
        if let Some(kind) = ScheduleKind::entering(next.next()) {
            self.schedule.arm_phase(kind, due);
        }
        self.phase_change_time = Some(due);
    }

    /// Run every scheduled entry due at `now` and return what ran
    pub fn run_due(&mut self, now: DateTime<Utc>, zone: Tz) -> Vec<ScheduleKind> {
        let due = self.schedule.take_due(now);
        for entry in &due {
            match entry.kind.target_phase() {
                Some(phase) => self.transition_to(phase, now),
                None => {
                    self.reset_daily_proposals();
                    self.schedule.arm_daily_reset(now, zone);
                }
            }
        }
        due.into_iter().map(|entry| entry.kind).collect()
    }

    /// Reconcile the schedule after loading a snapshot.
    ///
    /// Missed phase changes are reported to staff and dropped rather than
    /// replayed. An overdue daily reset runs. A daily reset is always armed
    /// afterwards.
    pub fn rearm(&mut self, now: DateTime<Utc>, zone: Tz) -> Rearm {
        let rearm = self.schedule.rearm(now);

        for missed in &rearm.missed {
            warn!("Missed scheduled {:?} due at {}", missed.kind, missed.due);
            self.outbox.push(Notice::AlertStaff(format!(
                "The scheduled change to the {} phase was due at {} but was missed while offline. \
                 It has not been replayed; set the phase manually.",
                missed.kind.target_phase().unwrap_or(self.phase),
                missed.due
            )));
        }
        if !rearm.missed.is_empty() {
            self.phase_change_time = None;
        }

        if rearm.overdue_reset {
            self.reset_daily_proposals();
        }
        if self.schedule.daily_reset_entry().is_none() {
            self.schedule.arm_daily_reset(now, zone);
        }
        rearm
    }

    /// One-paragraph overview of the game state
    pub fn status(&self) -> String {
        let mut out = format!(
            "Game: {}\nPhase: {}\nHosts: {}\nOfficial rules: {}\nOpen proposals: {}\nDiscarded rules: {}",
            self.name.as_deref().unwrap_or("(unnamed)"),
            self.phase,
            self.hosts.len(),
            self.official_rules.len(),
            self.proposals.len(),
            self.discarded_rules.len()
        );
        if let Some(due) = self.phase_change_time {
            out.push_str(&format!("\nNext phase change: {}", due));
        }
        if !self.topic.is_empty() {
            out.push_str(&format!("\nTopic: {}", self.topic));
        }
        out
    }
}
