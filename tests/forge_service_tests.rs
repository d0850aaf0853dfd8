mod common;

use std::error::Error;
use std::sync::Arc;

use chrono::Duration;
use serde_json::json;
use tempfile::tempdir;

use gameforge::core::{FileStorage, JsonStorage, MemoryStorage, Storage};
use gameforge::governance::{
    phase_length, CastOutcome, Phase, ProposalDraft, Rulebook, ScheduleKind, Verdict, VoteChoice,
};
use gameforge::reputation::xp::total_xp_for_level;
use gameforge::reputation::HostId;
use gameforge::{ForgeService, ServiceError};

use common::{env, env_with, service_over, start, FlakyStorage, RecordingGateway, RecordingLedger, Sent, BOOTSTRAP};

fn id(s: &str) -> HostId {
    HostId::new(s)
}

fn create(text: &str) -> ProposalDraft {
    ProposalDraft::Create { description: text.to_string(), for_challenge: None }
}

async fn add_hosts(service: &ForgeService, count: usize) -> Result<(), Box<dyn Error>> {
    for i in 1..=count {
        service.add_host(id(&i.to_string()), &format!("host{}", i)).await?;
    }
    Ok(())
}

#[tokio::test]
async fn test_full_phase_cycle() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 3).await?;

    env.service.transition_to(Phase::Proposing, start()).await?;
    let number = env.service.submit_proposal(&id("1"), create(BOOTSTRAP)).await?;
    assert_eq!(number, 1);

    // The gateway's posting is recorded on the proposal
    let book = env.service.snapshot().await;
    let posting = book.proposal(1)?.posting.clone().expect("posting attached");
    assert!(env.gateway.staff_alerts().await.iter().any(|a| a.contains("Proposal #1 has been submitted")));

    env.service.transition_to(Phase::Voting, start() + Duration::days(2)).await?;
    assert!(env.gateway.sent().await.contains(&Sent::VotingOpened(posting.clone())));

    for voter in ["1", "2", "3"] {
        let outcome = env.service.cast_vote(&id(voter), 1, VoteChoice::Approve).await?;
        assert_eq!(outcome, CastOutcome::First);
    }

    env.service.transition_to(Phase::Proposing, start() + Duration::days(4)).await?;

    let book = env.service.snapshot().await;
    assert!(book.proposals().is_empty());
    assert_eq!(book.official_rules().len(), 1);
    assert_eq!(book.official_rules()[0].number, 1);
    assert!(book.official_rules()[0].posting.is_some());
    assert_eq!(book.discarded_rules().len(), 1);

    let sent = env.gateway.sent().await;
    assert!(sent.contains(&Sent::VotingClosed(posting)));
    assert!(sent.iter().any(|s| matches!(s, Sent::OfficialRule { number: 1, .. })));
    assert!(env
        .gateway
        .announcements()
        .await
        .iter()
        .any(|a| a.contains("Proposed Rule #1 has become official rule #1.")));
    Ok(())
}

#[tokio::test]
async fn test_changed_vote_updates_posting_without_reward() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 2).await?;
    env.service.transition_to(Phase::Proposing, start()).await?;
    env.service.submit_proposal(&id("1"), create(BOOTSTRAP)).await?;
    env.service.transition_to(Phase::Voting, start()).await?;

    env.service.cast_vote(&id("2"), 1, VoteChoice::Approve).await?;
    let xp_after_first = env.service.snapshot().await.host(&id("2"))?.xp;

    let outcome = env.service.cast_vote(&id("2"), 1, VoteChoice::Disapprove).await?;
    assert_eq!(outcome, CastOutcome::Changed { previous: VoteChoice::Approve });

    let book = env.service.snapshot().await;
    assert_eq!(book.host(&id("2"))?.xp, xp_after_first);
    assert_eq!(book.proposal(1)?.votes.len(), 1);

    let updates = env
        .gateway
        .sent()
        .await
        .into_iter()
        .filter(|s| matches!(s, Sent::Update { .. }))
        .count();
    assert!(updates >= 2);
    Ok(())
}

#[tokio::test]
async fn test_rejected_proposal_changes_nothing() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 2).await?;

    // Plain rules cannot be proposed while brainstorming
    assert!(env.service.submit_proposal(&id("1"), create(BOOTSTRAP)).await.is_err());

    env.service.transition_to(Phase::Proposing, start()).await?;
    // The first rules must set up the show
    assert!(env.service.submit_proposal(&id("1"), create("Everyone wins")).await.is_err());
    assert!(env.service.submit_proposal(&id("9"), create(BOOTSTRAP)).await.is_err());

    let book = env.service.snapshot().await;
    assert!(book.proposals().is_empty());
    assert_eq!(book.next_proposal_number(), 1);
    assert!(env.gateway.sent().await.iter().all(|s| !matches!(s, Sent::Proposal { .. })));
    Ok(())
}

#[tokio::test]
async fn test_naming_and_describing_end_brainstorming() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 3).await?;

    let name = env
        .service
        .submit_proposal(&id("1"), ProposalDraft::GameName { name: "Starforge".to_string() })
        .await?;
    let description = env
        .service
        .submit_proposal(&id("2"), ProposalDraft::GameDescription { text: "A race to Mars.".to_string() })
        .await?;

    for number in [name, description] {
        for voter in ["1", "2", "3"] {
            env.service.cast_vote(&id(voter), number, VoteChoice::Approve).await?;
        }
    }

    let now = start() + Duration::hours(3);
    assert_eq!(env.service.judge_early(name, now).await?, Verdict::Official);
    assert_eq!(env.service.phase().await, Phase::Brainstorming);

    assert_eq!(env.service.judge_early(description, now).await?, Verdict::Official);
    assert_eq!(env.service.phase().await, Phase::Proposing);

    let book = env.service.snapshot().await;
    assert_eq!(book.game_name(), Some("Starforge"));
    assert_eq!(book.game_description(), Some("A race to Mars."));
    assert_eq!(book.phase_change_time(), Some(now + phase_length()));
    let entry = book.schedule().phase_entry().expect("voting scheduled");
    assert_eq!(entry.kind, ScheduleKind::EnterVoting);
    assert_eq!(entry.due, now + phase_length());
    Ok(())
}

#[tokio::test]
async fn test_early_judgement_leaves_close_votes_open() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 4).await?;
    env.service.transition_to(Phase::Proposing, start()).await?;
    env.service.submit_proposal(&id("1"), create(BOOTSTRAP)).await?;
    env.service.transition_to(Phase::Voting, start()).await?;

    env.service.cast_vote(&id("1"), 1, VoteChoice::Approve).await?;
    env.service.cast_vote(&id("2"), 1, VoteChoice::Approve).await?;
    env.service.cast_vote(&id("3"), 1, VoteChoice::Disapprove).await?;

    assert_eq!(env.service.judge_early(1, start()).await?, Verdict::Pending);
    assert_eq!(env.service.snapshot().await.proposals().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_tick_runs_due_phase_change() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 1).await?;
    env.service.rearm(start()).await?;
    env.service.transition_to(Phase::Proposing, start()).await?;

    let ran = env.service.tick(start() + Duration::hours(1)).await?;
    assert!(ran.is_empty());
    assert_eq!(env.service.phase().await, Phase::Proposing);

    let ran = env.service.tick(start() + Duration::days(2) + Duration::seconds(1)).await?;
    assert!(ran.contains(&ScheduleKind::EnterVoting));
    assert!(ran.contains(&ScheduleKind::DailyReset));
    assert_eq!(env.service.phase().await, Phase::Voting);

    let book = env.service.snapshot().await;
    assert_eq!(book.schedule().phase_entry().map(|e| e.kind), Some(ScheduleKind::EnterProposing));
    assert!(book.schedule().daily_reset_entry().is_some());
    Ok(())
}

#[tokio::test]
async fn test_missed_phase_change_alerts_staff_after_restart() -> Result<(), Box<dyn Error>> {
    let storage = Arc::new(MemoryStorage::new());
    {
        let env = env_with(storage.clone(), RecordingLedger::default()).await;
        add_hosts(&env.service, 1).await?;
        env.service.transition_to(Phase::Proposing, start()).await?;
    }

    let env = env_with(storage, RecordingLedger::default()).await;
    assert_eq!(env.service.phase().await, Phase::Proposing);

    let rearm = env.service.rearm(start() + Duration::days(3)).await?;
    assert_eq!(rearm.missed.len(), 1);
    assert_eq!(rearm.missed[0].kind, ScheduleKind::EnterVoting);

    // The missed change is reported, not replayed
    assert_eq!(env.service.phase().await, Phase::Proposing);
    assert!(env.gateway.staff_alerts().await.iter().any(|a| a.contains("missed")));

    let book = env.service.snapshot().await;
    assert!(book.schedule().phase_entry().is_none());
    assert!(book.schedule().daily_reset_entry().is_some());
    Ok(())
}

#[tokio::test]
async fn test_refused_points_credit_is_reported_to_host() -> Result<(), Box<dyn Error>> {
    let storage = Arc::new(MemoryStorage::new());
    let config = common::config();

    // A host one XP short of level 8, which pays out a point
    let mut book = Rulebook::new();
    book.add_host(id("7"), "Ada")?;
    book.transition_to(Phase::Proposing, start());
    let mut snapshot = serde_json::to_value(&book)?;
    snapshot["hosts"][0]["xp"] = json!(total_xp_for_level(8) - 1);
    snapshot["hosts"][0]["level"] = json!(7);
    storage.put_json(&config.snapshot_key, &snapshot).await?;

    let env = env_with(storage, RecordingLedger::refusing()).await;
    let number = env.service.submit_proposal(&id("7"), create(BOOTSTRAP)).await?;

    // The proposal stands even though the credit failed
    assert!(env.service.snapshot().await.proposal(number).is_ok());
    assert_eq!(env.service.snapshot().await.host(&id("7"))?.level, 8);
    assert!(env.ledger.credits().await.is_empty());

    let messages = env.gateway.messages_to("7").await;
    assert!(messages.iter().any(|m| m.contains("You leveled up! You are now level 8")));
    assert!(messages.iter().any(|m| m.contains("not in the points database")));
    Ok(())
}

#[tokio::test]
async fn test_points_are_credited() -> Result<(), Box<dyn Error>> {
    let storage = Arc::new(MemoryStorage::new());
    let config = common::config();

    let mut book = Rulebook::new();
    book.add_host(id("7"), "Ada")?;
    book.transition_to(Phase::Proposing, start());
    let mut snapshot = serde_json::to_value(&book)?;
    snapshot["hosts"][0]["xp"] = json!(total_xp_for_level(8) - 1);
    snapshot["hosts"][0]["level"] = json!(7);
    storage.put_json(&config.snapshot_key, &snapshot).await?;

    let env = env_with(storage, RecordingLedger::default()).await;
    env.service.submit_proposal(&id("7"), create(BOOTSTRAP)).await?;

    assert_eq!(env.ledger.credits().await, vec![("7".to_string(), 1)]);
    Ok(())
}

#[tokio::test]
async fn test_snapshot_survives_restart_on_disk() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let config = common::config();

    let gateway = Arc::new(RecordingGateway::default());
    let ledger = Arc::new(RecordingLedger::default());
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()).await?);

    let service = ForgeService::load(storage.clone(), gateway.clone(), ledger.clone(), &config).await?;
    add_hosts(&service, 2).await?;
    service.transition_to(Phase::Proposing, start()).await?;
    service.submit_proposal(&id("2"), create(BOOTSTRAP)).await?;
    service.transition_to(Phase::Voting, start()).await?;
    service.cast_vote(&id("1"), 1, VoteChoice::NoOpinion).await?;
    let before = service.snapshot().await;
    drop(service);

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()).await?);
    let reloaded = ForgeService::load(storage, gateway, ledger, &config).await?;
    let after = reloaded.snapshot().await;

    assert_eq!(after.phase(), Phase::Voting);
    assert_eq!(after.hosts(), before.hosts());
    assert_eq!(after.proposals(), before.proposals());
    assert_eq!(after.proposal(1)?.vote_of(&id("1")).map(|v| v.choice), Some(VoteChoice::NoOpinion));
    assert_eq!(after.schedule(), before.schedule());
    assert_eq!(after.phase_change_time(), before.phase_change_time());
    Ok(())
}

#[tokio::test]
async fn test_host_admin() -> Result<(), Box<dyn Error>> {
    let env = env().await;
    add_hosts(&env.service, 2).await?;

    assert!(env.service.add_host(id("1"), "again").await.is_err());
    assert!(env.gateway.announcements().await.iter().any(|a| a.contains("host1")));

    env.service.record_discussion(&id("2")).await?;
    let page = env.service.leaderboard(1).await;
    assert_eq!(page.entries.len(), 2);
    assert_eq!(page.entries[0].host_id, id("2"));

    // Colours are locked until level 5
    assert!(env.service.set_custom_color(&id("1"), 0x1cc347).await.is_err());

    let profile = env.service.profile(&id("2")).await?;
    assert!(profile.starts_with("host2\nXP: 1"));

    env.service.remove_host(&id("1")).await?;
    assert!(env.service.profile(&id("1")).await.is_err());
    assert_eq!(env.service.snapshot().await.hosts().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_scheduler_tick_keeps_changes_saved_by_another_process() -> Result<(), Box<dyn Error>> {
    let storage = Arc::new(MemoryStorage::new());
    let daemon = env_with(storage.clone(), RecordingLedger::default()).await;
    add_hosts(&daemon.service, 1).await?;
    daemon.service.rearm(start()).await?;
    daemon.service.transition_to(Phase::Proposing, start()).await?;

    // A one-shot command loads the same store, changes it and exits
    let gateway = Arc::new(RecordingGateway::default());
    let command = service_over(storage.clone(), gateway).await;
    command.add_host(id("2"), "host2").await?;
    drop(command);

    let ran = daemon.service.tick(start() + Duration::seconds(30)).await?;
    assert!(ran.is_empty());
    let saved: Rulebook = storage.get_json(&daemon.config.snapshot_key).await?;
    assert_eq!(saved.hosts().len(), 2);

    // Work that is due runs on top of the latest snapshot
    let ran = daemon.service.tick(start() + phase_length()).await?;
    assert!(ran.contains(&ScheduleKind::EnterVoting));
    let saved: Rulebook = storage.get_json(&daemon.config.snapshot_key).await?;
    assert_eq!(saved.hosts().len(), 2);
    assert_eq!(saved.phase(), Phase::Voting);
    assert_eq!(daemon.service.snapshot().await.hosts().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_idle_tick_writes_nothing() -> Result<(), Box<dyn Error>> {
    let storage = Arc::new(FlakyStorage::default());
    let gateway = Arc::new(RecordingGateway::default());
    let service = service_over(storage.clone(), gateway).await;
    add_hosts(&service, 1).await?;
    service.rearm(start()).await?;

    storage.fail_writes(true);
    assert!(service.tick(start() + Duration::minutes(1)).await?.is_empty());
    assert!(service.rearm(start() + Duration::minutes(2)).await?.missed.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_failed_save_is_reported_and_rolled_back() -> Result<(), Box<dyn Error>> {
    let storage = Arc::new(FlakyStorage::default());
    let gateway = Arc::new(RecordingGateway::default());
    let service = service_over(storage.clone(), gateway.clone()).await;
    add_hosts(&service, 1).await?;

    storage.fail_writes(true);
    let result = service.add_host(id("2"), "host2").await;
    assert!(matches!(result, Err(ServiceError::Storage(_))));

    // Nothing announced, nothing kept
    assert!(!gateway.announcements().await.iter().any(|a| a.contains("host2")));
    assert_eq!(service.snapshot().await.hosts().len(), 1);

    storage.fail_writes(false);
    service.add_host(id("2"), "host2").await?;
    assert_eq!(service.snapshot().await.hosts().len(), 2);
    Ok(())
}
