// GameForge entry point

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use gameforge::config::ForgeConfig;
use gameforge::core::{init_tracing, FileStorage};
use gameforge::governance::{Phase, ProposalDraft, VoteChoice};
use gameforge::reputation::HostId;
use gameforge::{ForgeService, LoggingGateway, LoggingLedger, PhaseScheduler};

/// GameForge CLI arguments
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the phase scheduler until interrupted
    Run,
    /// Show the state of the game
    Status,
    /// Show the host leaderboard
    Leaderboard {
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Show a host's profile
    Profile { host: String },
    /// Register a new host
    AddHost { id: String, name: String },
    /// Remove a host
    RemoveHost { id: String },
    /// Pick the colour of a host's proposals (hex, e.g. 1cc347)
    SetColor { host: String, color: String },
    /// Submit a proposal
    Propose {
        /// Proposing host
        host: String,
        #[command(subcommand)]
        draft: DraftCommand,
    },
    /// Credit a host for taking part in discussion
    Discuss { host: String },
    /// Reword an open proposal
    Edit { host: String, number: u64, description: String },
    /// Vote on a proposal (approve, disapprove, no-opinion)
    Vote { host: String, number: u64, choice: VoteChoice },
    /// Accept a proposal now if it already clearly passes
    JudgeEarly { number: u64 },
    /// Force the game into a phase
    SetPhase { phase: Phase },
}

#[derive(Subcommand, Debug)]
enum DraftCommand {
    /// Propose a new rule
    Create {
        description: String,
        /// Challenge the rule is for
        #[arg(long)]
        challenge: Option<u32>,
    },
    /// Propose new text for an official rule
    Modify { target: u64, description: String },
    /// Propose removing an official rule
    Remove { target: u64, reason: String },
    /// Propose the game's name
    Name { name: String },
    /// Propose the game's description
    Description { text: String },
    /// Propose that the rules are final
    Finalize,
}

impl From<DraftCommand> for ProposalDraft {
    fn from(command: DraftCommand) -> Self {
        match command {
            DraftCommand::Create { description, challenge } => ProposalDraft::Create {
                description,
                for_challenge: challenge,
            },
            DraftCommand::Modify { target, description } => ProposalDraft::Modify { target, description },
            DraftCommand::Remove { target, reason } => ProposalDraft::Remove { target, reason },
            DraftCommand::Name { name } => ProposalDraft::GameName { name },
            DraftCommand::Description { text } => ProposalDraft::GameDescription { text },
            DraftCommand::Finalize => ProposalDraft::FinalizeRules,
        }
    }
}

fn load_config(args: &Args) -> Result<ForgeConfig> {
    let mut config = match &args.config {
        Some(path) => ForgeConfig::from_file(path)?
            .with_env_overrides(|key| std::env::var(key).ok())?,
        None => ForgeConfig::load()?,
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn parse_color(raw: &str) -> Result<u32> {
    let hex = raw.trim().trim_start_matches('#').trim_start_matches("0x");
    u32::from_str_radix(hex, 16).with_context(|| format!("Invalid colour: {}", raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).context("Failed to load configuration")?;
    init_tracing(&config.log_level);

    let storage = Arc::new(
        FileStorage::new(&config.data_dir)
            .await
            .context("Failed to initialize storage")?,
    );
    let service = Arc::new(
        ForgeService::load(storage, Arc::new(LoggingGateway::new()), Arc::new(LoggingLedger), &config)
            .await
            .context("Failed to load the rulebook")?,
    );

    match args.command {
        Command::Run => {
            let shutdown = CancellationToken::new();
            let scheduler = PhaseScheduler::new(service.clone(), Duration::from_secs(config.scheduler_tick_secs));
            let token = shutdown.clone();
            let handle = tokio::spawn(async move { scheduler.run(token).await });

            info!("GameForge running, press Ctrl+C to exit");
            signal::ctrl_c().await?;
            info!("Shutting down GameForge...");
            shutdown.cancel();

            match handle.await {
                Ok(result) => result?,
                Err(e) => error!("Scheduler task failed: {}", e),
            }
        }
        Command::Status => println!("{}", service.status().await),
        Command::Leaderboard { page } => println!("{}", service.leaderboard(page).await.render()),
        Command::Profile { host } => println!("{}", service.profile(&HostId::new(host)).await?),
        Command::AddHost { id, name } => {
            service.add_host(HostId::new(id), &name).await?;
            println!("Added host {}", name);
        }
        Command::RemoveHost { id } => {
            service.remove_host(&HostId::new(id.clone())).await?;
            println!("Removed host {}", id);
        }
        Command::SetColor { host, color } => {
            service.set_custom_color(&HostId::new(host), parse_color(&color)?).await?;
            println!("Colour updated");
        }
        Command::Propose { host, draft } => {
            let number = service.submit_proposal(&HostId::new(host), draft.into()).await?;
            println!("Submitted proposal #{}", number);
        }
        Command::Discuss { host } => service.record_discussion(&HostId::new(host)).await?,
        Command::Edit { host, number, description } => {
            service.edit_proposal(&HostId::new(host), number, &description).await?;
            println!("Edited proposal #{}", number);
        }
        Command::Vote { host, number, choice } => {
            if service.phase().await != Phase::Voting {
                bail!("Votes are only taken during the Voting phase");
            }
            let outcome = service.cast_vote(&HostId::new(host), number, choice).await?;
            println!("{:?}: voted {} on proposal #{}", outcome, choice, number);
        }
        Command::JudgeEarly { number } => {
            let verdict = service.judge_early(number, Utc::now()).await?;
            println!("Proposal #{}: {}", number, verdict);
        }
        Command::SetPhase { phase } => {
            service.transition_to(phase, Utc::now()).await?;
            println!("Phase is now {}", phase);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#1cc347").unwrap(), 0x1cc347);
        assert_eq!(parse_color("0xff").unwrap(), 0xff);
        assert!(parse_color("green").is_err());
    }

    #[test]
    fn test_cli_parses_proposal() {
        let args = Args::try_parse_from(["gameforge", "propose", "42", "create", "Rounds last a day", "--challenge", "3"])
            .unwrap();
        match args.command {
            Command::Propose { host, draft } => {
                assert_eq!(host, "42");
                let draft: ProposalDraft = draft.into();
                assert_eq!(draft.description(), "For Challenge #3: Rounds last a day");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_vote_choice() {
        let args = Args::try_parse_from(["gameforge", "vote", "1", "2", "no-opinion"]).unwrap();
        assert!(matches!(args.command, Command::Vote { choice: VoteChoice::NoOpinion, .. }));
    }
}
