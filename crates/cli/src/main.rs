//! ctxkeeper CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config and storage root
//! - `chat`     — Single-message or line-by-line chat for one participant
//! - `history`  — Print a participant's stored history
//! - `sessions` — List stored sessions
//! - `clear`    — Forget a participant, a group, or everything
//! - `doctor`   — Diagnose config, storage and backend reachability

use clap::{Parser, Subcommand};
use ctxkeeper_core::message::{GroupId, ParticipantId};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "ctxkeeper",
    about = "ctxkeeper — token-budgeted conversation memory for chat LLMs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.ctxkeeper/config.toml
    #[arg(short, long, global = true, env = "CTXKEEPER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default config file and storage root
    Onboard,

    /// Chat as one participant of one group
    Chat {
        /// Group (workspace) id
        #[arg(short, long, default_value_t = 0)]
        group: GroupId,

        /// Participant id
        #[arg(short, long, default_value_t = 0)]
        participant: ParticipantId,

        /// Send a single message instead of reading lines from stdin
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print a participant's stored history
    History {
        #[arg(short, long)]
        group: GroupId,

        #[arg(short, long)]
        participant: ParticipantId,

        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },

    /// List stored sessions
    Sessions,

    /// Forget stored history
    Clear {
        /// Group whose history to clear
        #[arg(short, long, required_unless_present = "everything")]
        group: Option<GroupId>,

        /// Participant to clear within the group
        #[arg(short, long, conflicts_with_all = ["all_in_group", "everything"])]
        participant: Option<ParticipantId>,

        /// Clear every participant in the group
        #[arg(long, conflicts_with = "everything")]
        all_in_group: bool,

        /// Clear every session in every group
        #[arg(long)]
        everything: bool,

        /// Required with --everything
        #[arg(long)]
        confirm: bool,
    },

    /// Diagnose config, storage and backend health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Onboard => commands::onboard::run(config).await?,
        Commands::Chat {
            group,
            participant,
            message,
        } => commands::chat::run(config, group, participant, message).await?,
        Commands::History {
            group,
            participant,
            json,
        } => commands::history::run(config, group, participant, json).await?,
        Commands::Sessions => commands::sessions::run(config).await?,
        Commands::Clear {
            group,
            participant,
            all_in_group,
            everything,
            confirm,
        } => {
            let target = if everything {
                commands::clear::Target::Everything { confirm }
            } else {
                let group = group.ok_or("--group is required")?;
                match (participant, all_in_group) {
                    (Some(participant), _) => {
                        commands::clear::Target::Participant(group, participant)
                    }
                    (None, true) => commands::clear::Target::Group(group),
                    (None, false) => {
                        return Err("Pass --participant <ID> or --all-in-group".into());
                    }
                }
            };
            commands::clear::run(config, target).await?
        }
        Commands::Doctor => commands::doctor::run(config).await?,
    }

    Ok(())
}
