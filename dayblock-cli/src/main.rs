use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod calendar;
mod config;
mod housekeeping;
mod plan;
mod prompt;
mod state;

use plan::PlanOptions;

#[derive(Parser, Debug)]
#[command(
    name = "dayblock",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("DAYBLOCK_BUILD_SHA"), ")"),
    about = "Greedy time-block planner over a Notion task database"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive planning session: overview, triage, then one proposal per task
    Plan {
        /// Plan tomorrow instead of today
        #[arg(long)]
        tomorrow: bool,

        /// Log writes instead of sending them
        #[arg(long)]
        dry_run: bool,

        /// Commit every proposal without asking
        #[arg(long)]
        accept_all: bool,

        /// Size blocks by level of effort where a task has one
        #[arg(long)]
        by_effort: bool,

        /// Skip classifying unassigned tasks
        #[arg(long)]
        skip_triage: bool,

        /// Write the committed blocks as an .ics file (default: ~/.dayblock/plan-<date>.ics)
        #[arg(long, value_name = "PATH", num_args = 0..=1)]
        ics: Option<Option<PathBuf>>,
    },

    /// Show the day's blocks and remaining free time
    Overview {
        #[arg(long)]
        tomorrow: bool,
    },

    /// Assign a priority (or close) each unassigned task
    Triage,

    /// Move unfinished time-boxed tasks to a date-only due of today
    CleanSlate {
        /// Only tasks whose block already started
        #[arg(long)]
        overdue_only: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Deprecate newer duplicates of same-named open tasks
    Dedupe {
        #[arg(long)]
        dry_run: bool,
    },

    /// Promote tasks due soon to "Must Be Done Today"
    Escalate {
        /// Horizon in days, starting today
        #[arg(long, default_value_t = 3)]
        days: u32,

        #[arg(long)]
        dry_run: bool,
    },

    /// Pack class tasks into their matching calendar events
    Align {
        #[arg(long)]
        tomorrow: bool,

        #[arg(long)]
        dry_run: bool,
    },

    /// Manage ~/.dayblock/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing() {
    // Logs go to stderr so prompts on stdout stay readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("dayblock_cli=info,dayblock_core=info,dayblock_notion=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}\n", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
                Ok(())
            }
        };
    }

    let cfg = config::load_config()?;

    match cli.command {
        Command::Plan {
            tomorrow,
            dry_run,
            accept_all,
            by_effort,
            skip_triage,
            ics,
        } => {
            plan::run_plan(
                &cfg,
                PlanOptions {
                    tomorrow,
                    dry_run,
                    accept_all,
                    by_effort,
                    skip_triage,
                    ics,
                },
            )?;
        }

        Command::Overview { tomorrow } => plan::run_overview(&cfg, tomorrow)?,

        Command::Triage => {
            let store = cfg.notion_store()?;
            plan::run_triage(&store)?;
        }

        Command::CleanSlate { overdue_only, dry_run } => housekeeping::clean_slate(&cfg, overdue_only, dry_run).await?,

        Command::Dedupe { dry_run } => housekeeping::dedupe(&cfg, dry_run).await?,

        Command::Escalate { days, dry_run } => housekeeping::escalate(&cfg, days, dry_run).await?,

        Command::Align { tomorrow, dry_run } => housekeeping::align(&cfg, tomorrow, dry_run)?,

        Command::Config { .. } => {}
    }

    Ok(())
}
