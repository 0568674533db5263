//! Command-line entry point for running outbound campaigns
//!
//! - `send` works through the recipient table, rotating sender accounts
//! - `check` shows who would be contacted, without sending
//! - `state` inspects the record of already-contacted identifiers

#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier::{
    config::{Courier, find_config_file},
    controller::SendOptions,
};
use courier_common::logging;

/// Send personalised emails with attachments, once per recipient
#[derive(Parser, Debug)]
#[command(name = "courier")]
#[command(about = "Run outbound email campaigns", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults to $COURIER_CONFIG, then
    /// ./courier.config.ron, then /etc/courier/courier.config.ron)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send the campaign
    Send {
        /// Build every message but send nothing and leave the sent-state untouched
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Show how the recipient table would be treated
    Check {
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Inspect the sent-state
    State {
        #[command(subcommand)]
        action: StateAction,
    },
}

#[derive(clap::Args, Debug)]
struct Overrides {
    /// Successful sends per account (0 for no limit)
    #[arg(long)]
    max_per_account: Option<u32>,

    /// Base delay between sends, in seconds
    #[arg(long)]
    delay: Option<f64>,

    /// Relative jitter applied to the delay, between 0 and 1
    #[arg(long)]
    jitter: Option<f64>,

    /// Sender login to use (repeatable, replaces the configured list)
    #[arg(long = "login")]
    logins: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum StateAction {
    /// Print every identifier, one per line
    List,
    /// Print how many identifiers are stored
    Count,
}

impl Overrides {
    fn into_options(self, dry_run: bool) -> SendOptions {
        SendOptions {
            dry_run,
            max_per_account: self.max_per_account,
            delay_secs: self.delay,
            jitter: self.jitter,
            logins: self.logins,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = find_config_file(cli.config.as_deref())?;
    let courier = Courier::load(&config_path)?;
    logging::init(courier.log_file.as_deref())?;

    match cli.command {
        Commands::Send { dry_run, overrides } => {
            let report = courier.send(overrides.into_options(dry_run)).await?;
            println!("{report}");
        }
        Commands::Check { overrides } => {
            let report = courier.check(&overrides.into_options(false)).await?;
            print!("{report}");
        }
        Commands::State { action } => {
            let state = courier.sent_state().await?;
            match action {
                StateAction::List => state.iter().for_each(|id| println!("{id}")),
                StateAction::Count => println!("{}", state.len()),
            }
        }
    }

    Ok(())
}
