use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};

mod logging;

use tourguide::config::Config;
use tourguide::progress::{FileProgressStore, ProgressStore};
use tourguide::terminal::{self, TerminalHost};
use tourguide::tour::TourDefinition;
use tourguide::Phase;

#[derive(Parser)]
#[command(name = "tourguide")]
#[command(about = "Play guided tours that resume where the user left off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a tour in the terminal
    Play {
        /// Tour definition file (TOML)
        tour: PathBuf,

        /// Targets present on screen; steps pointing elsewhere are passed over
        #[arg(short, long = "target")]
        targets: Vec<String>,
    },

    /// Show saved tour progress
    Status {
        /// Only show this tour
        identity: Option<String>,
    },

    /// Forget saved progress so a tour plays again
    Reset {
        /// Tour to reset
        identity: Option<String>,

        /// Reset every tour
        #[arg(long, conflicts_with = "identity")]
        all: bool,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let is_play_mode = matches!(cli.command, Commands::Play { .. });
    let logging_handle = logging::init_logging(&config, is_play_mode, cli.debug)?;
    if cli.debug {
        if let Some(path) = &logging_handle.log_file_path {
            eprintln!("Logging to {}", path.display());
        }
    }

    match cli.command {
        Commands::Play { tour, targets } => cmd_play(&config, &tour, targets),
        Commands::Status { identity } => cmd_status(&config, identity.as_deref()),
        Commands::Reset { identity, all } => cmd_reset(&config, identity.as_deref(), all),
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn cmd_play(config: &Config, tour_path: &Path, targets: Vec<String>) -> Result<()> {
    let tour = TourDefinition::load(tour_path)?;
    let store = FileProgressStore::open(config.state_path())?;

    let mut host = TerminalHost::new(io::stdout());
    for target in targets {
        host.add_target(target);
    }

    let mut sequence = tour.into_sequence(host, &config.steps, store);
    sequence.set_on_item_shown(|step, position| {
        tracing::info!(title = %step.title(), position, "step shown");
    });
    sequence.set_on_item_dismissed(|step, position| {
        tracing::info!(title = %step.title(), position, "step dismissed");
    });

    if let Some(identity) = sequence.identity() {
        if sequence.has_fired()? {
            println!("Tour '{identity}' is already complete.");
            println!("Run `tourguide reset {identity}` to play it again.");
            return Ok(());
        }
    }

    sequence.start()?;

    terminal::play(&mut sequence, io::stdin().lock())?;

    match sequence.phase() {
        Phase::Finished => println!("Tour complete."),
        Phase::Abandoned => match sequence.identity() {
            Some(_) => println!(
                "Tour paused after {} step(s); play it again to resume.",
                sequence.position()
            ),
            None => println!("Tour stopped."),
        },
        Phase::Idle | Phase::Presenting => {}
    }
    Ok(())
}

fn cmd_status(config: &Config, identity: Option<&str>) -> Result<()> {
    let store = FileProgressStore::open(config.state_path())?;
    let records: Vec<_> = store
        .records()?
        .into_iter()
        .filter(|(id, _)| identity.map(|wanted| wanted == id).unwrap_or(true))
        .collect();

    if records.is_empty() {
        match identity {
            Some(id) => println!("No saved progress for '{id}'."),
            None => println!("No saved progress."),
        }
        return Ok(());
    }

    for (id, record) in records {
        println!(
            "{id:<24} {:<24} {}",
            record.status.to_string(),
            record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    Ok(())
}

fn cmd_reset(config: &Config, identity: Option<&str>, all: bool) -> Result<()> {
    let mut store = FileProgressStore::open(config.state_path())?;
    match (identity, all) {
        (_, true) => {
            store.reset_all()?;
            println!("Reset all tours.");
        }
        (Some(id), false) => {
            store.reset(id)?;
            println!("Reset '{id}'.");
        }
        (None, false) => bail!("specify a tour identity or --all"),
    }
    Ok(())
}
