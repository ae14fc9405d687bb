#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a cops-and-robbers match in the terminal.

mod terminal;

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use cops_and_robbers_core::GameConfig;
use cops_and_robbers_session::Session;
use cops_and_robbers_system_map_generation::MapGenerator;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::terminal::{CrosstermInput, CrosstermSink, TerminalGuard};

/// Command-line arguments accepted by the game.
#[derive(Debug, Parser)]
#[command(
    name = "cops-and-robbers",
    version,
    about = "Grab every bag of money before the cops corner you."
)]
struct CliArgs {
    /// Edge length of the square board (at least 15).
    #[arg(long, value_name = "CELLS")]
    size: Option<u32>,
    /// Number of cops on the board.
    #[arg(long, value_name = "COUNT")]
    cops: Option<u32>,
    /// Seed for a reproducible board and reproducible cops.
    #[arg(long)]
    seed: Option<u64>,
    /// Manhattan distance below which cops chase instead of wandering.
    #[arg(long, value_name = "CELLS")]
    chase_threshold: Option<u32>,
    /// Milliseconds between cop moves.
    #[arg(long, value_name = "MS")]
    pursuit_ms: Option<u64>,
    /// Milliseconds between redraws.
    #[arg(long, value_name = "MS")]
    render_ms: Option<u64>,
    /// Milliseconds the keyboard is polled before checking for shutdown.
    #[arg(long, value_name = "MS")]
    input_ms: Option<u64>,
    /// TOML file with default settings; flags take precedence.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Write logs to this file; nothing is logged otherwise.
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl CliArgs {
    /// Merges defaults, the config file and command-line flags, in that order.
    fn resolve_config(&self) -> Result<GameConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GameConfig::default(),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut GameConfig) {
        if let Some(size) = self.size {
            config.board_size = size;
        }
        if let Some(cops) = self.cops {
            config.cop_count = cops;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(threshold) = self.chase_threshold {
            config.chase_threshold = threshold;
        }
        if let Some(pursuit) = self.pursuit_ms {
            config.pursuit_interval_ms = pursuit;
        }
        if let Some(render) = self.render_ms {
            config.render_interval_ms = render;
        }
        if let Some(input) = self.input_ms {
            config.input_interval_ms = input;
        }
    }
}

fn load_config(path: &Path) -> Result<GameConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn install_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

/// Entry point for the cops-and-robbers command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    if let Some(path) = &args.log_file {
        install_tracing(path)?;
    }

    let config = args.resolve_config()?;
    config.validate().context("invalid configuration")?;
    info!(?config, "configuration resolved");

    let rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let state = MapGenerator::new(rng)
        .generate(&config)
        .context("failed to generate board")?;
    let session = Session::new(config, state).context("invalid configuration")?;

    let report = {
        let _terminal = TerminalGuard::enter()?;
        let mut input = CrosstermInput;
        let mut sink = CrosstermSink::new(io::stdout());
        session.play(&mut input, &mut sink)?
    };

    match report.outcome {
        Some(outcome) => println!("{}", outcome.banner()),
        None => println!("You walked away from the heist."),
    }
    Ok(())
}
