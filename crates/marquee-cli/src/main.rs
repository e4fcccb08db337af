use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marquee_core::AppConfig;

mod commands;

#[derive(Parser)]
#[command(name = "marquee")]
#[command(author, version, about = "Precompute and coordinate DSL-driven widget animations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/marquee/config.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every widget in a scene and summarize the timelines
    Run {
        /// Scene file (.json or .toml)
        scene: PathBuf,
        /// Smooth timelines so no frame jumps more than one cell
        #[arg(long)]
        smooth: bool,
        /// Print the first N frames of each timeline
        #[arg(short = 'f', long, value_name = "N")]
        frames: Option<usize>,
    },
    /// List the SYNC events and waits each widget declares
    Events {
        /// Scene file (.json or .toml)
        scene: PathBuf,
    },
    /// Report validation warnings without running anything
    Check {
        /// Scene file (.json or .toml)
        scene: PathBuf,
    },
    /// Write a default configuration file to --config or the default path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Run {
            scene,
            smooth,
            frames,
        } => {
            if smooth {
                config.engine.smoothing = true;
            }
            commands::run::run(&config, &scene, frames)
        }
        Commands::Events { scene } => commands::events::run(&config, &scene),
        Commands::Check { scene } => commands::check::run(&scene),
        Commands::Init { force } => commands::init::run(cli.config.as_deref(), force),
    }
}
