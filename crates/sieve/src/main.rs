//! Sieve CLI - keyboard-driven image review with phone-style output synthesis.
//!
//! Sieve walks a folder of images one at a time. Each image is kept,
//! discarded or marked for modification; accepted images are archived
//! untouched and re-rendered as a phone-style JPEG in the background.
//!
//! # Usage
//!
//! ```bash
//! # Review a folder
//! sieve review ~/Pictures/trip
//!
//! # Look at what a rendered file carries
//! sieve inspect ~/Pictures/trip/keep/IMG_20240309_140507.jpg --json
//!
//! # Send every accepted image to one place
//! sieve config set-central ~/Pictures/curated
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// Sieve - keep, discard or modify images, one keypress at a time.
#[derive(Parser, Debug)]
#[command(name = "sieve")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, env = "SIEVE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Review a folder of images interactively
    Review(cli::review::ReviewArgs),

    /// Show format, chroma subsampling and EXIF of an image
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(sieve_core::Config::default_path);
    let config = match sieve_core::Config::load_or_default(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `sieve config path`."
            );
            sieve_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Sieve v{}", sieve_core::VERSION);
    tracing::debug!("Config file: {:?}", config_path);

    match cli.command {
        Commands::Review(args) => cli::review::execute(args, config, config_path).await,
        Commands::Inspect(args) => cli::inspect::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, config, &config_path).await,
    }
}
