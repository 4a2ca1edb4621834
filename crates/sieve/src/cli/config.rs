//! The `sieve config` command for configuration management.

use clap::{ArgAction, Args, Subcommand};
use sieve_core::Config;
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,

    /// Show config file path
    Path,

    /// Initialize a new config file with defaults
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Set the central output folder and switch it on
    SetCentral {
        /// Folder that receives archive/, keep/ and modify/ (`~` allowed)
        path: String,
    },

    /// Turn the central output folder on or off
    UseCentral {
        /// true or false
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
}

/// Execute the config command.
pub async fn execute(args: ConfigArgs, config: Config, path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let toml = config.to_toml()?;
            println!("{}", toml);
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at: {}\nUse --force to overwrite.",
                    path.display()
                );
            }

            Config::default().save_to(path)?;

            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }

        ConfigCommand::SetCentral { path: central } => {
            let mut config = config;
            config.output.central_folder_path = central;
            config.output.use_central_folder = true;
            config.save_to(path)?;

            let resolved = config
                .output
                .central_folder()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("Central folder set to: {}", resolved);
        }

        ConfigCommand::UseCentral { enabled } => {
            let mut config = config;
            config.output.use_central_folder = enabled;
            config.save_to(path)?;

            if enabled && config.output.central_folder().is_none() {
                tracing::warn!(
                    "Central folder enabled but no path is set; run `sieve config set-central <PATH>`"
                );
            }
            println!(
                "Central folder {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    }

    Ok(())
}
