// SPDX-FileCopyrightText: 2026 Cliniq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cliniq - credential vault and authenticated proxy for workflow-automation
//! API keys.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cliniq_config::{CliniqConfig, ConfigError};

/// Cliniq - credential vault and authenticated automation proxy.
#[derive(Parser, Debug)]
#[command(name = "cliniq", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Manage Cliniq configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Check configuration, storage, and stored credentials.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, then exit.
    Validate,
}

fn load(path: Option<&PathBuf>) -> Result<CliniqConfig, Vec<ConfigError>> {
    match path {
        Some(path) => cliniq_config::load_and_validate_path(path),
        None => cliniq_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Invalid configuration is fatal before anything binds or opens.
    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            cliniq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigCommand::Validate,
        }) => {
            println!(
                "configuration is valid (listen {}:{}, database {})",
                config.server.host, config.server.port, config.storage.database_path
            );
        }
        Some(Commands::Doctor { plain }) => {
            if doctor::run_doctor(&config, plain).await > 0 {
                std::process::exit(1);
            }
        }
        None => {
            println!("cliniq: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_config_validate_with_path() {
        let cli = Cli::parse_from(["cliniq", "--config", "/tmp/c.toml", "config", "validate"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommand::Validate
            })
        ));
    }

    #[test]
    fn parses_doctor_plain() {
        let cli = Cli::parse_from(["cliniq", "doctor", "--plain"]);
        assert!(matches!(cli.command, Some(Commands::Doctor { plain: true })));
    }
}
