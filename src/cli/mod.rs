//! CLI module for the user accounts service
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `migrate`: create or roll back the PostgreSQL schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// User accounts REST service
#[derive(Parser)]
#[command(name = "user-accounts")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Apply (or revert) PostgreSQL storage migrations
    Migrate(migrate::MigrateArgs),
}

/// Loads `.env` and layered configuration, then installs the log subscriber
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["user-accounts", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_migrate() {
        let cli = Cli::try_parse_from(["user-accounts", "migrate", "--revert"]).unwrap();
        match cli.command {
            Command::Migrate(args) => assert!(args.revert),
            _ => panic!("expected migrate"),
        }
    }

    #[test]
    fn test_unknown_command() {
        assert!(Cli::try_parse_from(["user-accounts", "ui"]).is_err());
    }
}
