//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::transfer::CancellationFlag;
use commands::env::EnvCommands;
use commands::order::OrderArgs;
use commands::run::RunArgs;

#[derive(Debug, Parser)]
#[command(name = "directus-migrate", version, about = "Migrate access control and files between instances")]
pub struct Cli {
    /// Config file (defaults to ~/.config/directus-migrate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Inspect configured environments
    #[command(subcommand)]
    Env(EnvCommands),
    /// Compute the dependency order of an instance's collections
    Order(OrderArgs),
    /// Migrate records from one environment to another
    Run(RunArgs),
}

/// Execute a parsed command line
pub async fn execute(cli: Cli, cancel: CancellationFlag) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Env(command) => commands::env::handle_env_command(command, &config),
        Commands::Order(args) => commands::order::handle_order_command(args, &config).await,
        Commands::Run(args) => commands::run::handle_run_command(args, &config, cancel).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::EntityType;

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "directus-migrate",
            "run",
            "--source",
            "staging",
            "--target",
            "prod",
            "--roles",
            "--permissions",
            "--type-order",
            "roles,permissions",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.source, "staging");
                assert!(args.roles && args.permissions && !args.policies);
                assert!(args.dry_run);
                assert_eq!(args.type_order, vec![EntityType::Role, EntityType::Permission]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_order_needs_a_schema_source() {
        let result = Cli::try_parse_from(["directus-migrate", "order", "--source", "a", "--schema-file", "s.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_list_with_global_config() {
        let cli = Cli::try_parse_from(["directus-migrate", "env", "list", "--config", "/tmp/c.toml", "-v"]).unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Env(EnvCommands::List)));
    }
}
