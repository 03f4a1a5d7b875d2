//! `env` subcommands

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

#[derive(Debug, Subcommand)]
pub enum EnvCommands {
    /// List configured environments
    List,
}

pub fn handle_env_command(command: EnvCommands, config: &Config) -> Result<()> {
    match command {
        EnvCommands::List => list_environments(config),
    }
}

fn list_environments(config: &Config) -> Result<()> {
    if config.environments.is_empty() {
        println!("No environments configured.");
        println!(
            "Add one to {}",
            Config::default_path().display().to_string().cyan()
        );
        return Ok(());
    }

    println!("{}", "Environments:".bold());
    for (name, environment) in &config.environments {
        println!(
            "  {}  {}  {}",
            name.bright_green().bold(),
            environment.url,
            format!("({})", environment.auth_summary()).dimmed()
        );
    }
    Ok(())
}
