//! `order` command: dependency analysis of an instance's collections

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args};
use colored::*;
use serde_json::Value;

use crate::api::{Record, Transport};
use crate::config::Config;
use crate::graph::{self, MigrationOrder, SchemaSnapshot};

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("schema").required(true).args(["source", "schema_file"])))]
pub struct OrderArgs {
    /// Environment to read collections and relations from
    #[arg(long)]
    pub source: Option<String>,

    /// JSON file with `collections` and `relations`
    #[arg(long)]
    pub schema_file: Option<PathBuf>,

    /// Only analyse these collections (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// Also print wavefront batches
    #[arg(long)]
    pub batches: bool,

    /// Validate this order instead of computing one (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub custom: Vec<String>,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn handle_order_command(args: OrderArgs, config: &Config) -> Result<()> {
    let schema = load_schema(&args, config).await?;
    let graph = schema.graph(&config.migration.graph_options());

    if !args.custom.is_empty() {
        let validation = graph::validate_custom_order(&graph, &args.custom);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&validation).context("Failed to format JSON output")?);
        } else if validation.valid {
            println!("{} {}", "✓".bright_green(), "Custom order is valid".bold());
        } else {
            println!("{}", "Custom order violates dependencies:".red().bold());
            for error in &validation.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }
        if !validation.valid {
            anyhow::bail!("Custom order is invalid ({} problems)", validation.errors.len());
        }
        return Ok(());
    }

    let selected = if args.only.is_empty() {
        graph.names().to_vec()
    } else {
        args.only.clone()
    };
    let mut result = graph::order(&graph, &selected);
    result.warnings.extend(schema.skipped.iter().cloned());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result).context("Failed to format JSON output")?);
        return Ok(());
    }

    print_order(&result, args.batches);
    Ok(())
}

async fn load_schema(args: &OrderArgs, config: &Config) -> Result<SchemaSnapshot> {
    if let Some(path) = &args.schema_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Schema file is not valid JSON: {}", path.display()))?;
        return parse_schema(value).with_context(|| format!("Invalid schema file: {}", path.display()));
    }

    let Some(name) = &args.source else {
        anyhow::bail!("Either --source or --schema-file is required");
    };

    let transport = super::connect(config, name).await?;
    let collections = transport.list("collections", None).await?;
    let relations = transport.list("relations", None).await?;
    log::info!(
        "Fetched {} collections and {} relations from {}",
        collections.len(),
        relations.len(),
        name
    );

    Ok(SchemaSnapshot::from_records(&collections, &relations))
}

/// Accept either a snapshot (`collections` as names) or raw API records
fn parse_schema(value: Value) -> Result<SchemaSnapshot> {
    let collections = value
        .get("collections")
        .and_then(Value::as_array)
        .context("Missing 'collections' array")?;

    if collections.iter().all(Value::is_string) {
        return serde_json::from_value(value).context("Failed to parse schema snapshot");
    }

    let as_records = |key: &str| -> Vec<Record> {
        value
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(|v| v.as_object().cloned()).collect())
            .unwrap_or_default()
    };

    Ok(SchemaSnapshot::from_records(&as_records("collections"), &as_records("relations")))
}

fn print_order(result: &MigrationOrder, with_batches: bool) {
    println!("{}", "Migration order:".bold());
    for (index, name) in result.order.iter().enumerate() {
        let level = result.level_of(name).unwrap_or_default();
        println!(
            "  {:>3}. {} {}",
            index + 1,
            name.bright_green(),
            format!("(level {})", level).dimmed()
        );
    }

    if with_batches {
        println!();
        println!("{}", "Batches:".bold());
        for (index, batch) in result.batches().iter().enumerate() {
            println!("  {} {}", format!("[{}]", index + 1).cyan(), batch.join(", "));
        }
    }

    if result.has_cycles() {
        println!();
        println!("{}", "Cycles:".red().bold());
        for cycle in &result.cycles {
            println!("  {}", cycle.join(" -> "));
        }
    }

    if !result.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }
}
