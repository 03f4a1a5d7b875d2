//! `run` command: migrate records between two environments

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::api::{DryRunTransport, Filter, Transport};
use crate::config::Config;
use crate::migration::{MigrationError, MigrationOptions, MigrationReport, MigrationSelection, Migrator};
use crate::transfer::{CancellationFlag, EntityType, ExecutionMode, TransferStatus};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Environment to read from
    #[arg(long)]
    pub source: String,

    /// Environment to write to
    #[arg(long)]
    pub target: String,

    /// Migrate roles
    #[arg(long)]
    pub roles: bool,

    /// Migrate policies
    #[arg(long)]
    pub policies: bool,

    /// Migrate permissions
    #[arg(long)]
    pub permissions: bool,

    /// Migrate role/user policy assignments
    #[arg(long)]
    pub access: bool,

    /// Migrate folders
    #[arg(long)]
    pub folders: bool,

    /// Migrate file metadata
    #[arg(long)]
    pub files: bool,

    /// Migrate every entity type
    #[arg(long)]
    pub all: bool,

    /// Let the target assign new identifiers and match by natural key
    #[arg(long)]
    pub no_preserve_ids: bool,

    /// Also migrate privileged records (e.g. admin policies)
    #[arg(long)]
    pub include_admin: bool,

    /// Write records even when a referenced record is absent from the target
    #[arg(long)]
    pub no_skip_missing: bool,

    /// Read everything but only log the writes that would happen
    #[arg(long)]
    pub dry_run: bool,

    /// Order folders level by level instead of depth first
    #[arg(long)]
    pub level_batched: bool,

    /// Process the selected types in this order (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub type_order: Vec<EntityType>,

    /// Source filter as `type:field=value` (repeatable)
    #[arg(long = "filter")]
    pub filters: Vec<String>,
}

impl RunArgs {
    fn selection(&self) -> MigrationSelection {
        if self.all {
            return MigrationSelection::all();
        }

        let flags = [
            (self.roles, EntityType::Role),
            (self.policies, EntityType::Policy),
            (self.permissions, EntityType::Permission),
            (self.access, EntityType::AccessLink),
            (self.folders, EntityType::Folder),
            (self.files, EntityType::File),
        ];
        MigrationSelection::from_types(flags.into_iter().filter(|(on, _)| *on).map(|(_, t)| t))
    }

    fn options(&self, config: &Config) -> Result<MigrationOptions> {
        let mut defaults = config.migration.transfer_options();
        if self.no_preserve_ids {
            defaults.preserve_identifiers = false;
        }
        if self.include_admin {
            defaults.skip_admin_like_records = false;
        }
        if self.no_skip_missing {
            defaults.skip_if_missing_prerequisite = false;
        }

        let mut options = MigrationOptions {
            defaults,
            mode: if self.level_batched {
                ExecutionMode::LevelBatched
            } else {
                ExecutionMode::Sequential
            },
            type_order: (!self.type_order.is_empty()).then(|| self.type_order.clone()),
            ..MigrationOptions::default()
        };

        for raw in &self.filters {
            let (entity_type, filter) = parse_filter(raw)?;
            options = options.with_filter(entity_type, filter);
        }

        Ok(options)
    }
}

/// Parse `type:field=value`
fn parse_filter(raw: &str) -> Result<(EntityType, Filter)> {
    let (entity_type, expr) = raw
        .split_once(':')
        .with_context(|| format!("Filter '{}' must look like type:field=value", raw))?;
    let entity_type: EntityType = entity_type.parse().map_err(anyhow::Error::msg)?;
    let filter = Filter::parse(expr).with_context(|| format!("Invalid filter expression: {}", expr))?;
    Ok((entity_type, filter))
}

pub async fn handle_run_command(args: RunArgs, config: &Config, cancel: CancellationFlag) -> Result<()> {
    let selection = args.selection();
    if selection.is_empty() {
        anyhow::bail!("Nothing selected: pass --all or at least one of --roles, --policies, --permissions, --access, --folders, --files");
    }
    if args.source == args.target {
        anyhow::bail!("Source and target must be different environments");
    }

    let options = args.options(config)?;

    let source = super::connect(config, &args.source)
        .await
        .map_err(|e| MigrationError::Auth(format!("{:#}", e)))?;
    let target = super::connect(config, &args.target)
        .await
        .map_err(|e| MigrationError::Auth(format!("{:#}", e)))?;

    let target: Box<dyn Transport> = if args.dry_run {
        println!("{}", "Dry run: no records will be written".yellow().bold());
        Box::new(DryRunTransport::new(target))
    } else {
        Box::new(target)
    };

    println!(
        "Migrating {} from {} to {}",
        selection
            .types()
            .iter()
            .map(|t| t.collection())
            .collect::<Vec<_>>()
            .join(", ")
            .cyan(),
        args.source.bright_green().bold(),
        args.target.bright_green().bold()
    );

    let report = Migrator::new(&source, target.as_ref())
        .with_cancellation(cancel)
        .run(&selection, &options)
        .await?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &MigrationReport) {
    if !report.warnings.is_empty() {
        println!();
        println!("{}", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }

    println!();
    println!("{}", "Results:".bold());
    for outcome in &report.per_type {
        println!(
            "  {:<12} {} created, {} updated, {} failed, {} skipped",
            outcome.entity_type.to_string().bold(),
            outcome.created().to_string().bright_green(),
            outcome.updated().to_string().bright_green(),
            outcome.error.to_string().red(),
            outcome.skipped.to_string().yellow()
        );
        for item in outcome.problems() {
            let marker = match item.status {
                TransferStatus::Error => "✗".red(),
                _ => "-".yellow(),
            };
            println!(
                "      {} {} {}",
                marker,
                item.source_id,
                item.detail.as_deref().unwrap_or_default().dimmed()
            );
        }
    }

    let totals = report.total_counts();
    println!();
    println!(
        "Total: {} succeeded, {} failed, {} skipped",
        totals.success.to_string().bright_green().bold(),
        totals.error.to_string().red().bold(),
        totals.skipped.to_string().yellow().bold()
    );
    if let Some(finished) = report.finished_at {
        let elapsed = finished - report.started_at;
        println!("Elapsed: {:.2}s", elapsed.num_milliseconds() as f64 / 1000.0);
    }
    if report.cancelled {
        println!("{}", "Run was cancelled; remaining records were skipped".yellow());
    }
}
