//! Drives the transfer engine across entity types
//!
//! A run has three phases:
//! 1. plan the type order (derived from the type graph, or a validated custom order)
//! 2. read source records and target snapshots, failing the run on any primary read error
//! 3. transfer each type in order, sharing one identifier map across types

use std::collections::HashMap;

use futures::future::try_join_all;

use crate::api::{FetchError, Record, Transport, record_id};
use crate::graph;
use crate::transfer::{
    CancellationFlag, EntityType, IdMap, RefTarget, SnapshotSet, TargetSnapshot, TransferEngine, order_records,
};

use super::error::MigrationError;
use super::options::{MigrationOptions, MigrationSelection};
use super::report::MigrationReport;

/// Processing order and consistency warnings for a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub order: Vec<EntityType>,
    pub warnings: Vec<String>,
}

/// Plan the order in which `selection` is processed
///
/// A custom order must list exactly the selected types and respect every
/// dependency between them; it is refused otherwise, never corrected.
pub fn plan(selection: &MigrationSelection, options: &MigrationOptions) -> Result<MigrationPlan, MigrationError> {
    let graph = EntityType::dependency_graph();
    let names: Vec<String> = selection.types().iter().map(|t| t.collection().to_string()).collect();
    let analysed = graph::order(&graph, &names);

    let order = match &options.type_order {
        Some(custom) => {
            let proposed: Vec<String> = custom.iter().map(|t| t.collection().to_string()).collect();
            let mut errors = graph::validate_custom_order(&graph, &proposed).errors;
            for name in &names {
                if !proposed.contains(name) {
                    errors.push(format!("'{}' is selected but missing from the custom order", name));
                }
            }
            for name in &proposed {
                if !names.contains(name) {
                    errors.push(format!("'{}' is not selected for this run", name));
                }
            }
            if !errors.is_empty() {
                return Err(MigrationError::OrderingViolation(errors));
            }
            custom.clone()
        }
        None => analysed
            .order
            .iter()
            .filter_map(|name| EntityType::from_collection(name))
            .collect(),
    };

    Ok(MigrationPlan {
        order,
        warnings: analysed.warnings,
    })
}

/// Migrates records from a source instance to a target instance
pub struct Migrator<'a> {
    source: &'a dyn Transport,
    target: &'a dyn Transport,
    cancel: CancellationFlag,
}

impl<'a> Migrator<'a> {
    pub fn new(source: &'a dyn Transport, target: &'a dyn Transport) -> Self {
        Self {
            source,
            target,
            cancel: CancellationFlag::new(),
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancel
    }

    /// Run a migration
    ///
    /// Fails only when the plan is refused or a primary read fails, in which
    /// case nothing was written. Unreachable instances and rejected
    /// credentials surface as [`MigrationError::Connectivity`], other read
    /// failures as [`MigrationError::PrimaryRead`]. Per-record failures end up in the report.
    pub async fn run(
        &self,
        selection: &MigrationSelection,
        options: &MigrationOptions,
    ) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport::new();
        let plan = plan(selection, options)?;
        report.warnings.extend(plan.warnings);

        log::info!(
            "Migration order: {}",
            plan.order.iter().map(|t| t.collection()).collect::<Vec<_>>().join(" -> ")
        );

        let mut source_records = self.fetch_source(&plan.order, options).await?;
        let mut snapshots = self.fetch_snapshots(&plan.order).await?;

        for (collection, warning) in self.fetch_external(&plan.order, &mut snapshots).await {
            log::warn!("{}", warning);
            report.warnings.push(format!("{}: {}", collection, warning));
        }

        let engine = TransferEngine::new(self.target, &snapshots, &self.cancel);
        let mut ids = IdMap::new();

        for entity_type in &plan.order {
            let records = source_records.remove(entity_type).unwrap_or_default();
            let records = order_records(*entity_type, records, options.mode);
            let outcome = engine
                .transfer(*entity_type, &records, &options.transfer_options(*entity_type), &mut ids)
                .await;
            report.per_type.push(outcome);
        }

        report.finish(self.cancel.is_cancelled());

        let totals = report.total_counts();
        log::info!(
            "Migration finished: {} succeeded, {} failed, {} skipped{}",
            totals.success,
            totals.error,
            totals.skipped,
            if report.cancelled { " (cancelled)" } else { "" }
        );

        Ok(report)
    }

    async fn fetch_source(
        &self,
        order: &[EntityType],
        options: &MigrationOptions,
    ) -> Result<HashMap<EntityType, Vec<Record>>, FetchError> {
        let fetches = order.iter().map(|&entity_type| async move {
            let records = self
                .source
                .list(entity_type.collection(), options.filters.get(&entity_type))
                .await?;
            log::info!("Fetched {} {} records from source", records.len(), entity_type);
            Ok::<_, FetchError>((entity_type, records))
        });

        Ok(try_join_all(fetches).await?.into_iter().collect())
    }

    /// Snapshot the target for every processed type and its prerequisites
    async fn fetch_snapshots(&self, order: &[EntityType]) -> Result<SnapshotSet, FetchError> {
        let mut needed: Vec<EntityType> = Vec::new();
        for entity_type in order {
            for t in std::iter::once(*entity_type).chain(entity_type.prerequisites()) {
                if !needed.contains(&t) {
                    needed.push(t);
                }
            }
        }

        let fetches = needed.iter().map(|&entity_type| async move {
            let records = self.target.list(entity_type.collection(), None).await?;
            log::info!("Fetched {} existing {} records from target", records.len(), entity_type);
            Ok::<_, FetchError>(TargetSnapshot::new(entity_type, records))
        });

        let mut snapshots = SnapshotSet::new();
        for snapshot in try_join_all(fetches).await? {
            snapshots.insert(snapshot);
        }
        Ok(snapshots)
    }

    /// Best-effort snapshots of collections referenced but never migrated
    ///
    /// A failed read is returned as a warning and leaves the collection empty.
    async fn fetch_external(&self, order: &[EntityType], snapshots: &mut SnapshotSet) -> Vec<(String, String)> {
        let mut collections: Vec<&'static str> = Vec::new();
        for entity_type in order {
            for reference in entity_type.references() {
                if let RefTarget::External(collection) = reference.target {
                    if !collections.contains(&collection) {
                        collections.push(collection);
                    }
                }
            }
        }

        let mut warnings = Vec::new();
        for collection in collections {
            match self.target.list(collection, None).await {
                Ok(records) => {
                    log::info!("Fetched {} existing {} records from target", records.len(), collection);
                    let ids = records.iter().filter_map(|r| record_id(r, "id"));
                    snapshots.insert_external(collection, ids);
                }
                Err(err) => {
                    warnings.push((
                        collection.to_string(),
                        format!("{}; records referencing it will be skipped", err),
                    ));
                    snapshots.insert_external(collection, Vec::new());
                }
            }
        }
        warnings
    }
}
