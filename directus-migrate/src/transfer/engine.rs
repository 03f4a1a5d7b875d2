//! Transfer engine: idempotent upsert of one entity type
//!
//! For every source record, in order:
//! 1. skip privileged records when asked to
//! 2. rewrite references to target ids, skipping records whose prerequisite is missing
//! 3. strip derived relationship fields
//! 4. update the matching target record, or create a new one
//!
//! A failure only ever affects the record it belongs to.

use serde_json::Value;

use crate::api::{Operation, Record, Transport, id_string, record_id};

use super::cancel::CancellationFlag;
use super::entity::{EntityType, RefTarget};
use super::id_map::IdMap;
use super::snapshot::{SnapshotSet, TargetSnapshot};
use super::types::{
    ADMIN_SKIPPED, CANCELLED, PREREQUISITE_MISSING, TransferAction, TransferItem, TransferOptions, TransferOutcome,
    TransferStatus,
};

/// Label used for records without an identifier
const MISSING_ID: &str = "<missing id>";

/// Copy of `record` without its identifier and derived relationship fields
pub fn prepare_body(entity_type: EntityType, record: &Record) -> Record {
    let derived = entity_type.derived_fields();
    record
        .iter()
        .filter(|(field, _)| field.as_str() != entity_type.id_field() && !derived.contains(&field.as_str()))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}

/// Executes transfers against one target
pub struct TransferEngine<'a> {
    transport: &'a dyn Transport,
    snapshots: &'a SnapshotSet,
    cancel: &'a CancellationFlag,
}

impl<'a> TransferEngine<'a> {
    pub fn new(transport: &'a dyn Transport, snapshots: &'a SnapshotSet, cancel: &'a CancellationFlag) -> Self {
        Self {
            transport,
            snapshots,
            cancel,
        }
    }

    /// Transfer `records` of one type, in the given order
    ///
    /// Every successful item is added to `ids` as soon as it completes, so
    /// later records (of this or following types) can reference it.
    pub async fn transfer(
        &self,
        entity_type: EntityType,
        records: &[Record],
        options: &TransferOptions,
        ids: &mut IdMap,
    ) -> TransferOutcome {
        let empty = TargetSnapshot::empty(entity_type);
        let snapshot = self.snapshots.get(entity_type).unwrap_or(&empty);
        let mut outcome = TransferOutcome::new(entity_type);

        log::info!(
            "Transferring {} {} records ({} already in target)",
            records.len(),
            entity_type,
            snapshot.len()
        );

        for (index, record) in records.iter().enumerate() {
            if self.cancel.is_cancelled() {
                let remaining = &records[index..];
                log::warn!("Cancelled: skipping {} remaining {} records", remaining.len(), entity_type);
                for record in remaining {
                    outcome.push(TransferItem::skipped(source_label(entity_type, record), CANCELLED));
                }
                break;
            }

            let item = self.transfer_record(entity_type, record, snapshot, options, ids).await;

            match item.status {
                TransferStatus::Success => {
                    if let Some(target_id) = &item.target_id {
                        ids.insert(entity_type, item.source_id.clone(), target_id.clone());
                    }
                }
                TransferStatus::Error => log::warn!(
                    "{} {} failed: {}",
                    entity_type.label(),
                    item.source_id,
                    item.detail.as_deref().unwrap_or_default()
                ),
                TransferStatus::Skipped => log::debug!(
                    "{} {} skipped: {}",
                    entity_type.label(),
                    item.source_id,
                    item.detail.as_deref().unwrap_or_default()
                ),
            }

            outcome.push(item);
        }

        log::info!(
            "{}: {} succeeded ({} created, {} updated), {} failed, {} skipped",
            entity_type,
            outcome.success,
            outcome.created(),
            outcome.updated(),
            outcome.error,
            outcome.skipped
        );

        outcome
    }

    async fn transfer_record(
        &self,
        entity_type: EntityType,
        record: &Record,
        snapshot: &TargetSnapshot,
        options: &TransferOptions,
        ids: &IdMap,
    ) -> TransferItem {
        let id_field = entity_type.id_field();
        let Some(source_id) = record_id(record, id_field) else {
            return TransferItem::error(MISSING_ID, format!("record has no '{}' field", id_field));
        };

        if options.skip_admin_like_records && entity_type.is_admin_like(record) {
            return TransferItem::skipped(source_id, ADMIN_SKIPPED);
        }

        let mut body = prepare_body(entity_type, record);

        if let Err(missing) = self.resolve_references(entity_type, &mut body, options, ids) {
            return TransferItem::skipped(source_id, format!("{}: {}", PREREQUISITE_MISSING, missing));
        }

        let existing = if options.preserve_identifiers {
            snapshot.find_by_id(&source_id)
        } else {
            snapshot.find_by_natural_key(&body)
        };

        let operation = match existing.and_then(|r| record_id(r, id_field)) {
            Some(target_id) => Operation::update(entity_type.collection(), target_id, body),
            None if options.preserve_identifiers => {
                let mut with_id = Record::new();
                if let Some(id) = record.get(id_field) {
                    with_id.insert(id_field.to_string(), id.clone());
                }
                with_id.extend(body);
                Operation::create(entity_type.collection(), with_id)
            }
            None => Operation::create(entity_type.collection(), body),
        };

        match operation.execute(self.transport).await {
            Ok(stored) => match &operation {
                Operation::Update { id, .. } => TransferItem::success(source_id, id.clone(), TransferAction::Updated),
                Operation::Create { .. } => {
                    let target_id = record_id(&stored, id_field)
                        .or_else(|| options.preserve_identifiers.then(|| source_id.clone()));
                    match target_id {
                        Some(target_id) => TransferItem::success(source_id, target_id, TransferAction::Created),
                        None => TransferItem {
                            source_id,
                            target_id: None,
                            status: TransferStatus::Success,
                            action: Some(TransferAction::Created),
                            detail: Some("target returned no identifier".to_string()),
                        },
                    }
                }
            },
            Err(err) => TransferItem::error(source_id, err.to_string()),
        }
    }

    /// Rewrite references in `body` to target ids
    ///
    /// A reference is present when it was migrated during this run or already
    /// exists in the target snapshot. Returns the first missing reference when
    /// missing prerequisites are skipped.
    fn resolve_references(
        &self,
        entity_type: EntityType,
        body: &mut Record,
        options: &TransferOptions,
        ids: &IdMap,
    ) -> Result<(), String> {
        for reference in entity_type.references() {
            let Some(reference_id) = body.get(reference.field).and_then(id_string) else {
                continue;
            };

            let resolved = match reference.target {
                RefTarget::Entity(target) => ids
                    .resolve(target, &reference_id)
                    .map(|id| id.to_string())
                    .or_else(|| {
                        self.snapshots
                            .contains_id(target, &reference_id)
                            .then(|| reference_id.clone())
                    }),
                RefTarget::External(collection) => self
                    .snapshots
                    .contains_external(collection, &reference_id)
                    .then(|| reference_id.clone()),
            };

            match resolved {
                Some(target_id) => {
                    let original = body.get(reference.field).cloned().unwrap_or(Value::Null);
                    if target_id != reference_id || original.is_object() {
                        body.insert(reference.field.to_string(), Value::String(target_id));
                    }
                }
                None if options.skip_if_missing_prerequisite => {
                    let target = match reference.target {
                        RefTarget::Entity(target) => target.collection(),
                        RefTarget::External(collection) => collection,
                    };
                    return Err(format!("{} {} ({})", target, reference_id, reference.field));
                }
                None => {}
            }
        }
        Ok(())
    }
}

fn source_label(entity_type: EntityType, record: &Record) -> String {
    record_id(record, entity_type.id_field()).unwrap_or_else(|| MISSING_ID.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryTransport;
    use serde_json::json;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect()
    }

    fn snapshots_from(pairs: Vec<(EntityType, Vec<Value>)>) -> SnapshotSet {
        let mut set = SnapshotSet::new();
        for (entity_type, values) in pairs {
            set.insert(TargetSnapshot::new(entity_type, records(values)));
        }
        set
    }

    async fn snapshot_of(transport: &MemoryTransport, entity_type: EntityType) -> SnapshotSet {
        let listed = transport.list(entity_type.collection(), None).await.unwrap();
        let mut set = SnapshotSet::new();
        set.insert(TargetSnapshot::new(entity_type, listed));
        set
    }

    #[test]
    fn test_prepare_body_strips_derived_fields() {
        let role = records(vec![json!({"id": "r1", "name": "Editor", "users": ["u1"], "policies": [], "children": []})]);

        let body = prepare_body(EntityType::Role, &role[0]);

        assert_eq!(Value::Object(body), json!({"name": "Editor"}));
    }

    #[test]
    fn test_prepare_body_strips_server_managed_file_fields() {
        let file = records(vec![json!({
            "id": "file-1",
            "filename_disk": "logo.png",
            "title": "Logo",
            "folder": "f1",
            "uploaded_by": "u1",
            "uploaded_on": "2024-01-01T00:00:00Z",
            "modified_by": null,
            "modified_on": "2024-02-01T00:00:00Z"
        })]);

        let body = prepare_body(EntityType::File, &file[0]);

        assert_eq!(
            Value::Object(body),
            json!({"filename_disk": "logo.png", "title": "Logo", "folder": "f1"})
        );
    }

    #[tokio::test]
    async fn test_roles_update_existing_and_create_missing() {
        let target = MemoryTransport::new().with_records("roles", vec![json!({"id": "r1", "name": "Old"})]);
        let source = records(vec![
            json!({"id": "r1", "name": "Editor"}),
            json!({"id": "r2", "name": "Viewer"}),
            json!({"id": "r3", "name": "Author"}),
        ]);
        let snapshots = snapshot_of(&target, EntityType::Role).await;
        let cancel = CancellationFlag::new();
        let engine = TransferEngine::new(&target, &snapshots, &cancel);
        let mut ids = IdMap::new();

        let outcome = engine
            .transfer(EntityType::Role, &source, &TransferOptions::default(), &mut ids)
            .await;

        assert_eq!(outcome.success, 3);
        assert_eq!(outcome.updated(), 1);
        assert_eq!(outcome.created(), 2);
        let updated = outcome.find("r1").unwrap();
        assert_eq!(updated.action, Some(TransferAction::Updated));
        assert_eq!(updated.target_id.as_deref(), Some("r1"));
        assert_eq!(outcome.find("r2").unwrap().target_id.as_deref(), Some("r2"));

        let writes = target.writes();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0], Operation::update("roles", "r1", records(vec![json!({"name": "Editor"})]).remove(0)));
        assert_eq!(writes[1].operation_type(), "create");
        assert_eq!(writes[1].data()["id"], json!("r2"));
    }

    #[tokio::test]
    async fn test_second_run_only_updates() {
        let target = MemoryTransport::new();
        let source = records(vec![
            json!({"id": "r1", "name": "Editor"}),
            json!({"id": "r2", "name": "Viewer"}),
        ]);
        let cancel = CancellationFlag::new();
        let options = TransferOptions::default();

        let first_snapshots = snapshot_of(&target, EntityType::Role).await;
        let first = TransferEngine::new(&target, &first_snapshots, &cancel)
            .transfer(EntityType::Role, &source, &options, &mut IdMap::new())
            .await;
        assert_eq!(first.created(), 2);

        let second_snapshots = snapshot_of(&target, EntityType::Role).await;
        let second = TransferEngine::new(&target, &second_snapshots, &cancel)
            .transfer(EntityType::Role, &source, &options, &mut IdMap::new())
            .await;

        assert_eq!(second.success, 2);
        assert_eq!(second.updated(), 2);
        assert_eq!(second.created(), 0);
        assert_eq!(target.records("roles").len(), 2);
    }

    #[tokio::test]
    async fn test_natural_key_match_without_preserved_ids() {
        let target = MemoryTransport::new().with_records("roles", vec![json!({"id": "t-9", "name": "Editor"})]);
        let source = records(vec![json!({"id": "r1", "name": "Editor"}), json!({"id": "r2", "name": "Viewer"})]);
        let snapshots = snapshot_of(&target, EntityType::Role).await;
        let cancel = CancellationFlag::new();
        let options = TransferOptions {
            preserve_identifiers: false,
            ..TransferOptions::default()
        };
        let mut ids = IdMap::new();

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Role, &source, &options, &mut ids)
            .await;

        assert_eq!(outcome.find("r1").unwrap().target_id.as_deref(), Some("t-9"));
        assert_eq!(outcome.find("r1").unwrap().action, Some(TransferAction::Updated));
        let created = outcome.find("r2").unwrap().target_id.clone().unwrap();
        assert_ne!(created, "r2");
        assert_eq!(ids.resolve(EntityType::Role, "r2"), Some(created.as_str()));
        assert!(target.writes()[1].data().get("id").is_none());
    }

    #[tokio::test]
    async fn test_missing_policy_skips_permission() {
        let target = MemoryTransport::new();
        let snapshots = snapshots_from(vec![
            (EntityType::Policy, vec![json!({"id": "P1", "name": "Existing"})]),
            (EntityType::Permission, vec![]),
        ]);
        let source = records(vec![
            json!({"id": 1, "policy": "P123", "collection": "articles", "action": "read"}),
            json!({"id": 2, "policy": "P1", "collection": "articles", "action": "read"}),
            json!({"id": 3, "policy": "P2", "collection": "articles", "action": "read"}),
        ]);
        let cancel = CancellationFlag::new();
        let mut ids = IdMap::new();
        ids.insert(EntityType::Policy, "P2", "P2-target");

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Permission, &source, &TransferOptions::default(), &mut ids)
            .await;

        let skipped = outcome.find("1").unwrap();
        assert_eq!(skipped.status, TransferStatus::Skipped);
        assert!(skipped.detail.as_deref().unwrap().starts_with(PREREQUISITE_MISSING));
        assert!(outcome.find("2").unwrap().is_success());
        assert!(outcome.find("3").unwrap().is_success());

        let writes = target.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].data()["policy"], json!("P2-target"));
    }

    #[tokio::test]
    async fn test_missing_prerequisite_passed_through_when_not_skipping() {
        let target = MemoryTransport::new();
        let snapshots = snapshots_from(vec![(EntityType::Policy, vec![])]);
        let source = records(vec![json!({"id": 1, "policy": "P123", "collection": "articles", "action": "read"})]);
        let cancel = CancellationFlag::new();
        let options = TransferOptions {
            skip_if_missing_prerequisite: false,
            ..TransferOptions::default()
        };

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Permission, &source, &options, &mut IdMap::new())
            .await;

        assert_eq!(outcome.success, 1);
        assert_eq!(target.writes()[0].data()["policy"], json!("P123"));
    }

    #[tokio::test]
    async fn test_admin_policy_skipped() {
        let target = MemoryTransport::new();
        let snapshots = SnapshotSet::new();
        let source = records(vec![
            json!({"id": "p-admin", "name": "Administrator", "admin_access": true}),
            json!({"id": "p-edit", "name": "Editors", "admin_access": false}),
        ]);
        let cancel = CancellationFlag::new();

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Policy, &source, &TransferOptions::default(), &mut IdMap::new())
            .await;

        assert_eq!(outcome.find("p-admin").unwrap().detail.as_deref(), Some(ADMIN_SKIPPED));
        assert_eq!(outcome.success, 1);
        assert_eq!(target.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_does_not_abort_batch() {
        let target = MemoryTransport::new().failing_write("name", "Broken");
        let snapshots = SnapshotSet::new();
        let source = records(vec![
            json!({"id": "r1", "name": "Broken"}),
            json!({"id": "r2", "name": "Fine"}),
        ]);
        let cancel = CancellationFlag::new();

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Role, &source, &TransferOptions::default(), &mut IdMap::new())
            .await;

        let failed = outcome.find("r1").unwrap();
        assert_eq!(failed.status, TransferStatus::Error);
        assert_eq!(failed.detail.as_deref(), Some("HTTP 400: Invalid payload: rejected by test"));
        assert!(outcome.find("r2").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_child_folder_sees_parent_from_same_run() {
        let target = MemoryTransport::new();
        let snapshots = snapshots_from(vec![(EntityType::Folder, vec![])]);
        let source = records(vec![
            json!({"id": "f1", "name": "Images", "parent": null}),
            json!({"id": "f2", "name": "Logos", "parent": "f1"}),
            json!({"id": "f3", "name": "Orphan", "parent": "gone"}),
        ]);
        let cancel = CancellationFlag::new();

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Folder, &source, &TransferOptions::default(), &mut IdMap::new())
            .await;

        assert!(outcome.find("f1").unwrap().is_success());
        assert!(outcome.find("f2").unwrap().is_success());
        assert_eq!(outcome.find("f3").unwrap().status, TransferStatus::Skipped);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_everything() {
        let target = MemoryTransport::new();
        let snapshots = SnapshotSet::new();
        let source = records(vec![json!({"id": "r1", "name": "A"}), json!({"id": "r2", "name": "B"})]);
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Role, &source, &TransferOptions::default(), &mut IdMap::new())
            .await;

        assert_eq!(outcome.skipped, 2);
        assert!(outcome.items.iter().all(|i| i.detail.as_deref() == Some(CANCELLED)));
        assert!(target.writes().is_empty());
    }

    #[tokio::test]
    async fn test_record_without_id_is_an_error() {
        let target = MemoryTransport::new();
        let snapshots = SnapshotSet::new();
        let source = records(vec![json!({"name": "Nameless"})]);
        let cancel = CancellationFlag::new();

        let outcome = TransferEngine::new(&target, &snapshots, &cancel)
            .transfer(EntityType::Role, &source, &TransferOptions::default(), &mut IdMap::new())
            .await;

        assert_eq!(outcome.error, 1);
        assert_eq!(outcome.items[0].source_id, MISSING_ID);
    }
}
