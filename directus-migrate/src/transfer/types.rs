//! Transfer options and per-item outcomes

use serde::{Deserialize, Serialize};

use super::entity::EntityType;

/// Detail recorded for records skipped because a referenced record is missing
pub const PREREQUISITE_MISSING: &str = "prerequisite not present in target";
/// Detail recorded for privileged records skipped on request
pub const ADMIN_SKIPPED: &str = "admin-like record skipped";
/// Detail recorded for records not attempted after cancellation
pub const CANCELLED: &str = "cancelled";

/// Final state of one transferred record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Success,
    Error,
    Skipped,
}

impl TransferStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// Which write path a record took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferAction {
    Created,
    Updated,
}

/// Outcome for one source record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub source_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub status: TransferStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<TransferAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TransferItem {
    pub fn success(source_id: impl Into<String>, target_id: impl Into<String>, action: TransferAction) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: Some(target_id.into()),
            status: TransferStatus::Success,
            action: Some(action),
            detail: None,
        }
    }

    pub fn error(source_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: None,
            status: TransferStatus::Error,
            action: None,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(source_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: None,
            status: TransferStatus::Skipped,
            action: None,
            detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TransferStatus::Success
    }
}

/// Per-type transfer switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOptions {
    /// Carry source identifiers into the target and match existing records by id
    pub preserve_identifiers: bool,
    /// Skip records whose referenced prerequisite is absent from the target
    pub skip_if_missing_prerequisite: bool,
    /// Skip records that grant privileged access
    pub skip_admin_like_records: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            preserve_identifiers: true,
            skip_if_missing_prerequisite: true,
            skip_admin_like_records: true,
        }
    }
}

/// All items produced for one entity type, with running counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub entity_type: EntityType,
    pub items: Vec<TransferItem>,
    pub success: usize,
    pub error: usize,
    pub skipped: usize,
}

impl TransferOutcome {
    pub fn new(entity_type: EntityType) -> Self {
        Self {
            entity_type,
            items: Vec::new(),
            success: 0,
            error: 0,
            skipped: 0,
        }
    }

    pub fn push(&mut self, item: TransferItem) {
        match item.status {
            TransferStatus::Success => self.success += 1,
            TransferStatus::Error => self.error += 1,
            TransferStatus::Skipped => self.skipped += 1,
        }
        self.items.push(item);
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn count_by_action(&self, action: TransferAction) -> usize {
        self.items.iter().filter(|i| i.action == Some(action)).count()
    }

    pub fn created(&self) -> usize {
        self.count_by_action(TransferAction::Created)
    }

    pub fn updated(&self) -> usize {
        self.count_by_action(TransferAction::Updated)
    }

    /// Items that did not succeed
    pub fn problems(&self) -> impl Iterator<Item = &TransferItem> {
        self.items.iter().filter(|i| !i.is_success())
    }

    pub fn find(&self, source_id: &str) -> Option<&TransferItem> {
        self.items.iter().find(|i| i.source_id == source_id)
    }
}
