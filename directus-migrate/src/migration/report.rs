//! Run summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transfer::{EntityType, TransferOutcome};

/// Items and counts for one processed entity type
pub type TypeReport = TransferOutcome;

/// Success, error and skip totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub success: usize,
    pub error: usize,
    pub skipped: usize,
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Outcomes in processing order
    pub per_type: Vec<TypeReport>,
    pub warnings: Vec<String>,
    /// Whether the run was cancelled before finishing
    pub cancelled: bool,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            per_type: Vec::new(),
            warnings: Vec::new(),
            cancelled: false,
        }
    }

    pub fn finish(&mut self, cancelled: bool) {
        self.cancelled = cancelled;
        self.finished_at = Some(Utc::now());
    }

    pub fn get(&self, entity_type: EntityType) -> Option<&TypeReport> {
        self.per_type.iter().find(|r| r.entity_type == entity_type)
    }

    pub fn total_counts(&self) -> Counts {
        self.per_type.iter().fold(Counts::default(), |acc, r| Counts {
            success: acc.success + r.success,
            error: acc.error + r.error,
            skipped: acc.skipped + r.skipped,
        })
    }

    /// True when no record failed
    pub fn is_clean(&self) -> bool {
        self.total_counts().error == 0
    }

    /// One line per processed type
    pub fn summary_lines(&self) -> Vec<String> {
        self.per_type
            .iter()
            .map(|r| {
                format!(
                    "{}: {} succeeded ({} created, {} updated), {} failed, {} skipped",
                    r.entity_type,
                    r.success,
                    r.created(),
                    r.updated(),
                    r.error,
                    r.skipped
                )
            })
            .collect()
    }
}

impl Default for MigrationReport {
    fn default() -> Self {
        Self::new()
    }
}
