//! Idempotent transfer of records between two instances
//!
//! Source records are written to the target one at a time. Records that
//! already exist in the target are updated, everything else is created, and
//! references are rewritten to the identifiers the target actually uses.

pub mod cancel;
pub mod engine;
pub mod entity;
pub mod id_map;
pub mod record_order;
pub mod snapshot;
pub mod types;

pub use cancel::CancellationFlag;
pub use engine::{TransferEngine, prepare_body};
pub use entity::{EntityType, RefTarget, Reference};
pub use id_map::IdMap;
pub use record_order::{ExecutionMode, order_records};
pub use snapshot::{SnapshotSet, TargetSnapshot, natural_key};
pub use types::{
    ADMIN_SKIPPED, CANCELLED, PREREQUISITE_MISSING, TransferAction, TransferItem, TransferOptions, TransferOutcome,
    TransferStatus,
};
