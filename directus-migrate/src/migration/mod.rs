//! Migration runs across entity types

pub mod error;
pub mod options;
pub mod orchestrator;
pub mod report;

pub use error::MigrationError;
pub use options::{MigrationOptions, MigrationSelection};
pub use orchestrator::{MigrationPlan, Migrator, plan};
pub use report::{Counts, MigrationReport, TypeReport};
