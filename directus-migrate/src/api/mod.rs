//! Remote instance access
//!
//! The migration core only talks to instances through the [`Transport`]
//! trait. [`HttpTransport`] implements it over the REST API, and
//! [`DryRunTransport`] wraps another transport to preview writes.

pub mod auth;
pub mod client;
pub mod dry_run;
pub mod error;
pub mod operations;
pub mod query;
pub mod transport;

#[cfg(test)]
pub mod memory;

pub use auth::Credentials;
pub use client::HttpTransport;
pub use dry_run::DryRunTransport;
pub use error::{FetchError, FetchErrorKind, WriteError};
pub use operations::Operation;
pub use query::Filter;
pub use transport::{Record, Transport, id_string, record_id};
