//! Dependency-ordered migration of access control and file metadata
//! between two instances of the platform.

pub mod api;
pub mod cli;
pub mod config;
pub mod graph;
pub mod migration;
pub mod transfer;
