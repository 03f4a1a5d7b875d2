//! Run-level errors

use crate::api::FetchError;

/// Errors that stop a migration run before or instead of writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationError {
    /// An instance was unreachable or rejected the credentials
    Connectivity(FetchError),
    /// A primary read was answered with an error status or an undecodable body
    PrimaryRead(FetchError),
    /// The requested type order breaks a dependency
    OrderingViolation(Vec<String>),
    /// A session could not be established
    Auth(String),
}

impl std::fmt::Display for MigrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationError::Connectivity(err) | MigrationError::PrimaryRead(err) => write!(f, "{}", err),
            MigrationError::OrderingViolation(errors) => {
                write!(f, "Refusing to run with an invalid type order: {}", errors.join("; "))
            }
            MigrationError::Auth(msg) => write!(f, "Authentication failed: {}", msg),
        }
    }
}

impl std::error::Error for MigrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MigrationError::Connectivity(err) | MigrationError::PrimaryRead(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FetchError> for MigrationError {
    fn from(err: FetchError) -> Self {
        if err.is_connectivity() {
            MigrationError::Connectivity(err)
        } else {
            MigrationError::PrimaryRead(err)
        }
    }
}
