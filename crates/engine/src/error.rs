//! The module contains the errors an export run can throw.
//!
//! The errors are:
//!
//! - [`MissingCredential`] thrown when a destination credential still holds
//!   its placeholder value.
//! - [`UnmappedAccount`] thrown when a scraped account number has no
//!   destination account configured.
//! - [`UnknownCategory`] thrown when a category label is not known by the
//!   destination.
//! - [`NoActiveDestination`] thrown when the configuration enables no
//!   destination at all.
//! - [`DestinationsFailed`] thrown when at least one destination failed; it
//!   keeps the results of the destinations that succeeded.
//!
//!  [`MissingCredential`]: ExportError::MissingCredential
//!  [`UnmappedAccount`]: ExportError::UnmappedAccount
//!  [`UnknownCategory`]: ExportError::UnknownCategory
//!  [`NoActiveDestination`]: ExportError::NoActiveDestination
//!  [`DestinationsFailed`]: ExportError::DestinationsFailed
use std::{collections::BTreeMap, fmt};

use thiserror::Error;

use crate::{DestinationName, ExecutionResult};

/// Failure of a call made against a destination store.
///
/// Remote clients map their own errors (HTTP status, transport, file I/O)
/// into this opaque shape so it can be cloned into events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteError {
    pub status: Option<u16>,
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{status}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Outcome of a run where some destinations failed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialExport {
    pub errors: BTreeMap<DestinationName, ExportError>,
    pub succeeded: ExecutionResult,
}

impl PartialExport {
    /// The error of the first failed destination, in name order.
    pub fn first_error(&self) -> Option<&ExportError> {
        self.errors.values().next()
    }
}

impl fmt::Display for PartialExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self
            .errors
            .iter()
            .map(|(name, err)| format!("{name}: {err}"))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{failed}")
    }
}

/// Export custom errors.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ExportError {
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Unhandled account number {0}")]
    UnmappedAccount(String),
    #[error("No category for name {0}")]
    UnknownCategory(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("\"{0}\" must be initialized before exporting")]
    NotInitialized(String),
    #[error("You need to set at least one output vendor to be active")]
    NoActiveDestination,
    #[error("Export failed for {0}")]
    DestinationsFailed(PartialExport),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
