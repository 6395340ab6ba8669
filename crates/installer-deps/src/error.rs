//! Error types for the installer dependency seams

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while translating a raw document into a plan.
///
/// Both variants are terminal for the call; no partial plan is produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// Payload does not deserialize into a document
    #[error("Malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// Payload deserializes but uses an unrecognized version or shape
    #[error("Unsupported document schema {schema_version:?}: {reason}")]
    UnsupportedSchema {
        schema_version: String,
        reason: String,
    },
}

impl TranslateError {
    pub(crate) fn unsupported(schema_version: &str, reason: impl Into<String>) -> Self {
        TranslateError::UnsupportedSchema {
            schema_version: schema_version.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::MalformedDocument {
            reason: err.to_string(),
        }
    }
}

/// Call-level execution errors.
///
/// Individual step failures are never reported here; they are recorded in
/// the `ExecutionResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecuteError {
    /// The underlying runner cannot begin execution
    #[error("Step executor unavailable: {reason}")]
    ExecutorUnavailable { reason: String },
}

/// Filesystem probe errors
#[derive(Error, Debug)]
pub enum FsError {
    /// Path does not exist
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Path exists but could not be read
    #[error("Failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Classify an I/O error raised while reading `path`.
    pub fn from_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            FsError::NotFound { path }
        } else {
            FsError::ReadError { path, source: err }
        }
    }
}

/// Host identity lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Metadata source could not be reached or its answer could not be parsed
    #[error("Host metadata unavailable for {attribute}: {reason}")]
    MetadataUnavailable {
        attribute: &'static str,
        reason: String,
    },
}

impl HostError {
    pub(crate) fn unavailable(attribute: &'static str, reason: impl ToString) -> Self {
        HostError::MetadataUnavailable {
            attribute,
            reason: reason.to_string(),
        }
    }
}
