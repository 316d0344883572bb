//! Error taxonomy shared by every collection and manager.

use thiserror::Error;

use crate::storage::StorageError;

/// Unified error type for tracker operations.
///
/// Every variant means the requested mutation was not applied, except
/// [`TrackerError::Storage`]: the in-memory change happened but could not be
/// made durable.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A required field was missing or out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An operation referenced an id absent from its collection.
    #[error("{kind} `{id}` not found")]
    NotFound { kind: &'static str, id: String },

    /// Stored or imported JSON could not be decoded.
    #[error("malformed {context}: {source}")]
    MalformedData {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A save-state document declares a schema newer than this build understands.
    #[error("unsupported save-state schema version {found} (newest supported is {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    /// The key-value store rejected a write.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TrackerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn malformed(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::MalformedData {
            context: context.into(),
            source,
        }
    }

    /// Whether this error is a missing-id lookup.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Reject blank names before any mutation happens.
pub(crate) fn require_name(field: &str, value: &str) -> TrackerResult<()> {
    if value.trim().is_empty() {
        return Err(TrackerError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
