//! Error taxonomy for the content store.
//!
//! Not-Found covers both "absent" and "present but not owned by the caller";
//! the two are deliberately indistinguishable so callers cannot enumerate
//! other users' resource identifiers.

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Resource absent, or owned by somebody else.
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage failure other than not-found. Fatal to the calling operation.
    #[error("storage error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored payload could not be parsed.
    #[error("failed to decode '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// Rejected before persistence (bad path, date range, discriminator mismatch).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub fn not_found(what: impl Into<String>) -> Self {
        StoreError::NotFound(what.into())
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn decode(path: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Decode {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::InvalidInput(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
