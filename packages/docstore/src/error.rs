//! Error taxonomy shared by every store operation.

use thiserror::Error;

/// Errors returned by the document store client.
///
/// Every operation fails with exactly one of these kinds; nothing is logged and swallowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The connection is not usable (never initialized, degraded or shut down).
    #[error("document store not initialized: {reason}")]
    NotInitialized { reason: String },

    /// The targeted document does not exist and absence is an error for this operation.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The backing store failed or timed out. Retryable by the caller.
    #[error("document store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Malformed collection name, document id, field name or configuration value.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl StoreError {
    #[must_use]
    pub fn not_initialized(reason: impl Into<String>) -> Self {
        Self::NotInitialized {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Short stable name of the error kind, used for metrics labels and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotInitialized { .. } => "not_initialized",
            Self::NotFound { .. } => "not_found",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::InvalidArgument { .. } => "invalid_argument",
        }
    }

    /// Only backend failures are worth retrying; everything else is a caller error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        Self::unavailable(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
