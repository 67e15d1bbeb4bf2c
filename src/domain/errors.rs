//! Domain errors for the bulletin state store.

use thiserror::Error;

/// Errors surfaced by the stores and the services built on them.
///
/// Callers are expected to branch on the variant (`matches!`), never on the
/// rendered message.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The underlying store failed the round-trip (query, update, connection).
    #[error("Store adapter error: {0}")]
    Adapter(String),

    /// A stored record could not be turned back into a domain value.
    #[error("Cannot deserialize record {key}: {reason}")]
    Deserialize { key: String, reason: String },

    /// The requested resource does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A unit of work dispatched to the work pool panicked or was cancelled.
    #[error("Worker failed: {0}")]
    WorkerFailed(String),
}

impl DomainError {
    /// Build a [`DomainError::Deserialize`] for the record stored under `key`.
    pub fn deserialize(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::Deserialize {
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub const fn is_deserialize(&self) -> bool {
        matches!(self, Self::Deserialize { .. })
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound("row".to_string()),
            other => DomainError::Adapter(other.to_string()),
        }
    }
}
