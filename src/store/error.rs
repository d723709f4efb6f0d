/// Error types for the persistence layer
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// Serializing or deserializing stored JSON failed
    #[error("Stored data error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error while touching the data directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested row does not exist
    #[error("Not found")]
    NotFound,

    /// The acting user may not touch this row
    #[error("Access denied")]
    Forbidden,

    /// A uniqueness rule was violated
    #[error("{0}")]
    Conflict(String),

    /// Input failed validation before reaching the database
    #[error("{0}")]
    Invalid(String),
}

impl StoreError {
    /// True when the error should surface as a form-level message
    /// rather than an error page.
    pub fn is_user_error(&self) -> bool {
        matches!(self, StoreError::Conflict(_) | StoreError::Invalid(_))
    }
}

/// Map a unique-constraint failure onto a `Conflict` with a readable message,
/// leaving every other SQLite error untouched.
pub(crate) fn unique_violation(err: rusqlite::Error, message: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &err {
        if inner.code == rusqlite::ErrorCode::ConstraintViolation {
            return StoreError::Conflict(message.to_string());
        }
    }
    StoreError::Db(err)
}
