use thiserror::Error;

/// Errors reported by storage adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database driver failure.
    #[error("database error: {0}")]
    Db(String),
    /// A table or column name cannot be used as an identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    /// Any other backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Db(err.to_string())
    }
}

/// Convenience alias for adapter results.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
