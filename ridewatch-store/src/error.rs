//! Store error types.

use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// A previous writer panicked while holding the connection.
    #[error("Database connection lock poisoned")]
    LockPoisoned,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A stored value could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(column, _, source) => {
                StoreError::Parse(format!("column {column}: {source}"))
            }
            other => StoreError::Database(other),
        }
    }
}

impl StoreError {
    /// Returns true if the store itself is unusable (as opposed to bad input).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::LockPoisoned | StoreError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(StoreError::LockPoisoned.is_unavailable());
        assert!(StoreError::Io(std::io::Error::other("disk full")).is_unavailable());
        assert!(!StoreError::Config("bad".into()).is_unavailable());
        assert!(!StoreError::Parse("bad".into()).is_unavailable());
    }

    #[test]
    fn test_decode_failures_are_parse_errors() {
        let decode = rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other("bad start time")),
        );
        let err = StoreError::from(decode);
        assert!(matches!(err, StoreError::Parse(ref msg) if msg.contains("column 4")));
        assert!(!err.is_unavailable());

        let err = StoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(err.is_unavailable());
    }
}
