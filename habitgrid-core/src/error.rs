//! Error types for habitgrid-core

use thiserror::Error;

/// Main error type for the habitgrid-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Goal not found (or not owned by the requesting user)
    #[error("goal not found: {0}")]
    GoalNotFound(String),

    /// Record not found (or not owned by the requesting user)
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// Input rejected at the validation boundary
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// The connection mutex was poisoned by a panicking thread
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Shorthand for building an [`Error::InvalidInput`].
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for habitgrid-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let e = Error::invalid("duration_minutes", "cannot exceed 1440 minutes");
        assert_eq!(
            e.to_string(),
            "invalid duration_minutes: cannot exceed 1440 minutes"
        );
    }

    #[test]
    fn test_not_found_display() {
        assert_eq!(
            Error::GoalNotFound("g-1".to_string()).to_string(),
            "goal not found: g-1"
        );
    }
}
