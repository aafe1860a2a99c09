//! Error types for the alarm repository
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized for whatever UI sits on top.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Alarm with ID {0} already exists")]
    DuplicateId(String),

    #[error("Alarm with ID {0} does not exist")]
    NotFound(String),

    #[error("Alarm storage unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Invalid alarm time: {0}")]
    InvalidTime(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Caller errors are reported back to the offending call and never retried.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            AppError::DuplicateId(_) | AppError::NotFound(_) | AppError::InvalidTime(_)
        )
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_alarm() {
        let err = AppError::NotFound("abc".to_string());
        assert_eq!(err.to_string(), "Alarm with ID abc does not exist");

        let err = AppError::DuplicateId("abc".to_string());
        assert_eq!(err.to_string(), "Alarm with ID abc already exists");
    }

    #[test]
    fn test_backend_errors_are_not_caller_errors() {
        assert!(AppError::NotFound("x".into()).is_caller_error());
        assert!(!AppError::BackendUnavailable("closed".into()).is_caller_error());
        assert!(!AppError::Database(sqlx::Error::PoolClosed).is_caller_error());
    }

    #[test]
    fn test_serializes_as_message() {
        let json = serde_json::to_string(&AppError::NotFound("7".into())).unwrap();
        assert_eq!(json, "\"Alarm with ID 7 does not exist\"");
    }
}
