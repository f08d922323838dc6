//! Error handling module
//!
//! Top-level error type for the binary.

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Storage(#[from] crate::storage::StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_app_error_from_config() {
        let err: AppError = ConfigError::MissingEnv("DATABASE_URL").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing environment variable: DATABASE_URL"
        );
    }
}
