//! Storage Errors

/// Errors raised while talking to the relational store
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A configured table is missing
    #[error("Required table '{0}' does not exist")]
    SchemaIncomplete(String),
}

impl StorageError {
    /// Check if the error came from a constraint violation (duplicate key etc.)
    pub fn is_constraint_violation(&self) -> bool {
        match self {
            StorageError::Database(sqlx::Error::Database(db_err)) => db_err
                .code()
                .map(|code| code.starts_with("23"))
                .unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SchemaIncomplete("wallets".to_string());
        assert_eq!(err.to_string(), "Required table 'wallets' does not exist");
        assert!(!err.is_constraint_violation());

        let err = StorageError::Database(sqlx::Error::RowNotFound);
        assert!(err.to_string().starts_with("Database error"));
        assert!(!err.is_constraint_violation());
    }
}
