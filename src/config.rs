//! Configuration module
//!
//! Loads configuration from environment variables.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::domain::{InboundKind, InboundTags};

/// How the wallet-creation batch reports completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalletCreationMode {
    /// Inserts are spawned and the completion event is published immediately.
    /// `STORAGE_CREATED_NEW_WALLETS` does not imply the rows are durable.
    #[default]
    Detached,
    /// Completion is published after every insert has settled.
    Awaited,
}

impl std::str::FromStr for WalletCreationMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "detached" => Ok(WalletCreationMode::Detached),
            "awaited" => Ok(WalletCreationMode::Awaited),
            _ => Err(()),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How long a query waits for a free connection
    pub database_acquire_timeout: Duration,

    /// Wallets table name
    pub wallets_table: String,

    /// Transactions table name
    pub transactions_table: String,

    pub wallet_creation: WalletCreationMode,

    /// Bus tags of the inbound events
    pub inbound_tags: InboundTags,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections: u32 = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "1".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        if database_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"));
        }

        let acquire_secs: u64 = lookup("DATABASE_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_ACQUIRE_TIMEOUT_SECS"))?;

        let wallets_table = lookup("WALLETS_TABLE_NAME").unwrap_or_else(|| "wallets".to_string());
        if !is_sql_identifier(&wallets_table) {
            return Err(ConfigError::InvalidValue("WALLETS_TABLE_NAME"));
        }

        let transactions_table =
            lookup("TRANSACTIONS_TABLE_NAME").unwrap_or_else(|| "transactions".to_string());
        if !is_sql_identifier(&transactions_table) {
            return Err(ConfigError::InvalidValue("TRANSACTIONS_TABLE_NAME"));
        }

        let wallet_creation = match lookup("WALLET_CREATION_MODE") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue("WALLET_CREATION_MODE"))?,
            None => WalletCreationMode::default(),
        };

        let inbound_tags = inbound_tags(&lookup)?;

        Ok(Self {
            database_url,
            database_max_connections,
            database_acquire_timeout: Duration::from_secs(acquire_secs),
            wallets_table,
            transactions_table,
            wallet_creation,
            inbound_tags,
        })
    }
}

/// `EVENT_TAG_<default tag>` renames one inbound kind; tags must stay unique.
fn inbound_tags<F>(lookup: &F) -> Result<InboundTags, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut tags = HashMap::new();

    for kind in InboundKind::ALL {
        let key = format!("EVENT_TAG_{}", kind.as_str());
        let tag = lookup(&key).unwrap_or_else(|| kind.as_str().to_string());

        if tag.trim().is_empty() || tags.insert(tag, kind).is_some() {
            return Err(ConfigError::InvalidEventTag(key));
        }
    }

    Ok(InboundTags::from(tags))
}

/// Table names end up inside statement text, so only bare identifiers
/// (optionally `schema.table`) are accepted.
fn is_sql_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return false;
    }

    parts.iter().all(|part| {
        let mut chars = part.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    })
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Empty or duplicate event tag: {0}")]
    InvalidEventTag(String),
}
