//! Storage module
//!
//! Query execution against Postgres and the wallet store port handlers use.

mod error;
mod executor;
mod memory;
mod repository;
mod statements;

pub use error::StorageError;
pub use executor::{
    log_error_reporter, ErrorReporter, QueryExecutor, QueryResult, ResultRow, RowMode, SqlValue,
};
pub use memory::MemoryWalletStore;
pub use repository::{PgWalletStore, WalletStore};
pub use statements::Statements;
