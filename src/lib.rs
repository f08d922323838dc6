//! Waves reward bot storage
//!
//! Persists wallets and reward transactions, and turns bus events into
//! store queries and outcome events.

pub mod bus;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod service;
pub mod storage;
mod error;

pub use bus::{ChannelPublisher, EventPublisher};
pub use config::{Config, WalletCreationMode};
pub use domain::{BusEvent, InboundKind, OutboundEvent, OutcomeKind, Payload};
pub use error::{AppError, AppResult};
pub use service::StorageService;
pub use storage::{MemoryWalletStore, PgWalletStore, WalletStore};
