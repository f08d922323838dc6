//! Domain module
//!
//! Event envelopes, payloads and stored record shapes.

pub mod events;
pub mod payload;
pub mod wallet;

pub use events::{BusEvent, InboundKind, InboundTags, OutboundEvent, OutcomeKind};
pub use payload::{Party, Payload, Stat, Transfer, Update, UserEntry};
pub use payload::{STAT_ALIAS_BALANCES, STAT_ALIAS_MONTH};
pub use wallet::{month_start, NewWallet, RecipientStat, StatRow, TransactionRecord, WalletRow};
