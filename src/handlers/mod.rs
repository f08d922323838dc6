//! Event Handlers module
//!
//! One handler per concern. Each takes the event payload by value, queries
//! the wallet store and returns the enriched payload inside the outcome
//! event the dispatcher publishes.

mod error;
mod provisioning_handler;
mod stat_handler;
mod transaction_handler;
mod transfer_handler;
mod wallet_handler;


pub use error::{HandlerError, HandlerResult};
pub use provisioning_handler::ProvisioningHandler;
pub use stat_handler::{current_month_start, StatHandler, WindowStart};
pub use transaction_handler::TransactionHandler;
pub use transfer_handler::TransferHandler;
pub use wallet_handler::WalletLookupHandler;
