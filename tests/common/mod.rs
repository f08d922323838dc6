//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::mpsc::UnboundedReceiver;

use waves_reward_storage::domain::WalletRow;
use waves_reward_storage::{
    ChannelPublisher, MemoryWalletStore, OutboundEvent, StorageService, WalletStore,
};

pub const WALLETS_TABLE: &str = "test_wallets";
pub const TRANSACTIONS_TABLE: &str = "test_transactions";

// Tests share the two tables; hold this while using them
pub static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Setup test database - create and truncate the two tables
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {WALLETS_TABLE} (
            slack_id TEXT PRIMARY KEY,
            wallet_phrase TEXT NOT NULL,
            wallet_address TEXT NOT NULL,
            wallet_created TIMESTAMPTZ NOT NULL
        )
        "#
    ))
    .execute(&pool)
    .await
    .expect("Failed to create wallets table");

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {TRANSACTIONS_TABLE} (
            emitent_id TEXT NOT NULL,
            recipient_id TEXT NOT NULL,
            transaction_hash TEXT NOT NULL UNIQUE,
            transaction_date TIMESTAMPTZ NOT NULL,
            transaction_amount NUMERIC NOT NULL
        )
        "#
    ))
    .execute(&pool)
    .await
    .expect("Failed to create transactions table");

    // Clean up DB for fresh state
    sqlx::query(&format!("TRUNCATE TABLE {WALLETS_TABLE}, {TRANSACTIONS_TABLE}"))
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}

/// Memory-backed service with two wallets: U1 (phraseX/addrX), U2 (phraseY/addrY)
pub fn memory_service() -> (
    StorageService,
    Arc<MemoryWalletStore>,
    UnboundedReceiver<OutboundEvent>,
) {
    let store = Arc::new(
        MemoryWalletStore::new()
            .with_wallet(WalletRow::new("U1", "phraseX", "addrX"))
            .with_wallet(WalletRow::new("U2", "phraseY", "addrY")),
    );
    let (publisher, rx) = ChannelPublisher::new();
    let store_port: Arc<dyn WalletStore> = store.clone();
    let service = StorageService::new(store_port, Arc::new(publisher));

    (service, store, rx)
}

/// Everything published so far
pub fn drain(rx: &mut UnboundedReceiver<OutboundEvent>) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
