//! Integration tests for the Postgres wallet store

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use waves_reward_storage::db;
use waves_reward_storage::domain::{NewWallet, TransactionRecord};
use waves_reward_storage::storage::{
    QueryExecutor, RowMode, SqlValue, Statements, StorageError,
};
use waves_reward_storage::{PgWalletStore, WalletStore};

mod common;

fn store(pool: sqlx::PgPool) -> PgWalletStore {
    PgWalletStore::new(
        QueryExecutor::new(pool),
        Statements::new(common::WALLETS_TABLE, common::TRANSACTIONS_TABLE),
    )
}

fn wallet(id: &str, phrase: &str, address: &str) -> NewWallet {
    NewWallet {
        slack_id: id.to_string(),
        wallet_phrase: phrase.to_string(),
        wallet_address: address.to_string(),
    }
}

fn transaction(
    emitent: &str,
    recipient: &str,
    hash: &str,
    days_ago: i64,
    amount: Decimal,
) -> TransactionRecord {
    TransactionRecord {
        emitent_id: emitent.to_string(),
        recipient_id: recipient.to_string(),
        transfer_hash: hash.to_string(),
        occurred_at: Utc::now() - Duration::days(days_ago),
        amount,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_schema_check() {
    let _guard = common::DB_LOCK.lock().await;
    let pool = common::setup_test_db().await;

    db::verify_connection(&pool).await.unwrap();
    db::check_schema(&pool, &[common::WALLETS_TABLE, common::TRANSACTIONS_TABLE])
        .await
        .unwrap();

    let result = db::check_schema(&pool, &[common::WALLETS_TABLE, "no_such_table"]).await;
    assert!(matches!(result, Err(StorageError::SchemaIncomplete(t)) if t == "no_such_table"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_wallet_insert_and_lookup() {
    let _guard = common::DB_LOCK.lock().await;
    let pool = common::setup_test_db().await;
    let store = store(pool);
    let now = Utc::now();

    assert_eq!(store.insert_wallet(&wallet("U1", "phraseX", "addrX"), now).await, 1);
    assert_eq!(store.insert_wallet(&wallet("U2", "phraseY", "addrY"), now).await, 1);
    // Duplicate slack id is rejected by the primary key
    assert_eq!(store.insert_wallet(&wallet("U1", "other", "other"), now).await, 0);

    let found = store.find_wallet("U1").await.unwrap();
    assert_eq!(found.phrase, "phraseX");
    assert_eq!(found.address, "addrX");
    assert!(store.find_wallet("U9").await.is_none());

    let pair = store.find_wallet_pair("U1", "U2").await;
    assert_eq!(pair.len(), 2);
    assert!(store.find_wallet_pair("U8", "U9").await.is_empty());

    let mut ids = store.wallet_user_ids().await;
    ids.sort();
    assert_eq!(ids, vec!["U1", "U2"]);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_transactions_and_recipient_stats() {
    let _guard = common::DB_LOCK.lock().await;
    let pool = common::setup_test_db().await;
    let store = store(pool);
    let now = Utc::now();

    store.insert_wallet(&wallet("U2", "phraseY", "addrY"), now).await;

    assert_eq!(store.insert_transaction(&transaction("U1", "U2", "h1", 90, dec!(5))).await, 1);
    assert_eq!(store.insert_transaction(&transaction("U1", "U3", "h2", 1, dec!(3))).await, 1);
    assert_eq!(store.insert_transaction(&transaction("U1", "U3", "h3", 2, dec!(1.5))).await, 1);
    // Same hash again
    assert_eq!(store.insert_transaction(&transaction("U1", "U3", "h3", 0, dec!(9))).await, 0);

    let all = store.recipient_stats(None).await;
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].recipient_id, "U2");
    assert_eq!(all[0].amount, dec!(5));
    assert_eq!(all[0].address.as_deref(), Some("addrY"));
    assert_eq!(all[1].recipient_id, "U3");
    assert_eq!(all[1].amount, dec!(4.5));
    assert!(all[1].address.is_none());

    let recent = store.recipient_stats(Some(now - Duration::days(30))).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].recipient_id, "U3");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_executor_reports_failures() {
    let _guard = common::DB_LOCK.lock().await;
    let pool = common::setup_test_db().await;

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    let executor =
        QueryExecutor::new(pool).with_error_reporter(Arc::new(move |err: &StorageError| {
            sink.lock().unwrap().push(err.to_string());
        }));

    let empty = executor.execute("   ", vec![], RowMode::Object).await.unwrap();
    assert_eq!(empty.row_count, 0);

    assert!(executor
        .execute("SELECT * FROM no_such_table", vec![], RowMode::Object)
        .await
        .is_none());
    assert_eq!(reported.lock().unwrap().len(), 1);

    let result = executor
        .execute(
            "SELECT $1::text AS name, $2::numeric AS amount",
            vec![SqlValue::from("U1"), SqlValue::Numeric(dec!(2.5))],
            RowMode::Array,
        )
        .await
        .unwrap();
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0].get(0).and_then(SqlValue::as_str), Some("U1"));
    assert_eq!(result.rows[0].get(1).and_then(SqlValue::as_decimal), Some(dec!(2.5)));
    assert!(result.rows[0].get_named("name").is_none());
}
