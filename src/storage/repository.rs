//! Wallet Store
//!
//! The port handlers use to reach persisted wallets and transactions, and
//! its Postgres implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{NewWallet, RecipientStat, TransactionRecord, WalletRow};

use super::executor::{QueryExecutor, ResultRow, RowMode, SqlValue};
use super::statements::Statements;

/// Access to wallets and transaction records.
///
/// Failures are recovered below this trait, so a failed read looks like an
/// empty one and a failed write reports zero affected rows.
#[async_trait]
pub trait WalletStore: Send + Sync + 'static {
    /// Wallet of one user, if any
    async fn find_wallet(&self, user_id: &str) -> Option<WalletRow>;

    /// Wallets of both parties of a transfer, at most two rows
    async fn find_wallet_pair(&self, emitent_id: &str, recipient_id: &str) -> Vec<WalletRow>;

    /// Per-recipient totals, optionally restricted to transfers at or after `since`,
    /// ordered by total amount then latest transfer, both descending
    async fn recipient_stats(&self, since: Option<DateTime<Utc>>) -> Vec<RecipientStat>;

    /// Ids of every user that already has a wallet
    async fn wallet_user_ids(&self) -> Vec<String>;

    /// Returns the number of inserted rows
    async fn insert_wallet(&self, wallet: &NewWallet, created_at: DateTime<Utc>) -> u64;

    /// Returns the number of inserted rows
    async fn insert_transaction(&self, record: &TransactionRecord) -> u64;
}

/// Postgres-backed wallet store
#[derive(Clone)]
pub struct PgWalletStore {
    executor: QueryExecutor,
    statements: Statements,
}

impl PgWalletStore {
    pub fn new(executor: QueryExecutor, statements: Statements) -> Self {
        Self {
            executor,
            statements,
        }
    }

    async fn fetch_rows(&self, text: &str, params: Vec<SqlValue>) -> Vec<ResultRow> {
        self.executor
            .execute(text, params, RowMode::Array)
            .await
            .map(|result| result.rows)
            .unwrap_or_default()
    }

    async fn write(&self, text: &str, params: Vec<SqlValue>) -> u64 {
        self.executor
            .execute(text, params, RowMode::Array)
            .await
            .map(|result| result.row_count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn find_wallet(&self, user_id: &str) -> Option<WalletRow> {
        self.fetch_rows(&self.statements.get_wallet, vec![user_id.into()])
            .await
            .iter()
            .find_map(wallet_from_row)
    }

    async fn find_wallet_pair(&self, emitent_id: &str, recipient_id: &str) -> Vec<WalletRow> {
        self.fetch_rows(
            &self.statements.get_wallet_pair,
            vec![emitent_id.into(), recipient_id.into()],
        )
        .await
        .iter()
        .filter_map(wallet_from_row)
        .collect()
    }

    async fn recipient_stats(&self, since: Option<DateTime<Utc>>) -> Vec<RecipientStat> {
        let rows = match since {
            Some(since) => {
                self.fetch_rows(&self.statements.recipients_since, vec![since.into()])
                    .await
            }
            None => self.fetch_rows(&self.statements.all_recipients, vec![]).await,
        };

        rows.iter().filter_map(stat_from_row).collect()
    }

    async fn wallet_user_ids(&self) -> Vec<String> {
        self.fetch_rows(&self.statements.all_wallet_ids, vec![])
            .await
            .iter()
            .filter_map(|row| row.get(0).and_then(SqlValue::as_str).map(str::to_string))
            .collect()
    }

    async fn insert_wallet(&self, wallet: &NewWallet, created_at: DateTime<Utc>) -> u64 {
        self.write(
            &self.statements.create_wallet,
            vec![
                wallet.slack_id.as_str().into(),
                wallet.wallet_phrase.as_str().into(),
                wallet.wallet_address.as_str().into(),
                created_at.into(),
            ],
        )
        .await
    }

    async fn insert_transaction(&self, record: &TransactionRecord) -> u64 {
        self.write(
            &self.statements.add_transaction,
            vec![
                record.emitent_id.as_str().into(),
                record.recipient_id.as_str().into(),
                record.transfer_hash.as_str().into(),
                record.occurred_at.into(),
                record.amount.into(),
            ],
        )
        .await
    }
}

/// `(slack_id, wallet_phrase, wallet_address)`
fn wallet_from_row(row: &ResultRow) -> Option<WalletRow> {
    let text = |idx: usize| row.get(idx).and_then(SqlValue::as_str).map(str::to_string);

    match (text(0), text(1), text(2)) {
        (Some(user_id), Some(phrase), Some(address)) => Some(WalletRow {
            user_id,
            phrase,
            address,
        }),
        _ => {
            tracing::warn!("Skipping wallet row with missing columns");
            None
        }
    }
}

/// `(recipient_id, transaction_amount, transaction_date, wallet_address)`
fn stat_from_row(row: &ResultRow) -> Option<RecipientStat> {
    let recipient_id = row.get(0).and_then(SqlValue::as_str)?.to_string();
    let amount = row
        .get(1)
        .and_then(SqlValue::as_decimal)
        .unwrap_or(Decimal::ZERO);

    Some(RecipientStat {
        recipient_id,
        amount,
        last_transfer_at: row.get(2).and_then(SqlValue::as_timestamp),
        address: row.get(3).and_then(SqlValue::as_str).map(str::to_string),
    })
}
