//! In-memory wallet store
//!
//! Keeps both tables in process and enforces the same uniqueness rules as
//! the Postgres schema (one wallet per `slack_id`, one record per
//! `transaction_hash`).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{NewWallet, RecipientStat, TransactionRecord, WalletRow};

use super::repository::WalletStore;

#[derive(Debug, Default)]
struct Tables {
    wallets: Vec<(WalletRow, DateTime<Utc>)>,
    transactions: Vec<TransactionRecord>,
}

/// Wallet store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryWalletStore {
    tables: Mutex<Tables>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a wallet directly, bypassing the provisioning flow
    pub fn with_wallet(self, wallet: WalletRow) -> Self {
        self.lock().wallets.push((wallet, Utc::now()));
        self
    }

    /// Seed a transaction record directly
    pub fn with_transaction(self, record: TransactionRecord) -> Self {
        self.lock().transactions.push(record);
        self
    }

    pub fn wallets(&self) -> Vec<WalletRow> {
        self.lock().wallets.iter().map(|(w, _)| w.clone()).collect()
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.lock().transactions.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Rows are pushed whole, so a poisoned lock still holds consistent tables
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn find_wallet(&self, user_id: &str) -> Option<WalletRow> {
        self.lock()
            .wallets
            .iter()
            .find(|(w, _)| w.user_id == user_id)
            .map(|(w, _)| w.clone())
    }

    async fn find_wallet_pair(&self, emitent_id: &str, recipient_id: &str) -> Vec<WalletRow> {
        self.lock()
            .wallets
            .iter()
            .filter(|(w, _)| w.user_id == emitent_id || w.user_id == recipient_id)
            .take(2)
            .map(|(w, _)| w.clone())
            .collect()
    }

    async fn recipient_stats(&self, since: Option<DateTime<Utc>>) -> Vec<RecipientStat> {
        let tables = self.lock();
        let mut totals: HashMap<&str, RecipientStat> = HashMap::new();

        let in_window = tables
            .transactions
            .iter()
            .filter(|tx| since.map_or(true, |since| tx.occurred_at >= since));

        for tx in in_window {
            let entry = totals
                .entry(tx.recipient_id.as_str())
                .or_insert_with(|| RecipientStat {
                    recipient_id: tx.recipient_id.clone(),
                    amount: Default::default(),
                    last_transfer_at: None,
                    address: tables
                        .wallets
                        .iter()
                        .find(|(w, _)| w.user_id == tx.recipient_id)
                        .map(|(w, _)| w.address.clone()),
                });
            entry.amount += tx.amount;
            entry.last_transfer_at = entry.last_transfer_at.max(Some(tx.occurred_at));
        }

        let mut stats: Vec<RecipientStat> = totals.into_values().collect();
        stats.sort_by(|a, b| {
            b.amount
                .cmp(&a.amount)
                .then_with(|| b.last_transfer_at.cmp(&a.last_transfer_at))
        });
        stats
    }

    async fn wallet_user_ids(&self) -> Vec<String> {
        self.lock()
            .wallets
            .iter()
            .map(|(w, _)| w.user_id.clone())
            .collect()
    }

    async fn insert_wallet(&self, wallet: &NewWallet, created_at: DateTime<Utc>) -> u64 {
        let mut tables = self.lock();
        if tables.wallets.iter().any(|(w, _)| w.user_id == wallet.slack_id) {
            tracing::warn!(user_id = %wallet.slack_id, "Duplicate wallet rejected");
            return 0;
        }

        tables.wallets.push((
            WalletRow::new(
                wallet.slack_id.clone(),
                wallet.wallet_phrase.clone(),
                wallet.wallet_address.clone(),
            ),
            created_at,
        ));
        1
    }

    async fn insert_transaction(&self, record: &TransactionRecord) -> u64 {
        let mut tables = self.lock();
        if tables
            .transactions
            .iter()
            .any(|tx| tx.transfer_hash == record.transfer_hash)
        {
            tracing::warn!(hash = %record.transfer_hash, "Duplicate transaction rejected");
            return 0;
        }

        tables.transactions.push(record.clone());
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn record(hash: &str, to: &str, amount: Decimal, at: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord {
            emitent_id: "U0".to_string(),
            recipient_id: to.to_string(),
            transfer_hash: hash.to_string(),
            occurred_at: at,
            amount,
        }
    }

    #[test]
    fn test_duplicate_wallet_rejected() {
        let store = MemoryWalletStore::new().with_wallet(WalletRow::new("U1", "p", "a"));
        let dup = NewWallet {
            slack_id: "U1".to_string(),
            wallet_phrase: "other".to_string(),
            wallet_address: "other".to_string(),
        };

        let inserted = tokio_test::block_on(store.insert_wallet(&dup, Utc::now()));

        assert_eq!(inserted, 0);
        assert_eq!(store.wallets(), vec![WalletRow::new("U1", "p", "a")]);
    }

    #[tokio::test]
    async fn test_stats_order_and_window() {
        let base = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let store = MemoryWalletStore::new()
            .with_wallet(WalletRow::new("U1", "p1", "addr1"))
            .with_transaction(record("h1", "U1", dec!(10), base - Duration::days(40)))
            .with_transaction(record("h2", "U2", dec!(5), base))
            .with_transaction(record("h3", "U3", dec!(5), base - Duration::days(1)))
            .with_transaction(record("h4", "U1", dec!(1), base - Duration::days(2)));

        let all = store.recipient_stats(None).await;
        let ids: Vec<&str> = all.iter().map(|s| s.recipient_id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2", "U3"]);
        assert_eq!(all[0].amount, dec!(11));
        assert_eq!(all[0].address.as_deref(), Some("addr1"));
        assert_eq!(all[1].address, None);

        let recent = store.recipient_stats(Some(base - Duration::days(5))).await;
        let ids: Vec<&str> = recent.iter().map(|s| s.recipient_id.as_str()).collect();
        // U2 and U3 tie on amount, U2 transferred later
        assert_eq!(ids, vec!["U2", "U3", "U1"]);
        assert_eq!(recent[2].amount, dec!(1));
    }

    #[tokio::test]
    async fn test_pair_lookup_bounded() {
        let store = MemoryWalletStore::new()
            .with_wallet(WalletRow::new("U1", "p1", "a1"))
            .with_wallet(WalletRow::new("U2", "p2", "a2"))
            .with_wallet(WalletRow::new("U3", "p3", "a3"));

        assert_eq!(store.find_wallet_pair("U1", "U3").await.len(), 2);
        assert_eq!(store.find_wallet_pair("U1", "U9").await.len(), 1);
        assert!(store.find_wallet_pair("U8", "U9").await.is_empty());
    }
}
