//! Wallet and transaction records
//!
//! Row shapes of the two persisted tables and the aggregated statistics row.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stored wallet: `(slack_id, wallet_phrase, wallet_address)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletRow {
    pub user_id: String,
    pub phrase: String,
    pub address: String,
}

impl WalletRow {
    pub fn new(
        user_id: impl Into<String>,
        phrase: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            phrase: phrase.into(),
            address: address.into(),
        }
    }
}

/// Wallet generated by the chain node, waiting to be stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewWallet {
    pub slack_id: String,
    pub wallet_phrase: String,
    pub wallet_address: String,
}

/// One completed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub emitent_id: String,
    pub recipient_id: String,
    pub transfer_hash: String,
    pub occurred_at: DateTime<Utc>,
    pub amount: Decimal,
}

/// Positional wire form of a statistics row:
/// `[recipient_id, transaction_amount, transaction_date, wallet_address]`
pub type StatRow = (String, Decimal, Option<DateTime<Utc>>, Option<String>);

/// Per-recipient totals used by the statistics tables.
///
/// Published as a positional row; consumers read the columns by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "StatRow", from = "StatRow")]
pub struct RecipientStat {
    pub recipient_id: String,
    pub amount: Decimal,
    pub last_transfer_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
}

impl From<RecipientStat> for StatRow {
    fn from(stat: RecipientStat) -> Self {
        (stat.recipient_id, stat.amount, stat.last_transfer_at, stat.address)
    }
}

impl From<StatRow> for RecipientStat {
    fn from((recipient_id, amount, last_transfer_at, address): StatRow) -> Self {
        Self {
            recipient_id,
            amount,
            last_transfer_at,
            address,
        }
    }
}

/// First instant of the calendar month `now` falls in, in `now`'s timezone.
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let first_day = now
        .date_naive()
        .with_day(1)
        .and_then(|day| day.and_hms_opt(0, 0, 0));

    first_day
        .and_then(|naive| naive.and_local_timezone(now.timezone()).earliest())
        .map(|start| start.with_timezone(&Utc))
        // Midnight skipped by a DST jump; the month still started before `now`
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
