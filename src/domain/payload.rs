//! Event Payload
//!
//! The `data` object carried by bus events. Handlers read the fields they
//! need and return an enriched copy; fields this crate does not know about
//! are kept in `extra` and forwarded untouched.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::wallet::{NewWallet, RecipientStat};

/// Payload of an inbound or outbound event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emitent: Option<Party>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Party>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer: Option<Transfer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stat: Option<Stat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Update>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payload {
    pub fn emitent_id(&self) -> Option<&str> {
        self.emitent.as_ref().map(|p| p.id.as_str())
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|p| p.id.as_str())
    }
}

/// One side of a transfer (the emitent or the recipient)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: String,

    /// Recovery phrase, filled by a seed request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,

    /// Recovery phrase, filled by the transfer precondition check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Party {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// A transfer executed by the chain node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// External reference of the executed transfer (transaction hash).
    /// Absent until the node has executed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(serialize_with = "amount_as_number")]
    pub amount: Decimal,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transfer {
    pub fn new(id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Some(id.into()),
            amount,
            extra: Map::new(),
        }
    }
}

/// Amounts arrive as JSON numbers and leave the same way: whole values as
/// integers, anything else as a float.
fn amount_as_number<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.fract().is_zero() {
        if let Some(whole) = amount.to_i64() {
            return serializer.serialize_i64(whole);
        }
    }

    match amount.to_f64() {
        Some(float) => serializer.serialize_f64(float),
        None => serializer.collect_str(amount),
    }
}

pub const STAT_ALIAS_BALANCES: &str = "balances";
pub const STAT_ALIAS_MONTH: &str = "month";

/// Statistics request and its result list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<RecipientStat>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Stat {
    pub fn with_alias(alias: &str) -> Self {
        Self {
            alias: Some(alias.to_string()),
            ..Default::default()
        }
    }

    /// `true` for the all-time balances table, anything else is monthly
    pub fn is_balances(&self) -> bool {
        self.alias.as_deref() == Some(STAT_ALIAS_BALANCES)
    }
}

/// Wallet provisioning batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub users: Vec<UserEntry>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entry of `update.users`: a bare user id while filtering, a freshly
/// generated wallet once the node has created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserEntry {
    Id(String),
    Wallet(NewWallet),
}

impl UserEntry {
    pub fn user_id(&self) -> &str {
        match self {
            UserEntry::Id(id) => id,
            UserEntry::Wallet(wallet) => &wallet.slack_id,
        }
    }
}
