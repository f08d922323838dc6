//! Bus Events
//!
//! Envelopes consumed from and published to the process event bus.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::payload::Payload;

/// Raw envelope as it arrives from the bus.
///
/// Both fields are optional: envelopes without a type are ignored and the
/// payload is only decoded once the type is known.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusEvent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub data: Option<Value>,
}

impl BusEvent {
    pub fn new(kind: &str, data: Value) -> Self {
        Self {
            kind: Some(kind.to_string()),
            data: Some(data),
        }
    }
}

/// Event kinds this service reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    /// A user granted funds to another user
    WavesGranted,
    AllRequested,
    TopRequested,
    SeedRequested,
    StatRequested,
    AddressRequested,
    BalanceRequested,
    UpdateWalletsRequested,
    /// The chain node generated wallets for new users
    WalletsCreated,
    /// The chain node finished a request (transfers carry `transfer`)
    RequestSucceeded,
}

impl InboundKind {
    pub const ALL: [InboundKind; 10] = [
        InboundKind::WavesGranted,
        InboundKind::AllRequested,
        InboundKind::TopRequested,
        InboundKind::SeedRequested,
        InboundKind::StatRequested,
        InboundKind::AddressRequested,
        InboundKind::BalanceRequested,
        InboundKind::UpdateWalletsRequested,
        InboundKind::WalletsCreated,
        InboundKind::RequestSucceeded,
    ];

    /// Default bus tag of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundKind::WavesGranted => "SLACK_WAVES_GRANTED",
            InboundKind::AllRequested => "SLACK_ALL_REQUESTED",
            InboundKind::TopRequested => "SLACK_TOP_REQUESTED",
            InboundKind::SeedRequested => "SLACK_SEED_REQUESTED",
            InboundKind::StatRequested => "SLACK_STAT_REQUESTED",
            InboundKind::AddressRequested => "SLACK_ADDRESS_REQUESTED",
            InboundKind::BalanceRequested => "SLACK_BALANCE_REQUESTED",
            InboundKind::UpdateWalletsRequested => "SLACK_UPDATE_WALLETS_REQUESTED",
            InboundKind::WalletsCreated => "NODE_WALLETS_CREATED",
            InboundKind::RequestSucceeded => "NODE_REQUEST_SUCCEEDED",
        }
    }

}

impl std::fmt::Display for InboundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bus tags this service subscribes to, mapped to their kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTags(HashMap<String, InboundKind>);

impl InboundTags {
    /// Resolve a bus tag; `None` for tags this service does not handle
    pub fn resolve(&self, tag: &str) -> Option<InboundKind> {
        self.0.get(tag).copied()
    }
}

impl Default for InboundTags {
    fn default() -> Self {
        Self(
            InboundKind::ALL
                .into_iter()
                .map(|kind| (kind.as_str().to_string(), kind))
                .collect(),
        )
    }
}

impl From<HashMap<String, InboundKind>> for InboundTags {
    fn from(tags: HashMap<String, InboundKind>) -> Self {
        Self(tags)
    }
}

/// Event kinds published by this service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    #[serde(rename = "STORAGE_CONNECTED")]
    Connected,
    #[serde(rename = "STORAGE_NOT_CONNECTED")]
    NotConnected,
    #[serde(rename = "STORAGE_STAT_REQUEST_SUCCEEDED")]
    StatRequestSucceeded,
    #[serde(rename = "STORAGE_STAT_REQUEST_FAILED")]
    StatRequestFailed,
    #[serde(rename = "STORAGE_SEED_REQUEST_SUCCEEDED")]
    SeedRequestSucceeded,
    #[serde(rename = "STORAGE_SEED_REQUEST_FAILED")]
    SeedRequestFailed,
    #[serde(rename = "STORAGE_ADDRESS_REQUEST_SUCCEEDED")]
    AddressRequestSucceeded,
    #[serde(rename = "STORAGE_ADDRESS_REQUEST_FAILED")]
    AddressRequestFailed,
    #[serde(rename = "STORAGE_REQUEST_BALANCE")]
    RequestBalance,
    #[serde(rename = "STORAGE_NO_WALLET")]
    NoWallet,
    #[serde(rename = "STORAGE_NO_WALLETS")]
    NoWallets,
    #[serde(rename = "STORAGE_NO_EMITTER_WALLET")]
    NoEmitterWallet,
    #[serde(rename = "STORAGE_NO_RECIPIENT_WALLET")]
    NoRecipientWallet,
    #[serde(rename = "STORAGE_SELF_TRANSFER_REJECTED")]
    SelfTransferRejected,
    #[serde(rename = "STORAGE_TRANSFER_WAVES")]
    TransferWaves,
    #[serde(rename = "STORAGE_CREATED_NEW_WALLETS")]
    CreatedNewWallets,
    #[serde(rename = "STORAGE_CREATE_NEW_WALLETS")]
    CreateNewWallets,
    #[serde(rename = "STORAGE_TRANSFER_COMPLETED")]
    TransferCompleted,
    #[serde(rename = "STORAGE_TRANSFER_NOT_COMPLETED")]
    TransferNotCompleted,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Connected => "STORAGE_CONNECTED",
            OutcomeKind::NotConnected => "STORAGE_NOT_CONNECTED",
            OutcomeKind::StatRequestSucceeded => "STORAGE_STAT_REQUEST_SUCCEEDED",
            OutcomeKind::StatRequestFailed => "STORAGE_STAT_REQUEST_FAILED",
            OutcomeKind::SeedRequestSucceeded => "STORAGE_SEED_REQUEST_SUCCEEDED",
            OutcomeKind::SeedRequestFailed => "STORAGE_SEED_REQUEST_FAILED",
            OutcomeKind::AddressRequestSucceeded => "STORAGE_ADDRESS_REQUEST_SUCCEEDED",
            OutcomeKind::AddressRequestFailed => "STORAGE_ADDRESS_REQUEST_FAILED",
            OutcomeKind::RequestBalance => "STORAGE_REQUEST_BALANCE",
            OutcomeKind::NoWallet => "STORAGE_NO_WALLET",
            OutcomeKind::NoWallets => "STORAGE_NO_WALLETS",
            OutcomeKind::NoEmitterWallet => "STORAGE_NO_EMITTER_WALLET",
            OutcomeKind::NoRecipientWallet => "STORAGE_NO_RECIPIENT_WALLET",
            OutcomeKind::SelfTransferRejected => "STORAGE_SELF_TRANSFER_REJECTED",
            OutcomeKind::TransferWaves => "STORAGE_TRANSFER_WAVES",
            OutcomeKind::CreatedNewWallets => "STORAGE_CREATED_NEW_WALLETS",
            OutcomeKind::CreateNewWallets => "STORAGE_CREATE_NEW_WALLETS",
            OutcomeKind::TransferCompleted => "STORAGE_TRANSFER_COMPLETED",
            OutcomeKind::TransferNotCompleted => "STORAGE_TRANSFER_NOT_COMPLETED",
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Envelope published to the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEvent {
    #[serde(rename = "type")]
    pub kind: OutcomeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,

    /// Failure detail, only set for `STORAGE_NOT_CONNECTED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutboundEvent {
    pub fn new(kind: OutcomeKind) -> Self {
        Self {
            kind,
            data: None,
            error: None,
        }
    }

    pub fn with_data(kind: OutcomeKind, data: Payload) -> Self {
        Self {
            kind,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_error(kind: OutcomeKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_tags_resolve() {
        let tags = InboundTags::default();
        for kind in InboundKind::ALL {
            assert_eq!(tags.resolve(kind.as_str()), Some(kind));
        }
        assert_eq!(tags.resolve("SLACK_SOMETHING_NEW"), None);
        assert_eq!(tags.resolve(""), None);

        let renamed = InboundTags::from(HashMap::from([(
            "SEED_V2".to_string(),
            InboundKind::SeedRequested,
        )]));
        assert_eq!(renamed.resolve("SEED_V2"), Some(InboundKind::SeedRequested));
        assert_eq!(renamed.resolve("SLACK_SEED_REQUESTED"), None);
    }

    #[test]
    fn test_bus_event_without_type() {
        let event: BusEvent = serde_json::from_value(json!({"data": {"x": 1}})).unwrap();
        assert!(event.kind.is_none());

        let event: BusEvent = serde_json::from_value(json!({})).unwrap();
        assert!(event.kind.is_none());
        assert!(event.data.is_none());
    }

    #[test]
    fn test_outbound_serialization_uses_tags() {
        let event = OutboundEvent::with_error(OutcomeKind::NotConnected, "connection refused");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["type"], "STORAGE_NOT_CONNECTED");
        assert_eq!(value["error"], "connection refused");
        assert!(value.get("data").is_none());

        let kind: OutcomeKind = serde_json::from_value(json!("STORAGE_TRANSFER_WAVES")).unwrap();
        assert_eq!(kind, OutcomeKind::TransferWaves);
        assert_eq!(kind.to_string(), "STORAGE_TRANSFER_WAVES");
    }
}
