//! Wallet Lookup Handler
//!
//! Resolves a user's stored wallet for seed, address and balance requests.

use std::sync::Arc;

use crate::bus::EventPublisher;
use crate::domain::{OutboundEvent, OutcomeKind, Payload, WalletRow};
use crate::storage::WalletStore;

use super::{HandlerError, HandlerResult};

/// Handler for single-wallet lookups
pub struct WalletLookupHandler {
    store: Arc<dyn WalletStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl WalletLookupHandler {
    pub fn new(store: Arc<dyn WalletStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Look up one wallet. Publishes `STORAGE_NO_WALLET` with the payload when
    /// the user has none.
    pub async fn get_wallet(&self, user_id: &str, payload: &Payload) -> Option<WalletRow> {
        match self.store.find_wallet(user_id).await {
            Some(wallet) => Some(wallet),
            None => {
                tracing::debug!(user_id, "No wallet stored");
                self.publisher
                    .publish(OutboundEvent::with_data(OutcomeKind::NoWallet, payload.clone()))
                    .await;
                None
            }
        }
    }

    /// Attach the emitent's recovery phrase as `emitent.seed`
    pub async fn resolve_seed(&self, mut payload: Payload) -> HandlerResult {
        let Some(wallet) = self.emitent_wallet(&payload).await? else {
            return Ok(Some(OutboundEvent::with_data(
                OutcomeKind::SeedRequestFailed,
                payload,
            )));
        };

        if let Some(emitent) = payload.emitent.as_mut() {
            emitent.seed = Some(wallet.phrase);
        }

        Ok(Some(OutboundEvent::with_data(
            OutcomeKind::SeedRequestSucceeded,
            payload,
        )))
    }

    /// Attach the emitent's public address as `emitent.address`
    pub async fn resolve_address(&self, mut payload: Payload) -> HandlerResult {
        let Some(wallet) = self.emitent_wallet(&payload).await? else {
            return Ok(Some(OutboundEvent::with_data(
                OutcomeKind::AddressRequestFailed,
                payload,
            )));
        };

        if let Some(emitent) = payload.emitent.as_mut() {
            emitent.address = Some(wallet.address);
        }

        Ok(Some(OutboundEvent::with_data(
            OutcomeKind::AddressRequestSucceeded,
            payload,
        )))
    }

    /// Attach the emitent's address and hand over to the balance query.
    ///
    /// A missing wallet publishes nothing beyond `STORAGE_NO_WALLET`; the
    /// balance flow reports its own failures downstream.
    pub async fn resolve_balance(&self, mut payload: Payload) -> HandlerResult {
        let Some(wallet) = self.emitent_wallet(&payload).await? else {
            return Ok(None);
        };

        if let Some(emitent) = payload.emitent.as_mut() {
            emitent.address = Some(wallet.address);
        }

        Ok(Some(OutboundEvent::with_data(
            OutcomeKind::RequestBalance,
            payload,
        )))
    }

    async fn emitent_wallet(&self, payload: &Payload) -> Result<Option<WalletRow>, HandlerError> {
        let user_id = payload
            .emitent_id()
            .ok_or(HandlerError::MissingField("emitent.id"))?;

        Ok(self.get_wallet(user_id, payload).await)
    }
}
