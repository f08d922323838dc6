//! Transfer Handler
//!
//! Checks that both parties of a grant have wallets before the chain node
//! is asked to move funds.

use std::sync::Arc;

use crate::domain::{OutboundEvent, OutcomeKind, Payload};
use crate::storage::WalletStore;

use super::{HandlerError, HandlerResult};

/// Handler for the pre-transfer wallet check
pub struct TransferHandler {
    store: Arc<dyn WalletStore>,
}

impl TransferHandler {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// Resolve the emitent's phrase and the recipient's address in one query.
    ///
    /// Publishes `STORAGE_TRANSFER_WAVES` only when both were found.
    pub async fn check_transfer_pair(&self, mut payload: Payload) -> HandlerResult {
        let emitent_id = payload
            .emitent_id()
            .ok_or(HandlerError::MissingField("emitent.id"))?
            .to_string();
        let recipient_id = payload
            .recipient_id()
            .ok_or(HandlerError::MissingField("recipient.id"))?
            .to_string();

        if emitent_id == recipient_id {
            tracing::warn!(user_id = %emitent_id, "Rejecting transfer to self");
            return Ok(Some(OutboundEvent::with_data(
                OutcomeKind::SelfTransferRejected,
                payload,
            )));
        }

        let rows = self.store.find_wallet_pair(&emitent_id, &recipient_id).await;
        if rows.is_empty() {
            return Ok(Some(OutboundEvent::with_data(OutcomeKind::NoWallets, payload)));
        }

        let mut phrase = None;
        let mut address = None;
        for row in rows {
            if row.user_id == emitent_id {
                phrase = Some(row.phrase).filter(|p| !p.is_empty());
            } else if row.user_id == recipient_id {
                address = Some(row.address).filter(|a| !a.is_empty());
            }
        }

        let kind = match (&phrase, &address) {
            (None, _) => OutcomeKind::NoEmitterWallet,
            (Some(_), None) => OutcomeKind::NoRecipientWallet,
            (Some(_), Some(_)) => OutcomeKind::TransferWaves,
        };

        if let Some(emitent) = payload.emitent.as_mut() {
            emitent.phrase = phrase;
        }
        if let Some(recipient) = payload.recipient.as_mut() {
            recipient.address = address;
        }

        Ok(Some(OutboundEvent::with_data(kind, payload)))
    }
}
