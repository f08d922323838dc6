//! Transaction Handler
//!
//! Records a transfer once the chain node reports it succeeded.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{OutboundEvent, OutcomeKind, Payload, TransactionRecord};
use crate::storage::WalletStore;

use super::{HandlerError, HandlerResult};

/// Handler that writes transaction records
pub struct TransactionHandler {
    store: Arc<dyn WalletStore>,
}

impl TransactionHandler {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self { store }
    }

    /// A transfer without a reference id cannot be stored and is reported
    /// as not completed.
    pub async fn record_transaction(&self, payload: Payload) -> HandlerResult {
        if payload.transfer.as_ref().is_some_and(|t| t.id.is_none()) {
            tracing::warn!("Transfer has no reference id, not recording");
            return Ok(Some(OutboundEvent::with_data(
                OutcomeKind::TransferNotCompleted,
                payload,
            )));
        }

        let record = build_record(&payload)?;
        let inserted = self.store.insert_transaction(&record).await;

        let kind = if inserted == 0 {
            tracing::warn!(hash = %record.transfer_hash, "Transaction was not recorded");
            OutcomeKind::TransferNotCompleted
        } else {
            tracing::info!(
                hash = %record.transfer_hash,
                emitent = %record.emitent_id,
                recipient = %record.recipient_id,
                amount = %record.amount,
                "Transaction recorded"
            );
            OutcomeKind::TransferCompleted
        };

        Ok(Some(OutboundEvent::with_data(kind, payload)))
    }
}

fn build_record(payload: &Payload) -> Result<TransactionRecord, HandlerError> {
    let transfer = payload
        .transfer
        .as_ref()
        .ok_or(HandlerError::MissingField("transfer"))?;

    Ok(TransactionRecord {
        emitent_id: payload
            .emitent_id()
            .ok_or(HandlerError::MissingField("emitent.id"))?
            .to_string(),
        recipient_id: payload
            .recipient_id()
            .ok_or(HandlerError::MissingField("recipient.id"))?
            .to_string(),
        transfer_hash: transfer
            .id
            .clone()
            .ok_or(HandlerError::MissingField("transfer.id"))?,
        occurred_at: Utc::now(),
        amount: transfer.amount,
    })
}
