//! Provisioning Handler
//!
//! Finds users that still need a wallet and stores the wallets the chain
//! node generated for them.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::task::JoinSet;

use crate::config::WalletCreationMode;
use crate::domain::{NewWallet, OutboundEvent, OutcomeKind, Payload, UserEntry};
use crate::storage::WalletStore;

use super::{HandlerError, HandlerResult};

/// Handler for wallet provisioning
pub struct ProvisioningHandler {
    store: Arc<dyn WalletStore>,
    mode: WalletCreationMode,
    detached: Mutex<JoinSet<()>>,
}

impl ProvisioningHandler {
    pub fn new(store: Arc<dyn WalletStore>, mode: WalletCreationMode) -> Self {
        Self {
            store,
            mode,
            detached: Mutex::new(JoinSet::new()),
        }
    }

    /// Wait for detached wallet inserts that are still running
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.detached());
        if !pending.is_empty() {
            tracing::info!(pending = pending.len(), "Waiting for wallet inserts");
        }

        while let Some(joined) = pending.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "Wallet insert task failed");
            }
        }
    }

    fn spawn_inserts(&self, wallets: Vec<NewWallet>, created_at: DateTime<Utc>) {
        let mut detached = self.detached();
        // Reap inserts that already finished
        while detached.try_join_next().is_some() {}

        for wallet in wallets {
            let store = self.store.clone();
            detached.spawn(async move {
                if store.insert_wallet(&wallet, created_at).await == 0 {
                    tracing::warn!(user_id = %wallet.slack_id, "Wallet was not stored");
                }
            });
        }
    }

    fn detached(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.detached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store every wallet in `update.users` with one shared creation time.
    ///
    /// Inserts fail independently. `STORAGE_CREATED_NEW_WALLETS` is published
    /// regardless, so it never proves that every row landed; in
    /// `Detached` mode it is published before any insert has settled, and
    /// [`settle`](Self::settle) waits for the stragglers.
    pub async fn create_users(&self, payload: Payload) -> HandlerResult {
        let update = payload
            .update
            .as_ref()
            .ok_or(HandlerError::MissingField("update"))?;

        let created_at = Utc::now();
        let wallets: Vec<NewWallet> = update
            .users
            .iter()
            .filter_map(|entry| match entry {
                UserEntry::Wallet(wallet) => Some(wallet.clone()),
                UserEntry::Id(id) => {
                    tracing::warn!(user_id = %id, "No wallet data for user, skipping");
                    None
                }
            })
            .collect();

        match self.mode {
            WalletCreationMode::Detached => self.spawn_inserts(wallets, created_at),
            WalletCreationMode::Awaited => {
                let requested = wallets.len();
                let inserted: u64 = join_all(
                    wallets
                        .iter()
                        .map(|wallet| self.store.insert_wallet(wallet, created_at)),
                )
                .await
                .into_iter()
                .sum();

                if inserted < requested as u64 {
                    tracing::warn!(inserted, requested, "Some wallets were not stored");
                } else {
                    tracing::info!(inserted, "Wallets stored");
                }
            }
        }

        Ok(Some(OutboundEvent::with_data(
            OutcomeKind::CreatedNewWallets,
            payload,
        )))
    }

    /// Drop users that already have a wallet from `update.users`.
    ///
    /// When no wallet ids come back at all the handler stays silent.
    pub async fn filter_users_without_wallets(&self, mut payload: Payload) -> HandlerResult {
        if payload.update.is_none() {
            return Err(HandlerError::MissingField("update"));
        }

        let existing: HashSet<String> = self.store.wallet_user_ids().await.into_iter().collect();
        if existing.is_empty() {
            tracing::debug!("No stored wallet ids, skipping provisioning");
            return Ok(None);
        }

        if let Some(update) = payload.update.as_mut() {
            update
                .users
                .retain(|entry| !existing.contains(entry.user_id()));
            tracing::debug!(remaining = update.users.len(), "Users without wallets");
        }

        Ok(Some(OutboundEvent::with_data(
            OutcomeKind::CreateNewWallets,
            payload,
        )))
    }
}
