//! Storage Service
//!
//! Owns the connection lifecycle and routes bus events to the handlers.
//! Each handler returns at most one outcome event, which is published here.
//! Wallet lookups may publish `STORAGE_NO_WALLET` on their own before that,
//! so a failed seed or address request yields two events.

use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use crate::bus::EventPublisher;
use crate::config::{Config, WalletCreationMode};
use crate::db;
use crate::domain::{
    BusEvent, InboundKind, InboundTags, OutboundEvent, OutcomeKind, Payload,
    STAT_ALIAS_BALANCES, STAT_ALIAS_MONTH,
};
use crate::handlers::{
    HandlerResult, ProvisioningHandler, StatHandler, TransactionHandler, TransferHandler,
    WalletLookupHandler, WindowStart,
};
use crate::storage::{PgWalletStore, QueryExecutor, Statements, StorageError, WalletStore};

/// Event-driven front of the wallet storage
pub struct StorageService {
    store: Arc<dyn WalletStore>,
    publisher: Arc<dyn EventPublisher>,
    wallets: WalletLookupHandler,
    transfers: TransferHandler,
    transactions: TransactionHandler,
    stats: StatHandler,
    provisioning: ProvisioningHandler,
    tags: InboundTags,
    pool: Option<PgPool>,
}

impl StorageService {
    pub fn new(store: Arc<dyn WalletStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            wallets: WalletLookupHandler::new(store.clone(), publisher.clone()),
            transfers: TransferHandler::new(store.clone()),
            transactions: TransactionHandler::new(store.clone()),
            stats: StatHandler::new(store.clone()),
            provisioning: ProvisioningHandler::new(store.clone(), WalletCreationMode::default()),
            store,
            publisher,
            tags: InboundTags::default(),
            pool: None,
        }
    }

    pub fn with_creation_mode(mut self, mode: WalletCreationMode) -> Self {
        self.provisioning = ProvisioningHandler::new(self.store.clone(), mode);
        self
    }

    pub fn with_inbound_tags(mut self, tags: InboundTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_window_start(mut self, window_start: WindowStart) -> Self {
        self.stats = StatHandler::new(self.store.clone()).with_window_start(window_start);
        self
    }

    /// Connect to Postgres and announce the result on the bus.
    ///
    /// Publishes `STORAGE_CONNECTED` or `STORAGE_NOT_CONNECTED`. There is no
    /// retry here; reconnecting is up to whoever supervises the process.
    pub async fn connect(
        config: &Config,
        publisher: Arc<dyn EventPublisher>,
    ) -> Result<Self, StorageError> {
        tracing::info!("Connecting to database...");

        let pool = match db::connect(config).await {
            Ok(pool) => pool,
            Err(err) => {
                tracing::error!(error = %err, "Database connection failed");
                publisher
                    .publish(OutboundEvent::with_error(OutcomeKind::NotConnected, err.to_string()))
                    .await;
                return Err(err.into());
            }
        };

        let tables = [config.wallets_table.as_str(), config.transactions_table.as_str()];
        match db::check_schema(&pool, &tables).await {
            Ok(()) => tracing::info!("Database schema verified"),
            Err(err) => tracing::warn!(error = %err, "Database schema check failed"),
        }

        tracing::info!("Database connected successfully");
        publisher.publish(OutboundEvent::new(OutcomeKind::Connected)).await;

        let executor = QueryExecutor::new(pool.clone());
        let statements = Statements::new(&config.wallets_table, &config.transactions_table);
        let store: Arc<dyn WalletStore> = Arc::new(PgWalletStore::new(executor, statements));

        let mut service = Self::new(store, publisher)
            .with_creation_mode(config.wallet_creation)
            .with_inbound_tags(config.inbound_tags.clone());
        service.pool = Some(pool);

        Ok(service)
    }

    /// Wait for detached wallet inserts, then close the database pool if
    /// this service opened one
    pub async fn close(&self) {
        self.provisioning.settle().await;

        if let Some(pool) = &self.pool {
            pool.close().await;
            tracing::info!("Database connections closed");
        }
    }

    /// Handle one event and return the outcome to publish.
    ///
    /// Events without a type, with a type this service does not know, or
    /// with a malformed payload produce nothing.
    pub async fn handle(&self, event: BusEvent) -> Option<OutboundEvent> {
        let tag = event.kind.as_deref()?;
        let Some(kind) = self.tags.resolve(tag) else {
            tracing::trace!(tag, "Ignoring event");
            return None;
        };

        let span = tracing::debug_span!("event", kind = %kind, correlation_id = %Uuid::new_v4());

        async move {
            tracing::debug!("Handling event");

            match self.dispatch(kind, event.data).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(error = %err, "Event dropped");
                    None
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Handle one event and publish its outcome
    pub async fn route(&self, event: BusEvent) {
        if let Some(outcome) = self.handle(event).await {
            self.publisher.publish(outcome).await;
        }
    }

    /// Consume events until the channel closes.
    ///
    /// Each event runs on its own task, so a slow query only holds up its
    /// own event. Outcomes may be published out of arrival order.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<BusEvent>) {
        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Some(event) => {
                        let service = self.clone();
                        in_flight.spawn(async move { service.route(event).await });
                    }
                    None => break,
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(err) = joined {
                        tracing::error!(error = %err, "Event handler task failed");
                    }
                }
            }
        }

        tracing::info!(pending = in_flight.len(), "Event stream closed, draining handlers");
        while let Some(joined) = in_flight.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "Event handler task failed");
            }
        }
    }

    async fn dispatch(&self, kind: InboundKind, data: Option<Value>) -> HandlerResult {
        let mut payload: Payload = match data {
            Some(value) => serde_json::from_value(value)?,
            None => Payload::default(),
        };

        match kind {
            InboundKind::WavesGranted => self.transfers.check_transfer_pair(payload).await,
            InboundKind::AllRequested => {
                payload.stat.get_or_insert_with(Default::default).alias =
                    Some(STAT_ALIAS_BALANCES.to_string());
                self.stats.get_stat(payload).await
            }
            InboundKind::TopRequested => {
                payload.stat.get_or_insert_with(Default::default).alias =
                    Some(STAT_ALIAS_MONTH.to_string());
                self.stats.get_stat(payload).await
            }
            InboundKind::StatRequested => self.stats.get_stat(payload).await,
            InboundKind::SeedRequested => self.wallets.resolve_seed(payload).await,
            InboundKind::AddressRequested => self.wallets.resolve_address(payload).await,
            InboundKind::BalanceRequested => self.wallets.resolve_balance(payload).await,
            InboundKind::UpdateWalletsRequested => {
                self.provisioning.filter_users_without_wallets(payload).await
            }
            InboundKind::WalletsCreated => self.provisioning.create_users(payload).await,
            InboundKind::RequestSucceeded => {
                // Other node requests succeed too; only transfers are recorded
                if payload.transfer.is_some() {
                    self.transactions.record_transaction(payload).await
                } else {
                    Ok(None)
                }
            }
        }
    }
}
