//! Statistics Handler
//!
//! Builds the recipient leaderboards: all-time balances and the current month.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use crate::domain::{month_start, OutboundEvent, OutcomeKind, Payload, STAT_ALIAS_MONTH};
use crate::storage::WalletStore;

use super::HandlerResult;

/// Supplies the lower bound of the monthly window
pub type WindowStart = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Start of the current month on the local clock
pub fn current_month_start() -> DateTime<Utc> {
    month_start(&Local::now())
}

/// Handler for statistics requests
pub struct StatHandler {
    store: Arc<dyn WalletStore>,
    window_start: WindowStart,
}

impl StatHandler {
    pub fn new(store: Arc<dyn WalletStore>) -> Self {
        Self {
            store,
            window_start: Arc::new(current_month_start),
        }
    }

    pub fn with_window_start(mut self, window_start: WindowStart) -> Self {
        self.window_start = window_start;
        self
    }

    /// `stat.alias == "balances"` reads all records; any other alias is
    /// rewritten to `"month"` and reads only the current month.
    pub async fn get_stat(&self, mut payload: Payload) -> HandlerResult {
        let mut stat = payload.stat.take().unwrap_or_default();

        let list = if stat.is_balances() {
            self.store.recipient_stats(None).await
        } else {
            stat.alias = Some(STAT_ALIAS_MONTH.to_string());
            let since = (self.window_start)();
            tracing::debug!(%since, "Monthly statistics window");
            self.store.recipient_stats(Some(since)).await
        };

        if list.is_empty() {
            payload.stat = Some(stat);
            return Ok(Some(OutboundEvent::with_data(
                OutcomeKind::StatRequestFailed,
                payload,
            )));
        }

        stat.list = Some(list);
        payload.stat = Some(stat);

        Ok(Some(OutboundEvent::with_data(
            OutcomeKind::StatRequestSucceeded,
            payload,
        )))
    }
}
