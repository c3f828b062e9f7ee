use crate::domain::channel::ChannelKey;
use crate::domain::ports::{Accessor, RecordLedger};
use crate::domain::record::{ChargeAttempt, Settlement};
use crate::error::{ChannelError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Ledger {
    attempts: Vec<ChargeAttempt>,
    settlements: HashMap<String, Settlement>,
}

/// A thread-safe in-memory record of charge attempts and settlements.
///
/// Attempts are kept in arrival order. Settlements are keyed by order number
/// and written once: a second settlement for the same order is rejected with
/// [`ChannelError::DuplicateSettlement`], so a provider retrying a delivered
/// notification cannot settle an order twice.
#[derive(Default, Clone)]
pub struct InMemoryAccessor {
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryAccessor {
    /// Creates a new, empty in-memory accessor.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Accessor for InMemoryAccessor {
    async fn set_record_started(
        &self,
        internal_id: i64,
        order_number: &str,
        err: Option<&ChannelError>,
    ) -> Result<()> {
        let mut ledger = self.ledger.write().await;
        ledger.attempts.push(ChargeAttempt {
            internal_id,
            order_number: order_number.to_string(),
            error: err.map(ToString::to_string),
        });
        Ok(())
    }

    async fn set_record_finish(
        &self,
        channel: ChannelKey,
        order_number: &str,
        real_amount: Decimal,
        err: Option<&ChannelError>,
    ) -> Result<()> {
        let mut ledger = self.ledger.write().await;
        if ledger.settlements.contains_key(order_number) {
            return Err(ChannelError::DuplicateSettlement(order_number.to_string()));
        }

        ledger.settlements.insert(
            order_number.to_string(),
            Settlement {
                channel,
                order_number: order_number.to_string(),
                real_amount,
                error: err.map(ToString::to_string),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl RecordLedger for InMemoryAccessor {
    async fn attempts(&self) -> Result<Vec<ChargeAttempt>> {
        let ledger = self.ledger.read().await;
        Ok(ledger.attempts.clone())
    }

    /// Settlements sorted by order number.
    async fn settlements(&self) -> Result<Vec<Settlement>> {
        let ledger = self.ledger.read().await;
        let mut settlements: Vec<Settlement> = ledger.settlements.values().cloned().collect();
        settlements.sort_by(|a, b| a.order_number.cmp(&b.order_number));
        Ok(settlements)
    }
}
