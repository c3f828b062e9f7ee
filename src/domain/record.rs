use super::channel::ChannelKey;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One order-creation attempt as reported by the charge path.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ChargeAttempt {
    pub internal_id: i64,
    pub order_number: String,
    /// Why creating the order failed, if it did.
    pub error: Option<String>,
}

/// The final outcome of an order as reported by a verified callback.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Settlement {
    pub channel: ChannelKey,
    pub order_number: String,
    pub real_amount: Decimal,
    pub error: Option<String>,
}

impl Settlement {
    pub fn is_paid(&self) -> bool {
        self.error.is_none()
    }
}
