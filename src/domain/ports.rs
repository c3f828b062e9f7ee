use super::channel::ChannelKey;
use super::order::{ExtendParams, PaymentLink};
use super::record::{ChargeAttempt, Settlement};
use super::status::PaidStatus;
use crate::error::{ChannelError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Decoded form of one provider notification.
///
/// A fresh instance is made per callback by the provider's [`TemplateFactory`]
/// and dropped once the outcome and acknowledgement have been read.
pub trait CallbackTemplate: Send + Sync {
    /// Populates the instance from the raw notification body.
    fn decode(&mut self, body: &[u8]) -> Result<()>;

    /// Recomputes the provider signature over the decoded fields.
    fn verify(&self, secret: &str) -> Result<()>;

    /// Order number carried inside the signed payload.
    fn order_number(&self) -> &str;

    /// Provider status mapped onto [`PaidStatus`]. Unrecognized codes must map
    /// to [`PaidStatus::PaidUnknown`].
    fn outcome(&self) -> PaidStatus;

    /// Amount the provider says was received, in the canonical currency unit.
    fn real_paid_amount(&self) -> Decimal;

    /// Exact body the provider expects in the HTTP 200 reply. Must be available
    /// even when `decode` failed.
    fn acknowledgement(&self) -> String;
}

/// Manufactures empty callback templates for one provider.
pub type TemplateFactory = fn() -> Box<dyn CallbackTemplate>;

/// How a channel reports payment results.
#[derive(Clone, Copy)]
pub enum CallbackMode {
    /// The provider calls back; notifications decode with this factory.
    Notify(TemplateFactory),
    /// The provider never calls back and has to be polled.
    Poll,
}

impl CallbackMode {
    pub fn template_factory(self) -> Option<TemplateFactory> {
        match self {
            Self::Notify(factory) => Some(factory),
            Self::Poll => None,
        }
    }

    pub fn requires_active_polling(self) -> bool {
        matches!(self, Self::Poll)
    }
}

/// One payment provider integration.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn key(&self) -> ChannelKey;

    /// Shared secret used to sign requests and verify callbacks.
    fn secret(&self) -> &str;

    fn identity(&self) -> (ChannelKey, &str) {
        (self.key(), self.secret())
    }

    fn callback_mode(&self) -> CallbackMode;

    /// Provider-facing order number, unique per attempt.
    fn generate_order_number(&self, internal_id: i64, amount: Decimal) -> String;

    /// Creates the order at the provider and returns what the payer must open.
    async fn create_order(
        &self,
        order_number: &str,
        amount: Decimal,
        callback_url: &str,
        extend: Option<&ExtendParams>,
    ) -> Result<PaymentLink>;

    /// Actively queries the payment status of an order.
    async fn check_status(&self, _provider_order_number: &str) -> Result<PaidStatus> {
        Err(ChannelError::NotSupported)
    }
}

pub type AdapterBox = Arc<dyn ChannelAdapter>;

/// Lookup of adapters and callback templates by channel.
pub trait ChannelRegistry: Send + Sync {
    fn register(&self, adapter: AdapterBox) -> Result<()>;
    fn resolve_adapter(&self, key: ChannelKey) -> Result<AdapterBox>;
    fn resolve_template(&self, key: ChannelKey) -> Result<TemplateFactory>;
}

pub type RegistryBox = Arc<dyn ChannelRegistry>;

/// Persistence collaborator recording charge attempts and settlements.
#[async_trait]
pub trait Accessor: Send + Sync {
    /// Called once per charge attempt, whether or not creating the order worked.
    async fn set_record_started(
        &self,
        internal_id: i64,
        order_number: &str,
        err: Option<&ChannelError>,
    ) -> Result<()>;

    /// Called at most once per verified terminal callback.
    async fn set_record_finish(
        &self,
        channel: ChannelKey,
        order_number: &str,
        real_amount: Decimal,
        err: Option<&ChannelError>,
    ) -> Result<()>;
}

pub type AccessorBox = Arc<dyn Accessor>;

/// Read side of an [`Accessor`], used by operators to inspect what was recorded.
#[async_trait]
pub trait RecordLedger: Accessor {
    async fn attempts(&self) -> Result<Vec<ChargeAttempt>>;
    async fn settlements(&self) -> Result<Vec<Settlement>>;
}

pub type LedgerBox = Arc<dyn RecordLedger>;
