use super::callback::callback_url;
use crate::domain::channel::ChannelKey;
use crate::domain::order::{ExtendParams, PaymentLink};
use crate::domain::ports::{AccessorBox, RegistryBox};
use crate::error::{ChannelError, Result};
use rust_decimal::Decimal;
use std::time::Duration;

/// One request to collect money through a channel.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub internal_id: i64,
    pub amount: Decimal,
    pub channel: ChannelKey,
    pub extend: Option<ExtendParams>,
    /// Upper bound on order creation, on top of the adapter's own timeout.
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChargeReceipt {
    pub order_number: String,
    pub link: PaymentLink,
}

/// Creates provider orders and records every attempt.
pub struct ChargeService {
    registry: RegistryBox,
    accessor: AccessorBox,
    callback_base_url: String,
}

impl ChargeService {
    /// # Arguments
    ///
    /// * `callback_base_url` - Public URL the webhook routes are mounted under.
    pub fn new(
        registry: RegistryBox,
        accessor: AccessorBox,
        callback_base_url: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            accessor,
            callback_base_url: callback_base_url.into(),
        }
    }

    /// Creates the order at the provider.
    ///
    /// Once the channel resolves, the attempt is recorded whether or not the
    /// provider accepted it. Failing to record it is logged and does not fail
    /// the charge.
    pub async fn charge(&self, request: ChargeRequest) -> Result<ChargeReceipt> {
        let adapter = self.registry.resolve_adapter(request.channel)?;
        let order_number = adapter.generate_order_number(request.internal_id, request.amount);
        let notify_url = callback_url(&self.callback_base_url, request.channel, &order_number);

        let create = adapter.create_order(
            &order_number,
            request.amount,
            &notify_url,
            request.extend.as_ref(),
        );
        let result = match request.deadline {
            Some(deadline) => tokio::time::timeout(deadline, create)
                .await
                .unwrap_or_else(|_| {
                    Err(ChannelError::TransportError("deadline exceeded".to_string()))
                }),
            None => create.await,
        };

        if let Err(e) = self
            .accessor
            .set_record_started(request.internal_id, &order_number, result.as_ref().err())
            .await
        {
            tracing::error!(
                channel = %request.channel,
                %order_number,
                error = %e,
                "Failed to record charge attempt"
            );
        }

        match result {
            Ok(link) => {
                tracing::info!(
                    channel = %request.channel,
                    internal_id = request.internal_id,
                    %order_number,
                    "Order created"
                );
                Ok(ChargeReceipt { order_number, link })
            }
            Err(e) => {
                tracing::warn!(
                    channel = %request.channel,
                    internal_id = request.internal_id,
                    %order_number,
                    error = %e,
                    "Order creation failed"
                );
                Err(e)
            }
        }
    }
}
