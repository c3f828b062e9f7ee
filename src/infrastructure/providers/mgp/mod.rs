//! MGP E-Pay, Ecuador. Orders are created with a signed JSON POST and settled
//! through a JSON notification.

pub mod model;

use super::http::{build_client, send_json};
use super::{amount_suffixed_order_number, trim_host};
use crate::domain::channel::ChannelKey;
use crate::domain::order::{ExtendParams, PaymentLink, validate_amount, validate_url};
use crate::domain::ports::{CallbackMode, ChannelAdapter};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use model::{PayArgument, PayResponse};
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;

/// Ecuador does not observe DST.
const ECUADOR_UTC_OFFSET_HOURS: i64 = -5;
const DATE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Default channel type; the only one the provider currently offers.
pub const CHANNEL_TYPE_ECUADOR: &str = "0";

pub struct MgpAdapter {
    host: String,
    secret: String,
    merchant_no: String,
    channel_type: String,
    client: Client,
}

impl MgpAdapter {
    pub fn new(
        host: &str,
        secret: &str,
        merchant_no: &str,
        channel_type: &str,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            host: trim_host(host),
            secret: secret.to_string(),
            merchant_no: merchant_no.to_string(),
            channel_type: channel_type.to_string(),
            client: build_client(timeout)?,
        })
    }

    fn request_date() -> String {
        (Utc::now() + TimeDelta::hours(ECUADOR_UTC_OFFSET_HOURS))
            .format(DATE_FORMAT)
            .to_string()
    }
}

#[async_trait]
impl ChannelAdapter for MgpAdapter {
    fn key(&self) -> ChannelKey {
        ChannelKey::EPay
    }

    fn secret(&self) -> &str {
        &self.secret
    }

    fn callback_mode(&self) -> CallbackMode {
        CallbackMode::Notify(model::new_notification)
    }

    fn generate_order_number(&self, _internal_id: i64, amount: Decimal) -> String {
        amount_suffixed_order_number(amount)
    }

    async fn create_order(
        &self,
        order_number: &str,
        amount: Decimal,
        callback_url: &str,
        _extend: Option<&ExtendParams>,
    ) -> Result<PaymentLink> {
        validate_amount(amount)?;
        validate_url(callback_url, "callback URL")?;

        let argument = PayArgument::new(
            &self.merchant_no,
            callback_url,
            order_number,
            amount,
            &self.channel_type,
            Self::request_date(),
        )
        .signed(&self.secret);

        tracing::info!(order_number, amount = %argument.amount, "Creating mgp order");

        let request = self
            .client
            .post(format!("{}/api/pay/V2", self.host))
            .json(&argument);
        let response: PayResponse = send_json(request, "mgp").await?;

        response.into_link()
    }
}
