//! KAB fiat transfer. Orders are created with a signed GET; the provider
//! reports completed transfers with a GET on the `/callback/` route.

pub mod model;

use super::http::{build_client, send_json};
use super::{trim_host, unique_order_number};
use crate::domain::channel::ChannelKey;
use crate::domain::money::{normalized, scaled_to_minor_units};
use crate::domain::order::{ExtendParams, PaymentLink, validate_amount, validate_url};
use crate::domain::ports::{CallbackMode, ChannelAdapter};
use crate::error::Result;
use async_trait::async_trait;
use model::ChargeResponse;
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;

pub struct KabAdapter {
    host: String,
    api_key: String,
    channel_code: String,
    pay_method: Option<String>,
    client: Client,
}

impl KabAdapter {
    pub fn new(
        host: &str,
        api_key: &str,
        channel_code: &str,
        pay_method: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            host: trim_host(host),
            api_key: api_key.to_string(),
            channel_code: channel_code.to_string(),
            pay_method,
            client: build_client(timeout)?,
        })
    }

    /// Query parameters of `/pay_index.php`, signature last.
    ///
    /// `sp` is escaped once here and signed in that form; the HTTP layer
    /// escapes it a second time, which is what the provider verifies against.
    pub fn charge_query(
        &self,
        order_number: &str,
        amount: Decimal,
        callback_url: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        let cents = normalized(scaled_to_minor_units(amount)?);
        let description = urlencoding::encode(&format!("充值{}U", normalized(amount))).into_owned();
        let sign = model::request_signature(
            &self.channel_code,
            order_number,
            &cents,
            &description,
            &self.api_key,
        );

        Ok(vec![
            ("u", self.channel_code.clone()),
            ("id", order_number.to_string()),
            ("je", cents),
            ("sp", description),
            ("cb", callback_url.to_string()),
            ("json", "1".to_string()),
            ("sign", sign),
        ])
    }
}

#[async_trait]
impl ChannelAdapter for KabAdapter {
    fn key(&self) -> ChannelKey {
        ChannelKey::Kab
    }

    fn secret(&self) -> &str {
        &self.api_key
    }

    fn callback_mode(&self) -> CallbackMode {
        CallbackMode::Notify(model::new_notification)
    }

    fn generate_order_number(&self, _internal_id: i64, _amount: Decimal) -> String {
        unique_order_number()
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

        tracing::info!(
            order_number,
            amount = %amount,
            pay_method = self.pay_method.as_deref().unwrap_or("default"),
            "Creating kab order"
        );

        let query = self.charge_query(order_number, amount, callback_url)?;
        let request = self
            .client
            .get(format!("{}/pay_index.php", self.host))
            .query(&query);
        let response: ChargeResponse = send_json(request, "kab").await?;

        response.into_link()
    }
}
