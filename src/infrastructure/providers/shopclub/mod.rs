//! Shop-club E-Pay. One adapter type serves several channel keys (ruble,
//! USDT), told apart by the key it is configured with.

pub mod model;

use super::http::{build_client, send_json};
use super::{trim_host, unique_order_number};
use crate::domain::channel::ChannelKey;
use crate::domain::money::to_minor_units;
use crate::domain::order::{ExtendParams, PaymentLink, validate_amount, validate_url};
use crate::domain::ports::{CallbackMode, ChannelAdapter};
use crate::error::{ChannelError, Result};
use async_trait::async_trait;
use chrono::Utc;
use model::{PayArgument, PayResponse};
use reqwest::Client;
use rust_decimal::Decimal;
use std::time::Duration;

pub struct ShopClubAdapter {
    key: ChannelKey,
    host: String,
    secret: String,
    mch_id: i64,
    app_id: i64,
    client: Client,
}

impl ShopClubAdapter {
    pub fn new(
        key: ChannelKey,
        host: &str,
        secret: &str,
        mch_id: i64,
        app_id: i64,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            key,
            host: trim_host(host),
            secret: secret.to_string(),
            mch_id,
            app_id,
            client: build_client(timeout)?,
        })
    }
}

#[async_trait]
impl ChannelAdapter for ShopClubAdapter {
    fn key(&self) -> ChannelKey {
        self.key
    }

    fn secret(&self) -> &str {
        &self.secret
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
        extend: Option<&ExtendParams>,
    ) -> Result<PaymentLink> {
        let extend = extend.ok_or_else(|| {
            ChannelError::ValidationError("shopclub orders need extend params".to_string())
        })?;
        validate_amount(amount)?;
        validate_url(callback_url, "callback URL")?;
        validate_url(&extend.success_url, "success URL")?;

        let argument = PayArgument {
            mch_id: self.mch_id,
            pay_code: extend.pay_code,
            order_no: order_number.to_string(),
            price: to_minor_units(amount)?,
            app_id: self.app_id,
            user_ip: extend.user_ip.clone(),
            user_id: extend.user_id.to_string(),
            pay_notice_url: callback_url.to_string(),
            pay_jump_url: extend.success_url.clone(),
            time: Utc::now().timestamp(),
            sign: String::new(),
        }
        .signed(&self.secret);

        tracing::info!(
            channel = %self.key,
            order_number,
            price = argument.price,
            "Creating shopclub order"
        );

        let request = self
            .client
            .post(format!("{}/payApi/PayApi/CreateOrder", self.host))
            .json(&argument);
        let response: PayResponse = send_json(request, "shopclub").await?;

        response.into_link()
    }
}
