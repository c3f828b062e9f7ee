use crate::domain::money::from_minor_units;
use crate::domain::order::PaymentLink;
use crate::domain::ports::CallbackTemplate;
use crate::domain::signing::{SignParams, SigningRule, digests_match};
use crate::domain::status::PaidStatus;
use crate::error::{ChannelError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `KEY=secret` appended after the sorted parameters, the whole string
/// upper-cased before hashing.
pub const RULE: SigningRule = SigningRule::trailing_parameter("key").with_uppercase_payload();

const CODE_PAID: i64 = 1;
const CODE_FAILED: i64 = 0;

const ACK: &str = "success";

/// Body of `POST /payApi/PayApi/CreateOrder`. Prices are in cents.
#[derive(Serialize, Debug, Clone)]
pub struct PayArgument {
    pub mch_id: i64,
    pub pay_code: i64,
    pub order_no: String,
    pub price: i64,
    pub app_id: i64,
    pub user_ip: String,
    pub user_id: String,
    pub pay_notice_url: String,
    pub pay_jump_url: String,
    /// Unix seconds.
    pub time: i64,
    pub sign: String,
}

impl PayArgument {
    /// `user_ip` and `user_id` travel with the request but are not signed.
    pub fn params(&self) -> SignParams {
        SignParams::new()
            .with("mch_id", self.mch_id.to_string())
            .with("pay_code", self.pay_code.to_string())
            .with("order_no", self.order_no.as_str())
            .with("price", self.price.to_string())
            .with("app_id", self.app_id.to_string())
            .with("pay_notice_url", self.pay_notice_url.as_str())
            .with("pay_jump_url", self.pay_jump_url.as_str())
            .with("time", self.time.to_string())
    }

    pub fn signed(mut self, secret: &str) -> Self {
        self.sign = self.params().sign(secret, RULE);
        self
    }
}

/// The `data` member has no fixed shape when the call fails, so it is only
/// decoded once `code` says the order exists.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PayResponse {
    pub code: i64,
    pub msg: String,
    pub data: Value,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct PayResponseData {
    pay_url: String,
}

impl PayResponse {
    pub fn into_link(self) -> Result<PaymentLink> {
        if self.code != 0 {
            return Err(ChannelError::ProviderRejection(format!(
                "code {}: {}",
                self.code, self.msg
            )));
        }

        let data: PayResponseData = serde_json::from_value(self.data)
            .map_err(|e| ChannelError::DecodeError(format!("shopclub response data: {e}")))?;
        if data.pay_url.is_empty() {
            return Err(ChannelError::DecodeError(
                "shopclub response carries no pay_url".to_string(),
            ));
        }

        Ok(PaymentLink::Url(data.pay_url))
    }
}

/// Asynchronous payment notification. Prices are in cents.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PayNotification {
    pub mch_id: i64,
    pub order_no: String,
    pub dis_order_no: String,
    pub real_price: i64,
    pub order_price: i64,
    /// UTC unix seconds.
    pub nti_time: i64,
    pub code: i64,
    pub sign: String,
}

impl PayNotification {
    pub fn params(&self) -> SignParams {
        SignParams::new()
            .with("mch_id", self.mch_id.to_string())
            .with("order_no", self.order_no.as_str())
            .with("dis_order_no", self.dis_order_no.as_str())
            .with("real_price", self.real_price.to_string())
            .with("order_price", self.order_price.to_string())
            .with("nti_time", self.nti_time.to_string())
            .with("code", self.code.to_string())
    }
}

impl CallbackTemplate for PayNotification {
    fn decode(&mut self, body: &[u8]) -> Result<()> {
        *self = serde_json::from_slice(body)
            .map_err(|e| ChannelError::DecodeError(format!("shopclub notification: {e}")))?;
        Ok(())
    }

    fn verify(&self, secret: &str) -> Result<()> {
        let expected = self.params().sign(secret, RULE);
        if digests_match(&expected, &self.sign) {
            Ok(())
        } else {
            Err(ChannelError::SignatureError)
        }
    }

    fn order_number(&self) -> &str {
        &self.order_no
    }

    fn outcome(&self) -> PaidStatus {
        match self.code {
            CODE_PAID => PaidStatus::Paid,
            CODE_FAILED => PaidStatus::PaidFail,
            _ => PaidStatus::PaidUnknown,
        }
    }

    fn real_paid_amount(&self) -> Decimal {
        from_minor_units(Decimal::from(self.real_price))
    }

    fn acknowledgement(&self) -> String {
        if self.outcome() == PaidStatus::Paid {
            ACK.to_string()
        } else {
            String::new()
        }
    }
}

pub fn new_notification() -> Box<dyn CallbackTemplate> {
    Box::new(PayNotification::default())
}
