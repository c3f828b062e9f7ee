use crate::domain::money::{deserialize_lenient, fixed2, from_minor_units};
use crate::domain::order::PaymentLink;
use crate::domain::ports::CallbackTemplate;
use crate::domain::signing::{digests_match, md5_hex};
use crate::domain::status::PaidStatus;
use crate::error::{ChannelError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STATUS_OK: i64 = 1;
const ACK: &str = "ok";

/// `md5(u + id + je + sp + api_key)` over the already-escaped values.
pub fn request_signature(
    channel_code: &str,
    order_no: &str,
    cents: &str,
    description: &str,
    api_key: &str,
) -> String {
    md5_hex(&[channel_code, order_no, cents, description, api_key].concat())
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct ChargeResponse {
    pub status: i64,
    pub message: String,
    pub data: Value,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ChargeResponseData {
    pay_url: String,
}

impl ChargeResponse {
    pub fn into_link(self) -> Result<PaymentLink> {
        if self.status != STATUS_OK {
            return Err(ChannelError::ProviderRejection(format!(
                "status {}: {}",
                self.status, self.message
            )));
        }

        let data: ChargeResponseData = serde_json::from_value(self.data)
            .map_err(|e| ChannelError::DecodeError(format!("kab response data: {e}")))?;
        if data.pay_url.is_empty() {
            return Err(ChannelError::DecodeError(
                "kab response carries no pay_url".to_string(),
            ));
        }

        Ok(PaymentLink::Url(data.pay_url))
    }
}

/// Settlement notification, delivered as a GET query and re-assembled into
/// JSON before decoding. Amounts are in cents.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PayNotification {
    pub orderid: String,
    #[serde(deserialize_with = "deserialize_lenient")]
    pub amount: Decimal,
    pub payno: String,
    pub sign: String,
}

impl PayNotification {
    pub fn signature(&self, api_key: &str) -> String {
        md5_hex(&[self.orderid.as_str(), &fixed2(self.amount), &self.payno, api_key].concat())
    }
}

impl CallbackTemplate for PayNotification {
    fn decode(&mut self, body: &[u8]) -> Result<()> {
        *self = serde_json::from_slice(body)
            .map_err(|e| ChannelError::DecodeError(format!("kab notification: {e}")))?;
        Ok(())
    }

    fn verify(&self, secret: &str) -> Result<()> {
        if digests_match(&self.signature(secret), &self.sign) {
            Ok(())
        } else {
            Err(ChannelError::SignatureError)
        }
    }

    fn order_number(&self) -> &str {
        &self.orderid
    }

    /// The provider only ever notifies completed transfers.
    fn outcome(&self) -> PaidStatus {
        PaidStatus::Paid
    }

    fn real_paid_amount(&self) -> Decimal {
        from_minor_units(self.amount)
    }

    fn acknowledgement(&self) -> String {
        ACK.to_string()
    }
}

pub fn new_notification() -> Box<dyn CallbackTemplate> {
    Box::new(PayNotification::default())
}
