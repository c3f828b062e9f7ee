use crate::domain::money::{deserialize_lenient, fixed2, normalized};
use crate::domain::order::PaymentLink;
use crate::domain::ports::CallbackTemplate;
use crate::domain::signing::{SignParams, SigningRule, digests_match};
use crate::domain::status::PaidStatus;
use crate::error::{ChannelError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const VERSION: &str = "V2";
pub const SIGN_TYPE: &str = "MD5";

/// Secret appended to the value of the last sorted parameter, lowercase hex.
pub const RULE: SigningRule = SigningRule::append_to_last_value();

const STATUS_SUCCESS: &str = "1";
const STATUS_FAIL: &str = "2";
const STATUS_PROCESSING: &str = "0";

const ACK: &str = "SUCCESS";

/// Body of `POST /api/pay/V2`.
#[derive(Serialize, Debug, Clone)]
pub struct PayArgument {
    pub version: &'static str,
    #[serde(rename = "signType")]
    pub sign_type: &'static str,
    #[serde(rename = "merchantNo")]
    pub merchant_no: String,
    /// `yyyyMMddHHmmss` in Ecuador time.
    pub date: String,
    // The provider's API spells it this way.
    #[serde(rename = "channleType")]
    pub channel_type: String,
    pub sign: String,
    #[serde(rename = "noticeUrl")]
    pub notice_url: String,
    #[serde(rename = "orderNo")]
    pub order_no: String,
    #[serde(rename = "bizAmt")]
    pub amount: String,
}

impl PayArgument {
    pub fn new(
        merchant_no: &str,
        notice_url: &str,
        order_no: &str,
        amount: Decimal,
        channel_type: &str,
        date: String,
    ) -> Self {
        Self {
            version: VERSION,
            sign_type: SIGN_TYPE,
            merchant_no: merchant_no.to_string(),
            date,
            channel_type: channel_type.to_string(),
            sign: String::new(),
            notice_url: notice_url.to_string(),
            order_no: order_no.to_string(),
            amount: normalized(amount),
        }
    }

    pub fn params(&self) -> SignParams {
        SignParams::new()
            .with("version", self.version)
            .with("signType", self.sign_type)
            .with("merchantNo", self.merchant_no.as_str())
            .with("date", self.date.as_str())
            .with("channleType", self.channel_type.as_str())
            .with("noticeUrl", self.notice_url.as_str())
            .with("orderNo", self.order_no.as_str())
            .with("bizAmt", self.amount.as_str())
    }

    pub fn signed(mut self, secret: &str) -> Self {
        self.sign = self.params().sign(secret, RULE);
        self
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PayResponse {
    /// `"0"` on success.
    pub code: String,
    pub msg: String,
    pub detail: PayResponseDetail,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct PayResponseDetail {
    #[serde(rename = "PayHtml")]
    pub pay_html: String,
    #[serde(rename = "PayURL")]
    pub pay_url: String,
}

impl PayResponse {
    /// A redirect URL wins over an HTML form.
    pub fn into_link(self) -> Result<PaymentLink> {
        if self.code != "0" {
            return Err(ChannelError::ProviderRejection(format!(
                "code {}: {}",
                self.code, self.msg
            )));
        }

        if !self.detail.pay_url.is_empty() {
            Ok(PaymentLink::Url(self.detail.pay_url))
        } else if !self.detail.pay_html.is_empty() {
            Ok(PaymentLink::Html(self.detail.pay_html))
        } else {
            Err(ChannelError::DecodeError(
                "response carries neither PayURL nor PayHtml".to_string(),
            ))
        }
    }
}

/// Asynchronous payment notification.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(default)]
pub struct PayNotification {
    #[serde(rename = "orderNo")]
    pub order_no: String,
    #[serde(rename = "orderAmt", deserialize_with = "deserialize_lenient")]
    pub order_amount: Decimal,
    #[serde(rename = "bizAmt", deserialize_with = "deserialize_lenient")]
    pub pay_amount: Decimal,
    pub status: String,
    pub remark: String,
    pub version: String,
    pub date: String,
    /// Echoed back from the order; only signed when present.
    pub notes: String,
    pub sign: String,
}

impl PayNotification {
    pub fn params(&self) -> SignParams {
        let mut params = SignParams::new()
            .with("orderNo", self.order_no.as_str())
            .with("orderAmt", fixed2(self.order_amount))
            .with("bizAmt", fixed2(self.pay_amount))
            .with("status", self.status.as_str())
            .with("remark", self.remark.as_str())
            .with("version", self.version.as_str())
            .with("date", self.date.as_str());
        if !self.notes.is_empty() {
            params.set("notes", self.notes.as_str());
        }
        params
    }
}

impl CallbackTemplate for PayNotification {
    fn decode(&mut self, body: &[u8]) -> Result<()> {
        *self = serde_json::from_slice(body)
            .map_err(|e| ChannelError::DecodeError(format!("mgp notification: {e}")))?;
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
        match self.status.as_str() {
            STATUS_SUCCESS => PaidStatus::Paid,
            STATUS_FAIL => PaidStatus::PaidFail,
            STATUS_PROCESSING => PaidStatus::PaidProcessing,
            _ => PaidStatus::PaidUnknown,
        }
    }

    fn real_paid_amount(&self) -> Decimal {
        self.pay_amount
    }

    fn acknowledgement(&self) -> String {
        match self.outcome() {
            PaidStatus::Paid | PaidStatus::PaidFail => ACK.to_string(),
            _ => String::new(),
        }
    }
}

pub fn new_notification() -> Box<dyn CallbackTemplate> {
    Box::new(PayNotification::default())
}
