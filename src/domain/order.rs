use crate::error::{ChannelError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use url::Url;

/// Extra order-creation inputs. Only the shop-club E-Pay family needs them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtendParams {
    pub pay_code: i64,
    pub user_id: i64,
    pub user_ip: String,
    /// Where the payer is redirected after a successful payment.
    pub success_url: String,
}

/// What the payer has to be shown to complete a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PaymentLink {
    /// Redirect the payer to this URL.
    Url(String),
    /// Render this HTML form (it usually auto-submits to the provider).
    Html(String),
}

impl PaymentLink {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(value) | Self::Html(value) => value,
        }
    }
}

pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(ChannelError::ValidationError(format!(
            "order amount must be positive, got {amount}"
        )))
    }
}

/// Accepts absolute http(s) URLs with a host.
pub fn validate_url(raw: &str, what: &str) -> Result<()> {
    let invalid = || ChannelError::ValidationError(format!("invalid {what} [{raw}]"));

    let parsed = Url::parse(raw).map_err(|_| invalid())?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(invalid());
    }

    Ok(())
}
