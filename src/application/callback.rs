use crate::domain::channel::{ChannelKey, ChannelLabels};
use crate::domain::ports::{AccessorBox, CallbackTemplate, RegistryBox};
use crate::domain::status::PaidStatus;
use crate::error::{ChannelError, Result};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

/// Path segment that marks query-style callback routes.
pub const CALLBACK_SEGMENT: &str = "callback";

/// The URL a provider is told to notify for one order:
/// `{base}/{key}/{order}`, or `{base}/callback/{key}/{order}` for channels
/// that notify with a GET query.
pub fn callback_url(base: &str, channel: ChannelKey, order_number: &str) -> String {
    let base = base.trim_end_matches('/');
    if channel.notifies_by_query() {
        format!("{base}/{CALLBACK_SEGMENT}/{channel}/{order_number}")
    } else {
        format!("{base}/{channel}/{order_number}")
    }
}

/// What happened to a notification once it was handled.
#[derive(Debug)]
pub enum Disposition {
    /// Verified and recorded as paid with the amount actually received.
    SettledPaid(Decimal),
    /// Verified and recorded as failed.
    SettledFailed,
    /// Verified but not final; nothing was recorded.
    Acknowledged(PaidStatus),
    RejectedAtDecode(ChannelError),
    RejectedAtVerify(ChannelError),
}

/// Reply to send back to the provider: always HTTP 200 with `body`.
#[derive(Debug)]
pub struct CallbackReply {
    pub body: String,
    pub disposition: Disposition,
}

impl CallbackReply {
    pub fn error(&self) -> Option<&ChannelError> {
        match &self.disposition {
            Disposition::RejectedAtDecode(err) | Disposition::RejectedAtVerify(err) => Some(err),
            _ => None,
        }
    }
}

/// Turns provider notifications into settlements.
///
/// Each notification is decoded into a fresh template from the channel's
/// factory, verified with the adapter's secret, and only a verified terminal
/// outcome reaches the [`Accessor`](crate::domain::ports::Accessor).
pub struct CallbackProcessor {
    registry: RegistryBox,
    accessor: AccessorBox,
    labels: ChannelLabels,
}

impl CallbackProcessor {
    pub fn new(registry: RegistryBox, accessor: AccessorBox) -> Self {
        Self {
            registry,
            accessor,
            labels: ChannelLabels::default(),
        }
    }

    pub fn with_labels(mut self, labels: ChannelLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Handles a notification body.
    ///
    /// Only an unknown channel is an `Err`: every other outcome, rejections
    /// included, yields the acknowledgement body the provider expects.
    pub async fn process(
        &self,
        channel: ChannelKey,
        order_number: &str,
        body: &[u8],
    ) -> Result<CallbackReply> {
        let factory = self.registry.resolve_template(channel)?;
        let adapter = self.registry.resolve_adapter(channel)?;
        let label = self.labels.label(channel);

        let mut template = factory();

        if let Err(err) = template.decode(body) {
            tracing::warn!(%channel, label, order_number, error = %err, "Callback rejected at decode");
            return Ok(CallbackReply {
                body: template.acknowledgement(),
                disposition: Disposition::RejectedAtDecode(err),
            });
        }

        if let Err(err) = verify_for_order(template.as_ref(), adapter.secret(), order_number) {
            tracing::warn!(%channel, label, order_number, error = %err, "Callback rejected at verify");
            return Ok(CallbackReply {
                body: template.acknowledgement(),
                disposition: Disposition::RejectedAtVerify(err),
            });
        }

        let status = template.outcome();
        let disposition = if !status.is_terminal() {
            tracing::info!(
                %channel,
                label,
                order_number,
                code = status.code(),
                "Order not final yet"
            );
            Disposition::Acknowledged(status)
        } else if status == PaidStatus::Paid {
            let amount = template.real_paid_amount();
            self.finish(channel, order_number, amount, None).await;
            tracing::info!(%channel, label, order_number, %amount, "Order paid");
            Disposition::SettledPaid(amount)
        } else {
            let reason = ChannelError::PaymentFailed(format!(
                "{label} reported order {order_number} as failed"
            ));
            self.finish(channel, order_number, Decimal::ZERO, Some(&reason))
                .await;
            tracing::info!(%channel, label, order_number, "Order failed");
            Disposition::SettledFailed
        };

        Ok(CallbackReply {
            body: template.acknowledgement(),
            disposition,
        })
    }

    /// Handles a notification delivered as a URL query string.
    ///
    /// The pairs are re-assembled into a JSON object of strings so the
    /// channel's template decodes them like any other body.
    pub async fn process_query(
        &self,
        channel: ChannelKey,
        order_number: &str,
        query: &str,
    ) -> Result<CallbackReply> {
        let body = query_to_body(query);
        self.process(channel, order_number, body.as_bytes()).await
    }

    // The provider gets its acknowledgement regardless; a lost write is logged.
    async fn finish(
        &self,
        channel: ChannelKey,
        order_number: &str,
        amount: Decimal,
        err: Option<&ChannelError>,
    ) {
        if let Err(e) = self
            .accessor
            .set_record_finish(channel, order_number, amount, err)
            .await
        {
            tracing::error!(%channel, order_number, error = %e, "Failed to record settlement");
        }
    }
}

// The route is not covered by the signature, so a verified payload must also
// name the order it was delivered to.
fn verify_for_order(
    template: &dyn CallbackTemplate,
    secret: &str,
    order_number: &str,
) -> Result<()> {
    template.verify(secret)?;
    if template.order_number() != order_number {
        return Err(ChannelError::OrderMismatch {
            addressed: order_number.to_string(),
            signed: template.order_number().to_string(),
        });
    }
    Ok(())
}

/// `a=1&b=x%20y` becomes `{"a":"1","b":"x y"}`. Repeated keys keep the last value.
pub fn query_to_body(query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let fields: Map<String, Value> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
        .collect();
    Value::Object(fields).to_string()
}
