//! Inbound webhook contract.
//!
//! Providers call `/{key}/{order}` with a body, or `/callback/{key}/{order}`
//! with a query string; either form may sit under a prefix. The reply is
//! always HTTP 200: the acknowledgement body the provider expects, or
//! [`FAILURE_BODY`] when the route does not name a registered channel.

use crate::application::callback::{CALLBACK_SEGMENT, CallbackProcessor, CallbackReply};
use crate::domain::channel::ChannelKey;
use crate::error::{ChannelError, Result};

pub const FAILURE_BODY: &str = "fail";

/// Where a notification was addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRoute {
    pub channel: ChannelKey,
    pub order_number: String,
    /// The notification travels in the query string, not the body.
    pub by_query: bool,
}

impl WebhookRoute {
    /// The route a channel's provider is told to call for `order_number`.
    pub fn for_channel(channel: ChannelKey, order_number: &str) -> Self {
        Self {
            channel,
            order_number: order_number.to_string(),
            by_query: channel.notifies_by_query(),
        }
    }

    /// Parses a request path (without query string).
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let [rest @ .., key, order_number] = segments.as_slice() else {
            return Err(ChannelError::ValidationError(format!(
                "webhook path {path:?} needs a channel key and an order number"
            )));
        };

        Ok(Self {
            channel: key.parse()?,
            order_number: order_number.to_string(),
            by_query: rest.last() == Some(&CALLBACK_SEGMENT),
        })
    }

    /// Hands the notification to the processor the way this route carries it.
    pub async fn deliver(
        &self,
        processor: &CallbackProcessor,
        payload: &[u8],
    ) -> Result<CallbackReply> {
        if self.by_query {
            let query = String::from_utf8_lossy(payload);
            processor
                .process_query(self.channel, &self.order_number, &query)
                .await
        } else {
            processor
                .process(self.channel, &self.order_number, payload)
                .await
        }
    }
}

/// Body of the HTTP 200 reply for a processed notification.
pub fn response_body(result: Result<CallbackReply>) -> String {
    match result {
        Ok(reply) => reply.body,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook could not be dispatched");
            FAILURE_BODY.to_string()
        }
    }
}

/// Handles one webhook request given its target (`path[?query]`) and body.
pub async fn handle(processor: &CallbackProcessor, target: &str, body: &[u8]) -> String {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    let route = match WebhookRoute::parse(path) {
        Ok(route) => route,
        Err(e) => return response_body(Err(e)),
    };
    let payload = if route.by_query { query.as_bytes() } else { body };

    response_body(route.deliver(processor, payload).await)
}
