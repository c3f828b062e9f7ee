//! Concrete payment provider integrations.
//!
//! Each provider lives in its own module: `model` holds the wire types and
//! their signing, `mod.rs` the [`ChannelAdapter`](crate::domain::ports::ChannelAdapter)
//! implementation.

pub mod http;
pub mod kab;
pub mod mgp;
pub mod shopclub;

use crate::domain::money::fixed2;
use rust_decimal::Decimal;
use ulid::Ulid;

/// Longest order number the E-Pay family accepts.
pub const ORDER_NO_MAX_LENGTH: usize = 36;

/// A fresh 26-character, time-ordered order number.
pub fn unique_order_number() -> String {
    Ulid::new().to_string()
}

/// A unique order number with the two-decimal amount appended, cut so the
/// whole value fits in [`ORDER_NO_MAX_LENGTH`].
pub fn amount_suffixed_order_number(amount: Decimal) -> String {
    let mut order_number = unique_order_number();
    let room = ORDER_NO_MAX_LENGTH - order_number.len();
    order_number.extend(fixed2(amount).chars().take(room));
    order_number
}

pub(crate) fn trim_host(host: &str) -> String {
    host.trim_end_matches('/').to_string()
}
