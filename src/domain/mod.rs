//! Domain model: channel identities, payment outcomes, money, signing and the
//! ports through which providers, registries and persistence plug in.

pub mod channel;
pub mod money;
pub mod order;
pub mod ports;
pub mod record;
pub mod signing;
pub mod status;
