//! Application layer: the two flows built on top of the domain ports.
//!
//! `ChargeService` creates provider orders and records each attempt;
//! `CallbackProcessor` verifies provider notifications and records the
//! settlements. Both hold only `Arc`s to the registry and the accessor, so
//! they can be shared across tasks.

pub mod callback;
pub mod charge;
