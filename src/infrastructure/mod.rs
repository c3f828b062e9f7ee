//! Adapters behind the domain ports: the channel registry, the record
//! accessors and the provider integrations.

pub mod in_memory;
pub mod providers;
pub mod registry;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
