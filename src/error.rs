use crate::domain::channel::ChannelKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Transport error: {0}")]
    TransportError(String),
    #[error("Decode error: {0}")]
    DecodeError(String),
    #[error("Provider rejected the request: {0}")]
    ProviderRejection(String),
    #[error("Signature mismatch")]
    SignatureError,
    #[error("Notification for order {signed} was delivered to order {addressed}")]
    OrderMismatch { addressed: String, signed: String },
    #[error("Channel {0} is not registered")]
    ChannelNotFound(ChannelKey),
    #[error("Channel {0} is already registered")]
    DuplicateChannel(ChannelKey),
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),
    #[error("Operation not supported by this channel")]
    NotSupported,
    #[error("Payment failed: {0}")]
    PaymentFailed(String),
    #[error("Order {0} is already settled")]
    DuplicateSettlement(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDbError(#[from] rocksdb::Error),
}

impl ChannelError {
    /// True when the channel simply does not offer the operation, as opposed to
    /// the operation failing at runtime.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported)
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;
