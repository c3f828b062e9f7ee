//! Gateway configuration, loaded from a JSON file.
//!
//! ```json
//! {
//!   "callback_base_url": "https://pay.example.com/notify",
//!   "labels": { "3": "E-Pay" },
//!   "channels": [
//!     { "provider": "mgp", "host": "https://mgp.example.com", "secret": "...",
//!       "merchant_no": "M-1" },
//!     { "provider": "shopclub", "key": 7, "host": "https://club.example.com",
//!       "secret": "...", "mch_id": 152, "app_id": 52 },
//!     { "provider": "kab", "host": "https://kab.example.com", "api_key": "...",
//!       "channel_code": "97" }
//!   ]
//! }
//! ```

use crate::domain::channel::{ChannelKey, ChannelLabels};
use crate::domain::order::validate_url;
use crate::domain::ports::{AdapterBox, ChannelRegistry};
use crate::error::{ChannelError, Result};
use crate::infrastructure::providers::kab::KabAdapter;
use crate::infrastructure::providers::mgp::{CHANNEL_TYPE_ECUADOR, MgpAdapter};
use crate::infrastructure::providers::shopclub::ShopClubAdapter;
use crate::infrastructure::registry::InMemoryChannelRegistry;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_channel_type() -> String {
    CHANNEL_TYPE_ECUADOR.to_string()
}

#[derive(Debug, Deserialize)]
pub struct GatewayConfig {
    /// Public URL the webhook routes are mounted under.
    pub callback_base_url: String,
    /// Label overrides layered on the built-in channel names.
    #[serde(default)]
    pub labels: HashMap<ChannelKey, String>,
    pub channels: Vec<ChannelConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum ChannelConfig {
    Mgp {
        host: String,
        secret: String,
        merchant_no: String,
        #[serde(default = "default_channel_type")]
        channel_type: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Shopclub {
        key: ChannelKey,
        host: String,
        secret: String,
        mch_id: i64,
        app_id: i64,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Kab {
        host: String,
        api_key: String,
        channel_code: String,
        #[serde(default)]
        pay_method: Option<String>,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ChannelConfig {
    pub fn timeout_secs(&self) -> u64 {
        match self {
            Self::Mgp { timeout_secs, .. }
            | Self::Shopclub { timeout_secs, .. }
            | Self::Kab { timeout_secs, .. } => *timeout_secs,
        }
    }

    pub fn build_adapter(&self) -> Result<AdapterBox> {
        let adapter: AdapterBox = match self {
            Self::Mgp {
                host,
                secret,
                merchant_no,
                channel_type,
                timeout_secs,
            } => Arc::new(MgpAdapter::new(
                host,
                secret,
                merchant_no,
                channel_type,
                Duration::from_secs(*timeout_secs),
            )?),
            Self::Shopclub {
                key,
                host,
                secret,
                mch_id,
                app_id,
                timeout_secs,
            } => Arc::new(ShopClubAdapter::new(
                *key,
                host,
                secret,
                *mch_id,
                *app_id,
                Duration::from_secs(*timeout_secs),
            )?),
            Self::Kab {
                host,
                api_key,
                channel_code,
                pay_method,
                timeout_secs,
            } => Arc::new(KabAdapter::new(
                host,
                api_key,
                channel_code,
                pay_method.clone(),
                Duration::from_secs(*timeout_secs),
            )?),
        };
        Ok(adapter)
    }
}

impl GatewayConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ChannelError::ConfigError(format!("invalid config: {e}")))?;

        validate_url(&config.callback_base_url, "callback base URL")
            .map_err(|e| ChannelError::ConfigError(e.to_string()))?;

        // A zero timeout would fail every outbound call.
        if let Some(index) = config.channels.iter().position(|c| c.timeout_secs() == 0) {
            return Err(ChannelError::ConfigError(format!(
                "channels[{index}]: timeout_secs must be positive"
            )));
        }

        Ok(config)
    }

    /// Registers every configured channel. A key configured twice fails the
    /// whole build.
    pub fn build_registry(&self) -> Result<InMemoryChannelRegistry> {
        let registry = InMemoryChannelRegistry::new();
        for channel in &self.channels {
            registry.register(channel.build_adapter()?)?;
        }
        Ok(registry)
    }

    pub fn labels(&self) -> ChannelLabels {
        ChannelLabels::with_overrides(self.labels.clone())
    }
}
