use crate::error::ChannelError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Identifies a provider + payment method pairing.
///
/// The integer values are part of the callback URL contract
/// (`{base}/{key}/{order}`), so they must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(i32)]
pub enum ChannelKey {
    /// Reserved sentinel meaning "no channel"; never registrable.
    All = 0,
    Erc20 = 1,
    Trc20 = 2,
    EPay = 3,
    Bank = 4,
    Kab = 5,
    Merchant = 6,
    EPayRuble = 7,
    EPayUsdt = 8,
    ProxyRur = 9,
    ProxyUsdt = 10,
}

impl ChannelKey {
    pub const ALL_KEYS: [ChannelKey; 11] = [
        Self::All,
        Self::Erc20,
        Self::Trc20,
        Self::EPay,
        Self::Bank,
        Self::Kab,
        Self::Merchant,
        Self::EPayRuble,
        Self::EPayUsdt,
        Self::ProxyRur,
        Self::ProxyUsdt,
    ];

    pub fn value(self) -> i32 {
        self as i32
    }

    pub fn is_sentinel(self) -> bool {
        self == Self::All
    }

    /// Channels whose provider notifies with a GET query on the distinguished
    /// `/callback/` route instead of POSTing a body.
    pub fn notifies_by_query(self) -> bool {
        self == Self::Kab
    }
}

impl TryFrom<i32> for ChannelKey {
    type Error = ChannelError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::ALL_KEYS
            .into_iter()
            .find(|key| key.value() == value)
            .ok_or_else(|| ChannelError::InvalidChannel(format!("unknown channel key {value}")))
    }
}

impl std::str::FromStr for ChannelKey {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i32 = s
            .trim()
            .parse()
            .map_err(|_| ChannelError::InvalidChannel(format!("not a channel key: {s:?}")))?;
        Self::try_from(value)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl Serialize for ChannelKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i32(self.value())
    }
}

impl<'de> Deserialize<'de> for ChannelKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i32::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Human readable names for channels, used in diagnostics.
///
/// Held as plain data so deployments can override or translate labels through
/// configuration instead of a process-wide table.
#[derive(Debug, Clone)]
pub struct ChannelLabels {
    labels: HashMap<ChannelKey, String>,
}

impl Default for ChannelLabels {
    fn default() -> Self {
        let labels = ChannelKey::ALL_KEYS
            .into_iter()
            .map(|key| {
                let label = match key {
                    ChannelKey::All => "All",
                    ChannelKey::Erc20 => "ERC20",
                    ChannelKey::Trc20 => "TRC20",
                    ChannelKey::EPay => "E-Pay",
                    ChannelKey::Bank => "Bank card transfer",
                    ChannelKey::Kab => "KAB fiat transfer",
                    ChannelKey::Merchant => "Merchant channel",
                    ChannelKey::EPayRuble => "E-Pay (RUB)",
                    ChannelKey::EPayUsdt => "E-Pay (USDT)",
                    ChannelKey::ProxyRur => "ProxyPay RUR",
                    ChannelKey::ProxyUsdt => "ProxyPay USDT",
                };
                (key, label.to_string())
            })
            .collect();
        Self { labels }
    }
}

impl ChannelLabels {
    pub const UNKNOWN: &'static str = "Unknown";

    /// Default labels with `overrides` layered on top.
    pub fn with_overrides(overrides: impl IntoIterator<Item = (ChannelKey, String)>) -> Self {
        let mut labels = Self::default();
        labels.labels.extend(overrides);
        labels
    }

    pub fn label(&self, key: ChannelKey) -> &str {
        self.labels
            .get(&key)
            .map(String::as_str)
            .unwrap_or(Self::UNKNOWN)
    }
}
