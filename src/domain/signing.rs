//! MD5 request/callback signing shared by every provider.
//!
//! Providers recompute the digest on their side byte for byte, so the
//! construction here must not drift: parameters are sorted by key in byte
//! order, joined as `key=value` with `&` without any URL encoding, the secret is
//! mixed in according to the provider's [`SigningRule`], and the MD5 digest is
//! rendered as hexadecimal.

use md5::{Digest, Md5};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

/// Name of the field carrying the signature; never part of the signed payload.
pub const SIGNATURE_FIELD: &str = "sign";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretPlacement {
    /// Append `name=secret` after the sorted parameters.
    TrailingParameter(&'static str),
    /// Concatenate the secret onto the value of the last sorted parameter.
    AppendToLastValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexCase {
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningRule {
    pub secret: SecretPlacement,
    /// Upper-case the joined string before hashing.
    pub uppercase_payload: bool,
    pub digest_case: HexCase,
}

impl SigningRule {
    pub const fn append_to_last_value() -> Self {
        Self {
            secret: SecretPlacement::AppendToLastValue,
            uppercase_payload: false,
            digest_case: HexCase::Lower,
        }
    }

    pub const fn trailing_parameter(name: &'static str) -> Self {
        Self {
            secret: SecretPlacement::TrailingParameter(name),
            uppercase_payload: false,
            digest_case: HexCase::Lower,
        }
    }

    pub const fn with_uppercase_payload(mut self) -> Self {
        self.uppercase_payload = true;
        self
    }

    pub const fn with_digest_case(mut self, case: HexCase) -> Self {
        self.digest_case = case;
        self
    }
}

/// Key-sorted parameter set to be signed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignParams {
    entries: BTreeMap<String, String>,
}

impl SignParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter. The signature field itself is ignored.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        if key != SIGNATURE_FIELD {
            self.entries.insert(key, value.into());
        }
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The exact string that gets hashed.
    pub fn canonical_string(&self, secret: &str, rule: SigningRule) -> String {
        let mut pairs: Vec<String> = Vec::with_capacity(self.entries.len() + 1);
        let last = self.entries.len().saturating_sub(1);

        for (index, (key, value)) in self.entries.iter().enumerate() {
            if rule.secret == SecretPlacement::AppendToLastValue && index == last {
                pairs.push(format!("{key}={value}{secret}"));
            } else {
                pairs.push(format!("{key}={value}"));
            }
        }

        match rule.secret {
            SecretPlacement::TrailingParameter(name) => pairs.push(format!("{name}={secret}")),
            SecretPlacement::AppendToLastValue if self.entries.is_empty() => {
                pairs.push(secret.to_string())
            }
            SecretPlacement::AppendToLastValue => {}
        }

        let joined = pairs.join("&");
        if rule.uppercase_payload {
            joined.to_uppercase()
        } else {
            joined
        }
    }

    pub fn sign(&self, secret: &str, rule: SigningRule) -> String {
        render(
            Md5::digest(self.canonical_string(secret, rule).as_bytes()).as_slice(),
            rule.digest_case,
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SignParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

/// Lowercase hex MD5 of a plain string, for providers that sign a bare
/// concatenation of values.
pub fn md5_hex(source: &str) -> String {
    render(Md5::digest(source.as_bytes()).as_slice(), HexCase::Lower)
}

/// Constant-time comparison of two rendered digests.
pub fn digests_match(expected: &str, received: &str) -> bool {
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

fn render(digest: &[u8], case: HexCase) -> String {
    match case {
        HexCase::Lower => hex::encode(digest),
        HexCase::Upper => hex::encode_upper(digest),
    }
}
