use crate::domain::channel::ChannelKey;
use crate::domain::ports::{AdapterBox, ChannelRegistry, TemplateFactory};
use crate::error::{ChannelError, Result};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

const INIT_CAPACITY: usize = 10;

struct Channels {
    adapters: HashMap<ChannelKey, AdapterBox>,
    templates: HashMap<ChannelKey, TemplateFactory>,
}

/// A thread-safe in-memory channel registry.
///
/// Both maps sit behind a single `RwLock`: registration takes the write lock so
/// an adapter and its template become visible together, lookups share the read
/// lock and never block each other.
pub struct InMemoryChannelRegistry {
    channels: RwLock<Channels>,
}

impl Default for InMemoryChannelRegistry {
    fn default() -> Self {
        Self {
            channels: RwLock::new(Channels {
                adapters: HashMap::with_capacity(INIT_CAPACITY),
                templates: HashMap::with_capacity(INIT_CAPACITY),
            }),
        }
    }
}

impl InMemoryChannelRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of every registered channel, sorted.
    pub fn keys(&self) -> Vec<ChannelKey> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<ChannelKey> = channels.adapters.keys().copied().collect();
        keys.sort();
        keys
    }
}

// Writers only ever insert complete entries, so a poisoned lock still guards
// consistent maps and is recovered instead of surfaced.
impl ChannelRegistry for InMemoryChannelRegistry {
    fn register(&self, adapter: AdapterBox) -> Result<()> {
        let key = adapter.key();
        if key.is_sentinel() {
            return Err(ChannelError::InvalidChannel(format!(
                "channel key {key} is reserved"
            )));
        }

        let mut channels = self.channels.write().unwrap_or_else(PoisonError::into_inner);
        if channels.adapters.contains_key(&key) {
            return Err(ChannelError::DuplicateChannel(key));
        }

        if let Some(factory) = adapter.callback_mode().template_factory() {
            channels.templates.insert(key, factory);
        }
        channels.adapters.insert(key, adapter);

        tracing::info!("Registered payment channel {}", key);
        Ok(())
    }

    fn resolve_adapter(&self, key: ChannelKey) -> Result<AdapterBox> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .adapters
            .get(&key)
            .cloned()
            .ok_or(ChannelError::ChannelNotFound(key))
    }

    fn resolve_template(&self, key: ChannelKey) -> Result<TemplateFactory> {
        let channels = self.channels.read().unwrap_or_else(PoisonError::into_inner);
        channels
            .templates
            .get(&key)
            .copied()
            .ok_or(ChannelError::ChannelNotFound(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{ExtendParams, PaymentLink};
    use crate::domain::ports::{CallbackMode, CallbackTemplate, ChannelAdapter};
    use crate::domain::status::PaidStatus;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    #[derive(Default)]
    struct NullTemplate;

    impl CallbackTemplate for NullTemplate {
        fn decode(&mut self, _body: &[u8]) -> Result<()> {
            Ok(())
        }
        fn verify(&self, _secret: &str) -> Result<()> {
            Ok(())
        }
        fn order_number(&self) -> &str {
            ""
        }
        fn outcome(&self) -> PaidStatus {
            PaidStatus::PaidUnknown
        }
        fn real_paid_amount(&self) -> Decimal {
            Decimal::ZERO
        }
        fn acknowledgement(&self) -> String {
            String::new()
        }
    }

    fn null_template() -> Box<dyn CallbackTemplate> {
        Box::new(NullTemplate)
    }

    struct StubAdapter {
        key: ChannelKey,
        secret: &'static str,
        mode: CallbackMode,
    }

    #[async_trait]
    impl ChannelAdapter for StubAdapter {
        fn key(&self) -> ChannelKey {
            self.key
        }
        fn secret(&self) -> &str {
            self.secret
        }
        fn callback_mode(&self) -> CallbackMode {
            self.mode
        }
        fn generate_order_number(&self, internal_id: i64, _amount: Decimal) -> String {
            internal_id.to_string()
        }
        async fn create_order(
            &self,
            _order_number: &str,
            _amount: Decimal,
            _callback_url: &str,
            _extend: Option<&ExtendParams>,
        ) -> Result<PaymentLink> {
            Err(ChannelError::NotSupported)
        }
    }

    fn stub(key: ChannelKey, secret: &'static str, mode: CallbackMode) -> AdapterBox {
        Arc::new(StubAdapter { key, secret, mode })
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = InMemoryChannelRegistry::new();
        registry
            .register(stub(ChannelKey::EPay, "s1", CallbackMode::Notify(null_template)))
            .unwrap();

        let adapter = registry.resolve_adapter(ChannelKey::EPay).unwrap();
        assert_eq!(adapter.identity(), (ChannelKey::EPay, "s1"));
        assert!(registry.resolve_template(ChannelKey::EPay).is_ok());
        assert_eq!(registry.keys(), vec![ChannelKey::EPay]);
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let registry = InMemoryChannelRegistry::new();
        registry
            .register(stub(ChannelKey::EPay, "first", CallbackMode::Notify(null_template)))
            .unwrap();

        let second = registry.register(stub(ChannelKey::EPay, "second", CallbackMode::Poll));
        assert!(matches!(
            second,
            Err(ChannelError::DuplicateChannel(ChannelKey::EPay))
        ));

        let adapter = registry.resolve_adapter(ChannelKey::EPay).unwrap();
        assert_eq!(adapter.secret(), "first");
        assert!(registry.resolve_template(ChannelKey::EPay).is_ok());
    }

    #[test]
    fn test_sentinel_key_rejected() {
        let registry = InMemoryChannelRegistry::new();
        let result = registry.register(stub(ChannelKey::All, "s", CallbackMode::Poll));
        assert!(matches!(result, Err(ChannelError::InvalidChannel(_))));
        assert!(registry.keys().is_empty());
    }

    #[test]
    fn test_polling_channel_has_no_template() {
        let registry = InMemoryChannelRegistry::new();
        registry
            .register(stub(ChannelKey::Bank, "s", CallbackMode::Poll))
            .unwrap();

        assert!(registry.resolve_adapter(ChannelKey::Bank).is_ok());
        assert!(matches!(
            registry.resolve_template(ChannelKey::Bank),
            Err(ChannelError::ChannelNotFound(ChannelKey::Bank))
        ));
    }

    #[test]
    fn test_unregistered_key_not_found() {
        let registry = InMemoryChannelRegistry::new();
        assert!(matches!(
            registry.resolve_adapter(ChannelKey::Kab),
            Err(ChannelError::ChannelNotFound(ChannelKey::Kab))
        ));
        assert!(matches!(
            registry.resolve_template(ChannelKey::Kab),
            Err(ChannelError::ChannelNotFound(ChannelKey::Kab))
        ));
    }

    #[test]
    fn test_concurrent_registration_accepts_exactly_one() {
        let registry = Arc::new(InMemoryChannelRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    registry
                        .register(stub(ChannelKey::Kab, "s", CallbackMode::Notify(null_template)))
                        .is_ok()
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(accepted, 1);
        assert!(registry.resolve_adapter(ChannelKey::Kab).is_ok());
    }
}
