use crate::domain::channel::ChannelKey;
use crate::domain::ports::{Accessor, RecordLedger};
use crate::domain::record::{ChargeAttempt, Settlement};
use crate::error::{ChannelError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Column Family for charge attempts, keyed by a big-endian sequence number.
pub const CF_ATTEMPTS: &str = "attempts";
/// Column Family for settlements, keyed by order number.
pub const CF_SETTLEMENTS: &str = "settlements";

/// A persistent accessor backed by RocksDB.
///
/// Attempts and settlements live in separate Column Families. Attempt keys
/// continue the sequence found on disk, so reopening a database appends
/// after the existing records.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBAccessor {
    db: Arc<DB>,
    next_attempt: Arc<AtomicU64>,
    // Serializes the check-then-put on settlements.
    settle_lock: Arc<Mutex<()>>,
}

impl RocksDBAccessor {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("attempts" and "settlements") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_attempts = ColumnFamilyDescriptor::new(CF_ATTEMPTS, Options::default());
        let cf_settlements = ColumnFamilyDescriptor::new(CF_SETTLEMENTS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_attempts, cf_settlements])?;
        let next_attempt = last_sequence(&db)?.map_or(0, |last| last + 1);

        Ok(Self {
            db: Arc::new(db),
            next_attempt: Arc::new(AtomicU64::new(next_attempt)),
            settle_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| internal(format!("{name} column family not found")))
    }

    fn read_all<T: DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let cf = self.cf(name)?;
        let mut records = Vec::new();

        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(
                serde_json::from_slice(&value)
                    .map_err(|e| internal(format!("Deserialization error: {e}")))?,
            );
        }

        Ok(records)
    }
}

fn last_sequence(db: &DB) -> Result<Option<u64>> {
    let cf = db
        .cf_handle(CF_ATTEMPTS)
        .ok_or_else(|| internal(format!("{CF_ATTEMPTS} column family not found")))?;

    match db.iterator_cf(cf, IteratorMode::End).next() {
        Some(item) => {
            let (key, _value) = item?;
            let bytes: [u8; 8] = key
                .as_ref()
                .try_into()
                .map_err(|_| internal("Malformed attempt key".to_string()))?;
            Ok(Some(u64::from_be_bytes(bytes)))
        }
        None => Ok(None),
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| internal(format!("Serialization error: {e}")))
}

fn internal(message: String) -> ChannelError {
    ChannelError::InternalError(Box::new(std::io::Error::other(message)))
}

#[async_trait]
impl Accessor for RocksDBAccessor {
    async fn set_record_started(
        &self,
        internal_id: i64,
        order_number: &str,
        err: Option<&ChannelError>,
    ) -> Result<()> {
        let cf = self.cf(CF_ATTEMPTS)?;
        let attempt = ChargeAttempt {
            internal_id,
            order_number: order_number.to_string(),
            error: err.map(ToString::to_string),
        };

        let key = self.next_attempt.fetch_add(1, Ordering::SeqCst).to_be_bytes();
        self.db.put_cf(cf, key, encode(&attempt)?)?;

        Ok(())
    }

    async fn set_record_finish(
        &self,
        channel: ChannelKey,
        order_number: &str,
        real_amount: Decimal,
        err: Option<&ChannelError>,
    ) -> Result<()> {
        let _guard = self.settle_lock.lock().await;
        let cf = self.cf(CF_SETTLEMENTS)?;

        // Pinned read: only existence matters here.
        if self.db.get_pinned_cf(cf, order_number.as_bytes())?.is_some() {
            return Err(ChannelError::DuplicateSettlement(order_number.to_string()));
        }

        let settlement = Settlement {
            channel,
            order_number: order_number.to_string(),
            real_amount,
            error: err.map(ToString::to_string),
        };
        self.db.put_cf(cf, order_number.as_bytes(), encode(&settlement)?)?;

        Ok(())
    }
}

#[async_trait]
impl RecordLedger for RocksDBAccessor {
    async fn attempts(&self) -> Result<Vec<ChargeAttempt>> {
        self.read_all(CF_ATTEMPTS)
    }

    async fn settlements(&self) -> Result<Vec<Settlement>> {
        self.read_all(CF_SETTLEMENTS)
    }
}
