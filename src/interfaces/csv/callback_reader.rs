use crate::domain::channel::ChannelKey;
use crate::error::{ChannelError, Result};
use serde::Deserialize;
use std::io::Read;

/// One recorded provider notification.
///
/// `payload` is the raw body for body-style channels and the raw query string
/// for channels that notify by query.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CallbackRecord {
    pub channel: ChannelKey,
    pub order_no: String,
    pub payload: String,
}

/// Reads recorded notifications from a CSV source with a
/// `channel,order_no,payload` header.
pub struct CallbackReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CallbackReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes the records; a malformed row yields an `Err` and
    /// does not stop the iteration.
    pub fn callbacks(self) -> impl Iterator<Item = Result<CallbackRecord>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ChannelError::from))
    }
}
