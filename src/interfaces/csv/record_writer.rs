use crate::domain::channel::ChannelKey;
use crate::domain::money::fixed2;
use crate::domain::record::{ChargeAttempt, Settlement};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct SettlementRow<'a> {
    channel: ChannelKey,
    order_no: &'a str,
    real_amount: String,
    error: &'a str,
}

#[derive(Serialize)]
struct AttemptRow<'a> {
    internal_id: i64,
    order_no: &'a str,
    error: &'a str,
}

const SETTLEMENT_HEADER: [&str; 4] = ["channel", "order_no", "real_amount", "error"];
const ATTEMPT_HEADER: [&str; 3] = ["internal_id", "order_no", "error"];

/// Writes ledger contents as CSV. Amounts always carry two decimals.
///
/// The header is written even for an empty ledger.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    /// `channel,order_no,real_amount,error`
    pub fn write_settlements(&mut self, settlements: &[Settlement]) -> Result<()> {
        self.writer.write_record(SETTLEMENT_HEADER)?;
        for settlement in settlements {
            self.writer.serialize(SettlementRow {
                channel: settlement.channel,
                order_no: &settlement.order_number,
                real_amount: fixed2(settlement.real_amount),
                error: settlement.error.as_deref().unwrap_or_default(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// `internal_id,order_no,error`
    pub fn write_attempts(&mut self, attempts: &[ChargeAttempt]) -> Result<()> {
        self.writer.write_record(ATTEMPT_HEADER)?;
        for attempt in attempts {
            self.writer.serialize(AttemptRow {
                internal_id: attempt.internal_id,
                order_no: &attempt.order_number,
                error: attempt.error.as_deref().unwrap_or_default(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_settlements() {
        let settlements = vec![
            Settlement {
                channel: ChannelKey::EPay,
                order_number: "A".to_string(),
                real_amount: dec!(10.5),
                error: None,
            },
            Settlement {
                channel: ChannelKey::EPayRuble,
                order_number: "B".to_string(),
                real_amount: dec!(0),
                error: Some("Payment failed: declined".to_string()),
            },
        ];

        let mut out = Vec::new();
        RecordWriter::new(&mut out).write_settlements(&settlements).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "channel,order_no,real_amount,error\n3,A,10.50,\n7,B,0.00,Payment failed: declined\n"
        );
    }

    #[test]
    fn test_write_attempts() {
        let attempts = vec![ChargeAttempt {
            internal_id: 4,
            order_number: "C".to_string(),
            error: None,
        }];

        let mut out = Vec::new();
        RecordWriter::new(&mut out).write_attempts(&attempts).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "internal_id,order_no,error\n4,C,\n");
    }

    #[test]
    fn test_empty_ledger_writes_header_only() {
        let mut out = Vec::new();
        RecordWriter::new(&mut out).write_settlements(&[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "channel,order_no,real_amount,error\n"
        );
    }
}
