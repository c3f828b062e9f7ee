#![allow(dead_code)]

use async_trait::async_trait;
use chargechannel::domain::channel::ChannelKey;
use chargechannel::domain::ports::Accessor;
use chargechannel::domain::signing::md5_hex;
use chargechannel::error::{ChannelError, Result};
use chargechannel::infrastructure::providers::{kab, mgp, shopclub};
use rust_decimal::Decimal;
use std::io::Error;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const MGP_SECRET: &str = "2cf6782df6d7478f872954ef8ff45a16";
pub const SHOPCLUB_SECRET: &str = "5516ec2da46b080c26ca04b0faee6537";
pub const KAB_API_KEY: &str = "kab-api-key";
pub const CALLBACK_BASE: &str = "https://pay.example.com/notify";

/// A signed MGP notification.
pub fn mgp_notification(order_no: &str, status: &str, biz_amt: Decimal) -> mgp::model::PayNotification {
    let mut notification = mgp::model::PayNotification {
        order_no: order_no.to_string(),
        order_amount: biz_amt,
        pay_amount: biz_amt,
        status: status.to_string(),
        remark: "remark".to_string(),
        version: "V2".to_string(),
        date: "20240301101500".to_string(),
        notes: String::new(),
        sign: String::new(),
    };
    notification.sign = notification.params().sign(MGP_SECRET, mgp::model::RULE);
    notification
}

pub fn mgp_body(notification: &mgp::model::PayNotification) -> String {
    serde_json::to_string(notification).unwrap()
}

/// A signed shop-club notification; `real_price` is in cents.
pub fn shopclub_body(order_no: &str, code: i64, real_price: i64) -> String {
    let mut notification = shopclub::model::PayNotification {
        mch_id: 152,
        order_no: order_no.to_string(),
        dis_order_no: format!("D-{order_no}"),
        real_price,
        order_price: real_price,
        nti_time: 1_709_288_100,
        code,
        sign: String::new(),
    };
    notification.sign = notification
        .params()
        .sign(SHOPCLUB_SECRET, shopclub::model::RULE);
    serde_json::to_string(&notification).unwrap()
}

/// A signed KAB notification query string; `cents` is the amount field.
pub fn kab_query(order_id: &str, cents: i64, pay_no: &str) -> String {
    let notification = kab::model::PayNotification {
        orderid: order_id.to_string(),
        amount: Decimal::from(cents),
        payno: pay_no.to_string(),
        sign: String::new(),
    };
    let sign = notification.signature(KAB_API_KEY);
    assert_eq!(
        sign,
        md5_hex(&format!("{order_id}{cents}.00{pay_no}{KAB_API_KEY}"))
    );
    format!("orderid={order_id}&amount={cents}&payno={pay_no}&sign={sign}")
}

pub fn config_json(mgp_host: &str, shopclub_host: &str, kab_host: &str) -> String {
    serde_json::json!({
        "callback_base_url": CALLBACK_BASE,
        "channels": [
            { "provider": "mgp", "host": mgp_host, "secret": MGP_SECRET,
              "merchant_no": "API2442810283706600", "timeout_secs": 2 },
            { "provider": "shopclub", "key": 7, "host": shopclub_host,
              "secret": SHOPCLUB_SECRET, "mch_id": 152, "app_id": 52, "timeout_secs": 2 },
            { "provider": "kab", "host": kab_host, "api_key": KAB_API_KEY,
              "channel_code": "97", "timeout_secs": 2 }
        ]
    })
    .to_string()
}

pub fn write_config(dir: &Path, mgp_host: &str, shopclub_host: &str, kab_host: &str) -> Result<PathBuf> {
    let path = dir.join("gateway.json");
    std::fs::write(&path, config_json(mgp_host, shopclub_host, kab_host))?;
    Ok(path)
}

/// Writes a replay CSV with properly quoted payloads.
pub fn write_callbacks_csv(path: &Path, rows: &[(ChannelKey, &str, String)]) -> std::result::Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["channel", "order_no", "payload"])?;
    for (channel, order_no, payload) in rows {
        wtr.write_record([channel.to_string().as_str(), order_no, payload.as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinishCall {
    pub channel: ChannelKey,
    pub order_number: String,
    pub real_amount: Decimal,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StartCall {
    pub internal_id: i64,
    pub order_number: String,
    pub error: Option<String>,
}

/// Accessor that records every call it receives, duplicates included.
#[derive(Default)]
pub struct RecordingAccessor {
    pub started: Mutex<Vec<StartCall>>,
    pub finished: Mutex<Vec<FinishCall>>,
    /// Variant name of each error passed to `set_record_started`.
    pub start_error_kinds: Mutex<Vec<Option<&'static str>>>,
}

fn kind(err: &ChannelError) -> &'static str {
    match err {
        ChannelError::ValidationError(_) => "validation",
        ChannelError::TransportError(_) => "transport",
        ChannelError::DecodeError(_) => "decode",
        ChannelError::ProviderRejection(_) => "rejection",
        _ => "other",
    }
}

#[async_trait]
impl Accessor for RecordingAccessor {
    async fn set_record_started(
        &self,
        internal_id: i64,
        order_number: &str,
        err: Option<&ChannelError>,
    ) -> Result<()> {
        self.started.lock().unwrap().push(StartCall {
            internal_id,
            order_number: order_number.to_string(),
            error: err.map(ToString::to_string),
        });
        self.start_error_kinds.lock().unwrap().push(err.map(kind));
        Ok(())
    }

    async fn set_record_finish(
        &self,
        channel: ChannelKey,
        order_number: &str,
        real_amount: Decimal,
        err: Option<&ChannelError>,
    ) -> Result<()> {
        self.finished.lock().unwrap().push(FinishCall {
            channel,
            order_number: order_number.to_string(),
            real_amount,
            error: err.map(ToString::to_string),
        });
        Ok(())
    }
}
