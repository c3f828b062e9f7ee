mod common;

use chargechannel::application::callback::{CallbackProcessor, Disposition};
use chargechannel::config::GatewayConfig;
use chargechannel::domain::channel::ChannelKey;
use chargechannel::domain::ports::{AccessorBox, RegistryBox};
use chargechannel::error::ChannelError;
use chargechannel::infrastructure::providers::mgp::model::PayNotification;
use chargechannel::interfaces::webhook::{self, FAILURE_BODY};
use common::{RecordingAccessor, config_json, kab_query, mgp_body, mgp_notification, shopclub_body};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn setup() -> (CallbackProcessor, Arc<RecordingAccessor>) {
    let config = GatewayConfig::from_json(&config_json(
        "https://mgp.example.com",
        "https://club.example.com",
        "https://kab.example.com",
    ))
    .unwrap();
    let registry: RegistryBox = Arc::new(config.build_registry().unwrap());
    let recorder = Arc::new(RecordingAccessor::default());
    let accessor: AccessorBox = recorder.clone();
    (CallbackProcessor::new(registry, accessor), recorder)
}

#[tokio::test]
async fn test_mgp_paid_notification_settles_once() {
    let (processor, recorder) = setup();
    let body = mgp_body(&mgp_notification("ORD-1", "1", dec!(10.5)));

    let reply = processor
        .process(ChannelKey::EPay, "ORD-1", body.as_bytes())
        .await
        .unwrap();

    assert_eq!(reply.body, "SUCCESS");
    assert!(matches!(reply.disposition, Disposition::SettledPaid(amount) if amount == dec!(10.5)));

    let finished = recorder.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].channel, ChannelKey::EPay);
    assert_eq!(finished[0].order_number, "ORD-1");
    assert_eq!(finished[0].real_amount, dec!(10.5));
    assert_eq!(finished[0].error, None);
}

#[tokio::test]
async fn test_tampered_signature_is_acknowledged_but_not_recorded() {
    let (processor, recorder) = setup();
    let mut notification = mgp_notification("ORD-2", "1", dec!(10.5));
    notification.sign = "0".repeat(32);

    let reply = processor
        .process(ChannelKey::EPay, "ORD-2", mgp_body(&notification).as_bytes())
        .await
        .unwrap();

    assert_eq!(reply.body, "SUCCESS");
    assert!(matches!(reply.error(), Some(ChannelError::SignatureError)));
    assert!(recorder.finished.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_payment_records_reason() {
    let (processor, recorder) = setup();
    let body = mgp_body(&mgp_notification("ORD-3", "2", dec!(10.5)));

    let reply = processor
        .process(ChannelKey::EPay, "ORD-3", body.as_bytes())
        .await
        .unwrap();

    assert_eq!(reply.body, "SUCCESS");
    assert!(matches!(reply.disposition, Disposition::SettledFailed));

    let finished = recorder.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].real_amount, dec!(0));
    assert!(finished[0].error.as_deref().unwrap().contains("ORD-3"));
}

#[tokio::test]
async fn test_non_terminal_statuses_are_not_recorded() {
    let (processor, recorder) = setup();

    for status in ["0", "9", ""] {
        let body = mgp_body(&mgp_notification("ORD-4", status, dec!(3)));
        let reply = processor
            .process(ChannelKey::EPay, "ORD-4", body.as_bytes())
            .await
            .unwrap();

        assert!(matches!(reply.disposition, Disposition::Acknowledged(_)));
        assert!(reply.error().is_none());
    }

    assert!(recorder.finished.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_undecodable_body_still_gets_an_acknowledgement() {
    let (processor, recorder) = setup();

    let reply = processor
        .process(ChannelKey::EPayRuble, "ORD-5", b"<html>not json</html>")
        .await
        .unwrap();

    assert!(matches!(reply.disposition, Disposition::RejectedAtDecode(_)));
    assert!(matches!(reply.error(), Some(ChannelError::DecodeError(_))));
    assert!(recorder.finished.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_every_signed_field_is_covered() {
    let (processor, recorder) = setup();
    let original = mgp_notification("ORD-6", "1", dec!(25.00));

    let mutations: Vec<Box<dyn Fn(&mut PayNotification)>> = vec![
        Box::new(|n: &mut PayNotification| n.order_no.push('X')),
        Box::new(|n: &mut PayNotification| n.pay_amount += dec!(0.01)),
        Box::new(|n: &mut PayNotification| n.order_amount -= dec!(0.01)),
        Box::new(|n: &mut PayNotification| n.status = "2".to_string()),
        Box::new(|n: &mut PayNotification| n.remark = "changed".to_string()),
        Box::new(|n: &mut PayNotification| n.version = "V1".to_string()),
        Box::new(|n: &mut PayNotification| n.date = "20240301101501".to_string()),
        Box::new(|n: &mut PayNotification| n.notes = "extra".to_string()),
    ];

    for mutate in mutations {
        let mut notification = original.clone();
        mutate(&mut notification);

        let reply = processor
            .process(ChannelKey::EPay, "ORD-6", mgp_body(&notification).as_bytes())
            .await
            .unwrap();

        assert!(
            matches!(reply.error(), Some(ChannelError::SignatureError)),
            "mutation accepted: {notification:?}"
        );
    }

    assert!(recorder.finished.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_shopclub_paid_notification_converts_cents() {
    let (processor, recorder) = setup();
    let body = shopclub_body("ORD-7", 1, 1250);

    let reply = processor
        .process(ChannelKey::EPayRuble, "ORD-7", body.as_bytes())
        .await
        .unwrap();

    assert_eq!(reply.body, "success");
    let finished = recorder.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].channel, ChannelKey::EPayRuble);
    assert_eq!(finished[0].real_amount, dec!(12.5));
}

#[tokio::test]
async fn test_shopclub_failure_is_recorded_without_ack() {
    let (processor, recorder) = setup();
    let body = shopclub_body("ORD-8", 0, 1250);

    let reply = processor
        .process(ChannelKey::EPayRuble, "ORD-8", body.as_bytes())
        .await
        .unwrap();

    assert_eq!(reply.body, "");
    assert!(matches!(reply.disposition, Disposition::SettledFailed));
    assert_eq!(recorder.finished.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_kab_query_through_webhook() {
    let (processor, recorder) = setup();
    let target = format!("/notify/callback/5/ORD-9?{}", kab_query("ORD-9", 5000, "P-77"));

    let body = webhook::handle(&processor, &target, b"").await;

    assert_eq!(body, "ok");
    let finished = recorder.finished.lock().unwrap();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].channel, ChannelKey::Kab);
    assert_eq!(finished[0].order_number, "ORD-9");
    assert_eq!(finished[0].real_amount, dec!(50));
}

#[tokio::test]
async fn test_mgp_body_through_webhook() {
    let (processor, recorder) = setup();
    let body = mgp_body(&mgp_notification("ORD-10", "1", dec!(7)));

    let reply = webhook::handle(&processor, "/notify/3/ORD-10", body.as_bytes()).await;

    assert_eq!(reply, "SUCCESS");
    assert_eq!(recorder.finished.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_unknown_channel_replies_failure() {
    let (processor, recorder) = setup();

    assert_eq!(webhook::handle(&processor, "/notify/1/ORD-11", b"{}").await, FAILURE_BODY);
    assert_eq!(webhook::handle(&processor, "/notify/42/ORD-11", b"{}").await, FAILURE_BODY);
    assert_eq!(webhook::handle(&processor, "/", b"{}").await, FAILURE_BODY);
    assert!(recorder.finished.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unregistered_channel_is_an_error() {
    let (processor, _) = setup();

    let result = processor.process(ChannelKey::Erc20, "ORD-12", b"{}").await;

    assert!(matches!(result, Err(ChannelError::ChannelNotFound(ChannelKey::Erc20))));
}

#[tokio::test]
async fn test_signed_notification_cannot_settle_another_order() {
    let (processor, recorder) = setup();
    let body = mgp_body(&mgp_notification("ORD-A", "1", dec!(10.5)));

    let reply = processor
        .process(ChannelKey::EPay, "ORD-B", body.as_bytes())
        .await
        .unwrap();

    assert_eq!(reply.body, "SUCCESS");
    assert!(matches!(reply.disposition, Disposition::RejectedAtVerify(_)));
    assert!(matches!(
        reply.error(),
        Some(ChannelError::OrderMismatch { addressed, signed })
            if addressed == "ORD-B" && signed == "ORD-A"
    ));
    assert!(recorder.finished.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_kab_query_replayed_to_another_route_is_ignored() {
    let (processor, recorder) = setup();
    let target = format!("/notify/callback/5/ORD-13?{}", kab_query("ORD-12", 5000, "P-78"));

    let body = webhook::handle(&processor, &target, b"").await;

    assert_eq!(body, "ok");
    assert!(recorder.finished.lock().unwrap().is_empty());
}
