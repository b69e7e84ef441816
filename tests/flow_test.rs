mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::MockTransport;

use wiredrop::session::flow::transfer_rate_mb_s;
use wiredrop::{FlowSender, SendOptions, SessionError};

#[tokio::test]
async fn test_drain_completes_when_buffer_reaches_zero() {
    let transport = MockTransport::new();
    transport.schedule_buffered(&[300, 200, 100, 0]);

    let mut sender = FlowSender::new(&transport);
    sender
        .push(vec![0xaa; 600], &mut SendOptions::default())
        .await
        .unwrap();
    let report = sender.drain(None).await.expect("drain should terminate");

    assert_eq!(report.bytes, 600);
    assert!(report.elapsed_ms >= 1);
    assert_eq!(transport.sent_payloads().len(), 1);
}

#[tokio::test]
async fn test_drain_hangs_when_buffer_never_empties() {
    // A transport stuck at a non-zero buffered amount hangs the drain loop
    // when no timeout is configured. Bounded harness documents the gap.
    let transport = MockTransport::new();
    transport.schedule_buffered(&[64]);

    let mut sender = FlowSender::new(&transport);
    sender
        .push(vec![0u8; 64], &mut SendOptions::default())
        .await
        .unwrap();

    let hung = tokio::time::timeout(Duration::from_millis(250), sender.drain(None)).await;
    assert!(hung.is_err(), "drain without a timeout must not complete");
}

#[tokio::test]
async fn test_drain_times_out_with_limit() {
    let transport = MockTransport::new();
    transport.schedule_buffered(&[64]);

    let mut sender = FlowSender::new(&transport);
    sender
        .push(vec![0u8; 64], &mut SendOptions::default())
        .await
        .unwrap();

    match sender.drain(Some(Duration::from_millis(50))).await {
        Err(SessionError::Timeout { phase, .. }) => assert_eq!(phase, "draining"),
        other => panic!("expected drain timeout, got {other:?}"),
    }
}

#[test]
fn test_throughput_formula() {
    let bytes = 3_500_000u64;
    let elapsed = 250u64;
    let expected = bytes as f64 * 1000.0 / elapsed as f64 / 1_048_576.0;
    assert!((transfer_rate_mb_s(bytes, elapsed) - expected).abs() < 1e-9);

    // Clamp: zero elapsed behaves as one millisecond
    assert_eq!(transfer_rate_mb_s(1024, 0), transfer_rate_mb_s(1024, 1));
}

#[tokio::test]
async fn test_ten_megabyte_send_drains() {
    let payload = vec![0x42u8; 10 * 1024 * 1024];
    let transport = MockTransport::new();
    transport.schedule_buffered(&[10 * 1024 * 1024, 5 * 1024 * 1024, 0]);

    let mut sender = FlowSender::new(&transport);
    sender
        .push(payload.clone(), &mut SendOptions::default())
        .await
        .unwrap();
    let report = sender.drain(None).await.unwrap();

    assert_eq!(report.bytes, payload.len() as u64);
    assert!(report.rate_mb_s > 0.0);
    assert!(report.rate_mb_s.is_finite());
    assert_eq!(transport.sent_payloads()[0].len(), payload.len());
}

#[tokio::test]
async fn test_progress_reports_units() {
    let transport = MockTransport::with_unit(1024);
    let seen: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();

    let mut options = SendOptions {
        progress: Some(Box::new(move |current, total| {
            sink.lock().unwrap().push((current, total));
            true
        })),
        ..SendOptions::default()
    };

    let mut sender = FlowSender::new(&transport);
    sender.push(vec![0u8; 4097], &mut options).await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 5);
    assert_eq!(seen.first(), Some(&(1, 5)));
    assert_eq!(seen.last(), Some(&(5, 5)));
}

#[tokio::test]
async fn test_progress_abort_stops_send() {
    let transport = MockTransport::with_unit(16);
    let mut options = SendOptions {
        progress: Some(Box::new(|current, _total| current < 3)),
        ..SendOptions::default()
    };

    let mut sender = FlowSender::new(&transport);
    match sender.push(vec![0u8; 256], &mut options).await {
        Err(SessionError::Aborted) => {}
        other => panic!("expected aborted send, got {other:?}"),
    }
    assert!(transport.sent_payloads().is_empty());
}
