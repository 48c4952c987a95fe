//! Protocol Client Tests
//!
//! Exercises the session client against the mock device and against
//! transports that fail in controlled ways.


use mock_device::{
    FlakyConnector, MockBehaviour, MockPixerDevice, RefusingConnector, closed_endpoint,
};
use pixer::errors::{ConnectionError, PixerError, ProtocolError};
use pixer::models::{BatteryLevel, DeviceEndpoint};
use pixer::protocol::{ClientOptions, ProtocolClient, TcpConnector, UPLOAD_SENTINEL};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

fn fast_options() -> ClientOptions {
    ClientOptions {
        connect_timeout: Duration::from_millis(500),
        read_timeout: Duration::from_millis(150),
        upload_timeout: Duration::from_secs(2),
        command_retries: 2,
    }
}

fn tcp_client(endpoint: DeviceEndpoint) -> ProtocolClient {
    ProtocolClient::with_connector(endpoint, Arc::new(TcpConnector), fast_options())
}

#[tokio::test]
async fn test_device_info_from_mock() {
    let device = MockPixerDevice::start().await;
    let mut client = tcp_client(device.endpoint());

    client
        .connect(3, Duration::from_millis(50))
        .await
        .expect("mock device should accept");
    assert!(client.is_connected());

    let info = client.get_device_info().await.expect("device info");
    client.close().await;

    assert!(info.connected);
    assert_eq!(info.battery_level, Some(BatteryLevel::Integer(87)));
    assert_eq!(info.ble_version.as_deref(), Some("14"));
    assert_eq!(info.ite_version.as_deref(), Some("35"));
    assert_eq!(info.mcu_version.as_deref(), Some("1702061"));
    assert!(info.error.is_none());
    assert_eq!(
        device.commands(),
        vec!["#TEST#", "batteryLevel", "bleVersion", "iteVersion", "mcuVersion"]
    );
}

#[tokio::test]
async fn test_non_numeric_battery_kept_raw() {
    let device = MockPixerDevice::start_with(MockBehaviour {
        battery: "charging".to_string(),
        ..Default::default()
    })
    .await;
    let mut client = tcp_client(device.endpoint());
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    let info = client.get_device_info().await.expect("device info");
    assert_eq!(
        info.battery_level,
        Some(BatteryLevel::Raw("charging".to_string()))
    );
}

#[tokio::test]
async fn test_silent_device_is_not_responding() {
    let device = MockPixerDevice::start_with(MockBehaviour::silent()).await;
    let mut client = tcp_client(device.endpoint());
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    let result = client.get_device_info().await;
    assert!(matches!(
        result,
        Err(PixerError::Protocol(ProtocolError::NotResponding))
    ));
    // Only the probe went out
    assert_eq!(device.commands(), vec!["#TEST#"]);
}

#[tokio::test]
async fn test_connect_makes_exactly_max_attempts() {
    let connector = Arc::new(RefusingConnector::default());
    let mut client = ProtocolClient::with_connector(
        DeviceEndpoint::default(),
        connector.clone(),
        fast_options(),
    );

    let retry_delay = Duration::from_millis(100);
    let started = Instant::now();
    let result = client.connect(3, retry_delay).await;
    let elapsed = started.elapsed();

    match result {
        Err(PixerError::Connection(ConnectionError::Unreachable { attempts, .. })) => {
            assert_eq!(attempts, 3)
        }
        other => panic!("Expected unreachable error, got: {:?}", other.err()),
    }
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 3);
    // Two pauses between three attempts, none after the last
    assert!(elapsed >= retry_delay * 2, "elapsed {:?}", elapsed);
    assert!(elapsed < retry_delay * 3 + Duration::from_millis(500));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_connect_to_closed_port_is_unreachable() {
    let mut client = tcp_client(closed_endpoint().await);

    let result = client.connect(3, Duration::from_millis(20)).await;
    assert!(matches!(
        result,
        Err(PixerError::Connection(ConnectionError::Unreachable { attempts: 3, .. }))
    ));
}

#[tokio::test]
async fn test_upload_reaches_mock_with_sentinel() {
    let device = MockPixerDevice::start().await;
    let mut client = tcp_client(device.endpoint());
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    let mut frame = b"#file#000801314144imagebin".to_vec();
    frame.extend((0..20_000u32).map(|i| (i % 256) as u8));

    let report = client
        .upload_image_data(&frame, 4096)
        .await
        .expect("upload should succeed");
    client.close().await;

    assert_eq!(report.bytes_sent, frame.len());
    assert_eq!(report.total_bytes, frame.len());

    let uploads = device.wait_for_uploads(1).await;
    assert_eq!(uploads[0], frame);
}

#[tokio::test]
async fn test_upload_abort_keeps_partial_count() {
    let chunk_size = 4096;
    let connector = Arc::new(FlakyConnector::new(None, 2 * chunk_size));
    let mut client = ProtocolClient::with_connector(
        DeviceEndpoint::default(),
        connector.clone(),
        fast_options(),
    );
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    let data = vec![0xA5u8; 5 * chunk_size + 100];
    let result = client.upload_image_data(&data, chunk_size).await;

    match result {
        Err(PixerError::Transfer(transfer)) => {
            assert_eq!(transfer.bytes_sent, 2 * chunk_size);
            assert_eq!(transfer.total_bytes, data.len());
        }
        other => panic!("Expected transfer error, got: {:?}", other),
    }
    assert!(!client.is_connected());

    let accepted = connector.accepted();
    assert_eq!(accepted.len(), 2 * chunk_size);
    assert!(!accepted.ends_with(UPLOAD_SENTINEL));
}

#[tokio::test]
async fn test_sentinel_failure_is_reported() {
    let data = vec![0x11u8; 3000];
    let connector = Arc::new(FlakyConnector::new(None, data.len()));
    let mut client = ProtocolClient::with_connector(
        DeviceEndpoint::default(),
        connector.clone(),
        fast_options(),
    );
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    let result = client.upload_image_data(&data, 1024).await;
    match result {
        Err(PixerError::Transfer(transfer)) => assert_eq!(transfer.bytes_sent, data.len()),
        other => panic!("Expected transfer error, got: {:?}", other),
    }
    assert_eq!(connector.accepted(), data);
}

#[tokio::test]
async fn test_reset_probes_then_sends_reset() {
    let device = MockPixerDevice::start().await;
    let mut client = tcp_client(device.endpoint());
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    client.reset_device().await.expect("reset should be sent");
    client.close().await;

    device.wait_for_command("reset").await;
    assert_eq!(device.commands(), vec!["#TEST#", "reset"]);
}

#[tokio::test]
async fn test_reset_refused_when_probe_fails() {
    let device = MockPixerDevice::start_with(MockBehaviour::silent()).await;
    let mut client = tcp_client(device.endpoint());
    client
        .connect(1, Duration::from_millis(10))
        .await
        .expect("connect");

    let result = client.reset_device().await;
    assert!(matches!(
        result,
        Err(PixerError::Protocol(ProtocolError::NotResponding))
    ));
    assert!(!device.commands().contains(&"reset".to_string()));
}

#[tokio::test]
async fn test_upload_without_session_fails() {
    let mut client = tcp_client(DeviceEndpoint::default());
    let result = client.upload_image_data(b"frame", 4096).await;
    assert!(matches!(
        result,
        Err(PixerError::Protocol(ProtocolError::NotConnected))
    ));
}
