use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use wiredrop::{MissingFilePolicy, SendConfig};

#[test]
fn test_default_config_is_valid() {
    let config = SendConfig::default();
    config.validate().expect("default config should be valid");
    assert!(!config.throttle);
    assert!(!config.per_message_compression);
    assert_eq!(config.missing_file, MissingFilePolicy::SendEmpty);
    assert_eq!(config.connect_timeout(), None);
    assert_eq!(config.ack_timeout(), None);
    assert_eq!(config.drain_timeout(), None);
}

#[test]
fn test_config_json_round_trip() {
    let config = SendConfig {
        connect_timeout_ms: Some(5000),
        ack_timeout_ms: Some(30_000),
        drain_timeout_ms: None,
        throttle: true,
        per_message_compression: false,
        missing_file: MissingFilePolicy::Fail,
        progress_unit: 32 * 1024,
    };

    let json = serde_json::to_string(&config).expect("should serialize");
    let decoded: SendConfig = serde_json::from_str(&json).expect("should deserialize");

    assert_eq!(decoded.connect_timeout(), Some(Duration::from_secs(5)));
    assert_eq!(decoded.ack_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(decoded.drain_timeout(), None);
    assert!(decoded.throttle);
    assert_eq!(decoded.missing_file, MissingFilePolicy::Fail);
    assert_eq!(decoded.progress_unit, 32 * 1024);
}

#[test]
fn test_load_or_default_falls_back() {
    let config = SendConfig::load_or_default(None);
    assert_eq!(config.progress_unit, SendConfig::default().progress_unit);

    let config = SendConfig::load_or_default(Some("/nonexistent/config.json"));
    assert_eq!(config.progress_unit, SendConfig::default().progress_unit);
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"ack_timeout_ms": 1500, "missing_file": "fail"}"#)
        .unwrap();

    let config = SendConfig::load_or_default(file.path().to_str());
    assert_eq!(config.ack_timeout_ms, Some(1500));
    assert_eq!(config.missing_file, MissingFilePolicy::Fail);
    // Unspecified fields keep their defaults
    assert_eq!(config.progress_unit, SendConfig::default().progress_unit);
}

#[test]
fn test_invalid_config_rejected() {
    let config = SendConfig {
        progress_unit: 0,
        ..SendConfig::default()
    };
    assert!(config.validate().is_err());

    let config = SendConfig {
        drain_timeout_ms: Some(0),
        ..SendConfig::default()
    };
    assert!(config.validate().is_err());
}
