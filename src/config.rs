use std::error::Error;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::MissingFilePolicy;
use crate::transport::DEFAULT_PROGRESS_UNIT;

/// Transfer configuration. All timeouts are optional; `None` preserves the
/// unbounded wait behavior of the protocol's reference client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    pub connect_timeout_ms: Option<u64>,
    pub ack_timeout_ms: Option<u64>,
    pub drain_timeout_ms: Option<u64>,
    pub throttle: bool,
    pub per_message_compression: bool,
    pub missing_file: MissingFilePolicy,
    pub progress_unit: usize,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            ack_timeout_ms: None,
            drain_timeout_ms: None,
            throttle: false,
            per_message_compression: false,
            missing_file: MissingFilePolicy::default(),
            progress_unit: DEFAULT_PROGRESS_UNIT,
        }
    }
}

impl SendConfig {
    /// Load configuration from a JSON file or fall back to defaults.
    pub fn load_or_default(config_path: Option<&str>) -> Self {
        if let Some(config) = config_path
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
        {
            return config;
        }
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.progress_unit == 0 {
            return Err("progress unit must be greater than 0".into());
        }

        for (name, value) in [
            ("connect timeout", self.connect_timeout_ms),
            ("ack timeout", self.ack_timeout_ms),
            ("drain timeout", self.drain_timeout_ms),
        ] {
            if value == Some(0) {
                return Err(format!("{name} must be greater than 0 when set").into());
            }
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn ack_timeout(&self) -> Option<Duration> {
        self.ack_timeout_ms.map(Duration::from_millis)
    }

    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout_ms.map(Duration::from_millis)
    }
}
