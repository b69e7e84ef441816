pub mod ws;

pub use ws::WsTransport;

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Bytes covered by one progress-callback unit.
pub const DEFAULT_PROGRESS_UNIT: usize = 64 * 1024;

/// Events pushed by the transport onto the session's event channel. The
/// channel is the only thing that crosses the boundary between the
/// transport's tasks and the session sequence.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Open {
        uri: String,
        headers: Vec<(String, String)>,
    },
    Close {
        code: u16,
        reason: String,
    },
    Message {
        payload: Vec<u8>,
        wire_size: usize,
    },
    Error {
        reason: String,
        retries: u32,
        wait_time_ms: u64,
        http_status: u16,
    },
}

/// TLS material for the connection. All fields optional; `insecure`
/// disables certificate and hostname verification.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub insecure: bool,
}

/// Connection parameters handed to the adapter before `start`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub url: String,
    pub per_message_compression: bool,
    pub tls: TlsOptions,
    pub progress_unit: usize,
}

impl TransportConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            per_message_compression: false,
            tls: TlsOptions::default(),
            progress_unit: DEFAULT_PROGRESS_UNIT,
        }
    }
}

/// Per-unit continuation signal invoked while a send is fragmented into the
/// outbound buffer. Receives `(current_unit, total_units)`; returning false
/// aborts the send.
pub type ProgressFn<'a> = &'a mut (dyn FnMut(u64, u64) -> bool + Send);

/// Contract consumed by the session layer. Implementations own their I/O
/// tasks; all inbound traffic and connection lifecycle changes surface as
/// [`TransportEvent`]s on the channel returned by `start`.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Open the connection. The open event for a connection is delivered on
    /// the returned channel before any message event.
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError>;

    /// Close the connection. Idempotent.
    async fn stop(&mut self);

    /// Queue `payload` for transmission as a single message, invoking
    /// `progress` once per unit as the payload is fragmented. Returns
    /// `Ok(false)` if the callback aborted the send.
    async fn send_binary(
        &self,
        payload: Vec<u8>,
        progress: ProgressFn<'_>,
    ) -> Result<bool, TransportError>;

    /// Bytes accepted by `send_binary` but not yet flushed to the wire.
    fn buffered_amount(&self) -> usize;
}
