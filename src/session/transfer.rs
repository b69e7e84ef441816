use std::path::Path;

use tracing::{error, info, warn};

use crate::config::SendConfig;
use crate::error::SessionError;
use crate::protocol::{build_envelope, AckReply};
use crate::session::flow::{
    transfer_rate_mb_s, FlowSender, ProgressHook, SendOptions, TransferReport,
};
use crate::session::signals::LifecycleSignals;
use crate::transport::{MessageTransport, TlsOptions, TransportConfig, WsTransport};
use crate::utils::{format_size, Stopwatch};

/// Progression of a single transfer. Transitions are owned exclusively by
/// [`TransferSession::run`]; there is no error terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    Sending,
    Draining,
    AwaitingAck,
    Done,
}

/// One-shot transfer: connect, send one envelope, wait for the ack, close.
/// Nothing is retried; the connection is closed exactly once on every path.
pub struct TransferSession<T: MessageTransport> {
    transport: T,
    config: SendConfig,
    state: SessionState,
    id: Option<String>,
}

impl<T: MessageTransport> TransferSession<T> {
    pub fn new(transport: T, config: SendConfig) -> Self {
        Self {
            transport,
            config,
            state: SessionState::Idle,
            id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session identifier, set once the envelope is built.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Drive the whole sequence: connect → wait for open → build envelope →
    /// flow-controlled send → wait for ack → close.
    pub async fn run(
        &mut self,
        path: &Path,
        progress: Option<ProgressHook>,
    ) -> Result<TransferReport, SessionError> {
        let result = self.run_inner(path, progress).await;
        self.transport.stop().await;
        result
    }

    async fn run_inner(
        &mut self,
        path: &Path,
        progress: Option<ProgressHook>,
    ) -> Result<TransferReport, SessionError> {
        self.state = SessionState::Connecting;
        let events = self.transport.start().await?;
        let mut signals = LifecycleSignals::spawn(events);

        signals
            .wait_for_connection(self.config.connect_timeout())
            .await?;
        self.state = SessionState::Connected;

        let watch = Stopwatch::start("load file from disk");
        let envelope = build_envelope(path, self.config.missing_file).await?;
        watch.report();
        self.id = Some(envelope.id.clone());
        info!(
            "sending {} ({})",
            envelope.filename,
            format_size(envelope.content.len() as u64)
        );

        let content_bytes = envelope.content.len() as u64;
        let payload = envelope.encode()?;
        let mut options = SendOptions {
            throttle: self.config.throttle,
            drain_timeout: self.config.drain_timeout(),
            progress,
        };
        let drain_timeout = options.drain_timeout;

        let mut sender = FlowSender::new(&self.transport);
        self.state = SessionState::Sending;
        sender.push(payload, &mut options).await?;
        self.state = SessionState::Draining;
        let flow = sender.drain(drain_timeout).await?;
        info!("send through transport completed in {} ms", flow.elapsed_ms);

        // Rate is computed over the file content, not the framed envelope
        let report = TransferReport {
            bytes: content_bytes,
            elapsed_ms: flow.elapsed_ms,
            rate_mb_s: transfer_rate_mb_s(content_bytes, flow.elapsed_ms),
        };
        info!("send transfer rate: {:.2} MB/s", report.rate_mb_s);

        self.state = SessionState::AwaitingAck;
        let ack = signals.wait_for_ack(self.config.ack_timeout()).await?;
        match AckReply::decode(&ack.payload) {
            Ok(reply) if Some(reply.id.as_str()) == self.id.as_deref() => {
                info!("ack confirmed for {}", reply.id);
            }
            Ok(reply) => {
                warn!(
                    "ack id mismatch: sent {}, received {}",
                    self.id.as_deref().unwrap_or(""),
                    reply.id
                );
            }
            Err(err) => {
                warn!("invalid ack payload: {err}");
            }
        }

        self.state = SessionState::Done;
        Ok(report)
    }
}

/// Narrow embedding surface: send one file over a WebSocket connection with
/// throttling and per-message compression fixed off. Returns 0 once the
/// full sequence through the ack has completed, 1 otherwise.
pub async fn send_file(url: &str, path: impl AsRef<Path>, tls: TlsOptions) -> i32 {
    let mut transport_config = TransportConfig::new(url);
    transport_config.tls = tls;
    transport_config.per_message_compression = false;

    let transport = WsTransport::new(transport_config);
    let mut session = TransferSession::new(transport, SendConfig::default());

    match session.run(path.as_ref(), None).await {
        Ok(report) => {
            info!("done ({:.2} MB/s)", report.rate_mb_s);
            0
        }
        Err(err) => {
            error!("transfer failed: {err}");
            1
        }
    }
}
