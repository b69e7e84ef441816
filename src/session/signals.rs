use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::transport::TransportEvent;

/// Connection details delivered with the open event.
#[derive(Debug, Clone)]
pub struct OpenInfo {
    pub uri: String,
    pub headers: Vec<(String, String)>,
}

/// First inbound message on the connection, interpreted as the ack.
#[derive(Debug, Clone)]
pub struct InboundAck {
    pub payload: Vec<u8>,
    pub wire_size: usize,
}

/// Bridges the transport's event channel to the session's sequential flow
/// with two distinct single-use completion signals: one for connection-open,
/// one for the first inbound message. A signal fired before its waiter
/// arrives is retained, so no notification can be lost. Close and error
/// events are logged and resolve nothing.
pub struct LifecycleSignals {
    connected: Option<oneshot::Receiver<OpenInfo>>,
    ack: Option<oneshot::Receiver<InboundAck>>,
    pump: JoinHandle<()>,
}

impl LifecycleSignals {
    pub fn spawn(mut events: mpsc::UnboundedReceiver<TransportEvent>) -> Self {
        let (connected_tx, connected_rx) = oneshot::channel();
        let (ack_tx, ack_rx) = oneshot::channel();

        let pump = tokio::spawn(async move {
            let mut connected_tx = Some(connected_tx);
            let mut ack_tx = Some(ack_tx);

            while let Some(event) = events.recv().await {
                match event {
                    TransportEvent::Open { uri, headers } => {
                        info!("connected to {uri}");
                        for (name, value) in &headers {
                            debug!("{name}: {value}");
                        }
                        match connected_tx.take() {
                            Some(tx) => {
                                let _ = tx.send(OpenInfo { uri, headers });
                            }
                            None => warn!("duplicate open event ignored"),
                        }
                    }
                    TransportEvent::Message { payload, wire_size } => {
                        info!("received message ({wire_size} bytes)");
                        match ack_tx.take() {
                            Some(tx) => {
                                let _ = tx.send(InboundAck { payload, wire_size });
                            }
                            None => debug!("extra inbound message dropped"),
                        }
                    }
                    TransportEvent::Close { code, reason } => {
                        info!("connection closed: code {code} reason {reason}");
                    }
                    TransportEvent::Error {
                        reason,
                        retries,
                        wait_time_ms,
                        http_status,
                    } => {
                        warn!(
                            "connection error: {reason} (#retries: {retries}, \
                             wait time: {wait_time_ms} ms, http status: {http_status})"
                        );
                    }
                }
            }
        });

        Self {
            connected: Some(connected_rx),
            ack: Some(ack_rx),
            pump,
        }
    }

    /// Block until the transport reports the connection open. `limit: None`
    /// waits indefinitely.
    pub async fn wait_for_connection(
        &mut self,
        limit: Option<Duration>,
    ) -> Result<OpenInfo, SessionError> {
        info!("connecting...");
        let rx = self.connected.take().ok_or(SessionError::ConnectionLost {
            phase: "connecting",
        })?;
        Self::await_signal(rx, limit, "connecting").await
    }

    /// Block until the first inbound message arrives. `limit: None` waits
    /// indefinitely.
    pub async fn wait_for_ack(
        &mut self,
        limit: Option<Duration>,
    ) -> Result<InboundAck, SessionError> {
        info!("waiting for ack...");
        let rx = self.ack.take().ok_or(SessionError::ConnectionLost {
            phase: "awaiting ack",
        })?;
        Self::await_signal(rx, limit, "awaiting ack").await
    }

    async fn await_signal<T>(
        rx: oneshot::Receiver<T>,
        limit: Option<Duration>,
        phase: &'static str,
    ) -> Result<T, SessionError> {
        match limit {
            None => rx.await.map_err(|_| SessionError::ConnectionLost { phase }),
            Some(limit) => match timeout(limit, rx).await {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(_)) => Err(SessionError::ConnectionLost { phase }),
                Err(_) => Err(SessionError::Timeout {
                    phase,
                    waited_ms: limit.as_millis() as u64,
                }),
            },
        }
    }
}

impl Drop for LifecycleSignals {
    fn drop(&mut self) {
        self.pump.abort();
    }
}
