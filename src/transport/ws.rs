use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector};
use tracing::{debug, warn};

use super::{MessageTransport, ProgressFn, TlsOptions, TransportConfig, TransportEvent};
use crate::error::TransportError;

/// WebSocket-backed transport. Owns a reader task that pumps inbound frames
/// into the event channel and a writer task that drains the outbound queue;
/// `buffered_amount` tracks bytes queued but not yet flushed to the socket.
pub struct WsTransport {
    config: TransportConfig,
    buffered: Arc<AtomicUsize>,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    close: Option<oneshot::Sender<()>>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl WsTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            buffered: Arc::new(AtomicUsize::new(0)),
            outbound: None,
            close: None,
            reader: None,
            writer: None,
        }
    }
}

fn build_connector(tls: &TlsOptions) -> Result<Connector, TransportError> {
    let mut builder = native_tls::TlsConnector::builder();

    if tls.insecure {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }

    if let Some(ca) = &tls.ca_file {
        let pem = std::fs::read(ca)?;
        builder.add_root_certificate(native_tls::Certificate::from_pem(&pem)?);
    }

    if let (Some(cert), Some(key)) = (&tls.cert_file, &tls.key_file) {
        let cert_pem = std::fs::read(cert)?;
        let key_pem = std::fs::read(key)?;
        builder.identity(native_tls::Identity::from_pkcs8(&cert_pem, &key_pem)?);
    }

    Ok(Connector::NativeTls(builder.build()?))
}

#[async_trait]
impl MessageTransport for WsTransport {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError> {
        let parsed = url::Url::parse(&self.config.url)
            .map_err(|_| TransportError::InvalidUrl(self.config.url.clone()))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl(self.config.url.clone()));
        }

        if self.config.per_message_compression {
            warn!("per-message compression requested but not supported; sending uncompressed");
        }

        let connector = build_connector(&self.config.tls)?;
        let (stream, response) =
            connect_async_tls_with_config(self.config.url.as_str(), None, true, Some(connector))
                .await?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let _ = events_tx.send(TransportEvent::Open {
            uri: self.config.url.clone(),
            headers,
        });

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (close_tx, mut close_rx) = oneshot::channel::<()>();

        let reader_events = events_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Binary(payload)) => {
                        let wire_size = payload.len();
                        if reader_events
                            .send(TransportEvent::Message { payload, wire_size })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Text(text)) => {
                        let wire_size = text.len();
                        if reader_events
                            .send(TransportEvent::Message {
                                payload: text.into_bytes(),
                                wire_size,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.into_owned()))
                            .unwrap_or((1005, String::new()));
                        let _ = reader_events.send(TransportEvent::Close { code, reason });
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let _ = reader_events.send(TransportEvent::Error {
                            reason: err.to_string(),
                            retries: 0,
                            wait_time_ms: 0,
                            http_status: 0,
                        });
                        break;
                    }
                }
            }
        });

        let buffered = self.buffered.clone();
        let writer_events = events_tx;
        let writer = tokio::spawn(async move {
            loop {
                tokio::select! {
                    queued = outbound_rx.recv() => {
                        match queued {
                            Some(payload) => {
                                let len = payload.len();
                                if let Err(err) = sink.send(Message::Binary(payload)).await {
                                    // Bytes stay counted as buffered; they never
                                    // reached the wire.
                                    let _ = writer_events.send(TransportEvent::Error {
                                        reason: err.to_string(),
                                        retries: 0,
                                        wait_time_ms: 0,
                                        http_status: 0,
                                    });
                                    break;
                                }
                                buffered.fetch_sub(len, Ordering::AcqRel);
                                debug!("flushed {len} bytes");
                            }
                            None => break,
                        }
                    }
                    _ = &mut close_rx => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        });

        self.outbound = Some(outbound_tx);
        self.close = Some(close_tx);
        self.reader = Some(reader);
        self.writer = Some(writer);

        Ok(events_rx)
    }

    async fn stop(&mut self) {
        if let Some(close) = self.close.take() {
            let _ = close.send(());
        }
        if let Some(writer) = self.writer.take() {
            let _ = writer.await;
        }
        self.outbound = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    async fn send_binary(
        &self,
        payload: Vec<u8>,
        progress: ProgressFn<'_>,
    ) -> Result<bool, TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotConnected)?;

        let unit = self.config.progress_unit.max(1);
        let total_units = payload.len().div_ceil(unit) as u64;

        // Fragmentation pass: the callback fires per unit while the payload
        // is copied into the outbound message; the network flush is observed
        // separately through buffered_amount.
        let mut queued = Vec::with_capacity(payload.len());
        for (index, chunk) in payload.chunks(unit).enumerate() {
            if !progress(index as u64 + 1, total_units) {
                self.buffered.fetch_sub(queued.len(), Ordering::AcqRel);
                return Ok(false);
            }
            queued.extend_from_slice(chunk);
            self.buffered.fetch_add(chunk.len(), Ordering::AcqRel);
        }

        outbound
            .send(queued)
            .map_err(|_| TransportError::NotConnected)?;
        Ok(true)
    }

    fn buffered_amount(&self) -> usize {
        self.buffered.load(Ordering::Acquire)
    }
}
