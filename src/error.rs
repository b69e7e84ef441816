use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the transport adapter.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("transport not connected")]
    NotConnected,
}

/// Errors raised while building or decoding a transfer envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("cannot read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Errors surfaced by a transfer session run.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("timed out after {waited_ms} ms while {phase}")]
    Timeout { phase: &'static str, waited_ms: u64 },

    #[error("connection lost while {phase}")]
    ConnectionLost { phase: &'static str },

    #[error("send aborted by progress callback")]
    Aborted,
}
