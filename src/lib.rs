pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod utils;

// Re-export the surface used by the binary and by integration tests
pub use config::SendConfig;
pub use error::{EnvelopeError, SessionError, TransportError};
pub use protocol::{AckReply, Envelope, MissingFilePolicy};
pub use session::{
    send_file, FlowSender, LifecycleSignals, ProgressHook, SendOptions, SessionState,
    TransferReport, TransferSession,
};
pub use transport::{
    MessageTransport, ProgressFn, TlsOptions, TransportConfig, TransportEvent, WsTransport,
};
