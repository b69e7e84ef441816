pub mod flow;
pub mod signals;
pub mod transfer;

pub use flow::{FlowSender, ProgressHook, SendOptions, TransferReport};
pub use signals::{InboundAck, LifecycleSignals, OpenInfo};
pub use transfer::{send_file, SessionState, TransferSession};
