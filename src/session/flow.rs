use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::SessionError;
use crate::transport::MessageTransport;

/// Interval between buffered-amount polls while draining.
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pause inserted per unit when throttling is enabled.
pub const THROTTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Caller-facing observer for per-unit send progress. Returning false
/// aborts the send.
pub type ProgressHook = Box<dyn FnMut(u64, u64) -> bool + Send>;

/// Knobs for one flow-controlled send.
pub struct SendOptions {
    pub throttle: bool,
    pub drain_timeout: Option<Duration>,
    pub progress: Option<ProgressHook>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            throttle: false,
            drain_timeout: None,
            progress: None,
        }
    }
}

/// Summary of a completed send, drain included.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReport {
    pub bytes: u64,
    pub elapsed_ms: u64,
    pub rate_mb_s: f64,
}

/// Effective transfer rate in MB/s. Elapsed time is clamped to at least one
/// millisecond so very small or very fast transfers do not divide by zero.
pub fn transfer_rate_mb_s(bytes: u64, elapsed_ms: u64) -> f64 {
    let elapsed_ms = elapsed_ms.max(1);
    (bytes as f64 * 1000.0 / elapsed_ms as f64) / (1024.0 * 1024.0)
}

/// Streams one payload through the transport without overrunning its
/// outbound buffer. `push` hands the payload over in a single send call;
/// `drain` polls the buffer down to zero before the transfer counts as
/// complete.
pub struct FlowSender<'a, T: MessageTransport> {
    transport: &'a T,
    started: Option<Instant>,
    bytes: u64,
}

impl<'a, T: MessageTransport> FlowSender<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            started: None,
            bytes: 0,
        }
    }

    /// Hand the payload to the transport. The throughput clock starts here.
    pub async fn push(
        &mut self,
        payload: Vec<u8>,
        options: &mut SendOptions,
    ) -> Result<(), SessionError> {
        self.bytes = payload.len() as u64;
        self.started = Some(Instant::now());

        let throttle = options.throttle;
        let hook = &mut options.progress;
        let mut callback = |current: u64, total: u64| -> bool {
            debug!("send step {current} out of {total}");
            let mut keep_going = true;
            if let Some(hook) = hook.as_deref_mut() {
                keep_going = hook(current, total);
            }
            if throttle {
                // Blocking on purpose: the throttle stalls the transport's
                // fragmentation loop itself.
                std::thread::sleep(THROTTLE_INTERVAL);
            }
            keep_going
        };

        let completed = self
            .transport
            .send_binary(payload, &mut callback)
            .await?;
        if !completed {
            return Err(SessionError::Aborted);
        }
        Ok(())
    }

    /// Poll the transport until its outbound buffer reads exactly zero,
    /// sleeping between polls. The throughput clock stops here. `limit:
    /// None` polls indefinitely.
    pub async fn drain(&mut self, limit: Option<Duration>) -> Result<TransferReport, SessionError> {
        let started = self.started.unwrap_or_else(Instant::now);
        let drain_started = Instant::now();

        loop {
            let buffered = self.transport.buffered_amount();
            if buffered == 0 {
                break;
            }
            debug!("{buffered} bytes left to be sent");
            if let Some(limit) = limit {
                if drain_started.elapsed() > limit {
                    return Err(SessionError::Timeout {
                        phase: "draining",
                        waited_ms: limit.as_millis() as u64,
                    });
                }
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }

        let elapsed_ms = (started.elapsed().as_millis() as u64).max(1);
        Ok(TransferReport {
            bytes: self.bytes,
            elapsed_ms,
            rate_mb_s: transfer_rate_mb_s(self.bytes, elapsed_ms),
        })
    }
}
