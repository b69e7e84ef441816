use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use wiredrop::{MessageTransport, ProgressFn, TransportError, TransportEvent};

/// Scriptable transport double. Clones share state: the test keeps one clone
/// to fire events and inspect sends while the session owns another.
///
/// `buffered_amount` follows a preset schedule of readings, one per call;
/// the last reading repeats forever, so a schedule ending in a non-zero
/// value models a transport that never finishes flushing.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<MockInner>,
}

struct MockInner {
    unit: usize,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
    sent: Mutex<Vec<Vec<u8>>>,
    schedule: Mutex<VecDeque<usize>>,
    stop_calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_unit(64 * 1024)
    }

    pub fn with_unit(unit: usize) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(MockInner {
                unit,
                event_tx,
                event_rx: Mutex::new(Some(event_rx)),
                sent: Mutex::new(Vec::new()),
                schedule: Mutex::new(VecDeque::new()),
                stop_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Handle for firing transport events into the session. Keeping it alive
    /// keeps the event channel open.
    pub fn events(&self) -> mpsc::UnboundedSender<TransportEvent> {
        self.inner.event_tx.clone()
    }

    pub fn schedule_buffered(&self, readings: &[usize]) {
        self.inner.schedule.lock().unwrap().extend(readings);
    }

    pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
        self.inner.sent.lock().unwrap().clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.inner.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn start(&mut self) -> Result<mpsc::UnboundedReceiver<TransportEvent>, TransportError> {
        self.inner
            .event_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(TransportError::NotConnected)
    }

    async fn stop(&mut self) {
        self.inner.stop_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn send_binary(
        &self,
        payload: Vec<u8>,
        progress: ProgressFn<'_>,
    ) -> Result<bool, TransportError> {
        let total_units = payload.len().div_ceil(self.inner.unit).max(1) as u64;
        for current in 1..=total_units {
            if !progress(current, total_units) {
                return Ok(false);
            }
        }
        self.inner.sent.lock().unwrap().push(payload);
        Ok(true)
    }

    fn buffered_amount(&self) -> usize {
        let mut schedule = self.inner.schedule.lock().unwrap();
        if schedule.len() > 1 {
            schedule.pop_front().unwrap()
        } else {
            schedule.front().copied().unwrap_or(0)
        }
    }
}
