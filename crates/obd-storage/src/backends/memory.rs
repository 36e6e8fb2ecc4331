//! In-memory recorder for dry runs and tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use obd_conv::Packet;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{RecorderError, RecorderResult};
use crate::recorder::{Recorder, RecorderConfig, RecorderFactory};

/// Keeps every recorded packet in memory
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<Packet>>,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded packets
    pub fn records(&self) -> Vec<Packet> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of times `close` was called
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recorder for MemoryRecorder {
    fn backend(&self) -> &str {
        MemoryRecorderFactory::NAME
    }

    async fn record(&self, packet: &Packet) -> RecorderResult<()> {
        if self.is_closed() {
            return Err(RecorderError::Closed);
        }
        debug!(measurement = %packet.measurement, time = packet.time, "Recorded packet in memory");
        self.records.lock().push(packet.clone());
        Ok(())
    }

    async fn close(&self) -> RecorderResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory for [`MemoryRecorder`]
///
/// With a shared sink every created recorder is the same instance, so a
/// test can inspect what a scanner recorded.
#[derive(Debug, Default)]
pub struct MemoryRecorderFactory {
    sink: Option<Arc<MemoryRecorder>>,
}

impl MemoryRecorderFactory {
    pub const NAME: &'static str = "memory";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(sink: Arc<MemoryRecorder>) -> Self {
        Self { sink: Some(sink) }
    }
}

#[async_trait]
impl RecorderFactory for MemoryRecorderFactory {
    async fn create(&self, _config: &RecorderConfig) -> RecorderResult<Arc<dyn Recorder>> {
        let recorder = match &self.sink {
            Some(sink) => sink.clone(),
            None => Arc::new(MemoryRecorder::new()),
        };
        Ok(recorder)
    }
}
