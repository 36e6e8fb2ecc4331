//! Scanner - polls a device and feeds a recorder
//!
//! The scanner owns the device connection, the polling list, the converter
//! table and one recorder. `start` spawns a single worker task that loops:
//!
//! 1. sleep for the current period
//! 2. query the next metric (round-robin)
//! 3. convert the reading and hand the packet to the recorder
//!
//! Failures inside the loop are logged and the cycle is skipped; the loop
//! only ends when `stop` raises the cancellation flag.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use obd_conv::ConverterRegistry;
use obd_core::{DeviceConnector, DevicePort, Metric, ObdDevice, Response};
use obd_storage::{Recorder, RecorderRegistry};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::config::{check_metrics, ScannerConfig};
use crate::error::{ScanError, ScanResult};
use crate::schedule::RoundRobin;

/// Polling frequency used when none is configured (Hz)
pub const DEFAULT_FREQUENCY: f64 = 10.0;

/// Highest frequency adapters are expected to sustain (Hz); not enforced
pub const MAX_FREQUENCY: f64 = 100.0;

type SharedDevice = Arc<RwLock<Option<Arc<dyn ObdDevice>>>>;

/// Snapshot of worker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Completed loop iterations
    pub cycles: u64,
    /// Packets accepted by the recorder
    pub recorded: u64,
    /// Null readings (including failed queries)
    pub null_responses: u64,
    /// Readings the converter table refused
    pub conversion_failures: u64,
    /// Packets the recorder refused
    pub record_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    cycles: AtomicU64,
    recorded: AtomicU64,
    null_responses: AtomicU64,
    conversion_failures: AtomicU64,
    record_failures: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            recorded: self.recorded.load(Ordering::Relaxed),
            null_responses: self.null_responses.load(Ordering::Relaxed),
            conversion_failures: self.conversion_failures.load(Ordering::Relaxed),
            record_failures: self.record_failures.load(Ordering::Relaxed),
        }
    }
}

/// Background poller for one device
pub struct Scanner {
    port: DevicePort,
    connector: Arc<dyn DeviceConnector>,
    device: SharedDevice,
    metrics: Arc<[Metric]>,
    converters: Arc<ConverterRegistry>,
    recorder: Arc<dyn Recorder>,
    /// Seconds between queries
    period: Arc<RwLock<f64>>,
    cancel: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    recorder_closed: AtomicBool,
    counters: Arc<Counters>,
}

impl Scanner {
    /// Create a scanner and connect to the device
    ///
    /// Fails without connecting when the polling list or frequency is
    /// invalid, and fails when the device cannot be opened.
    pub async fn new(
        port: DevicePort,
        metrics: Vec<Metric>,
        recorder: Arc<dyn Recorder>,
        converters: Arc<ConverterRegistry>,
        connector: Arc<dyn DeviceConnector>,
        frequency: Option<f64>,
    ) -> ScanResult<Self> {
        check_metrics(&metrics, &converters)?;
        let period = period_for(frequency)?;

        let scanner = Self {
            port,
            connector,
            device: Arc::new(RwLock::new(None)),
            metrics: metrics.into(),
            converters,
            recorder,
            period: Arc::new(RwLock::new(period)),
            cancel: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
            recorder_closed: AtomicBool::new(false),
            counters: Arc::new(Counters::default()),
        };
        scanner.connect().await?;
        Ok(scanner)
    }

    /// Build a scanner from configuration
    ///
    /// The recorder is created from the `recorder` section through
    /// `recorders`, and closed again if the device cannot be opened.
    pub async fn from_config(
        config: &ScannerConfig,
        converters: Arc<ConverterRegistry>,
        recorders: &RecorderRegistry,
        connector: Arc<dyn DeviceConnector>,
    ) -> ScanResult<Self> {
        let metrics = config.metrics(&converters)?;
        // Reject a bad frequency before touching the backend
        period_for(config.frequency)?;

        let recorder = recorders.create(None, &config.recorder).await?;
        info!(backend = recorder.backend(), "Recorder created");

        match Self::new(
            config.port(),
            metrics,
            recorder.clone(),
            converters,
            connector,
            config.frequency,
        )
        .await
        {
            Ok(scanner) => Ok(scanner),
            Err(e) => {
                if let Err(close_err) = recorder.close().await {
                    warn!(error = %close_err, "Failed to close recorder after startup failure");
                }
                Err(e)
            }
        }
    }

    /// Open the device connection
    ///
    /// A no-op when already connected; the open connection is kept.
    pub async fn connect(&self) -> ScanResult<()> {
        if self.is_connected() {
            error!("Scanner already connected to OBD device");
            return Ok(());
        }
        debug!(port = %self.port, "Connecting to OBD device");
        let device = self.connector.connect(&self.port).await.map_err(|e| {
            error!(port = %self.port, error = %e, "Failed to connect to OBD device");
            e
        })?;
        *self.device.write() = Some(device);
        info!(port = %self.port, "Connected to OBD device");
        Ok(())
    }

    /// Close the device connection
    pub async fn disconnect(&self) {
        if !self.is_connected() {
            error!("Scanner not connected to OBD device");
            return;
        }
        let device = self.device.write().take();
        if let Some(device) = device {
            device.close().await;
            info!(port = %self.port, "Disconnected from OBD device");
        }
    }

    /// Spawn the polling worker
    ///
    /// Requires an open connection. Must be called from within a tokio
    /// runtime.
    pub fn start(&self) {
        if !self.is_connected() {
            error!("Scanner not connected to OBD device");
            return;
        }
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            error!("Scanner already started");
            return;
        }

        self.cancel.store(false, Ordering::SeqCst);
        let task = ScanTask {
            schedule: RoundRobin::new(self.metrics.clone()),
            device: self.device.clone(),
            converters: self.converters.clone(),
            recorder: self.recorder.clone(),
            period: self.period.clone(),
            cancel: self.cancel.clone(),
            counters: self.counters.clone(),
        };
        *worker = Some(tokio::spawn(task.run()));
    }

    /// Signal the worker to exit and wait for it
    ///
    /// Waits for at most one period plus one in-flight query.
    pub async fn stop(&self) {
        if !self.is_scanning() {
            error!("Scanner not started");
            return;
        }
        self.cancel.store(true, Ordering::SeqCst);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Scanner worker panicked");
            }
        }
    }

    /// Stop, disconnect and close the recorder
    ///
    /// Safe to call repeatedly; the recorder is closed only once.
    pub async fn shutdown(&self) -> ScanResult<()> {
        if self.is_scanning() {
            self.stop().await;
        }
        if self.is_connected() {
            self.disconnect().await;
        }
        if !self.recorder_closed.swap(true, Ordering::SeqCst) {
            self.recorder.close().await?;
            info!(backend = self.recorder.backend(), "Recorder closed");
        }
        Ok(())
    }

    /// Polling frequency in Hz
    pub fn frequency(&self) -> f64 {
        1.0 / *self.period.read()
    }

    /// Change the polling frequency
    ///
    /// `None` restores the default. Takes effect from the next cycle; a
    /// rejected value leaves the current frequency in place.
    pub fn set_frequency(&self, frequency: Option<f64>) -> ScanResult<()> {
        let period = period_for(frequency)?;
        *self.period.write() = period;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.device
            .read()
            .as_ref()
            .is_some_and(|device| device.is_connected())
    }

    /// Whether the worker task is alive
    pub fn is_scanning(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Polling list in order
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn stats(&self) -> ScanStats {
        self.counters.snapshot()
    }

    pub fn port(&self) -> &DevicePort {
        &self.port
    }

    pub fn recorder(&self) -> &Arc<dyn Recorder> {
        &self.recorder
    }
}

impl Drop for Scanner {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("port", &self.port)
            .field("metrics", &self.metrics)
            .field("frequency", &self.frequency())
            .field("recorder", &self.recorder.backend())
            .finish()
    }
}

/// Convert a frequency into a loop period in seconds
fn period_for(frequency: Option<f64>) -> ScanResult<f64> {
    let hz = frequency.unwrap_or(DEFAULT_FREQUENCY);
    if !hz.is_finite() {
        return Err(ScanError::Validation(format!(
            "desired frequency {} is not finite",
            hz
        )));
    }
    if hz <= 0.0 {
        return Err(ScanError::Validation(format!(
            "desired frequency {} <= 0.0",
            hz
        )));
    }
    if hz > MAX_FREQUENCY {
        warn!(
            frequency = hz,
            max = MAX_FREQUENCY,
            "Frequency above what OBD adapters sustain"
        );
    }

    let period = 1.0 / hz;
    Duration::try_from_secs_f64(period).map_err(|_| {
        ScanError::Validation(format!("desired frequency {} is too low", hz))
    })?;
    Ok(period)
}

/// State moved into the worker task
struct ScanTask {
    schedule: RoundRobin,
    device: SharedDevice,
    converters: Arc<ConverterRegistry>,
    recorder: Arc<dyn Recorder>,
    period: Arc<RwLock<f64>>,
    cancel: Arc<AtomicBool>,
    counters: Arc<Counters>,
}

impl ScanTask {
    async fn run(mut self) {
        info!("Scanner started");
        while !self.cancel.load(Ordering::SeqCst) {
            let period = *self.period.read();
            tokio::time::sleep(Duration::from_secs_f64(period)).await;

            let metric = self.schedule.next_metric();
            match self.query(metric).await {
                Some(response) => self.record(&response).await,
                None => {
                    warn!(%metric, "Command returned no data");
                    Counters::bump(&self.counters.null_responses);
                }
            }
            Counters::bump(&self.counters.cycles);
        }
        info!("Scanner stopped");
    }

    async fn query(&self, metric: Metric) -> Option<Response> {
        // Clone out so the lock is not held across the query
        let device = self.device.read().clone();
        let Some(device) = device else {
            debug!(%metric, "No device connection");
            return None;
        };

        match device.query(metric).await {
            Ok(response) => response,
            Err(e) => {
                error!(%metric, error = %e, "Device query failed");
                None
            }
        }
    }

    async fn record(&self, response: &Response) {
        let packet = match self.converters.convert(response) {
            Ok(packet) => packet,
            Err(e) => {
                error!(metric = %response.metric, error = %e, "Conversion failed");
                Counters::bump(&self.counters.conversion_failures);
                return;
            }
        };

        match self.recorder.record(&packet).await {
            Ok(()) => {
                trace!(measurement = %packet.measurement, time = packet.time, "Recorded");
                Counters::bump(&self.counters.recorded);
            }
            Err(e) => {
                error!(measurement = %packet.measurement, error = %e, "Recorder rejected packet");
                Counters::bump(&self.counters.record_failures);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockConfig, MockConnector, MockDevice};
    use obd_core::DeviceResult;
    use obd_storage::MemoryRecorder;

    fn metric(name: &str) -> Metric {
        Metric::from_name(name).unwrap()
    }

    async fn scanner(metrics: &[&str], frequency: Option<f64>) -> (Scanner, Arc<MemoryRecorder>) {
        let recorder = Arc::new(MemoryRecorder::new());
        let scanner = Scanner::new(
            DevicePort::new("mock:", 38400),
            metrics.iter().map(|n| metric(n)).collect(),
            recorder.clone(),
            Arc::new(ConverterRegistry::with_builtins()),
            Arc::new(MockConnector::new(&MockConfig::default())),
            frequency,
        )
        .await
        .unwrap();
        (scanner, recorder)
    }

    #[test]
    fn test_period_for() {
        assert_eq!(period_for(None).unwrap(), 0.1);
        assert_eq!(period_for(Some(4.0)).unwrap(), 0.25);
        assert!(period_for(Some(0.0)).is_err());
        assert!(period_for(Some(-10.0)).is_err());
        assert!(period_for(Some(f64::NAN)).is_err());
        assert!(period_for(Some(f64::INFINITY)).is_err());
        assert!(period_for(Some(1e-300)).is_err());
        // Above the documented maximum is only a warning
        assert_eq!(period_for(Some(200.0)).unwrap(), 0.005);
    }

    #[tokio::test]
    async fn test_frequency_setter() {
        let (scanner, _) = scanner(&["SPEED"], None).await;
        assert!((scanner.frequency() - DEFAULT_FREQUENCY).abs() < 1e-9);

        scanner.set_frequency(Some(21.55)).unwrap();
        assert!((scanner.frequency() - 21.55).abs() < 1e-9);

        let err = scanner.set_frequency(Some(0.0)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert!((scanner.frequency() - 21.55).abs() < 1e-9);

        assert!(scanner.set_frequency(Some(-10.0)).is_err());
        assert!((scanner.frequency() - 21.55).abs() < 1e-9);

        scanner.set_frequency(None).unwrap();
        assert!((scanner.frequency() - DEFAULT_FREQUENCY).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_connected_after_construction() {
        let (scanner, _) = scanner(&["RPM"], None).await;
        assert!(scanner.is_connected());
        assert!(!scanner.is_scanning());

        scanner.disconnect().await;
        assert!(!scanner.is_connected());
        // Second disconnect only logs
        scanner.disconnect().await;

        scanner.connect().await.unwrap();
        assert!(scanner.is_connected());
    }

    #[tokio::test]
    async fn test_invalid_frequency_rejected_at_construction() {
        let result = Scanner::new(
            DevicePort::new("mock:", 38400),
            vec![metric("RPM")],
            Arc::new(MemoryRecorder::new()),
            Arc::new(ConverterRegistry::with_builtins()),
            Arc::new(MockConnector::new(&MockConfig::default())),
            Some(0.0),
        )
        .await;
        assert!(matches!(result, Err(ScanError::Validation(_))));
    }

    /// Hands out a new device on every connect
    #[derive(Default)]
    struct FreshConnector {
        devices: Mutex<Vec<Arc<MockDevice>>>,
    }

    #[async_trait::async_trait]
    impl DeviceConnector for FreshConnector {
        async fn connect(&self, _port: &DevicePort) -> DeviceResult<Arc<dyn ObdDevice>> {
            let device = Arc::new(MockDevice::new(&MockConfig::default()));
            self.devices.lock().push(device.clone());
            Ok(device)
        }
    }

    #[tokio::test]
    async fn test_connect_when_connected_keeps_connection() {
        let connector = Arc::new(FreshConnector::default());
        let scanner = Scanner::new(
            DevicePort::new("mock:", 38400),
            vec![metric("RPM")],
            Arc::new(MemoryRecorder::new()),
            Arc::new(ConverterRegistry::with_builtins()),
            connector.clone(),
            None,
        )
        .await
        .unwrap();

        scanner.connect().await.unwrap();
        assert_eq!(connector.devices.lock().len(), 1);

        scanner.shutdown().await.unwrap();
        let devices = connector.devices.lock().clone();
        assert_eq!(devices[0].close_count(), 1);
        assert!(!devices[0].is_connected());
    }

    #[tokio::test]
    async fn test_start_requires_connection() {
        let (scanner, recorder) = scanner(&["RPM"], Some(100.0)).await;
        scanner.disconnect().await;

        scanner.start();
        assert!(!scanner.is_scanning());
        assert_eq!(scanner.stats().cycles, 0);
        assert!(recorder.is_empty());
    }

    #[tokio::test]
    async fn test_stop_when_not_started_is_noop() {
        let (scanner, recorder) = scanner(&["RPM"], Some(100.0)).await;
        scanner.stop().await;
        assert!(!scanner.is_scanning());
        assert!(recorder.is_empty());
    }
}
