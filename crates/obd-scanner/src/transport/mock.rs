//! Simulated OBD adapter for dry runs and testing

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use obd_core::{
    DeviceConnector, DeviceError, DevicePort, DeviceResult, Metric, MonitorStatus, ObdDevice,
    Response, ResponseValue, ValueKind,
};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

/// Mock device behaviour
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Delay added to every query
    pub latency_ms: u64,
}

/// Mock adapter that answers every catalog metric
///
/// Values are synthetic unless overridden with [`MockDevice::set_value`].
pub struct MockDevice {
    config: MockConfig,
    connected: AtomicBool,
    /// Fixed readings (metric -> value)
    values: RwLock<HashMap<Metric, ResponseValue>>,
    /// Metrics that answer with a null reading
    null_metrics: RwLock<HashSet<Metric>>,
    /// Fixed reading time, wall clock when unset
    time: RwLock<Option<f64>>,
    fail_queries: AtomicBool,
    queries: Mutex<Vec<Metric>>,
    counter: AtomicU64,
    close_calls: AtomicUsize,
}

impl MockDevice {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            config: config.clone(),
            connected: AtomicBool::new(true),
            values: RwLock::new(HashMap::new()),
            null_metrics: RwLock::new(HashSet::new()),
            time: RwLock::new(None),
            fail_queries: AtomicBool::new(false),
            queries: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Answer `metric` with a fixed value
    pub fn set_value(&self, metric: Metric, value: ResponseValue) {
        self.values.write().insert(metric, value);
    }

    /// Make `metric` answer with a null reading
    pub fn set_null(&self, metric: Metric) {
        self.null_metrics.write().insert(metric);
    }

    /// Stamp every reading with a fixed time
    pub fn set_time(&self, seconds: f64) {
        *self.time.write() = Some(seconds);
    }

    /// Make every query fail with a protocol error
    pub fn set_failing(&self, failing: bool) {
        self.fail_queries.store(failing, Ordering::SeqCst);
    }

    /// Set connection state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Metrics queried so far, in order
    pub fn queried(&self) -> Vec<Metric> {
        self.queries.lock().clone()
    }

    /// Number of times `close` was called
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn synthetic_value(&self, metric: Metric) -> ResponseValue {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) as f64;
        match metric.kind() {
            ValueKind::Quantity => ResponseValue::quantity(n, metric.unit().unwrap_or_default()),
            ValueKind::Percent => ResponseValue::percent(n % 100.0),
            ValueKind::Count => ResponseValue::Count { magnitude: n },
            ValueKind::Text => ResponseValue::Text {
                text: format!("MOCK-{}", metric.name()),
            },
            ValueKind::TroubleCodes => ResponseValue::TroubleCodes {
                codes: vec![(
                    "P0104".to_string(),
                    "Mass or Volume Air Flow Circuit Intermittent".to_string(),
                )],
            },
            ValueKind::Status => ResponseValue::Status(MonitorStatus {
                mil: false,
                dtc_count: 0,
                ignition_type: "spark".to_string(),
            }),
        }
    }
}

#[async_trait]
impl ObdDevice for MockDevice {
    async fn query(&self, metric: Metric) -> DeviceResult<Option<Response>> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DeviceError::NotConnected);
        }

        // Simulate latency
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        self.queries.lock().push(metric);
        debug!(%metric, "Mock device: query");

        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(DeviceError::Protocol("mock adapter returned garbage".to_string()));
        }
        if self.null_metrics.read().contains(&metric) {
            return Ok(None);
        }

        let value = match self.values.read().get(&metric) {
            Some(value) => value.clone(),
            None => self.synthetic_value(metric),
        };
        let response = match *self.time.read() {
            Some(time) => Response::new(metric, value, time),
            None => Response::now(metric, value),
        };
        Ok(Some(response))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}

/// Connector handing out one shared [`MockDevice`]
///
/// Connecting again reopens the same device so tests keep their handle.
pub struct MockConnector {
    device: Arc<MockDevice>,
    failure: Option<String>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(config: &MockConfig) -> Self {
        Self::with_device(Arc::new(MockDevice::new(config)))
    }

    pub fn with_device(device: Arc<MockDevice>) -> Self {
        Self {
            device,
            failure: None,
            connects: AtomicUsize::new(0),
        }
    }

    /// Connector whose every connect attempt fails
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::new(&MockConfig::default())
        }
    }

    pub fn device(&self) -> Arc<MockDevice> {
        self.device.clone()
    }

    /// Number of successful connects
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceConnector for MockConnector {
    async fn connect(&self, port: &DevicePort) -> DeviceResult<Arc<dyn ObdDevice>> {
        if let Some(reason) = &self.failure {
            return Err(DeviceError::ConnectionFailed(format!("{}: {}", port.portstr, reason)));
        }
        self.device.set_connected(true);
        self.connects.fetch_add(1, Ordering::SeqCst);
        debug!(%port, "Mock device: connected");
        Ok(self.device.clone())
    }
}
