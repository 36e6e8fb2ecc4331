//! InfluxDB 1.x recorder
//!
//! Writes each packet as one line-protocol point through the HTTP API:
//!
//! ```text
//! POST {scheme}://{host}:{port}/write?db={database}&precision=ns
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use obd_conv::Packet;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::{RecorderError, RecorderResult};
use crate::line_protocol;
use crate::recorder::{settings_from_config, Recorder, RecorderConfig, RecorderFactory};

/// Connection settings for an InfluxDB server
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxDbSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    /// Use HTTPS
    #[serde(default)]
    pub ssl: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl InfluxDbSettings {
    fn base_url(&self) -> RecorderResult<Url> {
        let scheme = if self.ssl { "https" } else { "http" };
        Ok(Url::parse(&format!("{}://{}:{}/", scheme, self.host, self.port))?)
    }
}

/// Recorder backed by an InfluxDB server
#[derive(Debug)]
pub struct InfluxDbRecorder {
    client: Client,
    write_url: Url,
    ping_url: Url,
    username: String,
    password: String,
    closed: AtomicBool,
}

impl InfluxDbRecorder {
    /// Build a recorder; no request is made until the first write or ping
    pub fn new(settings: &InfluxDbSettings) -> RecorderResult<Self> {
        let base = settings.base_url()?;

        let mut write_url = base.join("write")?;
        write_url
            .query_pairs_mut()
            .append_pair("db", &settings.database)
            .append_pair("precision", "ns");
        let ping_url = base.join("ping")?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        info!(url = %base, database = %settings.database, "InfluxDB recorder configured");

        Ok(Self {
            client,
            write_url,
            ping_url,
            username: settings.username.clone(),
            password: settings.password.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// Write endpoint including query parameters
    pub fn write_url(&self) -> &Url {
        &self.write_url
    }

    async fn check_status(response: reqwest::Response) -> RecorderResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(RecorderError::ServerError {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Recorder for InfluxDbRecorder {
    fn backend(&self) -> &str {
        InfluxDbFactory::NAME
    }

    #[instrument(skip(self, packet), fields(measurement = %packet.measurement))]
    async fn record(&self, packet: &Packet) -> RecorderResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RecorderError::Closed);
        }

        let body = line_protocol::encode(packet)?;
        let response = self
            .client
            .post(self.write_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .body(body)
            .send()
            .await?;
        Self::check_status(response).await?;

        debug!("Point written");
        Ok(())
    }

    async fn close(&self) -> RecorderResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("InfluxDB recorder closed");
        }
        Ok(())
    }

    async fn ping(&self) -> RecorderResult<Option<String>> {
        let response = self
            .client
            .get(self.ping_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let version = response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        Ok(Some(format!("InfluxDB {}", version)))
    }
}

/// Factory registered under `influxdb`
#[derive(Debug, Default)]
pub struct InfluxDbFactory;

impl InfluxDbFactory {
    pub const NAME: &'static str = "influxdb";
}

#[async_trait]
impl RecorderFactory for InfluxDbFactory {
    fn required_keys(&self) -> &[&'static str] {
        &["host", "port", "database", "username", "password"]
    }

    async fn create(&self, config: &RecorderConfig) -> RecorderResult<Arc<dyn Recorder>> {
        let settings: InfluxDbSettings = settings_from_config(config)?;
        Ok(Arc::new(InfluxDbRecorder::new(&settings)?))
    }
}
