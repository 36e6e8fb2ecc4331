//! obd-influx - OBD-II to InfluxDB recorder
//!
//! Polls the metrics listed in a configuration file from an OBD-II adapter
//! and writes every reading to the configured recorder until Ctrl+C.
//!
//! # Usage
//!
//! Dry run against the simulated adapter:
//! ```bash
//! obd-influx -l DEBUG config/obd-influx-mock.toml
//! ```
//!
//! `config/obd-influx.json` shows a serial adapter and an InfluxDB recorder.
//! Only `mock:` ports have a built-in driver, so that file is usable with
//! `--check` (recorder reachability) until a serial connector is plugged in:
//! ```bash
//! obd-influx --check config/obd-influx.json
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use obd_conv::ConverterRegistry;
use obd_scanner::{transport, Scanner, ScannerConfig};
use obd_storage::RecorderRegistry;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Args, LogLevel};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    info!(config = %args.config.display(), "Loading config");
    let config = ScannerConfig::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;

    let converters = Arc::new(ConverterRegistry::with_builtins());
    let recorders = RecorderRegistry::with_builtins();

    if args.check {
        return check_config(&config, &converters, &recorders).await;
    }

    let connector = transport::create_connector(&config.portstr)
        .with_context(|| {
            format!(
                "Cannot open {}; only '{}' ports have a built-in driver",
                config.portstr,
                transport::MOCK_SCHEME
            )
        })?;

    // Startup failures exit before anything is scanned
    let scanner = Scanner::from_config(&config, converters, &recorders, connector)
        .await
        .context("Failed to start scanner")?;

    info!(
        port = %scanner.port(),
        commands = scanner.metrics().len(),
        frequency = scanner.frequency(),
        recorder = scanner.recorder().backend(),
        "Scanner ready"
    );
    scanner.start();
    info!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    scanner
        .shutdown()
        .await
        .context("Failed to shut down cleanly")?;

    let stats = scanner.stats();
    info!(
        cycles = stats.cycles,
        recorded = stats.recorded,
        null_responses = stats.null_responses,
        conversion_failures = stats.conversion_failures,
        record_failures = stats.record_failures,
        "Scanner stopped"
    );
    Ok(())
}

fn init_logging(level: LogLevel) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Validate the configuration and reach the recorder without scanning
async fn check_config(
    config: &ScannerConfig,
    converters: &ConverterRegistry,
    recorders: &RecorderRegistry,
) -> Result<()> {
    let metrics = config
        .metrics(converters)
        .context("Invalid command list")?;
    println!("Port: {}", config.port());
    println!("Commands:");
    for metric in &metrics {
        println!("  {:<28} {}", metric.name(), metric.description());
    }

    let recorder = recorders
        .create(None, &config.recorder)
        .await
        .context("Invalid recorder configuration")?;

    let result = recorder.ping().await;
    if let Err(e) = recorder.close().await {
        warn!(error = %e, "Failed to close recorder");
    }

    match result.with_context(|| format!("Recorder '{}' unreachable", recorder.backend()))? {
        Some(description) => println!("Recorder '{}': {}", recorder.backend(), description),
        None => println!("Recorder '{}': ok", recorder.backend()),
    }
    Ok(())
}
