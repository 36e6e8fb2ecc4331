//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Crates whose log output the `--log-level` flag controls
const LOG_TARGETS: &[&str] = &[
    "obd_influx",
    "obd_scanner",
    "obd_storage",
    "obd_conv",
    "obd_core",
];

#[derive(Parser, Debug)]
#[command(name = "obd-influx")]
#[command(about = "Poll an OBD-II adapter and record readings in a time-series database")]
#[command(version)]
pub struct Args {
    /// Scanner configuration file (.json or .toml)
    pub config: PathBuf,

    /// Log level for scanner output (RUST_LOG overrides)
    #[arg(short = 'l', long, value_enum, default_value = "INFO", ignore_case = true)]
    pub log_level: LogLevel,

    /// Check the configuration and recorder connection, then exit
    #[arg(long)]
    pub check: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            // tracing has no level above error
            LogLevel::Error | LogLevel::Fatal => "error",
        }
    }

    /// EnvFilter directives: other crates stay at warn
    pub fn filter(self) -> String {
        let level = self.directive();
        std::iter::once("warn".to_string())
            .chain(LOG_TARGETS.iter().map(|target| format!("{}={}", target, level)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["obd-influx", "obd.json"]).unwrap();
        assert_eq!(args.config, PathBuf::from("obd.json"));
        assert_eq!(args.log_level, LogLevel::Info);
        assert!(!args.check);
    }

    #[test]
    fn test_log_level_choices() {
        let args =
            Args::try_parse_from(["obd-influx", "-l", "WARNING", "--check", "obd.toml"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Warning);
        assert!(args.check);

        let args = Args::try_parse_from(["obd-influx", "--log-level", "debug", "x.json"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Debug);

        assert!(Args::try_parse_from(["obd-influx", "-l", "TRACE", "x.json"]).is_err());
        assert!(Args::try_parse_from(["obd-influx"]).is_err());
    }

    #[test]
    fn test_filter() {
        assert_eq!(
            LogLevel::Fatal.filter(),
            "warn,obd_influx=error,obd_scanner=error,obd_storage=error,obd_conv=error,obd_core=error"
        );
        assert!(LogLevel::Warning.filter().contains("obd_scanner=warn"));
    }
}
