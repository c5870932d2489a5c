// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use courier_core::impls::HttpInvokerConfig;
use courier_core::impls::http_invoker::TARGET_PLACEHOLDER;

use crate::server::ServerConfig;

/// Command-line arguments for `courier`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "courier",
    version,
    about = "Web-triggered runner that repeats an HTTP action until stopped.",
    long_about = None
)]
pub struct CliArgs {
    /// Address to bind the web interface to.
    #[arg(long, value_name = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port for the web interface.
    #[arg(long, value_name = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Endpoint URL template for the external action.
    ///
    /// Must contain `{target}`, which is replaced by the task's target id,
    /// e.g. `https://api.example.com/v1/{target}/messages`.
    #[arg(long, value_name = "URL", required_unless_present = "dry_run")]
    pub endpoint: Option<String>,

    /// Timeout for one external request, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Seconds to wait for workers to stop on shutdown.
    #[arg(long, value_name = "SECS", default_value_t = 5)]
    pub shutdown_grace_secs: u64,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `COURIER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Do not contact any endpoint; every attempt succeeds locally.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl CliArgs {
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.host.clone(), self.port)
    }

    /// `None` in dry-run mode.
    pub fn invoker_config(&self) -> Result<Option<HttpInvokerConfig>> {
        if self.dry_run {
            return Ok(None);
        }
        let Some(endpoint) = self.endpoint.as_deref() else {
            bail!("--endpoint is required unless --dry-run is given");
        };
        if !endpoint.contains(TARGET_PLACEHOLDER) {
            bail!("--endpoint must contain {TARGET_PLACEHOLDER}, got '{endpoint}'");
        }
        if self.request_timeout_secs == 0 {
            bail!("--request-timeout-secs must be greater than zero");
        }
        Ok(Some(
            HttpInvokerConfig::new(endpoint)
                .with_timeout(Duration::from_secs(self.request_timeout_secs)),
        ))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Result<CliArgs, clap::Error> {
        let mut argv = vec!["courier"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv)
    }

    #[test]
    fn endpoint_is_required_without_dry_run() {
        assert!(args(&[]).is_err());
        assert!(args(&["--dry-run"]).is_ok());
    }

    #[test]
    fn defaults() {
        let cli = args(&["--endpoint", "http://localhost:9000/{target}"]).unwrap();
        assert_eq!(cli.server_config().addr(), "127.0.0.1:8080");
        let config = cli.invoker_config().unwrap().unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(cli.shutdown_grace(), Duration::from_secs(5));
    }

    #[test]
    fn endpoint_without_placeholder_is_rejected() {
        let cli = args(&["--endpoint", "http://localhost:9000/send"]).unwrap();
        let err = cli.invoker_config().unwrap_err();
        assert!(err.to_string().contains("{target}"));
    }

    #[test]
    fn dry_run_has_no_invoker_config() {
        let cli = args(&["--dry-run", "--port", "9999", "--log-level", "debug"]).unwrap();
        assert!(cli.invoker_config().unwrap().is_none());
        assert_eq!(cli.port, 9999);
        assert!(matches!(cli.log_level, Some(LogLevel::Debug)));
    }
}
