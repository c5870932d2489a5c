// src/logging.rs

//! Subscriber setup for the `courier` binary.
//!
//! The level comes from `--log-level`, then `COURIER_LOG`, then `info`.
//! HTTP stack crates (hyper, h2, reqwest) are held at `warn` so a `debug` run
//! shows task activity instead of connection chatter.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "COURIER_LOG";

const QUIET_TARGETS: [&str; 3] = ["hyper", "h2", "reqwest"];

/// Install the global subscriber. Fails if one is already set.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV).ok();
    let level = effective_level(cli_level, env_value.as_deref());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter_for(level))
        .try_init()
        .context("failed to initialise logging")
}

fn effective_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    cli_level
        .map(Level::from)
        .or_else(|| env_value.and_then(|v| v.trim().parse().ok()))
        .unwrap_or(Level::INFO)
}

fn filter_for(level: Level) -> Targets {
    let quiet = level.min(Level::WARN);
    QUIET_TARGETS
        .iter()
        .fold(Targets::new().with_default(level), |filter, target| {
            filter.with_target(*target, quiet)
        })
}
