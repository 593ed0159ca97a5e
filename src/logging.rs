// src/logging.rs

//! Logging setup for `scriptlink` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` on the command line
//! 2. `SCRIPTLINK_LOG`, as `EnvFilter` directives (e.g. `debug` or
//!    `warn,scriptlink::oplog=info`)
//! 3. `info`
//!
//! Everything goes to STDERR; stdout carries script output only. The
//! operation log uses the `scriptlink::oplog` target and can be filtered on
//! its own.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "SCRIPTLINK_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    let directives = match (cli_level, env.map(str::trim)) {
        (Some(level), _) => level_directive(level).to_string(),
        (None, Some(s)) if !s.is_empty() => s.to_string(),
        _ => "info".to_string(),
    };
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log filter `{directives}`"))
}

fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
