// src/logging.rs

//! Logging setup for `pedigree` using `tracing` + `tracing-subscriber`.
//!
//! The level applies to this crate's own targets; everything else only
//! logs warnings. It is taken from, in order:
//! 1. the `--log-level` flag
//! 2. `PEDIGREE_LOG`, either a bare level ("debug") or full filter
//!    directives ("pedigree::engine=trace,pedigree=info")
//! 3. `info`
//!
//! Logs go to STDERR; stdout is reserved for command output such as the
//! `plugins` listing.

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "PEDIGREE_LOG";

/// Initialise the global logging subscriber.
///
/// Call once at startup; a second call fails.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directives = filter_directives(cli_level, env_value.as_deref());
    let filter = EnvFilter::try_new(&directives)
        .or_else(|_| EnvFilter::try_new(crate_directives(Level::INFO)))?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(())
}

/// Pick the effective level from the CLI flag and the env var value.
///
/// Env values that are not a bare level count as `info` here.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value.and_then(parse_level_str).unwrap_or(Level::INFO),
    }
}

/// Filter directives for the subscriber.
///
/// A flag or a bare level in the env var scopes that level to `pedigree`.
/// Any other non-empty env value is used verbatim as directives.
pub fn filter_directives(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if cli_level.is_none() {
        if let Some(raw) = env_value.map(str::trim).filter(|s| !s.is_empty()) {
            if parse_level_str(raw).is_none() {
                return raw.to_string();
            }
        }
    }
    crate_directives(resolve_level(cli_level, env_value))
}

fn crate_directives(level: Level) -> String {
    format!("warn,pedigree={}", level.as_str().to_lowercase())
}

fn level_from_log_level(lvl: LogLevel) -> Level {
    match lvl {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
