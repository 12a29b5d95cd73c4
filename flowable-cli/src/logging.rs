//! Tracing subscriber setup with format selection.

use anyhow::{Context, Result};
use std::io::IsTerminal;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON lines for log shippers.
    Json,
    /// Human-readable multi-line format with colors.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::default(),
        })
    }
}

/// Filter directive for a `-v` count.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Pick the format from `FLOWABLE_LOG_FORMAT`, else pretty on a terminal.
pub fn detect_format(explicit: Option<&str>, is_terminal: bool) -> LogFormat {
    match explicit {
        Some(value) => value.parse().unwrap_or_default(),
        None if is_terminal => LogFormat::Pretty,
        None => LogFormat::Compact,
    }
}

/// Install the global subscriber. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init(verbosity: u8) -> Result<()> {
    let directive = std::env::var("RUST_LOG").unwrap_or_else(|_| level_for(verbosity).to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let explicit = std::env::var("FLOWABLE_LOG_FORMAT").ok();
    let format = detect_format(explicit.as_deref(), std::io::stderr().is_terminal());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .flatten_event(true),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init(),
    }
    .context("Failed to initialize tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Some("JSON"), true), LogFormat::Json);
        assert_eq!(detect_format(Some("bogus"), true), LogFormat::Compact);
        assert_eq!(detect_format(None, true), LogFormat::Pretty);
        assert_eq!(detect_format(None, false), LogFormat::Compact);
    }
}
