//! Structured Logging Setup
//!
//! `RUST_LOG` takes precedence; otherwise the configured level (or DEBUG when
//! verbose) is the default directive. Logs go to stderr so command output on
//! stdout stays clean.

use crate::Config;
use anyhow::Result;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Build the filter from configuration and the verbose flag
pub fn env_filter(config: &Config, verbose: bool) -> Result<EnvFilter> {
    let level = if verbose {
        Level::DEBUG
    } else {
        config.log_level()?
    };

    Ok(EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy())
}

/// Install the global subscriber in the configured format
///
/// # Errors
///
/// Fails if the level is invalid or a global subscriber is already set.
pub fn init(config: &Config, verbose: bool) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config, verbose)?)
        .with_writer(std::io::stderr);

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing::{debug, info, warn};
    use tracing_subscriber::fmt;

    #[test]
    fn test_env_filter_from_config() {
        let mut config = Config::default();
        config.logging.level = "warn".to_string();
        assert!(env_filter(&config, false).is_ok());
    }

    #[test]
    fn test_env_filter_verbose_ignores_bad_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        assert!(env_filter(&config, false).is_err());
        assert!(env_filter(&config, true).is_ok());
    }

    #[test]
    fn test_init_rejects_invalid_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(init(&config, false).is_err());
    }

    /// In-memory log sink shared with the subscriber
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_json_output_format() {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = fmt()
            .json()
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            info!(command = "ls", verdict = "allowed", "Structured message");
        });

        let output = sink.contents();
        let line = output.lines().next().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(line).unwrap();

        assert!(line.contains(r#""command":"ls""#));
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["fields"]["verdict"], "allowed");
        assert_eq!(parsed["fields"]["message"], "Structured message");
    }

    #[test]
    fn test_log_fields() {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let command = "sudo ls";
        let reason = "forbidden pattern";

        tracing::subscriber::with_default(subscriber, || {
            info!(command = %command, "Info message");
            debug!(command = %command, "Debug message");
            warn!(command = %command, reason = %reason, "Warning message");
        });

        let output = sink.contents();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("INFO") && lines[0].contains("command=sudo ls"));
        assert!(lines[1].contains("DEBUG") && lines[1].contains("Debug message"));
        assert!(lines[2].contains("WARN") && lines[2].contains("reason=forbidden pattern"));
    }
}
