//! Logging and tracing initialization.

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::LoggingConfig;

/// Where log lines are written.
enum LogTarget {
    Stderr,
    File(File),
}

/// Initialize the tracing subscriber with the given configuration.
///
/// When `config.file` is set, log lines are appended to that file instead of
/// stderr, in plain or JSON form as configured. If the file cannot be opened,
/// stderr is used and a warning is logged.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let (target, open_error) = open_target(config);
    let to_file = matches!(target, LogTarget::File(_));
    let writer = match target {
        LogTarget::File(file) => BoxMakeWriter::new(Mutex::new(file)),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(!to_file);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish()).ok();
    } else {
        let subscriber = builder
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }

    if let Some(warning) = open_error {
        tracing::warn!("{warning}");
    }
}

/// Open the configured log file, falling back to stderr. The second value
/// describes an open failure, to be logged once a subscriber exists.
fn open_target(config: &LoggingConfig) -> (LogTarget, Option<String>) {
    let Some(path) = &config.file else {
        return (LogTarget::Stderr, None);
    };
    match std::fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => (LogTarget::File(file), None),
        Err(e) => (
            LogTarget::Stderr,
            Some(format!("Failed to open log file {}: {e}", path.display())),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_logs_to_stderr() {
        let (target, warning) = open_target(&LoggingConfig::default());
        assert!(matches!(target, LogTarget::Stderr));
        assert!(warning.is_none());
    }

    #[test]
    fn test_log_file_is_opened_for_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mockup.log");
        let config = LoggingConfig {
            json: true,
            file: Some(path.clone()),
            ..LoggingConfig::default()
        };
        let (target, warning) = open_target(&config);
        assert!(matches!(target, LogTarget::File(_)));
        assert!(warning.is_none());
        assert!(path.exists());
    }

    #[test]
    fn test_unopenable_file_falls_back_with_warning() {
        let config = LoggingConfig {
            json: true,
            file: Some("/nonexistent/mockup/logs/mockup.log".into()),
            ..LoggingConfig::default()
        };
        let (target, warning) = open_target(&config);
        assert!(matches!(target, LogTarget::Stderr));
        assert!(warning
            .unwrap()
            .contains("/nonexistent/mockup/logs/mockup.log"));
    }
}
