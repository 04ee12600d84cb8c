//! Detached temp-file cleanup after a render has been dispatched.
//!
//! The renderer gives no completion signal, so a watcher polls for the output
//! PNG and removes the temporary document once it appears, or once the
//! polling window runs out. Watchers share nothing with the configuration
//! loop except the filesystem.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mockup_common::config::CleanupConfig;

use crate::diagnostics::{Diagnostic, DiagnosticSink};

/// Bounded polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupPolicy {
    /// Delay before the first existence check.
    pub initial_delay: Duration,
    /// Sleep between checks.
    pub poll_interval: Duration,
    /// Sleeps allowed before giving up.
    pub max_polls: u32,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self::from(&CleanupConfig::default())
    }
}

impl From<&CleanupConfig> for CleanupPolicy {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        }
    }
}

/// How a cleanup watcher finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Output appeared; temp file removed.
    Rendered { output: PathBuf },
    /// Output never appeared; temp file removed anyway.
    TimedOut { output: PathBuf },
}

impl CleanupOutcome {
    pub fn output(&self) -> &Path {
        match self {
            CleanupOutcome::Rendered { output } | CleanupOutcome::TimedOut { output } => output,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, CleanupOutcome::TimedOut { .. })
    }
}

/// Spawn a watcher that removes `temp_file` once `output` exists or the
/// policy's window has elapsed. Must be called from inside a Tokio runtime.
pub fn spawn_cleanup(
    temp_file: PathBuf,
    output: PathBuf,
    policy: CleanupPolicy,
    sink: Arc<dyn DiagnosticSink>,
) -> tokio::task::JoinHandle<CleanupOutcome> {
    tokio::spawn(async move {
        tokio::time::sleep(policy.initial_delay).await;
        let appeared = wait_for_file(&output, policy.poll_interval, policy.max_polls).await;

        if !appeared {
            sink.report(Diagnostic::RenderIncomplete {
                output: output.clone(),
            });
        }

        match remove_if_exists_async(&temp_file).await {
            Ok(removed) => tracing::debug!(
                temp = %temp_file.display(),
                removed,
                "Cleaned up temporary document"
            ),
            Err(e) => tracing::warn!(
                temp = %temp_file.display(),
                error = %e,
                "Failed to remove temporary document"
            ),
        }

        if appeared {
            CleanupOutcome::Rendered { output }
        } else {
            CleanupOutcome::TimedOut { output }
        }
    })
}

/// Poll for `path`, sleeping `interval` between checks, at most `max_polls`
/// times. Returns whether the file was seen.
pub async fn wait_for_file(path: &Path, interval: Duration, max_polls: u32) -> bool {
    let mut polls = 0u32;
    loop {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return true;
        }
        if polls >= max_polls {
            return false;
        }
        tokio::time::sleep(interval).await;
        polls += 1;
    }
}

/// Delete a file, treating absence as success. Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn remove_if_exists_async(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    fn fast_policy(max_polls: u32) -> CleanupPolicy {
        CleanupPolicy {
            initial_delay: Duration::from_millis(5),
            poll_interval: Duration::from_millis(10),
            max_polls,
        }
    }

    #[test]
    fn test_default_policy_matches_plugin_window() {
        let policy = CleanupPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.poll_interval, Duration::from_secs(1));
        assert_eq!(policy.max_polls, 20);
    }

    #[test]
    fn test_remove_if_exists_ignores_absence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.png");
        assert!(!remove_if_exists(&path).unwrap());

        std::fs::write(&path, b"png").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_cleanup_removes_temp_when_output_appears() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("temp-1.svg");
        let output = dir.path().join("a.png");
        std::fs::write(&temp, b"<svg/>").unwrap();

        let sink = CollectingSink::new();
        let handle = spawn_cleanup(temp.clone(), output.clone(), fast_policy(50), Arc::new(sink.clone()));

        tokio::time::sleep(Duration::from_millis(30)).await;
        std::fs::write(&output, b"png").unwrap();

        let outcome = handle.await.unwrap();
        assert_eq!(outcome, CleanupOutcome::Rendered { output });
        assert!(!temp.exists());
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_times_out_and_still_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        let temp = dir.path().join("temp-2.svg");
        let output = dir.path().join("never.png");
        std::fs::write(&temp, b"<svg/>").unwrap();

        let sink = CollectingSink::new();
        let outcome = spawn_cleanup(temp.clone(), output.clone(), fast_policy(3), Arc::new(sink.clone()))
            .await
            .unwrap();

        assert!(outcome.timed_out());
        assert!(!temp.exists());
        assert_eq!(
            sink.entries(),
            vec![Diagnostic::RenderIncomplete { output }]
        );
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_missing_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("a.png");
        std::fs::write(&output, b"png").unwrap();

        let outcome = spawn_cleanup(
            dir.path().join("already-gone.svg"),
            output,
            fast_policy(1),
            Arc::new(CollectingSink::new()),
        )
        .await
        .unwrap();
        assert!(!outcome.timed_out());
    }

    #[tokio::test]
    async fn test_wait_for_file_checks_once_with_zero_polls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x");
        assert!(!wait_for_file(&path, Duration::from_secs(60), 0).await);
        std::fs::write(&path, b"").unwrap();
        assert!(wait_for_file(&path, Duration::from_secs(60), 0).await);
    }
}
