//! User-visible notices emitted while a configuration is processed.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A recoverable problem or progress notice. None of these stop a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `+`/`-` named a layer the document does not have.
    UnknownLayer { line: usize, layer: String },

    /// `#` named an element id the document does not have.
    UnknownRegion { line: usize, id: String },

    /// A checkpoint fired before any filename was declared.
    MissingFilename { line: usize },

    /// A render is being dispatched.
    Exporting { filename: String },

    /// The render could not be started.
    RenderFailed { filename: String, reason: String },

    /// The output did not appear within the cleanup window.
    RenderIncomplete { output: PathBuf },
}

impl Diagnostic {
    /// Problems are logged as warnings; progress notices as info.
    pub fn is_problem(&self) -> bool {
        !matches!(self, Diagnostic::Exporting { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownLayer { line, layer } => {
                write!(f, "line {line}: unknown layer '{layer}', ignored")
            }
            Diagnostic::UnknownRegion { line, id } => {
                write!(f, "line {line}: unknown region id '{id}', ignored")
            }
            Diagnostic::MissingFilename { line } => {
                write!(f, "line {line}: no filename declared, nothing exported")
            }
            Diagnostic::Exporting { filename } => write!(f, "Exporting {filename}"),
            Diagnostic::RenderFailed { filename, reason } => {
                write!(f, "Export of {filename} failed: {reason}")
            }
            Diagnostic::RenderIncomplete { output } => write!(
                f,
                "{} not ready within the cleanup window, result may be broken",
                output.display()
            ),
        }
    }
}

/// Receives diagnostics from the driver and from detached cleanup tasks.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        if diagnostic.is_problem() {
            tracing::warn!("{diagnostic}");
        } else {
            tracing::info!("{diagnostic}");
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Snapshot of reported problems, skipping progress notices.
    pub fn problems(&self) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(Diagnostic::is_problem)
            .collect()
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let unknown = Diagnostic::UnknownLayer {
            line: 3,
            layer: "z".to_string(),
        };
        assert_eq!(unknown.to_string(), "line 3: unknown layer 'z', ignored");

        let incomplete = Diagnostic::RenderIncomplete {
            output: PathBuf::from("out/a.png"),
        };
        assert!(incomplete.to_string().contains("out/a.png"));
    }

    #[test]
    fn test_collecting_sink_separates_progress() {
        let sink = CollectingSink::new();
        sink.report(Diagnostic::Exporting {
            filename: "a".to_string(),
        });
        sink.report(Diagnostic::MissingFilename { line: 1 });

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.problems(), vec![Diagnostic::MissingFilename { line: 1 }]);
    }
}
