//! Export jobs: fatal pre-checks and the top-level export entry point.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mockup_common::config::AppConfig;
use mockup_common::error::{MockupError, MockupResult};
use mockup_document::SvgDocument;

use crate::diagnostics::DiagnosticSink;
use crate::driver::{DriverSettings, ExportDriver, ExportReport, RenderObserver};
use crate::rasterizer::Rasterizer;
use crate::sanitize::PathSanitizer;

/// An export job ready to be run.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// SVG document whose layers are toggled.
    pub document_path: PathBuf,

    /// Layer configuration file.
    pub config_path: PathBuf,

    /// Directory receiving the PNG files.
    pub output_dir: PathBuf,
}

/// Inputs loaded and validated for a job.
#[derive(Debug, Clone)]
pub struct PreparedExport {
    pub document: SvgDocument,
    pub lines: Vec<String>,
    /// Absolute output directory.
    pub output_dir: PathBuf,
}

impl ExportJob {
    /// A job using the configured default config file and output directory.
    pub fn with_defaults(document_path: impl Into<PathBuf>, config: &AppConfig) -> Self {
        Self {
            document_path: document_path.into(),
            config_path: config.export.config_file.clone(),
            output_dir: config.export.output_dir.clone(),
        }
    }
}

/// Load the configuration lines, ensure the output directory is usable, and
/// parse the document. Any failure here aborts the run before anything is
/// rendered.
pub fn prepare_export(job: &ExportJob) -> MockupResult<PreparedExport> {
    let lines = read_config_lines(&job.config_path)?;
    let output_dir = ensure_output_dir(&job.output_dir)?;
    let document = SvgDocument::open(&job.document_path)
        .map_err(|e| MockupError::document(format!("{}: {e}", job.document_path.display())))?;

    Ok(PreparedExport {
        document,
        lines,
        output_dir,
    })
}

/// Run a whole job and wait for its cleanup watchers.
pub async fn export_document(
    job: &ExportJob,
    config: &AppConfig,
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn DiagnosticSink>,
    observer: Option<RenderObserver>,
) -> MockupResult<ExportReport> {
    tracing::info!(
        document = %job.document_path.display(),
        config = %job.config_path.display(),
        output = %job.output_dir.display(),
        "Starting export"
    );

    let prepared = prepare_export(job)?;
    let settings = DriverSettings::from_config(prepared.output_dir, config);
    let mut driver = ExportDriver::new(prepared.document, rasterizer, sink, settings)
        .with_path_mapper(Arc::new(PathSanitizer::from_config(&config.paths)));
    if let Some(observer) = observer {
        driver = driver.with_observer(observer);
    }

    let summary = driver.run(&prepared.lines);
    tracing::info!(
        lines = summary.lines,
        checkpoints = summary.checkpoints.len(),
        rejected = summary.rejected,
        "Configuration processed"
    );

    let report = driver.finish().await;
    tracing::info!(
        cleanups = report.cleanups.len(),
        timed_out = report.timed_out(),
        "Export finished"
    );
    Ok(report)
}

/// Read a layer configuration file into lines.
pub fn read_config_lines(path: &Path) -> MockupResult<Vec<String>> {
    if !path.is_file() {
        return Err(MockupError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Create the output directory if needed and return its absolute path.
pub fn ensure_output_dir(path: &Path) -> MockupResult<PathBuf> {
    std::fs::create_dir_all(path).map_err(|e| MockupError::output_dir(path, e.to_string()))?;
    let absolute =
        std::fs::canonicalize(path).map_err(|e| MockupError::output_dir(path, e.to_string()))?;
    let metadata =
        std::fs::metadata(&absolute).map_err(|e| MockupError::output_dir(path, e.to_string()))?;

    if !metadata.is_dir() {
        return Err(MockupError::output_dir(path, "not a directory"));
    }
    if metadata.permissions().readonly() {
        return Err(MockupError::output_dir(path, "directory is read-only"));
    }
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let job = ExportJob {
            document_path: dir.path().join("doc.svg"),
            config_path: dir.path().join("MockupMachine.txt"),
            output_dir: dir.path().join("out"),
        };
        let err = prepare_export(&job).unwrap_err();
        assert!(matches!(err, MockupError::FileNotFound { .. }));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_output_path_that_is_a_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("out");
        std::fs::write(&blocker, b"").unwrap();
        let err = ensure_output_dir(&blocker).unwrap_err();
        assert!(matches!(err, MockupError::OutputDir { .. }));
    }

    #[test]
    fn test_output_dir_is_created_and_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let absolute = ensure_output_dir(&nested).unwrap();
        assert!(absolute.is_absolute());
        assert!(absolute.is_dir());
    }

    #[test]
    fn test_malformed_document_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("layers.txt");
        let document = dir.path().join("doc.svg");
        std::fs::write(&config, "a:\n+ x\n").unwrap();
        std::fs::write(&document, "<svg><g></svg>").unwrap();

        let job = ExportJob {
            document_path: document,
            config_path: config,
            output_dir: dir.path().join("out"),
        };
        let err = prepare_export(&job).unwrap_err();
        assert!(matches!(err, MockupError::Document { .. }));
        assert!(err.is_fatal_setup_error());
    }

    #[test]
    fn test_config_lines_keep_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("layers.txt");
        std::fs::write(&config, "a:\r\n+ x\r\n\r\nb:\n").unwrap();
        let lines = read_config_lines(&config).unwrap();
        assert_eq!(lines, vec!["a:", "+ x", "", "b:"]);
    }

    #[test]
    fn test_job_defaults_follow_app_config() {
        let job = ExportJob::with_defaults("mock.svg", &AppConfig::default());
        assert_eq!(job.config_path, PathBuf::from("MockupMachine.txt"));
        assert_eq!(job.output_dir, PathBuf::from("MockupMachine"));
    }
}
