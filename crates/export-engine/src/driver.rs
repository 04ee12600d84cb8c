//! The export driver: configuration loop and checkpoint protocol.

use std::path::PathBuf;
use std::sync::Arc;

use mockup_common::config::AppConfig;
use mockup_document::style::with_display;
use mockup_document::{DocumentResult, LayerDocument, LayerRegistry, Visibility};

use crate::cleanup::{remove_if_exists, spawn_cleanup, CleanupOutcome, CleanupPolicy};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::directive::Directive;
use crate::rasterizer::{RenderOutcome, RenderRequest, Rasterizer};
use crate::sanitize::{PathMapper, PathSanitizer};
use crate::state::{CheckpointPlan, ExportState, Step};

/// Where and how checkpoints are rendered.
#[derive(Debug, Clone)]
pub struct DriverSettings {
    /// Receives PNGs and temporary documents. Should be absolute.
    pub output_dir: PathBuf,

    /// Temp document stem; the checkpoint number and `.svg` are appended.
    pub temp_base: String,

    /// Export resolution.
    pub dpi: u32,

    /// Temp-file cleanup schedule.
    pub cleanup: CleanupPolicy,
}

impl DriverSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let defaults = AppConfig::default();
        Self::from_config(output_dir, &defaults)
    }

    pub fn from_config(output_dir: impl Into<PathBuf>, config: &AppConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            temp_base: config.export.temp_base.clone(),
            dpi: config.renderer.dpi,
            cleanup: CleanupPolicy::from(&config.cleanup),
        }
    }
}

/// Observes the real outcome of each dispatched render.
pub type RenderObserver = Arc<dyn Fn(RenderReport) + Send + Sync>;

/// Delivered to a [`RenderObserver`] when a render process exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub sequence: u64,
    pub filename: String,
    pub output: PathBuf,
    pub outcome: RenderOutcome,
}

/// A checkpoint whose render was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointRecord {
    pub sequence: u64,
    pub plan: CheckpointPlan,
    pub temp_file: PathBuf,
    pub output: PathBuf,
}

impl CheckpointRecord {
    pub fn filename(&self) -> &str {
        self.plan.filename.as_deref().unwrap_or_default()
    }
}

/// Counters for one configuration run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines read from the configuration.
    pub lines: usize,
    /// Dispatched renders, in order.
    pub checkpoints: Vec<CheckpointRecord>,
    /// Directives dropped for naming unknown layers or ids.
    pub rejected: usize,
    /// Checkpoints with no filename to render to.
    pub skipped: usize,
    /// Checkpoints whose temp file could not be written or whose render could not start.
    pub failed: usize,
}

/// Everything known once all cleanup watchers have finished.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub summary: RunSummary,
    pub cleanups: Vec<CleanupOutcome>,
}

impl ExportReport {
    pub fn timed_out(&self) -> usize {
        self.cleanups.iter().filter(|c| c.timed_out()).count()
    }
}

/// Turns configuration lines into rendered images.
///
/// The loop itself is synchronous; each checkpoint dispatches its render and
/// spawns a cleanup watcher without waiting for either. Must be driven from
/// inside a Tokio runtime.
pub struct ExportDriver<D: LayerDocument> {
    document: D,
    state: ExportState,
    rasterizer: Arc<dyn Rasterizer>,
    mapper: Arc<dyn PathMapper>,
    sink: Arc<dyn DiagnosticSink>,
    settings: DriverSettings,
    observer: Option<RenderObserver>,
    cleanups: Vec<tokio::task::JoinHandle<CleanupOutcome>>,
    observations: Vec<tokio::task::JoinHandle<()>>,
    summary: RunSummary,
}

impl<D: LayerDocument> ExportDriver<D> {
    /// Create a driver; the document's layers are scanned once here.
    pub fn new(
        document: D,
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn DiagnosticSink>,
        settings: DriverSettings,
    ) -> Self {
        let available = LayerRegistry::scan(&document);
        Self {
            document,
            state: ExportState::new(available),
            rasterizer,
            mapper: Arc::new(PathSanitizer::identity()),
            sink,
            settings,
            observer: None,
            cleanups: Vec::new(),
            observations: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    /// Map renderer paths through `mapper`.
    pub fn with_path_mapper(mut self, mapper: Arc<dyn PathMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    /// Report each render's exit status to `observer`.
    pub fn with_observer(mut self, observer: RenderObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Process every line, then force a final checkpoint if the last block
    /// is still pending.
    pub fn run<I, S>(&mut self, lines: I) -> &RunSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.summary.lines += 1;
            let line_no = self.summary.lines;
            self.process_line(line_no, line.as_ref());
        }

        if let Some(plan) = self.state.finish(self.summary.lines + 1) {
            self.render_checkpoint(plan);
        }
        &self.summary
    }

    /// Apply one configuration line.
    pub fn process_line(&mut self, line_no: usize, line: &str) {
        let directive = Directive::parse(line);
        let document = &self.document;
        match self
            .state
            .apply(line_no, directive, |id| document.has_element(id))
        {
            Step::Continue => {}
            Step::Rejected(diagnostic) => {
                self.summary.rejected += 1;
                self.sink.report(diagnostic);
            }
            Step::Checkpoint(plan) => self.render_checkpoint(plan),
        }
    }

    /// Render one frozen state: set visibility, write a temp document,
    /// dispatch the rasterizer, and schedule cleanup.
    pub fn render_checkpoint(&mut self, plan: CheckpointPlan) {
        let Some(filename) = plan.filename.clone() else {
            self.summary.skipped += 1;
            self.sink
                .report(Diagnostic::MissingFilename { line: plan.line });
            return;
        };

        let bytes = match apply_visibility(&mut self.document, &plan.layers)
            .and_then(|()| self.document.serialize())
        {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail(&filename, e.to_string());
                return;
            }
        };

        let sequence = self.state.next_sequence();
        let temp_file = self
            .settings
            .output_dir
            .join(format!("{}-{sequence}.svg", self.settings.temp_base));
        if let Err(e) = std::fs::write(&temp_file, &bytes) {
            self.fail(
                &filename,
                format!("cannot write {}: {e}", temp_file.display()),
            );
            return;
        }
        let temp_file = std::fs::canonicalize(&temp_file).unwrap_or(temp_file);

        let output = self.settings.output_dir.join(format!("{filename}.png"));
        if let Err(e) = remove_if_exists(&output) {
            tracing::warn!(output = %output.display(), error = %e, "Failed to remove previous output");
        }

        self.sink.report(Diagnostic::Exporting {
            filename: filename.clone(),
        });

        let request = RenderRequest {
            input: self.mapper.map(&temp_file),
            output: self.mapper.map(&output),
            dpi: self.settings.dpi,
            export_id: plan.region.clone(),
        };

        let handle = match self.rasterizer.dispatch(&request) {
            Ok(handle) => handle,
            Err(e) => {
                if let Err(e) = remove_if_exists(&temp_file) {
                    tracing::warn!(temp = %temp_file.display(), error = %e, "Failed to remove temporary document");
                }
                self.fail(&filename, e.to_string());
                return;
            }
        };

        tracing::info!(
            sequence,
            filename = %filename,
            layers = ?plan.layers,
            region = ?plan.region,
            backend = self.rasterizer.name(),
            "Render dispatched"
        );

        if let Some(observer) = &self.observer {
            let observer = Arc::clone(observer);
            let report_filename = filename.clone();
            let report_output = output.clone();
            self.observations.push(tokio::spawn(async move {
                let outcome = handle.await.unwrap_or_else(|e| RenderOutcome::Failed {
                    reason: format!("render task failed: {e}"),
                });
                observer(RenderReport {
                    sequence,
                    filename: report_filename,
                    output: report_output,
                    outcome,
                });
            }));
        }

        self.cleanups.push(spawn_cleanup(
            temp_file.clone(),
            output.clone(),
            self.settings.cleanup,
            Arc::clone(&self.sink),
        ));

        self.summary.checkpoints.push(CheckpointRecord {
            sequence,
            plan,
            temp_file,
            output,
        });
    }

    /// Wait for every cleanup watcher and, with an observer installed, for
    /// every render to report. Renders are never cancelled.
    pub async fn finish(self) -> ExportReport {
        let mut cleanups = Vec::with_capacity(self.cleanups.len());
        for handle in self.cleanups {
            match handle.await {
                Ok(outcome) => cleanups.push(outcome),
                Err(e) => tracing::warn!(error = %e, "Cleanup task failed"),
            }
        }
        for handle in self.observations {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Render observer task failed");
            }
        }
        ExportReport {
            summary: self.summary,
            cleanups,
        }
    }

    pub fn state(&self) -> &ExportState {
        &self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    fn fail(&mut self, filename: &str, reason: String) {
        self.summary.failed += 1;
        self.sink.report(Diagnostic::RenderFailed {
            filename: filename.to_string(),
            reason,
        });
    }
}

/// Hide every layer group, then show those labeled in `layers`.
pub fn apply_visibility<D: LayerDocument + ?Sized>(
    document: &mut D,
    layers: &[String],
) -> DocumentResult<()> {
    let groups = document.layer_groups();
    for group in &groups {
        let style = with_display(document.style(*group), Visibility::Hidden);
        document.set_style(*group, &style)?;
    }
    for group in &groups {
        let shown = document
            .label(*group)
            .is_some_and(|label| layers.iter().any(|layer| layer == label));
        if shown {
            let style = with_display(document.style(*group), Visibility::Visible);
            document.set_style(*group, &style)?;
        }
    }
    Ok(())
}

/// Run the state machine alone: the checkpoints a configuration would
/// render, with diagnostics, without touching the document or filesystem.
pub fn plan_checkpoints<D, I, S>(document: &D, lines: I, sink: &dyn DiagnosticSink) -> Vec<CheckpointPlan>
where
    D: LayerDocument + ?Sized,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut state = ExportState::new(LayerRegistry::scan(document));
    let mut plans = Vec::new();
    let mut line_count = 0;

    for line in lines {
        line_count += 1;
        match state.apply(line_count, Directive::parse(line.as_ref()), |id| {
            document.has_element(id)
        }) {
            Step::Continue => {}
            Step::Rejected(diagnostic) => sink.report(diagnostic),
            Step::Checkpoint(plan) => plans.push(plan),
        }
    }
    plans.extend(state.finish(line_count + 1));

    for plan in &plans {
        if plan.filename.is_none() {
            sink.report(Diagnostic::MissingFilename { line: plan.line });
        }
    }
    plans
}
