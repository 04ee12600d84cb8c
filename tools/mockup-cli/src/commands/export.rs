//! Export one PNG per configuration block.

use std::path::PathBuf;
use std::sync::Arc;

use mockup_common::config::AppConfig;
use mockup_export::{
    export_document, ExportJob, InkscapeRasterizer, PathSanitizer, Rasterizer, RenderObserver,
    RenderOutcome, RenderReport, TracingSink,
};

pub async fn run(
    document: PathBuf,
    config_file: Option<PathBuf>,
    outdir: Option<PathBuf>,
    report_renders: bool,
    config: AppConfig,
) -> anyhow::Result<()> {
    let mut job = ExportJob::with_defaults(document, &config);
    if let Some(config_file) = config_file {
        job.config_path = config_file;
    }
    if let Some(outdir) = outdir {
        job.output_dir = outdir;
    }

    println!("Exporting layers of: {}", job.document_path.display());
    println!("  Config: {}", job.config_path.display());
    println!("  Output: {}", job.output_dir.display());

    let executable = PathSanitizer::from_config(&config.paths).sanitize(&config.renderer.executable);
    let rasterizer = InkscapeRasterizer::new(executable, config.renderer.flavor);
    if !rasterizer.is_available() {
        println!(
            "  [WARN] {} not found; renders will fail",
            rasterizer.executable()
        );
    }

    let observer: Option<RenderObserver> = report_renders.then(|| {
        let observer: RenderObserver = Arc::new(|report: RenderReport| match report.outcome {
            RenderOutcome::Succeeded => {
                println!("  [OK] {}", report.output.display());
            }
            RenderOutcome::Failed { reason } => {
                println!("  [FAIL] {}: {reason}", report.filename);
            }
        });
        observer
    });

    let report = export_document(
        &job,
        &config,
        Arc::new(rasterizer),
        Arc::new(TracingSink),
        observer,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Export aborted: {e}"))?;

    let summary = &report.summary;
    println!();
    println!("Images dispatched: {}", summary.checkpoints.len());
    for checkpoint in &summary.checkpoints {
        println!(
            "  {} [{}]",
            checkpoint.output.display(),
            checkpoint.plan.layers.join(", ")
        );
    }
    if summary.rejected > 0 {
        println!("Directives ignored: {}", summary.rejected);
    }
    if summary.skipped + summary.failed > 0 {
        println!(
            "Checkpoints not rendered: {} (no filename: {}, failed: {})",
            summary.skipped + summary.failed,
            summary.skipped,
            summary.failed
        );
    }
    if report.timed_out() > 0 {
        println!(
            "{} image(s) did not appear within the cleanup window and may be broken.",
            report.timed_out()
        );
    }

    Ok(())
}
