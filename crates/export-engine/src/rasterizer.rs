//! External rasterizer backends.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use mockup_common::config::{RendererConfig, RendererFlavor};
use mockup_common::error::{MockupError, MockupResult};

/// One render request. Paths are already mapped for the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Serialized document to rasterize.
    pub input: String,

    /// PNG file to produce.
    pub output: String,

    /// Export resolution.
    pub dpi: u32,

    /// Restrict the export to this element id.
    pub export_id: Option<String>,
}

/// How a dispatched render ended, as far as the backend can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Succeeded,
    Failed { reason: String },
}

/// Resolves when the render process exits.
pub type RenderHandle = tokio::task::JoinHandle<RenderOutcome>;

/// Trait for rasterizer backends (Inkscape, test doubles, ...).
pub trait Rasterizer: Send + Sync {
    /// Start the render and return immediately. Must be called from inside a
    /// Tokio runtime.
    fn dispatch(&self, request: &RenderRequest) -> MockupResult<RenderHandle>;

    /// Check if this backend is available on the system.
    fn is_available(&self) -> bool;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Runs Inkscape as a detached child process.
#[derive(Debug, Clone)]
pub struct InkscapeRasterizer {
    executable: String,
    flavor: RendererFlavor,
}

impl InkscapeRasterizer {
    pub fn new(executable: impl Into<String>, flavor: RendererFlavor) -> Self {
        Self {
            executable: executable.into(),
            flavor,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.executable.clone(), config.flavor)
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Command-line arguments for a request.
    pub fn args(&self, request: &RenderRequest) -> Vec<String> {
        let mut args = Vec::new();
        match self.flavor {
            RendererFlavor::Modern => {
                args.push("--export-type=png".to_string());
                args.push(format!("--export-filename={}", request.output));
                args.push(format!("--export-dpi={}", request.dpi));
                if let Some(id) = &request.export_id {
                    args.push(format!("--export-id={id}"));
                    args.push("--export-id-only".to_string());
                }
            }
            RendererFlavor::Legacy => {
                args.push("-z".to_string());
                args.push("-e".to_string());
                args.push(request.output.clone());
                args.push("-d".to_string());
                args.push(request.dpi.to_string());
                if let Some(id) = &request.export_id {
                    args.push("-i".to_string());
                    args.push(id.clone());
                    args.push("-j".to_string());
                }
            }
        }
        args.push(request.input.clone());
        args
    }
}

impl Rasterizer for InkscapeRasterizer {
    fn dispatch(&self, request: &RenderRequest) -> MockupResult<RenderHandle> {
        let args = self.args(request);
        tracing::debug!(executable = %self.executable, ?args, "Running rasterizer");

        let mut child = tokio::process::Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MockupError::render(format!("Failed to start {}: {e}", self.executable)))?;

        tracing::info!(
            pid = child.id(),
            output = %request.output,
            "Rasterizer process started"
        );

        Ok(tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => outcome_from_status(status),
                Err(e) => RenderOutcome::Failed {
                    reason: format!("failed to wait on rasterizer: {e}"),
                },
            }
        }))
    }

    fn is_available(&self) -> bool {
        command_exists(&self.executable)
    }

    fn name(&self) -> &str {
        "inkscape"
    }
}

fn outcome_from_status(status: ExitStatus) -> RenderOutcome {
    if status.success() {
        RenderOutcome::Succeeded
    } else {
        RenderOutcome::Failed {
            reason: format!("rasterizer exited with {status}"),
        }
    }
}

/// Whether `binary` names an existing file or resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    if binary.contains('/') || binary.contains('\\') {
        return Path::new(binary).is_file();
    }
    Command::new("sh")
        .arg("-c")
        .arg("command -v \"$1\" >/dev/null 2>&1")
        .arg("sh")
        .arg(binary)
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
