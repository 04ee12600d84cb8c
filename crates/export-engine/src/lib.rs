//! Mockup Export Engine
//!
//! Turns a layer configuration into one PNG per filename block.
//!
//! # Pipeline Architecture
//!
//! ```text
//! config lines ──► Directive::parse ──► ExportState ──┐
//!                                                      │ checkpoint
//!                                                      ▼
//!                        hide all layers, show active ones (document)
//!                                                      │
//!                                                      ▼
//!                        serialize ──► <out>/<temp>-N.svg
//!                                                      │
//!                              ┌───────────────────────┴──────────┐
//!                              ▼                                  ▼
//!                    rasterizer (child process)        cleanup watcher (task)
//!                              │                                  │
//!                              ▼                                  ▼
//!                       <out>/<name>.png ─── polled ───► temp file removed
//! ```
//!
//! The configuration loop never waits on a render. Renders report back only
//! through an optional [`RenderObserver`]; cleanup watchers only through the
//! filesystem and the [`DiagnosticSink`].

pub mod cleanup;
pub mod diagnostics;
pub mod directive;
pub mod driver;
pub mod job;
pub mod rasterizer;
pub mod sanitize;
pub mod state;

pub use cleanup::{CleanupOutcome, CleanupPolicy};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, TracingSink};
pub use directive::{CheckpointTrigger, Directive};
pub use driver::*;
pub use job::*;
pub use rasterizer::{InkscapeRasterizer, Rasterizer, RenderHandle, RenderOutcome, RenderRequest};
pub use sanitize::{PathMapper, PathSanitizer};
pub use state::{CheckpointPlan, ExportState, Step};
