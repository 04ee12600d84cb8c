//! Line classification for layer configuration files.
//!
//! ```text
//! ; comment
//! myfile-1.0:          filename of the next image
//! + layer              show a layer
//! - layer              hide a layer
//! # element-id         crop the render to one element
//!                      blank line: render, then reset
//! -----------          separator: render, then reset
//! ```

/// What caused a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointTrigger {
    /// An empty line.
    BlankLine,
    /// A line starting with `--`.
    Separator,
    /// End of input with a block still pending.
    EndOfInput,
}

/// One classified configuration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Comment,
    Checkpoint(CheckpointTrigger),
    Deactivate(String),
    Activate(String),
    Region(String),
    Filename(String),
}

impl Directive {
    /// Classify one line. Prefixes are checked in priority order on the
    /// trimmed line.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();

        if line.starts_with(';') {
            Directive::Comment
        } else if line.is_empty() {
            Directive::Checkpoint(CheckpointTrigger::BlankLine)
        } else if line.starts_with("--") {
            Directive::Checkpoint(CheckpointTrigger::Separator)
        } else if let Some(layer) = line.strip_prefix("- ") {
            Directive::Deactivate(layer.trim().to_string())
        } else if let Some(layer) = line.strip_prefix("+ ") {
            Directive::Activate(layer.trim().to_string())
        } else if let Some(id) = line.strip_prefix("# ") {
            Directive::Region(id.trim().to_string())
        } else {
            let name = line.strip_suffix(':').unwrap_or(line);
            Directive::Filename(name.trim().to_string())
        }
    }

    /// Whether processing this line fires a checkpoint.
    pub fn is_checkpoint(&self) -> bool {
        matches!(self, Directive::Checkpoint(_))
    }
}
