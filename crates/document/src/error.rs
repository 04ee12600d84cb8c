//! Document loading and serialization errors.

use std::path::PathBuf;

/// Errors raised while reading, mutating, or writing an SVG document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed markup: {0}")]
    Malformed(String),

    #[error("Document has no <svg> root element")]
    NotSvg,

    #[error("No top-level group #{0}")]
    UnknownGroup(usize),

    #[error("Failed to serialize document: {0}")]
    Serialize(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;
