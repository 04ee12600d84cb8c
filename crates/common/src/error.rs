//! Error types shared across Mockup crates.

use std::path::PathBuf;

/// Top-level error type for Mockup operations.
#[derive(Debug, thiserror::Error)]
pub enum MockupError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Document error: {message}")]
    Document { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Output directory {path} is not usable: {message}")]
    OutputDir { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using MockupError.
pub type MockupResult<T> = Result<T, MockupError>;

impl MockupError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn document(msg: impl Into<String>) -> Self {
        Self::Document {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn output_dir(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::OutputDir {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Whether this error aborts a run before any checkpoint is processed.
    pub fn is_fatal_setup_error(&self) -> bool {
        matches!(
            self,
            Self::Config { .. }
                | Self::FileNotFound { .. }
                | Self::OutputDir { .. }
                | Self::Document { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_path() {
        let err = MockupError::FileNotFound {
            path: PathBuf::from("/tmp/missing.txt"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/missing.txt");

        let err = MockupError::output_dir("/root/out", "permission denied");
        assert!(err.to_string().contains("/root/out"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_setup_errors_are_fatal() {
        assert!(MockupError::config("bad").is_fatal_setup_error());
        assert!(MockupError::document("broken svg").is_fatal_setup_error());
        assert!(!MockupError::render("spawn failed").is_fatal_setup_error());
    }

    #[test]
    fn test_io_errors_convert_and_are_not_setup_errors() {
        fn read() -> MockupResult<String> {
            Ok(std::fs::read_to_string("/nonexistent/mockup/MockupMachine.txt")?)
        }
        let err = read().unwrap_err();
        assert!(matches!(err, MockupError::Io(_)));
        assert!(!err.is_fatal_setup_error());
    }
}
