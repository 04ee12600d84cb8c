//! Path rewriting for paths handed to the external renderer.
//!
//! Some renderer builds split their command line badly on paths containing
//! spaces or non-ASCII characters. A [`PathSanitizer`] rewrites such paths
//! through a configurable substitution table (for instance long Windows
//! directory names to their 8.3 short names) before they are passed on.

use std::path::Path;

use mockup_common::config::{PathSanitizerConfig, PathSubstitution};

/// Turns a filesystem path into the string passed on the renderer's command line.
pub trait PathMapper: Send + Sync {
    fn map(&self, path: &Path) -> String;
}

/// Table-driven [`PathMapper`].
#[derive(Debug, Clone, Default)]
pub struct PathSanitizer {
    normalize_separators: bool,
    substitutions: Vec<PathSubstitution>,
}

impl PathSanitizer {
    /// A sanitizer that passes paths through unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PathSanitizerConfig) -> Self {
        Self {
            normalize_separators: config.normalize_separators,
            substitutions: config
                .substitutions
                .iter()
                .filter(|substitution| !substitution.from.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Add a substitution after the existing ones.
    pub fn with_substitution(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        if !from.is_empty() {
            self.substitutions.push(PathSubstitution {
                from,
                to: to.into(),
            });
        }
        self
    }

    pub fn normalizing_separators(mut self, enabled: bool) -> Self {
        self.normalize_separators = enabled;
        self
    }

    /// Apply the transform to a string path.
    pub fn sanitize(&self, path: &str) -> String {
        let mut result = if self.normalize_separators {
            path.replace('\\', "/")
        } else {
            path.to_string()
        };
        for substitution in &self.substitutions {
            result = result.replace(&substitution.from, &substitution.to);
        }
        result
    }
}

impl PathMapper for PathSanitizer {
    fn map(&self, path: &Path) -> String {
        self.sanitize(&path.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_through() {
        let sanitizer = PathSanitizer::identity();
        assert_eq!(
            sanitizer.sanitize(r"C:\Program Files\x.svg"),
            r"C:\Program Files\x.svg"
        );
    }

    #[test]
    fn test_default_table_shortens_program_files() {
        let sanitizer = PathSanitizer::from_config(&PathSanitizerConfig::default());
        assert_eq!(
            sanitizer.sanitize(r"C:\Program Files (x86)\Inkscape\inkscape.exe"),
            "C:/PROGRA~2/Inkscape/inkscape.exe"
        );
        assert_eq!(
            sanitizer.sanitize(r"C:\Program Files\Inkscape\inkscape.exe"),
            "C:/PROGRA~1/Inkscape/inkscape.exe"
        );
    }

    #[test]
    fn test_substitutions_apply_in_order() {
        let sanitizer = PathSanitizer::identity()
            .with_substitution("Program Files", "PROGRA~1")
            .with_substitution("Program Files (x86)", "PROGRA~2");
        // The shorter entry runs first and consumes the match.
        assert_eq!(
            sanitizer.sanitize("/Program Files (x86)/a"),
            "/PROGRA~1 (x86)/a"
        );
    }

    #[test]
    fn test_non_ascii_directory_substitution() {
        let sanitizer = PathSanitizer::identity()
            .normalizing_separators(true)
            .with_substitution("Rüdiger", "RDIGER~1");
        assert_eq!(
            sanitizer.map(Path::new(r"C:\Users\Rüdiger\mock.svg")),
            "C:/Users/RDIGER~1/mock.svg"
        );
    }

    #[test]
    fn test_empty_pattern_is_ignored() {
        let sanitizer = PathSanitizer::identity().with_substitution("", "X");
        assert_eq!(sanitizer.sanitize("/tmp/a.png"), "/tmp/a.png");
    }
}
