//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// External rasterizer settings.
    pub renderer: RendererConfig,

    /// Default export locations.
    pub export: ExportDefaults,

    /// Temp-file cleanup polling.
    pub cleanup: CleanupConfig,

    /// Path rewriting applied to renderer arguments.
    pub paths: PathSanitizerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Command-line dialect spoken by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RendererFlavor {
    /// Inkscape 1.x `--export-*` options.
    #[default]
    Modern,
    /// Inkscape 0.x short options (`-z -e <png> -d <dpi>`).
    Legacy,
}

/// External rasterizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Executable name or path.
    pub executable: String,

    /// Argument dialect.
    pub flavor: RendererFlavor,

    /// Export resolution in dots per inch.
    pub dpi: u32,
}

/// Default export locations, matching the Inkscape extension's option defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Directory receiving the PNG files and temporary documents.
    pub output_dir: PathBuf,

    /// Layer configuration file.
    pub config_file: PathBuf,

    /// File-name stem for temporary documents, suffixed with the checkpoint number.
    pub temp_base: String,
}

/// Bounded polling used to clean up temporary documents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Delay before the first existence check.
    pub initial_delay_ms: u64,

    /// Interval between existence checks.
    pub poll_interval_ms: u64,

    /// Maximum number of checks before giving up.
    pub max_polls: u32,
}

/// One substring replacement applied to renderer paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSubstitution {
    pub from: String,
    pub to: String,
}

/// Table-driven path rewriting for the renderer's command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSanitizerConfig {
    /// Rewrite `\` separators to `/`.
    pub normalize_separators: bool,

    /// Applied in order, first to last.
    pub substitutions: Vec<PathSubstitution>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "mockup_export=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            executable: "inkscape".to_string(),
            flavor: RendererFlavor::Modern,
            dpi: 90,
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("MockupMachine"),
            config_file: PathBuf::from("MockupMachine.txt"),
            temp_base: "temp.MockupMachine".to_string(),
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            poll_interval_ms: 1000,
            max_polls: 20,
        }
    }
}

impl Default for PathSanitizerConfig {
    fn default() -> Self {
        Self {
            normalize_separators: true,
            substitutions: vec![
                PathSubstitution {
                    from: "Program Files (x86)".to_string(),
                    to: "PROGRA~2".to_string(),
                },
                PathSubstitution {
                    from: "Program Files".to_string(),
                    to: "PROGRA~1".to_string(),
                },
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("mockup").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_plugin_options() {
        let config = AppConfig::default();
        assert_eq!(config.renderer.executable, "inkscape");
        assert_eq!(config.renderer.dpi, 90);
        assert_eq!(config.export.output_dir, PathBuf::from("MockupMachine"));
        assert_eq!(config.export.config_file, PathBuf::from("MockupMachine.txt"));
        assert_eq!(config.cleanup.max_polls, 20);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let json = r#"{ "renderer": { "flavor": "legacy" }, "cleanup": { "max_polls": 5 } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.renderer.flavor, RendererFlavor::Legacy);
        assert_eq!(config.renderer.executable, "inkscape");
        assert_eq!(config.cleanup.max_polls, 5);
        assert_eq!(config.cleanup.poll_interval_ms, 1000);
        assert_eq!(config.paths.substitutions.len(), 2);
    }

    #[test]
    fn test_substitution_table_is_replaceable() {
        let json = r#"{ "paths": { "substitutions": [ { "from": "My Docs", "to": "MYDOCS~1" } ] } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.paths.normalize_separators);
        assert_eq!(
            config.paths.substitutions,
            vec![PathSubstitution {
                from: "My Docs".to_string(),
                to: "MYDOCS~1".to_string(),
            }]
        );
    }
}
