//! Mockup CLI: export layer constellations of an SVG document as PNG images.
//!
//! Usage:
//!   mockup export --document <SVG>     Render one PNG per configuration block
//!   mockup validate --document <SVG>   Show what a configuration would render
//!   mockup layers <SVG>                List the document's layers
//!   mockup check                       Check that the renderer is installed

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mockup_common::config::{AppConfig, LoggingConfig, RendererFlavor};

mod commands;

#[derive(Parser)]
#[command(
    name = "mockup",
    about = "Batch-export SVG layer constellations as PNG images",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one PNG per filename block of a layer configuration
    Export {
        /// SVG document to export from
        #[arg(short, long)]
        document: PathBuf,

        /// Layer configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        outdir: Option<PathBuf>,

        /// Rasterizer executable
        #[arg(long)]
        renderer: Option<String>,

        /// Export resolution
        #[arg(long)]
        dpi: Option<u32>,

        /// Use Inkscape 0.x command-line options
        #[arg(long)]
        legacy_cli: bool,

        /// Report each renderer's exit status
        #[arg(long)]
        report_renders: bool,
    },

    /// Show the images a configuration would produce, without rendering
    Validate {
        /// SVG document to check against
        #[arg(short, long)]
        document: PathBuf,

        /// Layer configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the layers of a document
    Layers {
        /// SVG document
        path: PathBuf,
    },

    /// Check that the configured renderer is installed
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    mockup_common::logging::init_logging(&LoggingConfig {
        level: log_level,
        ..config.logging.clone()
    });

    match cli.command {
        Commands::Export {
            document,
            config: config_file,
            outdir,
            renderer,
            dpi,
            legacy_cli,
            report_renders,
        } => {
            if let Some(renderer) = renderer {
                config.renderer.executable = renderer;
            }
            if let Some(dpi) = dpi {
                config.renderer.dpi = dpi;
            }
            if legacy_cli {
                config.renderer.flavor = RendererFlavor::Legacy;
            }
            commands::export::run(document, config_file, outdir, report_renders, config).await
        }
        Commands::Validate {
            document,
            config: config_file,
        } => commands::validate::run(document, config_file, &config),
        Commands::Layers { path } => commands::layers::run(path),
        Commands::Check => commands::check::run(&config),
    }
}
