//! Check that the configured renderer can be started.

use mockup_common::config::{config_file_path, AppConfig};
use mockup_export::{InkscapeRasterizer, Rasterizer};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Mockup System Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config file: {}", path.display());
    } else {
        println!("[INFO] No config file at {}, using defaults", path.display());
    }

    let rasterizer = InkscapeRasterizer::from_config(&config.renderer);
    if rasterizer.is_available() {
        println!(
            "[OK] Renderer: {} ({:?} options, {} dpi)",
            rasterizer.executable(),
            config.renderer.flavor,
            config.renderer.dpi
        );
        println!("\nMockup is ready.");
    } else {
        println!("[FAIL] Renderer not found: {}", rasterizer.executable());
        println!("\nInstall Inkscape or set renderer.executable in the config file.");
    }

    Ok(())
}
