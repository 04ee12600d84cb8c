//! List the layers of an SVG document.

use std::path::PathBuf;

use mockup_document::{LayerRegistry, SvgDocument, Visibility};

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let document =
        SvgDocument::open(&path).map_err(|e| anyhow::anyhow!("Failed to load document: {e}"))?;

    let layers = LayerRegistry::describe(&document);
    println!("Layers in {} ({}):", path.display(), layers.len());
    for layer in &layers {
        let marker = match layer.visibility {
            Visibility::Visible => "+",
            Visibility::Hidden => "-",
        };
        println!("  {marker} {}", layer.label);
    }

    Ok(())
}
