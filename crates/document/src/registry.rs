//! Layer registry: the set of layer names a configuration may refer to.

use std::collections::BTreeSet;

use crate::style::{visibility_of, Visibility};
use crate::LayerDocument;

/// Layer names present in a document, computed once per run.
pub type AvailableLayers = BTreeSet<String>;

/// One layer as listed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub label: String,
    pub visibility: Visibility,
}

/// Scans a document for editor layers.
pub struct LayerRegistry;

impl LayerRegistry {
    /// Collect the labels of all top-level layer groups.
    ///
    /// Groups without the layer flag or without a label are skipped.
    pub fn scan<D: LayerDocument + ?Sized>(document: &D) -> AvailableLayers {
        let mut layers = AvailableLayers::new();
        for group in document.top_level_groups() {
            if !document.is_layer(group) {
                tracing::debug!(?group, "Skipping group without layer flag");
                continue;
            }
            match document.label(group) {
                Some(label) => {
                    layers.insert(label.to_string());
                }
                None => tracing::debug!(?group, "Skipping layer without label"),
            }
        }
        tracing::info!(layers = layers.len(), "Scanned document layers");
        layers
    }

    /// Labeled layers in document order with their current visibility.
    pub fn describe<D: LayerDocument + ?Sized>(document: &D) -> Vec<LayerSummary> {
        document
            .layer_groups()
            .into_iter()
            .filter_map(|group| {
                Some(LayerSummary {
                    label: document.label(group)?.to_string(),
                    visibility: visibility_of(document.style(group)),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SvgDocument;

    const SOURCE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape">
  <g inkscape:groupmode="layer" inkscape:label="base" style="display:inline"/>
  <g inkscape:groupmode="layer" inkscape:label="popup" style="display:none"/>
  <g inkscape:groupmode="layer" inkscape:label="popup"/>
  <g inkscape:groupmode="layer" id="nameless"/>
  <g inkscape:label="not-a-layer"/>
  <rect inkscape:groupmode="layer" inkscape:label="not-a-group"/>
</svg>"#;

    #[test]
    fn test_scan_collects_labeled_layers() {
        let document = SvgDocument::parse(SOURCE).unwrap();
        let layers = LayerRegistry::scan(&document);
        let expected: AvailableLayers = ["base", "popup"].iter().map(|s| s.to_string()).collect();
        assert_eq!(layers, expected);
    }

    #[test]
    fn test_scan_empty_document() {
        let document = SvgDocument::parse(r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#).unwrap();
        assert!(LayerRegistry::scan(&document).is_empty());
    }

    #[test]
    fn test_describe_reports_visibility_in_document_order() {
        let document = SvgDocument::parse(SOURCE).unwrap();
        let summary = LayerRegistry::describe(&document);
        assert_eq!(
            summary,
            vec![
                LayerSummary {
                    label: "base".to_string(),
                    visibility: Visibility::Visible,
                },
                LayerSummary {
                    label: "popup".to_string(),
                    visibility: Visibility::Hidden,
                },
                LayerSummary {
                    label: "popup".to_string(),
                    visibility: Visibility::Visible,
                },
            ]
        );
    }
}
