//! Mockup Document Model
//!
//! The editor-facing half of Mockup. An SVG produced by Inkscape keeps its
//! layers as direct `<g>` children of the root element, flagged with
//! `inkscape:groupmode="layer"` and named by `inkscape:label`. This crate
//! exposes exactly what the exporter needs from such a document:
//!
//! - enumerate top-level groups and read their layer flag and label
//! - read and rewrite a group's `style` attribute
//! - resolve an element by `id`
//! - serialize the (mutated) document back to bytes
//!
//! [`LayerDocument`] is that surface as a trait; [`SvgDocument`] implements it
//! over an owned quick-xml event stream so untouched markup round-trips
//! byte-for-byte.

pub mod error;
pub mod registry;
pub mod style;
pub mod svg;

pub use error::{DocumentError, DocumentResult};
pub use registry::{AvailableLayers, LayerRegistry, LayerSummary};
pub use style::Visibility;
pub use svg::SvgDocument;

/// SVG namespace URI.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Inkscape extension namespace URI.
pub const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";

/// Opaque reference to a top-level group element of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(pub(crate) usize);

/// Host document operations consumed by the exporter.
pub trait LayerDocument {
    /// Direct `<g>` children of the root element, in document order.
    fn top_level_groups(&self) -> Vec<GroupHandle>;

    /// Value of `inkscape:groupmode`, if present.
    fn group_mode(&self, group: GroupHandle) -> Option<&str>;

    /// Value of `inkscape:label`, if present.
    fn label(&self, group: GroupHandle) -> Option<&str>;

    /// Value of the `style` attribute, if present.
    fn style(&self, group: GroupHandle) -> Option<&str>;

    /// Replace (or add) the `style` attribute.
    fn set_style(&mut self, group: GroupHandle, style: &str) -> DocumentResult<()>;

    /// Whether any element in the document carries this `id`.
    fn has_element(&self, id: &str) -> bool;

    /// Serialize the document in its current state.
    fn serialize(&self) -> DocumentResult<Vec<u8>>;

    /// Whether the group is flagged as an editor layer.
    fn is_layer(&self, group: GroupHandle) -> bool {
        self.group_mode(group) == Some("layer")
    }

    /// Top-level groups flagged as layers.
    fn layer_groups(&self) -> Vec<GroupHandle> {
        self.top_level_groups()
            .into_iter()
            .filter(|group| self.is_layer(*group))
            .collect()
    }
}
