//! SVG document backed by an owned quick-xml event stream.

use std::collections::HashSet;
use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{DocumentError, DocumentResult};
use crate::{GroupHandle, LayerDocument, INKSCAPE_NS, SVG_NS};

/// Attributes of one top-level group, decoded once at load time.
#[derive(Debug, Clone)]
struct GroupRecord {
    event_index: usize,
    group_mode: Option<String>,
    label: Option<String>,
    style: Option<String>,
}

/// An in-memory SVG document.
///
/// Every parsed event is kept so that serialization reproduces the input,
/// apart from `style` attributes rewritten through [`LayerDocument::set_style`].
#[derive(Debug, Clone)]
pub struct SvgDocument {
    events: Vec<Event<'static>>,
    groups: Vec<GroupRecord>,
    ids: HashSet<String>,
}

impl SvgDocument {
    /// Read and parse an SVG file.
    pub fn open(path: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::parse(&source)?;
        tracing::debug!(
            path = %path.display(),
            groups = document.groups.len(),
            ids = document.ids.len(),
            "Loaded SVG document"
        );
        Ok(document)
    }

    /// Parse SVG markup.
    pub fn parse(source: &str) -> DocumentResult<Self> {
        let mut reader = Reader::from_str(source);
        let mut events = Vec::new();
        let mut groups = Vec::new();
        let mut ids = HashSet::new();
        let mut scope = NamespaceScope::default();
        let mut depth = 0usize;
        let mut saw_root = false;

        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(start) | Event::Empty(start) => {
                    let self_closing = matches!(event, Event::Empty(_));
                    let attributes = decode_attributes(start)?;
                    scope.enter(&attributes);

                    if depth == 0 {
                        if saw_root || local_name(start) != "svg" {
                            return Err(DocumentError::NotSvg);
                        }
                        saw_root = true;
                    }

                    if let Some((_, id)) = attributes.iter().find(|(key, _)| key == "id") {
                        ids.insert(id.clone());
                    }

                    if depth == 1 && scope.is_svg_element(start, "g") {
                        groups.push(GroupRecord {
                            event_index: events.len(),
                            group_mode: scope.inkscape_attribute(&attributes, "groupmode"),
                            label: scope.inkscape_attribute(&attributes, "label"),
                            style: plain_attribute(&attributes, "style"),
                        });
                    }

                    if self_closing {
                        scope.leave();
                    } else {
                        depth += 1;
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    scope.leave();
                }
                Event::Eof => break,
                _ => {}
            }
            events.push(event.into_owned());
        }

        if !saw_root {
            return Err(DocumentError::NotSvg);
        }

        Ok(Self {
            events,
            groups,
            ids,
        })
    }

    fn record(&self, group: GroupHandle) -> Option<&GroupRecord> {
        self.groups.get(group.0)
    }
}

impl LayerDocument for SvgDocument {
    fn top_level_groups(&self) -> Vec<GroupHandle> {
        (0..self.groups.len()).map(GroupHandle).collect()
    }

    fn group_mode(&self, group: GroupHandle) -> Option<&str> {
        self.record(group)?.group_mode.as_deref()
    }

    fn label(&self, group: GroupHandle) -> Option<&str> {
        self.record(group)?.label.as_deref()
    }

    fn style(&self, group: GroupHandle) -> Option<&str> {
        self.record(group)?.style.as_deref()
    }

    fn set_style(&mut self, group: GroupHandle, style: &str) -> DocumentResult<()> {
        let index = self
            .record(group)
            .ok_or(DocumentError::UnknownGroup(group.0))?
            .event_index;

        let (rebuilt, self_closing) = match &self.events[index] {
            Event::Start(start) => (replace_style(start, style)?, false),
            Event::Empty(start) => (replace_style(start, style)?, true),
            _ => return Err(DocumentError::UnknownGroup(group.0)),
        };

        self.events[index] = if self_closing {
            Event::Empty(rebuilt)
        } else {
            Event::Start(rebuilt)
        };
        self.groups[group.0].style = Some(style.to_string());
        Ok(())
    }

    fn has_element(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    fn serialize(&self) -> DocumentResult<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            writer
                .write_event(event.borrow())
                .map_err(|e| DocumentError::Serialize(e.to_string()))?;
        }
        Ok(writer.into_inner())
    }
}

/// In-scope `xmlns` declarations, innermost last.
#[derive(Debug, Default)]
struct NamespaceScope {
    frames: Vec<Vec<(Option<String>, String)>>,
}

impl NamespaceScope {
    fn enter(&mut self, attributes: &[(String, String)]) {
        let frame = attributes
            .iter()
            .filter_map(|(key, value)| {
                if key == "xmlns" {
                    Some((None, value.clone()))
                } else {
                    key.strip_prefix("xmlns:")
                        .map(|prefix| (Some(prefix.to_string()), value.clone()))
                }
            })
            .collect();
        self.frames.push(frame);
    }

    fn leave(&mut self) {
        self.frames.pop();
    }

    fn resolve(&self, prefix: Option<&str>) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|(declared, _)| declared.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Element local name matches and it lives in the SVG namespace (or in
    /// no namespace at all, for hand-written files).
    fn is_svg_element(&self, start: &BytesStart<'_>, name: &str) -> bool {
        if local_name(start) != name {
            return false;
        }
        let name = start.name();
        let prefix = name
            .prefix()
            .map(|prefix| String::from_utf8_lossy(prefix.as_ref()).into_owned());
        match self.resolve(prefix.as_deref()) {
            Some(uri) => uri == SVG_NS,
            None => prefix.is_none(),
        }
    }

    fn inkscape_attribute(&self, attributes: &[(String, String)], local: &str) -> Option<String> {
        attributes.iter().find_map(|(key, value)| {
            let (prefix, name) = key.split_once(':')?;
            if prefix == "xmlns" || name != local {
                return None;
            }
            (self.resolve(Some(prefix)) == Some(INKSCAPE_NS)).then(|| value.clone())
        })
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn plain_attribute(attributes: &[(String, String)], key: &str) -> Option<String> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
}

fn decode_attributes(start: &BytesStart<'_>) -> DocumentResult<Vec<(String, String)>> {
    start
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(|e| DocumentError::Malformed(e.to_string()))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            Ok((key, attribute_value(&attribute)))
        })
        .collect()
}

/// Unescaped value, or the raw text when it references entities the reader
/// does not know about.
fn attribute_value(attribute: &Attribute<'_>) -> String {
    match attribute.unescape_value() {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(&attribute.value).into_owned(),
    }
}

fn replace_style(start: &BytesStart<'_>, style: &str) -> DocumentResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut rebuilt = BytesStart::new(name);
    let mut replaced = false;

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| DocumentError::Malformed(e.to_string()))?;
        if attribute.key.as_ref() == b"style" {
            if !replaced {
                rebuilt.push_attribute(("style", style));
                replaced = true;
            }
            continue;
        }
        // Values are written back double-quoted, so they are re-escaped
        // rather than copied raw from a possibly single-quoted source.
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        match attribute.unescape_value() {
            Ok(value) => rebuilt.push_attribute((key.as_str(), &*value)),
            Err(_) => {
                let raw = String::from_utf8_lossy(&attribute.value).replace('"', "&quot;");
                rebuilt.push_attribute((key.as_bytes(), raw.as_bytes()));
            }
        }
    }

    if !replaced {
        rebuilt.push_attribute(("style", style));
    }
    Ok(rebuilt)
}
