use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::element::{ContainerKind, ElementKind};
use crate::error::{GpxError, Result};
use crate::gpx_types::*;
use crate::legacy::Adapter;
use crate::machine::StateMachine;

/// Attributes of one element, keyed by local name.
pub type Attributes = HashMap<String, String>;

/// Receives the events of one GPX document in document order and builds a
/// [`Gpx`] from them.
///
/// The version declared on the root element selects how the events are
/// interpreted; a parser must not be reused for a second document.
#[derive(Debug, Default)]
pub struct GpxParser {
    machine: StateMachine,
    adapter: Adapter,
    depth: usize,
}

impl GpxParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_element_start(&mut self, name: &str, attributes: &Attributes) {
        let kind = ElementKind::from_name(name);
        if self.depth == 0 && kind == ElementKind::Container(ContainerKind::Gpx) {
            let version = attributes
                .get("version")
                .and_then(|v| GpxVersion::from_attribute(v));
            self.adapter = Adapter::for_version(version);
        }
        self.depth += 1;
        self.adapter.start(kind, attributes, &mut self.machine);
    }

    pub fn on_character_data(&mut self, text: &str) {
        self.machine.text(text);
    }

    pub fn on_element_end(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.adapter
            .end(ElementKind::from_name(name), &mut self.machine);
    }

    pub fn finish(self) -> Gpx {
        self.machine.finish()
    }
}

/// Parse a GPX XML string into Gpx.
pub fn parse_gpx(xml: &str) -> Result<Gpx> {
    let mut reader = Reader::from_str(xml);
    let mut parser = GpxParser::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            GpxError::Parsing(format!("{e} at position {}", reader.error_position()))
        })?;
        match event {
            Event::Start(e) => {
                let name = local_name(&e)?;
                parser.on_element_start(&name, &collect_attributes(&e));
                depth += 1;
                seen_root = true;
            }
            Event::Empty(e) => {
                let name = local_name(&e)?;
                parser.on_element_start(&name, &collect_attributes(&e));
                parser.on_element_end(&name);
                seen_root = true;
            }
            Event::End(e) => {
                let name = std::str::from_utf8(e.local_name().into_inner())
                    .map_err(|e| GpxError::Parsing(e.to_string()))?;
                parser.on_element_end(name);
                depth = depth.saturating_sub(1);
            }
            Event::Text(e) => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| GpxError::Parsing(e.to_string()))?;
                parser.on_character_data(&normalize_line_endings(text));
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| GpxError::Parsing(e.to_string()))?;
                parser.on_character_data(&normalize_line_endings(text));
            }
            Event::GeneralRef(e) => {
                // Handle character references (&#60; &#x3C;) and predefined entities
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    parser.on_character_data(ch.encode_utf8(&mut [0; 4]));
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match predefined_entity(name) {
                        Some(text) => parser.on_character_data(text),
                        None => debug!(entity = name, "dropping unknown entity reference"),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(GpxError::Parsing("document has no root element".to_string()));
    }
    if depth > 0 {
        return Err(GpxError::Parsing(format!(
            "unexpected end of document with {depth} unclosed element(s)"
        )));
    }

    Ok(parser.finish())
}

/// Parse GPX from raw bytes. The input must be UTF-8; a byte order mark is allowed.
pub fn parse_gpx_bytes(bytes: &[u8]) -> Result<Gpx> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let xml = std::str::from_utf8(bytes)
        .map_err(|e| GpxError::Initialization(format!("input is not valid UTF-8: {e}")))?;
    parse_gpx(xml)
}

fn local_name(e: &BytesStart<'_>) -> Result<String> {
    std::str::from_utf8(e.local_name().into_inner())
        .map(str::to_string)
        .map_err(|e| GpxError::Parsing(e.to_string()))
}

/// Attribute values are unescaped; attributes that cannot be read are skipped.
fn collect_attributes(e: &BytesStart<'_>) -> Attributes {
    let mut attributes = Attributes::new();
    for attr_result in e.attributes() {
        let Ok(attr) = attr_result else {
            debug!("skipping malformed attribute");
            continue;
        };
        let Ok(key) = std::str::from_utf8(attr.key.local_name().into_inner()) else {
            continue;
        };
        match attr.unescape_value() {
            Ok(value) => {
                attributes.insert(key.to_string(), value.into_owned());
            }
            Err(err) => debug!(key, %err, "skipping attribute with invalid value"),
        }
    }
    attributes
}

/// Literal `\r\n` and lone `\r` are read as `\n`, as an XML processor must.
/// A `&#13;` reference arrives separately and is kept.
fn normalize_line_endings(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn predefined_entity(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    }
}
