//! Cosmetic re-indentation of serializer output.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::warn;

use crate::error::{GpxError, Result};

/// Re-indent XML with one tab per level and one element per line.
///
/// The XML declaration is kept verbatim, whitespace-only text is dropped and
/// elements without content are written as empty elements. If the input
/// cannot be tokenized it is returned unchanged.
pub fn format_xml(xml: &str) -> String {
    match try_format(xml) {
        Ok(formatted) => formatted,
        Err(err) => {
            warn!(%err, "returning unformatted XML");
            xml.to_string()
        }
    }
}

fn try_format(xml: &str) -> Result<String> {
    let (declaration, body) = split_declaration(xml);

    let mut reader = Reader::from_str(body);
    let mut out = Indenter {
        writer: Writer::new_with_indent(Vec::new(), b'\t', 1),
        pending: None,
        text: String::new(),
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                out.flush_text()?;
                out.open_pending()?;
                out.pending = Some(e);
            }
            Event::End(e) => {
                out.flush_text()?;
                match out.pending.take() {
                    Some(start) => out.writer.write_event(Event::Empty(start))?,
                    None => out.writer.write_event(Event::End(e))?,
                }
            }
            Event::Text(e) => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| GpxError::General(e.to_string()))?;
                out.text.push_str(text);
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())
                    .map_err(|e| GpxError::General(e.to_string()))?;
                out.text.push_str(text);
            }
            Event::GeneralRef(e) => {
                let name = std::str::from_utf8(e.as_ref())
                    .map_err(|e| GpxError::General(e.to_string()))?;
                let resolved = match e.resolve_char_ref()? {
                    Some(ch) => ch,
                    None => predefined_entity(name)
                        .ok_or_else(|| GpxError::General(format!("unknown entity &{name};")))?,
                };
                out.text.push(resolved);
            }
            Event::Decl(_) => {}
            Event::Eof => break,
            other => {
                out.flush_text()?;
                out.open_pending()?;
                out.writer.write_event(other)?;
            }
        }
    }
    out.flush_text()?;
    out.open_pending()?;

    let body = String::from_utf8(out.writer.into_inner())
        .map_err(|e| GpxError::General(e.to_string()))?;
    Ok(match declaration {
        Some(declaration) => format!("{declaration}\n{body}"),
        None => body,
    })
}

/// Indenting writer that holds back start tags until it knows whether the
/// element has content, and joins adjacent character data into one node.
struct Indenter<'a> {
    writer: Writer<Vec<u8>>,
    pending: Option<BytesStart<'a>>,
    text: String,
}

impl Indenter<'_> {
    fn open_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn flush_text(&mut self) -> Result<()> {
        if !self.text.trim().is_empty() {
            self.open_pending()?;
            self.writer
                .write_event(Event::Text(BytesText::new(&self.text)))?;
        }
        self.text.clear();
        Ok(())
    }
}

fn split_declaration(xml: &str) -> (Option<&str>, &str) {
    let trimmed = xml.trim_start();
    if trimmed.starts_with("<?xml") {
        if let Some(end) = trimmed.find("?>") {
            return (Some(&trimmed[..end + 2]), &trimmed[end + 2..]);
        }
    }
    (None, xml)
}

fn predefined_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}
