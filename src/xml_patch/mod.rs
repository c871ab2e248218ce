pub mod preserve;
pub mod strict;

pub use preserve::{unescape_entities, PreservingPatcher};
pub use strict::StrictPatcher;

use crate::csv_processor::TranslationMap;
use crate::utils::{L10nError, PatchStrategy, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use std::path::Path;

pub const XML_DECLARATION: &str = "<?xml version='1.0' encoding='utf-8'?>";

/// Replaces the text of root-level elements whose tag is a key of the map.
///
/// Returns `Ok(true)` when the file was rewritten. A file with no matching
/// element is left untouched on disk.
pub trait XmlPatcher {
    fn patch(&self, path: &Path, map: &TranslationMap) -> Result<bool>;

    fn name(&self) -> &'static str;
}

pub fn patcher_for(strategy: PatchStrategy) -> Box<dyn XmlPatcher> {
    match strategy {
        PatchStrategy::Strict => Box::new(StrictPatcher),
        PatchStrategy::Preserve => Box::new(PreservingPatcher),
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RewriteOptions {
    /// Keep comments, processing instructions and the doctype.
    pub keep_misc: bool,
    /// Reject text nodes with a bare `&` or an entity XML does not predefine.
    pub validate_text: bool,
    /// Emit a newline right after the root element closes.
    pub newline_after_root: bool,
}

pub(crate) fn read_source(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(L10nError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    let mut text = String::from_utf8(bytes)?;
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    Ok(text)
}

/// Streams `source` into a new document with the matched children replaced.
/// `None` means no root-level child matched and nothing should be written.
pub(crate) fn rewrite_document(
    source: &str,
    map: &TranslationMap,
    options: RewriteOptions,
) -> Result<Option<Vec<u8>>> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    let mut out = Vec::with_capacity(source.len() + 64);
    out.extend_from_slice(XML_DECLARATION.as_bytes());
    out.push(b'\n');
    let mut writer = Writer::new(out);

    let mut depth = 0usize;
    let mut seen_root = false;
    let mut changed = false;
    // Set right after a replacement: the element's old leading text is dropped.
    let mut skipping_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| position_error(e, reader.buffer_position()))?;

        if options.validate_text {
            if let Event::Text(text) = &event {
                text.unescape()
                    .map_err(|e| position_error(e, reader.buffer_position()))?;
            }
        }

        if skipping_text {
            if matches!(event, Event::Text(_) | Event::CData(_)) {
                continue;
            }
            skipping_text = false;
        }

        match event {
            Event::Eof => break,
            Event::Decl(_) => {}
            Event::Start(start) => {
                if depth == 0 {
                    check_single_root(&mut seen_root)?;
                }
                depth += 1;
                if depth == 2 {
                    let matched = lookup(map, start.name().as_ref());
                    if let Some(value) = matched {
                        writer.write_event(Event::Start(start))?;
                        writer.write_event(replacement_text(value))?;
                        skipping_text = true;
                        changed = true;
                        continue;
                    }
                }
                writer.write_event(Event::Start(start))?;
            }
            Event::Empty(start) => {
                if depth == 0 {
                    check_single_root(&mut seen_root)?;
                }
                if depth == 1 {
                    let matched = lookup(map, start.name().as_ref());
                    if let Some(value) = matched {
                        let end = start.to_end().into_owned();
                        writer.write_event(Event::Start(start))?;
                        writer.write_event(replacement_text(value))?;
                        writer.write_event(Event::End(end))?;
                        changed = true;
                        continue;
                    }
                }
                writer.write_event(Event::Empty(start))?;
                if depth == 0 && options.newline_after_root {
                    writer.get_mut().push(b'\n');
                }
            }
            Event::End(end) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    L10nError::XmlError("closing tag without a matching opening tag".to_string())
                })?;
                writer.write_event(Event::End(end))?;
                if depth == 0 && options.newline_after_root {
                    writer.get_mut().push(b'\n');
                }
            }
            Event::Text(text) => {
                if depth > 0 {
                    writer.write_event(Event::Text(text))?;
                } else if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(L10nError::XmlError(
                        "text content outside the root element".to_string(),
                    ));
                }
            }
            Event::CData(cdata) => {
                writer.write_event(Event::CData(cdata))?;
            }
            event @ (Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {
                if options.keep_misc {
                    writer.write_event(event)?;
                    if depth == 0 {
                        writer.get_mut().push(b'\n');
                    }
                }
            }
        }
    }

    if depth != 0 {
        return Err(L10nError::XmlError(format!(
            "unexpected end of document, {} element(s) left open",
            depth
        )));
    }
    if !seen_root {
        return Err(L10nError::XmlError("document has no root element".to_string()));
    }
    if !changed {
        return Ok(None);
    }

    Ok(Some(writer.into_inner()))
}

fn lookup<'m>(map: &'m TranslationMap, name: &[u8]) -> Option<&'m str> {
    std::str::from_utf8(name)
        .ok()
        .and_then(|tag| map.get(tag))
        .map(String::as_str)
}

fn replacement_text(value: &str) -> Event<'_> {
    Event::Text(BytesText::from_escaped(partial_escape(value)))
}

fn check_single_root(seen_root: &mut bool) -> Result<()> {
    if *seen_root {
        return Err(L10nError::XmlError(
            "document has more than one root element".to_string(),
        ));
    }
    *seen_root = true;
    Ok(())
}

fn position_error(e: quick_xml::Error, position: impl std::fmt::Display) -> L10nError {
    L10nError::XmlError(format!("{} (at byte {})", e, position))
}
