//! Small XML helpers over quick-xml for editing package parts in place.
//!
//! Parts are edited by splicing strings at element boundaries found with the
//! quick-xml reader, so everything the template carries that we do not touch
//! is written back byte for byte.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::AppError;

pub fn escape(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

pub fn xml_error(e: impl std::fmt::Display) -> AppError {
    AppError::Render(format!("XML error: {e}"))
}

/// Byte offsets of one element inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpan {
    /// Offset of the opening `<`.
    pub start: usize,
    /// Offset just past the closing `>`.
    pub end: usize,
    /// Offset of the `</` of the end tag; `None` for `<x/>`.
    pub inner_end: Option<usize>,
}

/// Locate the first element with the given local name.
pub fn find_element(xml: &str, local: &str) -> Result<Option<ElementSpan>, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Option<(usize, usize)> = None;
    let mut depth = 0usize;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        let pos = reader.buffer_position() as usize;
        match event {
            Event::Start(e) if e.local_name().as_ref() == local.as_bytes() => {
                if open.is_none() {
                    open = Some((tag_start(xml, pos), depth));
                }
                depth += 1;
            }
            Event::Start(_) => depth += 1,
            Event::Empty(e) if open.is_none() && e.local_name().as_ref() == local.as_bytes() => {
                return Ok(Some(ElementSpan {
                    start: tag_start(xml, pos),
                    end: pos,
                    inner_end: None,
                }));
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some((start, open_depth)) = open
                    && depth == open_depth
                {
                    return Ok(Some(ElementSpan {
                        start,
                        end: pos,
                        inner_end: Some(tag_start(xml, pos)),
                    }));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn tag_start(xml: &str, end: usize) -> usize {
    xml[..end].rfind('<').unwrap_or(0)
}

/// Attributes of a start tag keyed by their qualified name (`id`, `r:id`, ...).
pub fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>, AppError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = quick_xml::escape::unescape(&raw).map_err(xml_error)?.into_owned();
        out.insert(key, value);
    }
    Ok(out)
}

/// Collect the attributes of every element with the given local name, in document order.
pub fn collect_attributes(xml: &str, local: &str) -> Result<Vec<HashMap<String, String>>, AppError> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == local.as_bytes() => {
                out.push(attributes(&e)?);
            }
            Event::Eof => return Ok(out),
            _ => {}
        }
    }
}

/// Insert `fragment` at byte offset `at`.
pub fn splice(xml: &str, at: usize, fragment: &str) -> String {
    let mut out = String::with_capacity(xml.len() + fragment.len());
    out.push_str(&xml[..at]);
    out.push_str(fragment);
    out.push_str(&xml[at..]);
    out
}

/// Append `fragment` as the last child of the first `local` element.
///
/// A self-closing `<x/>` is expanded to `<x>fragment</x>` keeping its prefix.
pub fn append_child(xml: &str, local: &str, fragment: &str) -> Result<Option<String>, AppError> {
    let Some(span) = find_element(xml, local)? else {
        return Ok(None);
    };
    let out = match span.inner_end {
        Some(at) => splice(xml, at, fragment),
        None => {
            let tag = &xml[span.start..span.end];
            let open = tag.trim_end_matches('>').trim_end_matches('/').trim_end();
            let name = open[1..].split_whitespace().next().unwrap_or(local);
            let expanded = format!("{open}>{fragment}</{name}>");
            let mut out = String::with_capacity(xml.len() + expanded.len());
            out.push_str(&xml[..span.start]);
            out.push_str(&expanded);
            out.push_str(&xml[span.end..]);
            out
        }
    };
    Ok(Some(out))
}
