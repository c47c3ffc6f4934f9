//! A small owned element tree over `quick-xml` events.
//!
//! Children are always kept as a list, so a single `<field>` and twenty of
//! them come back through the same [`Element::children_named`] iterator. Each
//! element also keeps the raw source span it was parsed from, which the
//! option-block fallback scans textually.

use crate::MappingError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name (namespace prefix stripped).
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
    /// Source text of the element, tags included.
    pub raw: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All `<item>` elements under every `<container>` child.
    pub fn nested<'a>(
        &'a self,
        container: &'a str,
        item: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children_named(container)
            .flat_map(move |group| group.children_named(item))
    }
}

/// Parse a whole document and return its root element.
pub fn parse_document(text: &str) -> Result<Element, MappingError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<(Element, usize)> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let begin = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|err| MappingError::Xml(format!("at byte {begin}: {err}")))?;

        match event {
            Event::Start(start) => {
                stack.push((element_from(&start)?, begin));
            }
            Event::Empty(start) => {
                let mut element = element_from(&start)?;
                element.raw = span(text, begin, reader.buffer_position());
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let Some((mut element, opened_at)) = stack.pop() else {
                    return Err(MappingError::Xml("unbalanced closing tag".to_string()));
                };
                element.raw = span(text, opened_at, reader.buffer_position());
                attach(&mut stack, &mut root, element);
            }
            Event::Text(content) => {
                if let Some((element, _)) = stack.last_mut() {
                    let unescaped = content
                        .unescape()
                        .map_err(|err| MappingError::Xml(err.to_string()))?;
                    element.text.push_str(&unescaped);
                }
            }
            Event::CData(content) => {
                if let Some((element, _)) = stack.last_mut() {
                    element
                        .text
                        .push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some((element, _)) = stack.pop() {
        return Err(MappingError::Xml(format!("<{}> is never closed", element.name)));
    }

    root.ok_or_else(|| MappingError::Xml("document has no root element".to_string()))
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, MappingError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| MappingError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| MappingError::Xml(err.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn span(text: &str, begin: usize, end: usize) -> String {
    text.get(begin..end).unwrap_or_default().trim().to_string()
}

fn attach(stack: &mut [(Element, usize)], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some((parent, _)) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

// ============================================================================
// Option blocks
// ============================================================================

/// Decode an `<options>` block into an ordered map.
///
/// Structured `<option name="..">value</option>` children are used when the
/// tree has them; otherwise the raw block is scanned textually, which also
/// covers dialects where option values carry markup the tree does not keep.
pub fn parse_options(options: &Element) -> Map<String, Value> {
    let structured: Map<String, Value> = options
        .children_named("option")
        .filter_map(|option| {
            let key = option.attr("name")?;
            Some((key.to_string(), option_value(option)))
        })
        .collect();

    if !structured.is_empty() || !options.raw.contains("<option") {
        return structured;
    }

    scan_options_text(&options.raw)
}

fn option_value(option: &Element) -> Value {
    if option.children.iter().any(|child| child.name == "option") {
        return Value::Object(parse_options(option));
    }
    decode_literal(&option.text)
}

fn option_name_regex() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| {
        Regex::new(r#"name\s*=\s*["']([^"']*)["']"#).expect("static pattern compiles")
    })
}

/// Split a raw `<options>` block on `<option ` boundaries and decode each value.
pub fn scan_options_text(raw: &str) -> Map<String, Value> {
    let body = strip_wrapper(raw.trim());
    let mut options = Map::new();

    for chunk in body.split("<option ") {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }

        let chunk = chunk.replace("</option>", "");
        let (head, value) = match chunk.split_once('>') {
            Some((head, value)) => (head, value.trim()),
            None => (chunk.as_str(), ""),
        };

        let Some(key) = option_name_regex()
            .captures(head)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
        else {
            continue;
        };

        let value = if head.trim_end().ends_with('/') {
            Value::Null
        } else {
            decode_literal(value)
        };
        options.insert(key, value);
    }

    options
}

fn strip_wrapper(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("<options") else {
        return raw;
    };
    let Some((_, inner)) = rest.split_once('>') else {
        return raw;
    };
    inner.trim_end().strip_suffix("</options>").unwrap_or(inner)
}

/// Decode an option value as a typed literal: numbers, booleans, null and
/// JSON strings decode as such; anything else is kept as a plain string.
pub fn decode_literal(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }

    let unescaped = quick_xml::escape::unescape(trimmed)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| trimmed.to_string());

    match serde_json::from_str::<Value>(&unescaped) {
        Ok(value) => value,
        Err(_) => Value::String(unescaped),
    }
}
