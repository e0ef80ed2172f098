//! Converter HTML reader
//!
//! Parses the HTML a layout-aware PDF converter emits (absolutely positioned
//! `div`/`span` boxes with inline CSS and `<a name="N">Page N</a>` markers)
//! into a [`StyledTree`]. The markup is HTML, not XML, so the reader:
//! - never expects a closing tag for void elements (`br`, `meta`, ...)
//! - ignores end tags that close nothing and closes skipped elements implicitly
//! - keeps entities it cannot resolve as literal text
//!
//! After reading, inline `style` declarations are flattened onto their nodes
//! and every node is tagged with its page.

use crate::error::MarkupError;
use crate::tree::{assign_pages, attrs, NodeId, StyledTree, TreeBuilder};
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

const VOID_ELEMENTS: [&str; 10] = [
    "br", "meta", "img", "hr", "input", "link", "col", "area", "base", "wbr",
];

/// Style properties whose values are pixel lengths.
const PIXEL_PROPERTIES: [&str; 5] = [
    attrs::FONT_SIZE,
    attrs::TOP,
    attrs::LEFT,
    attrs::WIDTH,
    attrs::HEIGHT,
];

/// Parse converter HTML into a styled tree with inlined styles and pages.
pub fn parse_html(markup: &str) -> Result<StyledTree, MarkupError> {
    let mut tree = read_tree(markup)?;
    let inlined = inline_styles(&mut tree)?;
    let pages = assign_pages(&mut tree);

    log::info!(
        "✅ HTML parsing complete: {} nodes, {} styled, {} page markers",
        tree.len(),
        inlined,
        pages
    );

    Ok(tree)
}

/// Build the raw tree without any style or page processing.
pub fn read_tree(markup: &str) -> Result<StyledTree, MarkupError> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(false);
    reader.check_end_names(false);

    let mut builder = TreeBuilder::new();
    // Open elements, innermost last. The root is never popped.
    let mut open: Vec<(NodeId, String)> = vec![(builder.root(), String::new())];

    loop {
        let parent = open.last().map(|(id, _)| *id).unwrap_or(StyledTree::ROOT);

        match reader.read_event()? {
            Event::Start(start) => {
                let name = element_name(start.name().as_ref());
                let id = builder.element(parent, &name, read_attributes(&start))?;
                if !VOID_ELEMENTS.contains(&name.as_str()) {
                    open.push((id, name));
                }
            }
            Event::Empty(start) => {
                let name = element_name(start.name().as_ref());
                builder.element(parent, &name, read_attributes(&start))?;
            }
            Event::End(end) => {
                let name = element_name(end.name().as_ref());
                if let Some(position) = open.iter().rposition(|(_, open_name)| *open_name == name) {
                    if position > 0 {
                        open.truncate(position);
                    }
                }
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text);
                let content = decode_text(&raw);
                if !content.is_empty() {
                    builder.text(parent, content)?;
                }
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(&data).into_owned();
                if !content.is_empty() {
                    builder.text(parent, content)?;
                }
            }
            Event::Eof => break,
            // Comments, declarations, processing instructions, doctype
            _ => {}
        }
    }

    Ok(builder.build())
}

fn element_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn read_attributes(start: &BytesStart<'_>) -> Vec<(String, String)> {
    start
        .attributes()
        .with_checks(false)
        .filter_map(Result::ok)
        .map(|attribute| {
            let key = String::from_utf8_lossy(attribute.key.as_ref()).to_ascii_lowercase();
            let value = match attribute.unescape_value() {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attribute.value).into_owned(),
            };
            (key, value)
        })
        .collect()
}

fn decode_text(raw: &str) -> String {
    match unescape_with(raw, html_entity) {
        Ok(Cow::Borrowed(text)) => text.to_string(),
        Ok(Cow::Owned(text)) => text,
        Err(_) => raw.to_string(),
    }
}

fn html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        "nbsp" => Some("\u{00A0}"),
        "middot" => Some("\u{00B7}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "shy" => Some("\u{00AD}"),
        "copy" => Some("\u{00A9}"),
        _ => None,
    }
}

/// Move each inline `style` declaration onto its node as an attribute and
/// drop the `style` attribute. Returns how many nodes carried a style.
pub fn inline_styles(tree: &mut StyledTree) -> Result<usize, MarkupError> {
    let styled: Vec<NodeId> = tree
        .elements()
        .filter(|id| tree.attr(*id, attrs::STYLE).is_some())
        .collect();

    for id in &styled {
        if let Some(style) = tree.remove_attr(*id, attrs::STYLE) {
            for (property, value) in parse_style(&style)? {
                tree.set_attr(*id, &property, value);
            }
        }
    }

    Ok(styled.len())
}

/// Split a CSS declaration list into `(property, value)` pairs, stripping the
/// `px` unit from geometry and font-size values.
pub fn parse_style(style: &str) -> Result<Vec<(String, String)>, MarkupError> {
    style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .map(|declaration| {
            let (property, value) = declaration
                .split_once(':')
                .ok_or_else(|| MarkupError::MalformedStyle(declaration.to_string()))?;
            let property = property.trim().to_string();
            let value = map_style_value(&property, value.trim())?;
            Ok((property, value))
        })
        .collect()
}

fn map_style_value(property: &str, value: &str) -> Result<String, MarkupError> {
    if !PIXEL_PROPERTIES.contains(&property) {
        return Ok(value.to_string());
    }

    value
        .strip_suffix("px")
        .map(|number| number.trim().to_string())
        .ok_or_else(|| MarkupError::UnsupportedUnit {
            property: property.to_string(),
            value: value.to_string(),
        })
}
