//! SVG parsing into the immutable [`Document`] tree.

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use super::SvgError;
use super::document::{Document, Element, Node};

/// Parse SVG markup into a document tree.
///
/// Fails on malformed XML, on unclosed elements and when the root element
/// is not `<svg>`.
pub fn parse_svg(text: &str) -> Result<Document, SvgError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut prolog = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Decl(e) => prolog.push(format!("<?{}?>", utf8(e.as_ref())?)),
            Event::PI(e) => {
                if stack.is_empty() && root.is_none() {
                    prolog.push(format!("<?{}?>", utf8(e.as_ref())?));
                }
            }
            Event::DocType(e) => prolog.push(format!("<!DOCTYPE {}>", utf8(e.as_ref())?)),
            Event::Start(e) => stack.push(element_from(&e)?),
            Event::Empty(e) => {
                let element = element_from(&e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or(SvgError::Unbalanced)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => push_text(&mut stack, utf8(e.as_ref())?),
            Event::GeneralRef(e) => {
                let name = utf8(e.as_ref())?;
                push_text(&mut stack, &format!("&{name};"));
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::CData(utf8(e.as_ref())?.to_string()));
                }
            }
            Event::Comment(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Comment(utf8(e.as_ref())?.to_string()));
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(SvgError::Unbalanced);
    }

    let root = root.ok_or(SvgError::Empty)?;
    if root.local_name() != "svg" {
        return Err(SvgError::NotSvg(root.name));
    }

    Ok(Document { prolog, root })
}

/// Build an element (without children) from a start tag.
fn element_from(start: &BytesStart<'_>) -> Result<Element, SvgError> {
    let mut element = Element::new(utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?;
        let raw = utf8(&attr.value)?;
        let value = unescape(raw)?;
        element.attrs.push((key.to_string(), value.into_owned()));
    }
    Ok(element)
}

/// Append a finished element to its parent, or make it the root.
fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), SvgError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(SvgError::MultipleRoots),
    }
    Ok(())
}

/// Append text to the open element, merging with a preceding text node.
fn push_text(stack: &mut [Element], text: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    if let Some(Node::Text(existing)) = parent.children.last_mut() {
        existing.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}

#[inline]
fn utf8(bytes: &[u8]) -> Result<&str, SvgError> {
    Ok(std::str::from_utf8(bytes)?)
}
