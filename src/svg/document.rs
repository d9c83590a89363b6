//! Immutable SVG document tree.
//!
//! Parsing produces a [`Document`] once; every transformation (recolor,
//! filter injection) builds a new tree instead of mutating in place.

use std::fmt::Write;

use quick_xml::escape::escape;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Character data, kept in its escaped source form.
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name without namespace prefix (`svg:rect` → `rect`).
    pub fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    /// Builder form of [`Element::set_attr`].
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Iterate over child elements, skipping text and comments.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Look up a property from the inline `style` first, then the
    /// presentation attribute.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.style_value(name).or_else(|| self.attr(name)).map(str::trim)
    }

    /// Value of one declaration inside the inline `style` attribute.
    pub fn style_value(&self, name: &str) -> Option<&str> {
        style_declarations(self.attr("style")?)
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Whether `display:none` or `visibility:hidden` is set on this element.
    pub fn is_hidden(&self) -> bool {
        matches!(self.property("display"), Some("none"))
            || matches!(self.property("visibility"), Some("hidden" | "collapse"))
    }

    /// Depth-first search for the element with the given `id`.
    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        if self.attr("id") == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let _ = write!(out, " {key}=\"{}\"", escape(value.as_str()));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(el) => el.write_to(out),
                Node::Text(text) => out.push_str(text),
                Node::CData(data) => {
                    let _ = write!(out, "<![CDATA[{data}]]>");
                }
                Node::Comment(comment) => {
                    let _ = write!(out, "<!--{comment}-->");
                }
            }
        }
        let _ = write!(out, "</{}>", self.name);
    }
}

/// Split an inline style into trimmed `(property, value)` pairs.
pub fn style_declarations(style: &str) -> impl Iterator<Item = (&str, &str)> {
    style.split(';').filter_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        let key = key.trim();
        (!key.is_empty()).then(|| (key, value.trim()))
    })
}

/// A parsed SVG document: prolog lines (XML declaration, doctype,
/// processing instructions) and the root `<svg>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub prolog: Vec<String>,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            prolog: Vec::new(),
            root,
        }
    }

    /// Return a copy of this document with a different root.
    pub fn with_root(&self, root: Element) -> Self {
        Self {
            prolog: self.prolog.clone(),
            root,
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Element> {
        self.root.find_by_id(id)
    }

    /// Serialize back to SVG markup.
    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        for line in &self.prolog {
            out.push_str(line);
            out.push('\n');
        }
        self.root.write_to(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(Element::new("svg:rect").local_name(), "rect");
        assert_eq!(Element::new("rect").local_name(), "rect");
    }

    #[test]
    fn test_property_prefers_style() {
        let el = Element::new("rect")
            .with_attr("fill", "red")
            .with_attr("style", "stroke: blue; fill:#00ff00");
        assert_eq!(el.property("fill"), Some("#00ff00"));
        assert_eq!(el.property("stroke"), Some("blue"));
        assert_eq!(el.property("opacity"), None);
    }

    #[test]
    fn test_is_hidden() {
        assert!(Element::new("g").with_attr("display", "none").is_hidden());
        assert!(
            Element::new("g")
                .with_attr("style", "visibility:hidden")
                .is_hidden()
        );
        assert!(!Element::new("g").with_attr("display", "inline").is_hidden());
    }

    #[test]
    fn test_set_attr_keeps_position() {
        let mut el = Element::new("rect")
            .with_attr("x", "1")
            .with_attr("fill", "red")
            .with_attr("y", "2");
        el.set_attr("fill", "#000000");
        assert_eq!(el.attrs[1], ("fill".to_string(), "#000000".to_string()));
    }

    #[test]
    fn test_serialize_escapes_attributes() {
        let doc = Document::new(
            Element::new("svg").with_child(Element::new("text").with_attr("data-x", "a<b&\"c\"")),
        );
        let out = doc.to_svg_string();
        assert!(out.contains("data-x=\"a&lt;b&amp;&quot;c&quot;\""));
        assert!(out.starts_with("<svg><text"));
    }
}
