//! Owned XML element tree for slide and presentation parts.
//!
//! Slides are edited structurally (frames located, tables swapped out, slide ids
//! inserted), so unlike the read-only streaming parsers used elsewhere, parts that
//! get rewritten are loaded into this small tree. Element and attribute names are
//! kept qualified exactly as they appear in the source (`a:tbl`, `r:embed`), which
//! means namespace declarations survive a round trip untouched.
//!
//! Text and attribute values are stored unescaped and escaped again on output.
use crate::ooxml::error::{OoxmlError, Result};
use quick_xml::Reader;
use quick_xml::escape::{escape, unescape};
use quick_xml::events::{BytesStart, Event};

/// Standard declaration written in front of every OOXML part.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A node in an element's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    Comment(String),
}

/// An XML element with its qualified name, attributes in document order and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an empty element with a qualified name such as `a:tcPr`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Copy of the name and attributes without any content.
    pub fn shallow_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::new(),
        }
    }

    /// Qualified name for a sibling vocabulary element, reusing this element's prefix.
    ///
    /// `a:tc` qualifies `tcPr` as `a:tcPr`; an unprefixed element yields the bare name.
    pub fn qualify(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Qualified name as written in the document.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its namespace prefix.
    #[inline]
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    /// Namespace prefix, if the name has one.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Look up an attribute by its qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == key)?;
        Some(self.attributes.remove(pos).1)
    }

    #[inline]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Iterate over child elements, skipping text and comments.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Mutable variant of [`XmlElement::elements`].
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.local_name() == local)
    }

    /// First child element with the given local name, mutably.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.local_name() == local)
    }

    /// Append a child element.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Append text, merging with a trailing text node.
    pub fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    /// Depth-first search for the first descendant with the given local name.
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        for el in self.elements() {
            if el.local_name() == local {
                return Some(el);
            }
            if let Some(found) = el.find(local) {
                return Some(found);
            }
        }
        None
    }

    /// Depth-first search for the first descendant matching a predicate, mutably.
    pub fn find_where_mut<F>(&mut self, pred: &F) -> Option<&mut XmlElement>
    where
        F: Fn(&XmlElement) -> bool,
    {
        for el in self.elements_mut() {
            if pred(el) {
                return Some(el);
            }
            if let Some(found) = el.find_where_mut(pred) {
                return Some(found);
            }
        }
        None
    }

    /// Collect every descendant (in document order) matching a predicate.
    pub fn descendants_where<'a, F>(&'a self, pred: &F, out: &mut Vec<&'a XmlElement>)
    where
        F: Fn(&XmlElement) -> bool,
    {
        for el in self.elements() {
            if pred(el) {
                out.push(el);
            }
            el.descendants_where(pred, out);
        }
    }

    /// Serialize this element (without declaration) into `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attributes {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                XmlNode::Element(el) => el.write_to(out),
                XmlNode::Text(text) => out.push_str(&escape(text.as_str())),
                XmlNode::CData(data) => {
                    out.push_str("<![CDATA[");
                    out.push_str(data);
                    out.push_str("]]>");
                },
                XmlNode::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                },
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    /// Serialize this element (without declaration) to a new string.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(256);
        self.write_to(&mut out);
        out
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut element = XmlElement::new(std::str::from_utf8(start.name().as_ref())?);
        for attr in start.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let raw = std::str::from_utf8(&attr.value)?;
            element
                .attributes
                .push((key.to_string(), unescape_str(raw)?));
        }
        Ok(element)
    }
}

/// A parsed part: the root element plus whether a declaration preceded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    declaration: bool,
    root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: true,
            root,
        }
    }

    /// Parse a complete XML part.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut declaration = false;
        let mut root = None;
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Decl(_)) => declaration = true,
                Ok(Event::Start(e)) => stack.push(XmlElement::from_start(&e)?),
                Ok(Event::Empty(e)) => {
                    let element = XmlElement::from_start(&e)?;
                    attach(&mut stack, &mut root, element)?;
                },
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OoxmlError::Xml("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                },
                Ok(Event::Text(e)) => {
                    if let Some(top) = stack.last_mut() {
                        top.push_text(&unescape_str(std::str::from_utf8(&e)?)?);
                    }
                },
                Ok(Event::GeneralRef(e)) => {
                    if let Some(top) = stack.last_mut() {
                        let entity = format!("&{};", std::str::from_utf8(&e)?);
                        top.push_text(&unescape_str(&entity)?);
                    }
                },
                Ok(Event::CData(e)) => {
                    if let Some(top) = stack.last_mut() {
                        let data = std::str::from_utf8(&e)?.to_string();
                        top.children.push(XmlNode::CData(data));
                    }
                },
                Ok(Event::Comment(e)) => {
                    if let Some(top) = stack.last_mut() {
                        let comment = std::str::from_utf8(&e)?.to_string();
                        top.children.push(XmlNode::Comment(comment));
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e.to_string())),
                _ => {},
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OoxmlError::Xml(format!(
                "unclosed element <{}>",
                stack[stack.len() - 1].name
            )));
        }
        let root = root.ok_or_else(|| OoxmlError::Xml("document has no root element".to_string()))?;
        Ok(Self { declaration, root })
    }

    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Serialize the document, declaration included when the source had one.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        if self.declaration {
            out.push_str(XML_DECLARATION);
            out.push('\n');
        }
        self.root.write_to(&mut out);
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_xml().into_bytes()
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(XmlNode::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(OoxmlError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

fn unescape_str(raw: &str) -> Result<String> {
    unescape(raw)
        .map(|s| s.into_owned())
        .map_err(|e| OoxmlError::Xml(e.to_string()))
}

/// Strip a namespace prefix from a qualified name.
#[inline]
pub fn local_part(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_write_round_trip() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="urn:a" xmlns:p="urn:p"><a:t>Fish &amp; Chips</a:t><a:br/></p:sld>"#;
        let doc = XmlDocument::parse(xml).unwrap();

        assert_eq!(doc.root().name(), "p:sld");
        assert_eq!(doc.root().local_name(), "sld");
        assert_eq!(doc.root().attr("xmlns:a"), Some("urn:a"));

        let t = doc.root().child("t").unwrap();
        assert_eq!(t.children(), &[XmlNode::Text("Fish & Chips".to_string())]);

        let out = doc.to_xml();
        assert!(out.starts_with(XML_DECLARATION));
        assert!(out.contains("<a:t>Fish &amp; Chips</a:t><a:br/>"));
    }

    #[test]
    fn test_attribute_escaping() {
        let el = XmlElement::new("a:fld").with_attr("type", "a<b & \"c\"");
        let xml = el.to_xml();
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        assert_eq!(doc.root().attr("type"), Some("a<b & \"c\""));
    }

    #[test]
    fn test_find_descendant() {
        let xml = br#"<root><x:a><x:b id="1"/></x:a><x:b id="2"/></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().find("b").unwrap().attr("id"), Some("1"));

        let mut found = Vec::new();
        doc.root()
            .descendants_where(&|el| el.local_name() == "b", &mut found);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_set_and_remove_attr() {
        let mut el = XmlElement::new("a:tc").with_attr("gridSpan", "2");
        el.set_attr("gridSpan", "3");
        assert_eq!(el.attr("gridSpan"), Some("3"));
        assert_eq!(el.attributes().len(), 1);
        assert_eq!(el.remove_attr("gridSpan").as_deref(), Some("3"));
        assert!(el.attr("gridSpan").is_none());
    }

    #[test]
    fn test_unbalanced_document_is_rejected() {
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"").is_err());
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let doc = XmlDocument::parse(b"<a:t xmlns:a=\"urn:a\">  padded  </a:t>").unwrap();
        assert_eq!(
            doc.root().children(),
            &[XmlNode::Text("  padded  ".to_string())]
        );
    }
}
