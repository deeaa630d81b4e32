//! Owned XML tree for parts that get rewritten.
//!
//! Whitespace and the XML declaration are kept; attribute order is kept.
//! Prefixes are stored as written, lookups go by local name.

use deck_core::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlPart {
    decl: Option<BytesDecl<'static>>,
    /// Whitespace between the declaration and the root, as written.
    prolog: String,
    /// Document element.
    pub root: Element,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Nested element.
    Element(Element),
    /// Character data, unescaped.
    Text(String),
    /// CDATA section.
    CData(String),
    /// Comment, as written.
    Comment(String),
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Qualified name, e.g. `p:sp`.
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    /// Children in document order.
    pub children: Vec<Node>,
}

impl XmlPart {
    /// Parse a part from text.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut decl = None;
        let mut prolog = String::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event() {
                Ok(Event::Decl(d)) => decl = Some(d.into_owned()),
                Ok(Event::Start(ref e)) => stack.push(Element::from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = Element::from_start(e)?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::Text(ref e)) if stack.is_empty() => {
                    if root.is_none() {
                        prolog.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::XmlError(e.to_string()))?;
                        parent.children.push(Node::Text(text.into_owned()));
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        parent.children.push(Node::CData(text));
                    }
                }
                Ok(Event::Comment(ref e)) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(e).into_owned();
                        parent.children.push(Node::Comment(text));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("unexpected end of document".to_string()));
        }
        let root = root.ok_or_else(|| Error::XmlError("document has no root element".to_string()))?;

        Ok(Self { decl, prolog, root })
    }

    /// Serialize the part back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        if let Some(decl) = &self.decl {
            write_event(&mut writer, Event::Decl(decl.clone()))?;
        }
        if !self.prolog.is_empty() {
            write_event(&mut writer, Event::Text(BytesText::from_escaped(self.prolog.as_str())))?;
        }
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => *root = Some(element),
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("Failed to write XML: {}", e)))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return write_event(writer, Event::Empty(start));
    }

    write_event(writer, Event::Start(start))?;
    for child in &element.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => write_event(writer, Event::Text(BytesText::new(t)))?,
            Node::CData(t) => write_event(writer, Event::CData(BytesCData::new(t.as_str())))?,
            Node::Comment(t) => {
                write_event(writer, Event::Comment(BytesText::from_escaped(t.as_str())))?
            }
        }
    }
    write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn from_start(e: &BytesStart<'_>) -> Result<Self> {
        let mut element = Element::new(String::from_utf8_lossy(e.name().as_ref()));
        for attr in e.attributes() {
            let attr = attr.map_err(|e| Error::XmlError(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(e.to_string()))?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    /// Name without namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(p, _)| p)
    }

    /// Attribute value by local name (`r:id` matches `id`).
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| local_name(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value by local name, only among prefixed attributes.
    pub fn prefixed_attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.contains(':') && local_name(k) == local)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements with their index in `children`.
    pub fn elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children.iter().enumerate().filter_map(|(i, n)| match n {
            Node::Element(e) => Some((i, e)),
            _ => None,
        })
    }

    /// First child element with the given local name, with its index.
    pub fn child(&self, local: &str) -> Option<(usize, &Element)> {
        self.elements().find(|(_, e)| e.local_name() == local)
    }

    /// All child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = (usize, &'a Element)> {
        self.elements().filter(move |(_, e)| e.local_name() == local)
    }

    /// Follow a chain of local names, collecting child indices.
    pub fn find_path(&self, names: &[&str]) -> Option<(Vec<usize>, &Element)> {
        let mut path = Vec::with_capacity(names.len());
        let mut current = self;
        for name in names {
            let (i, next) = current.child(name)?;
            path.push(i);
            current = next;
        }
        Some((path, current))
    }

    /// Element at a path of child indices.
    pub fn at_path(&self, path: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &i in path {
            current = match current.children.get(i)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable element at a path of child indices.
    pub fn at_path_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &i in path {
            current = match current.children.get_mut(i)? {
                Node::Element(e) => e,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Concatenated character data of direct children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) | Node::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Call `f` on every descendant element with the given local name.
    /// Matches are not searched for nested matches.
    pub fn for_each_named_mut(&mut self, local: &str, f: &mut dyn FnMut(&mut Element)) {
        for child in &mut self.children {
            if let Node::Element(e) = child {
                if e.local_name() == local {
                    f(e);
                } else {
                    e.for_each_named_mut(local, f);
                }
            }
        }
    }
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}
