//! Owned XML tree built from the `quick-xml` event stream.
//!
//! The tree keeps text, attribute values, comments and CDATA in their raw
//! (still escaped) form so that content the deduplicator never touches is
//! written back exactly as it was read. Only the attribute values the engine
//! compares (`id`, `text`) are unescaped, once, at parse time.
//!
//! Elements are addressed by [`NodePath`]: the child indices leading from the
//! root element down to the node. Paths stay valid until a node at or before
//! them (in the same parent) is detached.

use std::fmt::Write as _;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// Error returned when the document body is not well-formed XML.
#[derive(Debug, Clone, Error)]
#[error("{message} (at byte {position})")]
pub struct ParseError {
    /// Description of the problem.
    pub message: String,
    /// Byte offset in the body where parsing stopped.
    pub position: u64,
}

/// Child index path from the root element to a node.
pub type NodePath = Vec<usize>;

/// One attribute of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    name: String,
    raw_value: String,
    value: String,
}

impl Attribute {
    /// Attribute name as written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unescaped value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, raw (escaped) form.
    Text(String),
    /// Contents of a `<![CDATA[...]]>` section.
    CData(String),
    /// Contents of a `<!--...-->` comment.
    Comment(String),
    /// Contents of a `<?...?>` processing instruction.
    ProcessingInstruction(String),
    /// Contents of a `<!DOCTYPE ...>` declaration.
    DocType(String),
}

impl Node {
    /// Returns the element if this node is one.
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }

    fn is_character_data(&self) -> bool {
        matches!(self, Self::Text(_) | Self::CData(_))
    }
}

/// An XML element with its attributes and ordered children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    raw_attributes: String,
    children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    /// Element name as written (prefix included, namespaces are not resolved).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Unescaped value of the attribute `name`, or `None` if absent.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Child nodes in document order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Visit every descendant element (not `self`) in document order.
    ///
    /// The callback receives each element's path relative to `self`.
    pub fn walk_descendants<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&NodePath, &'a Element),
    {
        let mut path = Vec::new();
        walk(self, &mut path, &mut visit);
    }

    fn from_start(start: &BytesStart<'_>, self_closing: bool) -> Result<Self, String> {
        let name = utf8(start.name().as_ref())?.to_string();
        let raw_attributes = utf8(start.attributes_raw())?.to_string();

        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
            attributes.push(Attribute {
                name: utf8(attr.key.as_ref())?.to_string(),
                raw_value: utf8(&attr.value)?.to_string(),
                value,
            });
        }

        Ok(Self {
            name,
            attributes,
            raw_attributes,
            children: Vec::new(),
            self_closing,
        })
    }
}

fn walk<'a, F>(element: &'a Element, path: &mut NodePath, visit: &mut F)
where
    F: FnMut(&NodePath, &'a Element),
{
    for (idx, child) in element.children.iter().enumerate() {
        if let Node::Element(el) = child {
            path.push(idx);
            visit(path, el);
            walk(el, path, visit);
            path.pop();
        }
    }
}

/// A parsed document body: misc nodes around a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    declaration: String,
    prolog: Vec<Node>,
    root: Element,
    epilog: Vec<Node>,
}

impl Document {
    /// Parse a document body (everything after the XML declaration).
    ///
    /// With `preserve_whitespace` unset, whitespace-only text nodes are
    /// dropped; the serializer re-indents the tree in that case anyway.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the body is not well-formed: mismatched or
    /// unclosed tags, malformed attributes, unknown entities, text outside
    /// the root element, more than one root, or no root at all.
    pub fn parse(body: &str, preserve_whitespace: bool) -> Result<Self, ParseError> {
        let mut reader = Reader::from_str(body);
        let mut builder = TreeBuilder::new(preserve_whitespace);

        loop {
            let event = reader
                .read_event()
                .map_err(|e| parse_error(&reader, e.to_string()))?;

            let step = match event {
                Event::Start(start) => Element::from_start(&start, false).map(|el| {
                    builder.open(el);
                }),
                Event::Empty(start) => Element::from_start(&start, true)
                    .and_then(|el| builder.place(Node::Element(el))),
                Event::End(_) => builder.close(),
                Event::Text(text) => text
                    .unescape()
                    .map_err(|e| e.to_string())
                    .and_then(|_| utf8(&text))
                    .and_then(|raw| builder.text(raw)),
                Event::CData(data) => {
                    utf8(&data).and_then(|raw| builder.place(Node::CData(raw.to_string())))
                }
                Event::Comment(comment) => utf8(&comment)
                    .and_then(|raw| builder.place(Node::Comment(raw.to_string()))),
                Event::PI(pi) => utf8(&pi)
                    .and_then(|raw| builder.place(Node::ProcessingInstruction(raw.to_string()))),
                Event::DocType(doctype) => utf8(&doctype)
                    .and_then(|raw| builder.place(Node::DocType(raw.to_string()))),
                Event::Decl(_) => Err("unexpected XML declaration".to_string()),
                Event::Eof => break,
            };
            step.map_err(|message| parse_error(&reader, message))?;
        }

        builder
            .finish()
            .map_err(|message| parse_error(&reader, message))
    }

    /// The XML declaration written in front of the body on output.
    #[must_use]
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// Replace the XML declaration (defaults to `<?xml version="1.0" encoding="utf-8"?>`).
    pub fn set_declaration(&mut self, declaration: impl Into<String>) {
        self.declaration = declaration.into();
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Remove the node at `path` from the tree and return it.
    ///
    /// Siblings keep their relative order. Returns `None` for an empty or
    /// dangling path.
    pub fn detach(&mut self, path: &[usize]) -> Option<Node> {
        let (&last, parents) = path.split_last()?;
        let mut parent = &mut self.root;
        for &idx in parents {
            parent = match parent.children.get_mut(idx)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        if last < parent.children.len() {
            Some(parent.children.remove(last))
        } else {
            None
        }
    }

    /// Serialize the document, declaration included.
    ///
    /// With `indent` set, the tree is re-indented with two spaces per level;
    /// elements holding character data are written inline. Otherwise every
    /// node is written back in its original form.
    #[must_use]
    pub fn to_xml(&self, indent: bool) -> String {
        let mut out = String::with_capacity(self.declaration.len() + 4096);
        out.push_str(&self.declaration);

        if indent {
            for node in &self.prolog {
                out.push('\n');
                write_indented(&mut out, node, 0);
            }
            out.push('\n');
            write_indented_element(&mut out, &self.root, 0);
            for node in &self.epilog {
                out.push('\n');
                write_indented(&mut out, node, 0);
            }
        } else {
            for node in &self.prolog {
                write_verbatim(&mut out, node);
            }
            write_verbatim_element(&mut out, &self.root);
            for node in &self.epilog {
                write_verbatim(&mut out, node);
            }
        }
        out
    }
}

const DEFAULT_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

struct TreeBuilder {
    preserve_whitespace: bool,
    stack: Vec<Element>,
    prolog: Vec<Node>,
    root: Option<Element>,
    epilog: Vec<Node>,
}

impl TreeBuilder {
    fn new(preserve_whitespace: bool) -> Self {
        Self {
            preserve_whitespace,
            stack: Vec::new(),
            prolog: Vec::new(),
            root: None,
            epilog: Vec::new(),
        }
    }

    fn open(&mut self, element: Element) {
        self.stack.push(element);
    }

    fn close(&mut self) -> Result<(), String> {
        let element = self
            .stack
            .pop()
            .ok_or_else(|| "unexpected closing tag".to_string())?;
        self.place(Node::Element(element))
    }

    fn text(&mut self, raw: &str) -> Result<(), String> {
        let blank = raw.trim().is_empty();
        if self.stack.is_empty() && !blank {
            return Err("text is not allowed outside the root element".to_string());
        }
        if blank && !self.preserve_whitespace {
            return Ok(());
        }
        self.place(Node::Text(raw.to_string()))
    }

    fn place(&mut self, node: Node) -> Result<(), String> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            Node::Element(el) => {
                if self.root.is_some() {
                    return Err(format!("multiple root elements: <{}>", el.name));
                }
                self.root = Some(el);
            }
            other if self.root.is_none() => self.prolog.push(other),
            other => self.epilog.push(other),
        }
        Ok(())
    }

    fn finish(self) -> Result<Document, String> {
        if let Some(open) = self.stack.last() {
            return Err(format!("unexpected end of document: <{}> is not closed", open.name));
        }
        let root = self.root.ok_or_else(|| "root element is missing".to_string())?;
        Ok(Document {
            declaration: DEFAULT_DECLARATION.to_string(),
            prolog: self.prolog,
            root,
            epilog: self.epilog,
        })
    }
}

fn parse_error(reader: &Reader<&[u8]>, message: String) -> ParseError {
    ParseError {
        message,
        position: reader.buffer_position() as u64,
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    str::from_utf8(bytes).map_err(|e| e.to_string())
}

fn write_verbatim(out: &mut String, node: &Node) {
    match node {
        Node::Element(el) => write_verbatim_element(out, el),
        other => write_leaf(out, other),
    }
}

fn write_verbatim_element(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(&el.name);
    out.push_str(&el.raw_attributes);
    if el.self_closing && el.children.is_empty() {
        out.push_str("/>");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_verbatim(out, child);
    }
    let _ = write!(out, "</{}>", el.name);
}

fn write_indented(out: &mut String, node: &Node, depth: usize) {
    match node {
        Node::Element(el) => write_indented_element(out, el, depth),
        other => write_leaf(out, other),
    }
}

fn write_indented_element(out: &mut String, el: &Element, depth: usize) {
    out.push('<');
    out.push_str(&el.name);
    write_normalized_attributes(out, el);
    if el.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');

    if el.children.iter().any(Node::is_character_data) {
        // mixed content: indentation would change the text
        for child in &el.children {
            write_inline(out, child);
        }
    } else {
        for child in &el.children {
            out.push('\n');
            push_indent(out, depth + 1);
            write_indented(out, child, depth + 1);
        }
        out.push('\n');
        push_indent(out, depth);
    }
    let _ = write!(out, "</{}>", el.name);
}

fn write_inline(out: &mut String, node: &Node) {
    let Node::Element(el) = node else {
        write_leaf(out, node);
        return;
    };
    out.push('<');
    out.push_str(&el.name);
    write_normalized_attributes(out, el);
    if el.children.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &el.children {
        write_inline(out, child);
    }
    let _ = write!(out, "</{}>", el.name);
}

fn write_normalized_attributes(out: &mut String, el: &Element) {
    for attr in &el.attributes {
        let _ = write!(
            out,
            " {}=\"{}\"",
            attr.name,
            attr.raw_value.replace('"', "&quot;")
        );
    }
}

fn write_leaf(out: &mut String, node: &Node) {
    let _ = match node {
        Node::Text(raw) => write!(out, "{raw}"),
        Node::CData(raw) => write!(out, "<![CDATA[{raw}]]>"),
        Node::Comment(raw) => write!(out, "<!--{raw}-->"),
        Node::ProcessingInstruction(raw) => write!(out, "<?{raw}?>"),
        Node::DocType(raw) => write!(out, "<!DOCTYPE {}>", raw.trim_start()),
        Node::Element(el) => {
            write_verbatim_element(out, el);
            Ok(())
        }
    };
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}
