//! Document loading module.
//!
//! This module provides functionality for:
//! - Validating the XML declaration within a bounded lookahead block
//! - Assembling the document body from the rest of the stream
//! - Building an owned, mutable XML tree from the body
//!
//! # Example
//!
//! ```
//! use itemdedup::document::{load, LoadOptions};
//!
//! let mut input: &[u8] = b"<?xml version=\"1.0\"?>\n<Root><Item id=\"a\"/></Root>";
//! let doc = load(&mut input, &LoadOptions::default()).unwrap();
//! assert_eq!(doc.root().name(), "Root");
//! assert_eq!(doc.declaration(), "<?xml version=\"1.0\"?>");
//! ```

pub mod header;
pub mod tree;

use std::io::Read;

use thiserror::Error;

pub use header::{read_body, scan_header, Header, HeaderError, LOOKAHEAD};
pub use tree::{Attribute, Document, Element, Node, NodePath, ParseError};

/// Options controlling how a document is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Keep whitespace-only text so the document can be written back unformatted.
    pub preserve_whitespace: bool,
    /// Total input length when known, used to size the body buffer.
    pub size_hint: Option<u64>,
}

impl LoadOptions {
    /// Set whitespace preservation.
    #[must_use]
    pub fn with_preserve_whitespace(mut self, preserve: bool) -> Self {
        self.preserve_whitespace = preserve;
        self
    }

    /// Set the input size hint.
    #[must_use]
    pub fn with_size_hint(mut self, size: Option<u64>) -> Self {
        self.size_hint = size;
        self
    }
}

/// Error type for document loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Missing or broken XML declaration, empty input, bad encoding, read failure.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// The body is not well-formed XML.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Scan the declaration, read the body and parse it into a [`Document`].
///
/// The original declaration is kept on the document so it is written back
/// unchanged.
///
/// # Errors
///
/// Returns `LoadError::Header` for empty input, a missing or unterminated
/// declaration, non-UTF-8 content or read failures, and `LoadError::Parse`
/// if the body is not well-formed.
pub fn load<R: Read + ?Sized>(
    reader: &mut R,
    options: &LoadOptions,
) -> Result<Document, LoadError> {
    let header = scan_header(reader)?;
    let declaration = String::from_utf8_lossy(header.declaration()).into_owned();
    let body = read_body(header, reader, options.size_hint)?;

    let mut doc = Document::parse(&body, options.preserve_whitespace)?;
    doc.set_declaration(declaration);
    Ok(doc)
}
