//! XML declaration scanning.
//!
//! # Overview
//!
//! Every input must begin with an `<?xml ... ?>` declaration. Rather than
//! materializing the whole input before validating it, the scanner reads a
//! bounded lookahead block, checks the declaration, and remembers where the
//! document body starts. The body is later assembled from the unread tail
//! of the lookahead block plus the rest of the stream.
//!
//! # Example
//!
//! ```
//! use itemdedup::document::header::{scan_header, read_body};
//!
//! let mut input: &[u8] = b"<?xml version=\"1.0\"?><Root><Item id=\"a\"/></Root>";
//! let header = scan_header(&mut input).unwrap();
//! assert_eq!(header.body_start(), 21);
//!
//! let body = read_body(header, &mut input, None).unwrap();
//! assert_eq!(body, "<Root><Item id=\"a\"/></Root>");
//! ```

use std::io::{self, Read};

use thiserror::Error;

/// Size of the lookahead block read before the body is parsed.
pub const LOOKAHEAD: usize = 512;

const XML_HEAD: &[u8] = b"<?xml";
const XML_HEAD_END: &[u8] = b"?>";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Error type for header scanning and body assembly.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// The input does not look like an XML document.
    #[error("{0}")]
    Format(&'static str),

    /// The input could not be read.
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl HeaderError {
    /// Returns `true` for format errors (as opposed to read failures).
    #[must_use]
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }
}

/// The result of a successful header scan.
#[derive(Debug, Clone)]
pub struct Header {
    lookahead: Vec<u8>,
    body_start: usize,
}

impl Header {
    /// Offset into the lookahead block immediately after the closing `?>`.
    #[must_use]
    pub fn body_start(&self) -> usize {
        self.body_start
    }

    /// The declaration text itself, e.g. `<?xml version="1.0"?>`.
    #[must_use]
    pub fn declaration(&self) -> &[u8] {
        let from = if self.lookahead.starts_with(UTF8_BOM) {
            UTF8_BOM.len()
        } else {
            0
        };
        &self.lookahead[from..self.body_start]
    }

    /// Bytes of the lookahead block that belong to the body.
    #[must_use]
    pub fn body_prefix(&self) -> &[u8] {
        &self.lookahead[self.body_start..]
    }
}

/// Read the lookahead block and locate the end of the XML declaration.
///
/// Advances `reader` by up to [`LOOKAHEAD`] bytes.
///
/// # Errors
///
/// - `Format("content is empty")` if the reader yields no bytes
/// - `Format("invalid xml format")` if the block does not start with `<?xml`
///   or has no `?>` inside the lookahead window
/// - `Format("unsupported encoding: utf-16")` for UTF-16 byte order marks
/// - `Io` if reading fails
pub fn scan_header<R: Read + ?Sized>(reader: &mut R) -> Result<Header, HeaderError> {
    let lookahead = read_block(reader, LOOKAHEAD)?;
    if lookahead.is_empty() {
        return Err(HeaderError::Format("content is empty"));
    }
    if lookahead.starts_with(&[0xFF, 0xFE]) || lookahead.starts_with(&[0xFE, 0xFF]) {
        return Err(HeaderError::Format("unsupported encoding: utf-16"));
    }

    let start = if lookahead.starts_with(UTF8_BOM) {
        UTF8_BOM.len()
    } else {
        0
    };
    let span = &lookahead[start..];
    if !span.starts_with(XML_HEAD) {
        return Err(HeaderError::Format("invalid xml format"));
    }

    let found = span[XML_HEAD.len()..]
        .windows(XML_HEAD_END.len())
        .position(|w| w == XML_HEAD_END)
        .ok_or(HeaderError::Format("invalid xml format"))?;
    let body_start = start + XML_HEAD.len() + found + XML_HEAD_END.len();

    log::trace!("XML declaration ends at byte {}", body_start);

    Ok(Header {
        lookahead,
        body_start,
    })
}

/// Assemble the document body: the lookahead tail followed by the rest of `reader`.
///
/// `size_hint` is the total input length when known, used to size the buffer.
///
/// # Errors
///
/// Returns `Io` if reading fails, or `Format` if the body is not valid UTF-8.
pub fn read_body<R: Read + ?Sized>(
    header: Header,
    reader: &mut R,
    size_hint: Option<u64>,
) -> Result<String, HeaderError> {
    let capacity = size_hint
        .and_then(|len| len.checked_sub(header.body_start as u64))
        .and_then(|remain| usize::try_from(remain).ok())
        .unwrap_or(0);

    let mut body = Vec::with_capacity(capacity);
    body.extend_from_slice(header.body_prefix());
    reader.read_to_end(&mut body)?;

    String::from_utf8(body).map_err(|_| HeaderError::Format("content is not valid utf-8"))
}

/// Fill up to `limit` bytes, stopping early only at end of stream.
fn read_block<R: Read + ?Sized>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>> {
    let mut block = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        match reader.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    block.truncate(filled);
    Ok(block)
}
