//! glcd XML - skin file tokenizer
//!
//! A small streaming XML parser driven by a character-class state machine.
//! It knows nothing about skins: it turns bytes into start-tag, end-tag and
//! character-data callbacks on an [`XmlHandler`].
//!
//! Supported subset:
//! - elements with quoted attributes, self-closing tags
//! - `<!-- comments -->` and `<?declarations?>` (skipped)
//! - `&lt; &gt; &amp; &quot; &apos;` and numeric character references in text
//! - `\"` / `\'` escapes inside attribute values
//!
//! There is no DTD or external entity support.

mod entities;
mod tokenizer;

use std::path::PathBuf;

pub use entities::decode_entities;
pub use tokenizer::Parser;

/// Parse a byte buffer with the default (identity) charset
pub fn parse<H: XmlHandler>(input: &[u8], handler: &mut H) -> Result<(), ParseError<H::Error>> {
    Parser::new().parse(input, handler)
}

/// Parse a string with the default (identity) charset
pub fn parse_str<H: XmlHandler>(input: &str, handler: &mut H) -> Result<(), ParseError<H::Error>> {
    Parser::new().parse(input.as_bytes(), handler)
}

/// Read and parse a file with the default (identity) charset
pub fn parse_file<H: XmlHandler>(
    path: impl Into<PathBuf>,
    handler: &mut H,
) -> Result<(), ParseError<H::Error>> {
    Parser::new().parse_file(path, handler)
}

/// Receiver of parse events
///
/// Returning an error from any callback aborts the parse; the error is
/// reported back with the line it happened on.
pub trait XmlHandler {
    type Error;

    /// An opening (or self-closing) tag with its attributes
    fn start_element(&mut self, tag: &str, attributes: &Attributes, line: u32) -> Result<(), Self::Error>;

    /// A closing tag; also sent right after `start_element` for `<tag/>`
    fn end_element(&mut self, tag: &str, line: u32) -> Result<(), Self::Error>;

    /// Entity-decoded character data
    fn text(&mut self, _text: &str, _line: u32) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Re-encodes decoded text for the host before it reaches the handler.
///
/// Displays with a limited glyph set install one of these to transliterate
/// or map characters. The default parser passes text through unchanged.
pub trait Charset {
    fn convert(&self, text: &str) -> String;
}

/// Attribute list of one element, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing an earlier value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Parse failure
#[derive(Debug, thiserror::Error)]
pub enum ParseError<E> {
    #[error("line {line}: {kind}")]
    Syntax { line: u32, kind: SyntaxError },

    #[error("line {line}: {source}")]
    Handler {
        line: u32,
        #[source]
        source: E,
    },

    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl<E> ParseError<E> {
    /// Line the error was detected on, if it came from the document
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Syntax { line, .. } | Self::Handler { line, .. } => Some(*line),
            Self::Io { .. } => None,
        }
    }
}

/// Structural problems in the document itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("unexpected character '{found}' {context}")]
    UnexpectedChar { found: char, context: &'static str },

    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedTag { expected: String, found: String },

    #[error("closing tag </{0}> without an open element")]
    UnmatchedClose(String),

    #[error("element <{0}> is never closed")]
    Unclosed(String),

    #[error("unexpected end of input")]
    UnexpectedEof,
}
