//! Tokenizer state machine
//!
//! Consumes one logical character at a time and drives an [`XmlHandler`].
//! Element nesting is tracked on a stack so mismatched or unclosed tags are
//! reported with the line they were found on.

use std::path::PathBuf;

use crate::entities::decode_entities;
use crate::{Attributes, Charset, ParseError, SyntaxError, XmlHandler};

/// Tokenizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    /// Character data between tags
    #[default]
    LookForStart,
    /// Just saw `<`
    LookForTag,
    InTagName,
    /// Saw `<!`, expecting the first `-`
    CommentOpen,
    /// Saw `<!-`, expecting the second `-`
    CommentOpenDash,
    InComment,
    CommentDash,
    CommentDashDash,
    /// Inside `<? ... ?>`
    InDeclaration,
    DeclarationQuestion,
    LookForAttrName,
    InAttrName,
    LookForAttrValue,
    InAttrValue,
    /// Saw `/` inside an opening tag
    SawSlash,
    /// Saw `</`
    LookForCloseTag,
    InCloseTag,
    AfterCloseTagName,
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Decode one logical character starting at `pos`.
///
/// A UTF-8 lead byte and its continuation bytes form one unit. Bytes that do
/// not form a valid sequence are taken one at a time as Latin-1.
fn decode_char(input: &[u8], pos: usize) -> (char, usize) {
    let lead = input[pos];
    let len = match lead {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 1,
    };
    if len > 1 && pos + len <= input.len() {
        if let Some(c) = std::str::from_utf8(&input[pos..pos + len])
            .ok()
            .and_then(|s| s.chars().next())
        {
            return (c, len);
        }
    }
    (char::from(lead), 1)
}

/// XML parser front end
#[derive(Default)]
pub struct Parser<'c> {
    charset: Option<&'c dyn Charset>,
}

impl<'c> Parser<'c> {
    /// Create a parser that passes text through unchanged
    pub fn new() -> Self {
        Self { charset: None }
    }

    /// Create a parser that converts text and attribute values with `charset`
    pub fn with_charset(charset: &'c dyn Charset) -> Self {
        Self { charset: Some(charset) }
    }

    /// Parse a complete document held in memory
    pub fn parse<H: XmlHandler>(&self, input: &[u8], handler: &mut H) -> Result<(), ParseError<H::Error>> {
        let mut machine = Machine::new(handler, self.charset);
        let mut pos = 0;
        while pos < input.len() {
            let (c, len) = decode_char(input, pos);
            machine.feed(c)?;
            pos += len;
        }
        machine.finish()
    }

    /// Read and parse a document from disk
    pub fn parse_file<H: XmlHandler>(
        &self,
        path: impl Into<PathBuf>,
        handler: &mut H,
    ) -> Result<(), ParseError<H::Error>> {
        let path = path.into();
        tracing::debug!("Parsing XML file {}", path.display());
        let data = std::fs::read(&path).map_err(|source| ParseError::Io { path, source })?;
        self.parse(&data, handler)
    }
}

struct Machine<'h, 'c, H: XmlHandler> {
    handler: &'h mut H,
    charset: Option<&'c dyn Charset>,
    state: State,
    line: u32,
    /// Pending character data
    text: String,
    tag_name: String,
    attr_name: String,
    attr_value: String,
    attributes: Attributes,
    /// Quote character delimiting the current attribute value
    quote: char,
    /// `=` already seen for the current attribute
    seen_equals: bool,
    /// Backslash pending inside an attribute value
    escape: bool,
    /// Open elements
    open: Vec<String>,
}

impl<'h, 'c, H: XmlHandler> Machine<'h, 'c, H> {
    fn new(handler: &'h mut H, charset: Option<&'c dyn Charset>) -> Self {
        Self {
            handler,
            charset,
            state: State::LookForStart,
            line: 1,
            text: String::new(),
            tag_name: String::new(),
            attr_name: String::new(),
            attr_value: String::new(),
            attributes: Attributes::new(),
            quote: '"',
            seen_equals: false,
            escape: false,
            open: Vec::new(),
        }
    }

    fn syntax(&self, kind: SyntaxError) -> ParseError<H::Error> {
        ParseError::Syntax { line: self.line, kind }
    }

    fn unexpected(&self, found: char, context: &'static str) -> ParseError<H::Error> {
        self.syntax(SyntaxError::UnexpectedChar { found, context })
    }

    fn convert(&self, text: &str) -> String {
        match self.charset {
            Some(charset) => charset.convert(text),
            None => text.to_string(),
        }
    }

    fn feed(&mut self, c: char) -> Result<(), ParseError<H::Error>> {
        match self.state {
            State::LookForStart => {
                if c == '<' {
                    self.flush_text()?;
                    self.state = State::LookForTag;
                } else {
                    self.text.push(c);
                }
            }

            State::LookForTag => {
                if c == '/' {
                    self.state = State::LookForCloseTag;
                } else if c == '!' {
                    self.state = State::CommentOpen;
                } else if c == '?' {
                    self.state = State::InDeclaration;
                } else if is_name_start(c) {
                    self.tag_name.clear();
                    self.tag_name.push(c);
                    self.attributes.clear();
                    self.state = State::InTagName;
                } else {
                    return Err(self.unexpected(c, "after '<'"));
                }
            }

            State::InTagName => {
                if is_name_char(c) {
                    self.tag_name.push(c);
                } else if is_space(c) {
                    self.state = State::LookForAttrName;
                } else if c == '/' {
                    self.state = State::SawSlash;
                } else if c == '>' {
                    self.open_element(false)?;
                } else {
                    return Err(self.unexpected(c, "in tag name"));
                }
            }

            State::CommentOpen => {
                if c == '-' {
                    self.state = State::CommentOpenDash;
                } else {
                    return Err(self.unexpected(c, "after '<!'"));
                }
            }

            State::CommentOpenDash => {
                if c == '-' {
                    self.state = State::InComment;
                } else {
                    return Err(self.unexpected(c, "after '<!-'"));
                }
            }

            State::InComment => {
                if c == '-' {
                    self.state = State::CommentDash;
                }
            }

            State::CommentDash => {
                self.state = if c == '-' { State::CommentDashDash } else { State::InComment };
            }

            State::CommentDashDash => {
                if c == '>' {
                    self.state = State::LookForStart;
                } else if c != '-' {
                    self.state = State::InComment;
                }
            }

            State::InDeclaration => {
                if c == '?' {
                    self.state = State::DeclarationQuestion;
                }
            }

            State::DeclarationQuestion => {
                if c == '>' {
                    self.state = State::LookForStart;
                } else if c != '?' {
                    self.state = State::InDeclaration;
                }
            }

            State::LookForAttrName => {
                if is_space(c) {
                    // skip
                } else if c == '/' {
                    self.state = State::SawSlash;
                } else if c == '>' {
                    self.open_element(false)?;
                } else if is_name_start(c) {
                    self.attr_name.clear();
                    self.attr_name.push(c);
                    self.state = State::InAttrName;
                } else {
                    return Err(self.unexpected(c, "where an attribute name was expected"));
                }
            }

            State::InAttrName => {
                if is_name_char(c) {
                    self.attr_name.push(c);
                } else if c == '=' {
                    self.seen_equals = true;
                    self.state = State::LookForAttrValue;
                } else if is_space(c) {
                    self.seen_equals = false;
                    self.state = State::LookForAttrValue;
                } else {
                    return Err(self.unexpected(c, "in attribute name"));
                }
            }

            State::LookForAttrValue => {
                if is_space(c) {
                    // skip
                } else if c == '=' && !self.seen_equals {
                    self.seen_equals = true;
                } else if (c == '"' || c == '\'') && self.seen_equals {
                    self.quote = c;
                    self.attr_value.clear();
                    self.escape = false;
                    self.state = State::InAttrValue;
                } else {
                    return Err(self.unexpected(c, "where an attribute value was expected"));
                }
            }

            State::InAttrValue => {
                if self.escape {
                    if c != self.quote {
                        self.attr_value.push('\\');
                    }
                    self.attr_value.push(c);
                    self.escape = false;
                } else if c == '\\' {
                    self.escape = true;
                } else if c == self.quote {
                    let value = self.convert(&self.attr_value);
                    self.attributes.insert(std::mem::take(&mut self.attr_name), value);
                    self.attr_value.clear();
                    self.state = State::LookForAttrName;
                } else {
                    self.attr_value.push(c);
                }
            }

            State::SawSlash => {
                if c == '>' {
                    self.open_element(true)?;
                } else {
                    return Err(self.unexpected(c, "after '/' in tag"));
                }
            }

            State::LookForCloseTag => {
                if is_name_start(c) {
                    self.tag_name.clear();
                    self.tag_name.push(c);
                    self.state = State::InCloseTag;
                } else {
                    return Err(self.unexpected(c, "after '</'"));
                }
            }

            State::InCloseTag => {
                if is_name_char(c) {
                    self.tag_name.push(c);
                } else if is_space(c) {
                    self.state = State::AfterCloseTagName;
                } else if c == '>' {
                    self.close_element()?;
                } else {
                    return Err(self.unexpected(c, "in closing tag"));
                }
            }

            State::AfterCloseTagName => {
                if c == '>' {
                    self.close_element()?;
                } else if !is_space(c) {
                    return Err(self.unexpected(c, "in closing tag"));
                }
            }
        }

        if c == '\n' {
            self.line += 1;
        }
        Ok(())
    }

    fn flush_text(&mut self) -> Result<(), ParseError<H::Error>> {
        if self.text.is_empty() {
            return Ok(());
        }
        let raw = std::mem::take(&mut self.text);
        let decoded = self.convert(&decode_entities(&raw));
        let line = self.line;
        self.handler
            .text(&decoded, line)
            .map_err(|source| ParseError::Handler { line, source })
    }

    fn open_element(&mut self, self_closing: bool) -> Result<(), ParseError<H::Error>> {
        let line = self.line;
        self.handler
            .start_element(&self.tag_name, &self.attributes, line)
            .map_err(|source| ParseError::Handler { line, source })?;
        if self_closing {
            self.handler
                .end_element(&self.tag_name, line)
                .map_err(|source| ParseError::Handler { line, source })?;
        } else {
            self.open.push(self.tag_name.clone());
        }
        self.attributes.clear();
        self.state = State::LookForStart;
        Ok(())
    }

    fn close_element(&mut self) -> Result<(), ParseError<H::Error>> {
        let line = self.line;
        match self.open.pop() {
            None => return Err(self.syntax(SyntaxError::UnmatchedClose(self.tag_name.clone()))),
            Some(expected) if expected != self.tag_name => {
                return Err(self.syntax(SyntaxError::MismatchedTag {
                    expected,
                    found: self.tag_name.clone(),
                }));
            }
            Some(_) => {}
        }
        self.handler
            .end_element(&self.tag_name, line)
            .map_err(|source| ParseError::Handler { line, source })?;
        self.state = State::LookForStart;
        Ok(())
    }

    fn finish(mut self) -> Result<(), ParseError<H::Error>> {
        if self.state != State::LookForStart {
            return Err(self.syntax(SyntaxError::UnexpectedEof));
        }
        if let Some(tag) = self.open.last() {
            return Err(self.syntax(SyntaxError::Unclosed(tag.clone())));
        }
        self.flush_text()
    }
}
