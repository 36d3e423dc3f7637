//! Integration tests for glcd-xml
//!
//! Well-formedness checks, line reporting and handler plumbing.

use glcd_xml::{parse_file, parse_str, Attributes, Charset, ParseError, Parser, SyntaxError, XmlHandler};
use std::io::Write;

#[derive(Default)]
struct Collect {
    starts: Vec<(String, u32)>,
    ends: Vec<String>,
    text: String,
}

impl XmlHandler for Collect {
    type Error = String;

    fn start_element(&mut self, tag: &str, attributes: &Attributes, line: u32) -> Result<(), String> {
        if attributes.get("fail").is_some() {
            return Err(format!("refused <{}>", tag));
        }
        self.starts.push((tag.to_string(), line));
        Ok(())
    }

    fn end_element(&mut self, tag: &str, _line: u32) -> Result<(), String> {
        self.ends.push(tag.to_string());
        Ok(())
    }

    fn text(&mut self, text: &str, _line: u32) -> Result<(), String> {
        self.text.push_str(text);
        Ok(())
    }
}

// ============================================================================
// WELL-FORMEDNESS
// ============================================================================

#[test]
fn test_mismatched_close_tag_reports_line() {
    let xml = "<a>\n  <b>\n</a>";
    let mut handler = Collect::default();
    let err = parse_str(xml, &mut handler).unwrap_err();
    match err {
        ParseError::Syntax { line, kind: SyntaxError::MismatchedTag { expected, found } } => {
            assert_eq!(line, 3);
            assert_eq!(expected, "b");
            assert_eq!(found, "a");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unclosed_element_rejected() {
    let mut handler = Collect::default();
    let err = parse_str("<skin><display>", &mut handler).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { kind: SyntaxError::Unclosed(ref tag), .. } if tag == "display"));
}

#[test]
fn test_stray_close_tag_rejected() {
    let mut handler = Collect::default();
    let err = parse_str("<a></a></b>", &mut handler).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { kind: SyntaxError::UnmatchedClose(_), .. }));
}

#[test]
fn test_invalid_tag_character_is_error() {
    let mut handler = Collect::default();
    let err = parse_str("<a-b></a-b>", &mut handler).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { kind: SyntaxError::UnexpectedChar { found: '-', .. }, line: 1 }));
}

#[test]
fn test_truncated_tag_is_eof_error() {
    let mut handler = Collect::default();
    let err = parse_str("<a x=\"1", &mut handler).unwrap_err();
    assert!(matches!(err, ParseError::Syntax { kind: SyntaxError::UnexpectedEof, .. }));
}

// ============================================================================
// CONTENT
// ============================================================================

#[test]
fn test_declaration_and_comments_skipped() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- header -->
<skin version="1.0"><display id="main"/></skin>"#;
    let mut handler = Collect::default();
    parse_str(xml, &mut handler).unwrap();
    let tags: Vec<&str> = handler.starts.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(tags, vec!["skin", "display"]);
    assert_eq!(handler.starts[0].1, 3);
    assert_eq!(handler.ends, vec!["display", "skin"]);
}

#[test]
fn test_text_entities_decoded() {
    let mut handler = Collect::default();
    parse_str("<t>a &lt; b &amp;&amp; c&#33;</t>", &mut handler).unwrap();
    assert_eq!(handler.text, "a < b && c!");
}

#[test]
fn test_utf8_text_passes_through() {
    let mut handler = Collect::default();
    parse_str("<t>Grüße €</t>", &mut handler).unwrap();
    assert_eq!(handler.text, "Grüße €");
}

#[test]
fn test_handler_error_carries_line() {
    let mut handler = Collect::default();
    let err = parse_str("<a>\n<b fail=\"1\"/></a>", &mut handler).unwrap_err();
    match err {
        ParseError::Handler { line, source } => {
            assert_eq!(line, 2);
            assert_eq!(source, "refused <b>");
        }
        other => panic!("unexpected error: {other}"),
    }
}

struct Upper;

impl Charset for Upper {
    fn convert(&self, text: &str) -> String {
        text.to_uppercase()
    }
}

#[test]
fn test_charset_applied_to_text() {
    let mut handler = Collect::default();
    Parser::with_charset(&Upper).parse(b"<t>abc</t>", &mut handler).unwrap();
    assert_eq!(handler.text, "ABC");
}

#[test]
fn test_parse_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"<root><child/></root>").unwrap();
    let mut handler = Collect::default();
    parse_file(file.path(), &mut handler).unwrap();
    assert_eq!(handler.starts.len(), 2);
}

#[test]
fn test_parse_missing_file_is_io_error() {
    let mut handler = Collect::default();
    let err = parse_file("/nonexistent/skin.xml", &mut handler).unwrap_err();
    assert!(matches!(err, ParseError::Io { .. }));
    assert_eq!(err.line(), None);
}
