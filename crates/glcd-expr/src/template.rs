//! Template strings
//!
//! Literal text interleaved with `{name}` / `{name:attrib}` tokens. Token
//! names are checked against the host when the template is parsed; values
//! are fetched again on every evaluation.

use crate::{EvalContext, ExprError, ParseContext, Result, Value};

/// Optional `:attrib` suffix of a token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TokenAttrib {
    #[default]
    None,
    Clean,
    Rest,
    Number(i64),
    Text(String),
}

impl TokenAttrib {
    fn parse(text: &str) -> Self {
        match text {
            "clean" => Self::Clean,
            "rest" => Self::Rest,
            _ => match text.parse() {
                Ok(n) => Self::Number(n),
                Err(_) => Self::Text(text.to_string()),
            },
        }
    }
}

/// A host token reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    /// Id returned by the host's reverse lookup at parse time
    pub id: u32,
    pub attrib: TokenAttrib,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
    /// `{#id}`: resolved through the variable table on every evaluation
    Variable(String),
}

/// Parsed template string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TemplateString {
    segments: Vec<Segment>,
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TemplateString {
    /// Parse `text`.
    ///
    /// A text that is exactly `#id` names a variable: its current value is
    /// fetched once and parsed in place of the reference.
    pub fn parse<C: ParseContext + ?Sized>(text: &str, ctx: &C) -> Result<Self> {
        if let Some(id) = text.strip_prefix('#').filter(|id| is_identifier(id)) {
            let resolved = ctx
                .variable_text(id)
                .ok_or_else(|| ExprError::UnknownVariable(id.to_string()))?;
            return Self::parse_tokens(&resolved, ctx);
        }
        Self::parse_tokens(text, ctx)
    }

    /// A template holding only literal text
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self { segments: vec![Segment::Literal(text)] }
    }

    fn parse_tokens<C: ParseContext + ?Sized>(text: &str, ctx: &C) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after
                .find(['{', '}'])
                .filter(|&i| after.as_bytes()[i] == b'}')
                .ok_or_else(|| ExprError::UnterminatedToken(text.to_string()))?;
            let body = &after[..close];
            if body.is_empty() {
                return Err(ExprError::EmptyToken(text.to_string()));
            }
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Self::parse_token(body, ctx)?);
            rest = &after[close + 1..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    fn parse_token<C: ParseContext + ?Sized>(body: &str, ctx: &C) -> Result<Segment> {
        let (name, attrib) = match body.split_once(':') {
            Some((name, attrib)) => (name, TokenAttrib::parse(attrib)),
            None => (body, TokenAttrib::None),
        };
        if let Some(id) = name.strip_prefix('#') {
            return Ok(Segment::Variable(id.to_string()));
        }
        let id = ctx
            .token_id(name)
            .ok_or_else(|| ExprError::UnknownToken(name.to_string()))?;
        Ok(Segment::Token(Token {
            name: name.to_string(),
            id,
            attrib,
        }))
    }

    /// Evaluate against the current host data.
    ///
    /// A template made of exactly one token keeps the token's own type.
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> Value {
        match self.segments.as_slice() {
            [] => Value::String(String::new()),
            [single] => Self::segment_value(single, ctx),
            segments => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Literal(text) => out.push_str(text),
                        other => out.push_str(&Self::segment_value(other, ctx).to_string()),
                    }
                }
                Value::String(out)
            }
        }
    }

    fn segment_value(segment: &Segment, ctx: &dyn EvalContext) -> Value {
        match segment {
            Segment::Literal(text) => Value::String(text.clone()),
            Segment::Token(token) => ctx.token(token),
            Segment::Variable(id) => ctx.variable(id).unwrap_or(Value::Boolean(false)),
        }
    }

    /// The literal text when the template holds no tokens
    pub fn as_literal(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [] => Some(""),
            [Segment::Literal(text)] => Some(text),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Host tokens referenced by this template
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Token(token) => Some(token),
            _ => None,
        })
    }
}
