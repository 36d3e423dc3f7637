//! Function expressions
//!
//! Grammar:
//!
//! ```text
//! Expr := String | Number | '#' Ident | Ident '(' Expr (',' Expr)* ')'
//! String := '\'' template '\'' | '{' template-run
//! ```
//!
//! Parsing is a single left-to-right pass; an identifier followed by `(`
//! must name one of the built-in operators and is checked for arity on the
//! spot. Nothing is resolved at parse time except host token names.

use crate::template::is_identifier;
use crate::{
    Arity, EvalContext, EvalError, ExprError, Extent, FontMetric, ParseContext, Result, TemplateString, Value,
};

/// Built-in operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Not,
    And,
    Or,
    Equal,
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
    File,
    Trans,
    Add,
    Sub,
    Mul,
    Div,
    FontTotalWidth,
    FontTotalHeight,
    FontTotalAscent,
    FontSpaceBetween,
    FontLineHeight,
    FontTextWidth,
    FontTextHeight,
    ImageWidth,
    ImageHeight,
    QueryFeature,
}

const OPERATORS: &[(&str, Operator)] = &[
    ("not", Operator::Not),
    ("and", Operator::And),
    ("or", Operator::Or),
    ("equal", Operator::Equal),
    ("eq", Operator::Eq),
    ("gt", Operator::Gt),
    ("lt", Operator::Lt),
    ("ge", Operator::Ge),
    ("le", Operator::Le),
    ("ne", Operator::Ne),
    ("file", Operator::File),
    ("trans", Operator::Trans),
    ("add", Operator::Add),
    ("sub", Operator::Sub),
    ("mul", Operator::Mul),
    ("div", Operator::Div),
    ("FontTotalWidth", Operator::FontTotalWidth),
    ("FontTotalHeight", Operator::FontTotalHeight),
    ("FontTotalAscent", Operator::FontTotalAscent),
    ("FontSpaceBetween", Operator::FontSpaceBetween),
    ("FontLineHeight", Operator::FontLineHeight),
    ("FontTextWidth", Operator::FontTextWidth),
    ("FontTextHeight", Operator::FontTextHeight),
    ("ImageWidth", Operator::ImageWidth),
    ("ImageHeight", Operator::ImageHeight),
    ("QueryFeature", Operator::QueryFeature),
];

impl Operator {
    /// Look up an operator by its exact (case-sensitive) name
    pub fn from_name(name: &str) -> Option<Self> {
        OPERATORS.iter().find(|(n, _)| *n == name).map(|(_, op)| *op)
    }

    pub fn name(self) -> &'static str {
        OPERATORS
            .iter()
            .find(|(_, op)| *op == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    pub fn arity(self) -> Arity {
        match self {
            Self::Not | Self::File | Self::Trans => Arity::Exact(1),
            Self::Equal
            | Self::Eq
            | Self::Ne
            | Self::Gt
            | Self::Lt
            | Self::Ge
            | Self::Le
            | Self::Div
            | Self::FontTextWidth
            | Self::FontTextHeight => Arity::Exact(2),
            Self::And | Self::Or | Self::Add | Self::Sub | Self::Mul => Arity::AtLeast(1),
            Self::FontTotalWidth
            | Self::FontTotalHeight
            | Self::FontTotalAscent
            | Self::FontSpaceBetween
            | Self::FontLineHeight => Arity::Exact(1),
            Self::ImageWidth | Self::ImageHeight | Self::QueryFeature => Arity::Exact(1),
        }
    }

    fn font_metric(self) -> Option<FontMetric> {
        match self {
            Self::FontTotalWidth => Some(FontMetric::TotalWidth),
            Self::FontTotalHeight => Some(FontMetric::TotalHeight),
            Self::FontTotalAscent => Some(FontMetric::TotalAscent),
            Self::FontSpaceBetween => Some(FontMetric::SpaceBetween),
            Self::FontLineHeight => Some(FontMetric::LineHeight),
            _ => None,
        }
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    String(TemplateString),
    Number(i64),
    /// `#id`, looked up on every evaluation
    Variable(String),
    Call { op: Operator, args: Vec<Function> },
}

impl Function {
    /// Parse a complete expression
    pub fn parse<C: ParseContext + ?Sized>(text: &str, ctx: &C) -> Result<Self> {
        let mut parser = FunctionParser { text, pos: 0, ctx };
        parser.skip_space();
        if parser.at_end() {
            return Err(ExprError::Empty);
        }
        let function = parser.parse_expr(0)?;
        parser.skip_space();
        match parser.peek() {
            None => Ok(function),
            Some(found) => Err(parser.unexpected(found)),
        }
    }

    /// Constant number expression
    pub fn number(value: i64) -> Self {
        Self::Number(value)
    }

    /// Evaluate against the current skin state
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> std::result::Result<Value, EvalError> {
        match self {
            Self::String(template) => Ok(template.evaluate(ctx)),
            Self::Number(n) => Ok(Value::Number(*n)),
            Self::Variable(id) => Ok(ctx.variable(id).unwrap_or(Value::Boolean(false))),
            Self::Call { op, args } => evaluate_call(*op, args, ctx),
        }
    }

    /// Evaluate, logging a failure and substituting `default`
    pub fn evaluate_or(&self, default: Value, ctx: &dyn EvalContext) -> Value {
        self.evaluate(ctx).unwrap_or_else(|err| {
            tracing::warn!("Expression failed ({}), using {}", err, default);
            default
        })
    }

    /// Integer result; failures count as 0
    pub fn evaluate_number(&self, ctx: &dyn EvalContext) -> i64 {
        self.evaluate_or(Value::Number(0), ctx).as_number()
    }

    /// Boolean result; failures count as false
    pub fn evaluate_bool(&self, ctx: &dyn EvalContext) -> bool {
        self.evaluate_or(Value::Boolean(false), ctx).as_bool()
    }

    /// True when the expression is a literal that never changes
    pub fn is_constant(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::String(template) => template.as_literal().is_some(),
            Self::Variable(_) | Self::Call { .. } => false,
        }
    }
}

fn evaluate_call(op: Operator, args: &[Function], ctx: &dyn EvalContext) -> std::result::Result<Value, EvalError> {
    let arg = |i: usize| args[i].evaluate(ctx);

    let value = match op {
        Operator::Not => Value::Boolean(!arg(0)?.as_bool()),
        Operator::And => {
            for a in args {
                if !a.evaluate(ctx)?.as_bool() {
                    return Ok(Value::Boolean(false));
                }
            }
            Value::Boolean(true)
        }
        Operator::Or => {
            for a in args {
                if a.evaluate(ctx)?.as_bool() {
                    return Ok(Value::Boolean(true));
                }
            }
            Value::Boolean(false)
        }
        Operator::Equal | Operator::Eq => Value::Boolean(arg(0)? == arg(1)?),
        Operator::Ne => Value::Boolean(arg(0)? != arg(1)?),
        Operator::Gt => Value::Boolean(arg(0)? > arg(1)?),
        Operator::Lt => Value::Boolean(arg(0)? < arg(1)?),
        Operator::Ge => Value::Boolean(arg(0)? >= arg(1)?),
        Operator::Le => Value::Boolean(arg(0)? <= arg(1)?),
        Operator::File => {
            let path = arg(0)?.to_string();
            if ctx.image_size(&path).is_some() {
                Value::String(path)
            } else {
                Value::Boolean(false)
            }
        }
        Operator::Trans => Value::String(ctx.translate(&arg(0)?.to_string())),
        Operator::Add => {
            let mut sum: i64 = 0;
            for a in args {
                sum = sum.wrapping_add(a.evaluate(ctx)?.as_number());
            }
            Value::Number(sum)
        }
        Operator::Sub => {
            let mut result = arg(0)?.as_number();
            for a in &args[1..] {
                result = result.wrapping_sub(a.evaluate(ctx)?.as_number());
            }
            Value::Number(result)
        }
        Operator::Mul => {
            let mut product: i64 = 1;
            for a in args {
                product = product.wrapping_mul(a.evaluate(ctx)?.as_number());
            }
            Value::Number(product)
        }
        Operator::Div => {
            let dividend = arg(0)?.as_number();
            let divisor = arg(1)?.as_number();
            if divisor == 0 {
                return Err(EvalError::DivisionByZero);
            }
            Value::Number(dividend.wrapping_div(divisor))
        }
        Operator::FontTotalWidth
        | Operator::FontTotalHeight
        | Operator::FontTotalAscent
        | Operator::FontSpaceBetween
        | Operator::FontLineHeight => {
            let font = arg(0)?.to_string();
            let metric = op.font_metric().and_then(|m| ctx.font_metric(&font, m));
            metric.map_or(Value::Boolean(false), Value::Number)
        }
        Operator::FontTextWidth | Operator::FontTextHeight => {
            let font = arg(0)?.to_string();
            let text = arg(1)?.to_string();
            let extent = if op == Operator::FontTextWidth { Extent::Width } else { Extent::Height };
            ctx.text_extent(&font, &text, extent)
                .map_or(Value::Boolean(false), Value::Number)
        }
        Operator::ImageWidth | Operator::ImageHeight => {
            let path = arg(0)?.to_string();
            match ctx.image_size(&path) {
                Some((w, h)) => Value::Number(i64::from(if op == Operator::ImageWidth { w } else { h })),
                None => Value::Boolean(false),
            }
        }
        Operator::QueryFeature => {
            let feature = arg(0)?.to_string();
            Value::Boolean(ctx.query_feature(&feature).is_some_and(|v| v != 0))
        }
    };
    Ok(value)
}

struct FunctionParser<'a, C: ?Sized> {
    text: &'a str,
    pos: usize,
    ctx: &'a C,
}

impl<'a, C: ParseContext + ?Sized> FunctionParser<'a, C> {
    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_space(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn unexpected(&self, found: char) -> ExprError {
        ExprError::UnexpectedChar {
            found,
            offset: self.pos,
            text: self.text.to_string(),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.advance();
        }
        &self.text[start..self.pos]
    }

    /// `depth` is the number of enclosing calls
    fn parse_expr(&mut self, depth: usize) -> Result<Function> {
        self.skip_space();
        let c = self
            .peek()
            .ok_or_else(|| ExprError::UnexpectedEnd(self.text.to_string()))?;
        match c {
            '\'' => self.parse_quoted(),
            '{' => self.parse_template_run(depth),
            '#' => {
                self.advance();
                let id = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                if !is_identifier(id) {
                    return Err(self.peek().map_or_else(
                        || ExprError::UnexpectedEnd(self.text.to_string()),
                        |c| self.unexpected(c),
                    ));
                }
                Ok(Function::Variable(id.to_string()))
            }
            '-' | '+' | '0'..='9' => self.parse_number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.parse_call(depth),
            other => Err(self.unexpected(other)),
        }
    }

    fn parse_number(&mut self) -> Result<Function> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.advance();
        }
        self.take_while(|c| c.is_ascii_digit());
        let literal = &self.text[start..self.pos];
        literal
            .parse()
            .map(Function::Number)
            .map_err(|_| ExprError::InvalidNumber(literal.to_string()))
    }

    fn parse_quoted(&mut self) -> Result<Function> {
        self.advance();
        let mut content = String::new();
        loop {
            match self.advance() {
                None => return Err(ExprError::UnterminatedString(self.text.to_string())),
                Some('\\') if self.peek() == Some('\'') => {
                    self.advance();
                    content.push('\'');
                }
                Some('\'') => break,
                Some(c) => content.push(c),
            }
        }
        Ok(Function::String(TemplateString::parse(&content, self.ctx)?))
    }

    /// A bare `{...}` template: runs until a `,` or `)` outside braces
    /// that belongs to an enclosing call, or the end of input.
    fn parse_template_run(&mut self, depth: usize) -> Result<Function> {
        let start = self.pos;
        let mut braces = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '{' => braces += 1,
                '}' => braces = braces.saturating_sub(1),
                ',' | ')' if braces == 0 && depth > 0 => break,
                _ => {}
            }
            self.advance();
        }
        let run = self.text[start..self.pos].trim_end();
        Ok(Function::String(TemplateString::parse(run, self.ctx)?))
    }

    fn parse_call(&mut self, depth: usize) -> Result<Function> {
        let name = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        self.skip_space();
        match self.peek() {
            Some('(') => {}
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(ExprError::UnexpectedEnd(self.text.to_string())),
        }
        let op = Operator::from_name(name).ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;
        self.advance();

        let mut args = Vec::new();
        self.skip_space();
        if self.peek() == Some(')') {
            self.advance();
        } else {
            loop {
                args.push(self.parse_expr(depth + 1)?);
                self.skip_space();
                match self.advance() {
                    Some(',') => continue,
                    Some(')') => break,
                    Some(c) => {
                        self.pos -= c.len_utf8();
                        return Err(self.unexpected(c));
                    }
                    None => return Err(ExprError::UnexpectedEnd(self.text.to_string())),
                }
            }
        }

        let expected = op.arity();
        if !expected.accepts(args.len()) {
            return Err(ExprError::Arity {
                name: op.name(),
                expected,
                found: args.len(),
            });
        }
        Ok(Function::Call { op, args })
    }
}
