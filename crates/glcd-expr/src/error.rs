//! Expression errors

use std::fmt;

/// Accepted argument count of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "exactly {}", n),
            Self::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Errors raised while parsing templates and functions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected token {{{0}}}")]
    UnknownToken(String),

    #[error("unknown variable #{0}")]
    UnknownVariable(String),

    #[error("unterminated token in '{0}'")]
    UnterminatedToken(String),

    #[error("empty token in '{0}'")]
    EmptyToken(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' takes {expected} argument(s), got {found}")]
    Arity {
        name: &'static str,
        expected: Arity,
        found: usize,
    },

    #[error("unterminated string literal in '{0}'")]
    UnterminatedString(String),

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected '{found}' at offset {offset} in '{text}'")]
    UnexpectedChar { found: char, offset: usize, text: String },

    #[error("unexpected end of expression '{0}'")]
    UnexpectedEnd(String),

    #[error("empty expression")]
    Empty,

    #[error("invalid evaluate policy '{0}'")]
    InvalidPolicy(String),
}

/// Errors raised while evaluating a parsed function
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
}
