//! Skin loading and rendering errors

use std::path::PathBuf;

use glcd_expr::ExprError;
use glcd_render::FontError;
use glcd_xml::{ParseError, SyntaxError};

/// Error type for skin operations
#[derive(Debug, thiserror::Error)]
pub enum SkinError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {kind}")]
    Syntax { line: u32, kind: SyntaxError },

    #[error("line {line}: {source}")]
    Load {
        line: u32,
        #[source]
        source: LoadError,
    },

    #[error("document has no <skin> element")]
    NoSkin,

    #[error("unknown display '{0}'")]
    UnknownDisplay(String),
}

impl SkinError {
    /// Line in the skin file, for errors raised while reading one
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Syntax { line, .. } | Self::Load { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<ParseError<LoadError>> for SkinError {
    fn from(err: ParseError<LoadError>) -> Self {
        match err {
            ParseError::Syntax { line, kind } => Self::Syntax { line, kind },
            ParseError::Handler { line, source } => Self::Load { line, source },
            ParseError::Io { path, source } => Self::Io { path, source },
        }
    }
}

/// Problems with the content of a well-formed skin document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error("unsupported skin version '{found}', expected {supported} or lower")]
    UnsupportedVersion { found: String, supported: &'static str },

    #[error("in include {}: {source}", path.display())]
    Include {
        path: PathBuf,
        #[source]
        source: Box<SkinError>,
    },

    #[error("include {} nested deeper than {limit}", path.display())]
    IncludeDepth { path: PathBuf, limit: u32 },

    #[error("<{tag}> requires attribute '{name}'")]
    MissingAttribute { tag: String, name: &'static str },

    #[error("<{tag}> has invalid {name}=\"{value}\"")]
    InvalidAttribute { tag: String, name: String, value: String },

    #[error("unexpected <{tag}> {context}")]
    UnexpectedTag { tag: String, context: &'static str },

    #[error("<list> must start with an <item>")]
    MissingItem,
}
