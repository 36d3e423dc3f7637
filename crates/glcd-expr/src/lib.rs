//! glcd Expr - skin expression language
//!
//! Everything a skin attribute can compute lives here:
//! - [`Value`]: the string / integer / boolean result type
//! - [`TemplateString`]: literal text with `{token}` substitutions
//! - [`Function`]: prefix-call expressions such as `gt(add(#x,1),10)`
//! - [`Variable`]: named, conditional, cached expressions
//!
//! The language is closed: no loops, no user-defined functions. Lookups that
//! depend on the host (tokens, fonts, images, driver features) go through
//! the [`ParseContext`] and [`EvalContext`] traits.

mod context;
mod error;
pub mod function;
pub mod template;
mod value;
pub mod variable;

pub use context::{EvalContext, Extent, FontMetric, ParseContext};
pub use error::{Arity, EvalError, ExprError};
pub use function::{Function, Operator};
pub use template::{TemplateString, Token, TokenAttrib};
pub use value::Value;
pub use variable::{EvalPolicy, Variable, VariableTable};

pub type Result<T> = std::result::Result<T, ExprError>;

#[cfg(test)]
mod testing;
