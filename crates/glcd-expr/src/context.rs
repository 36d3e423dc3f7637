//! Lookup traits implemented by the skin

use crate::template::Token;
use crate::Value;

/// Lookups available while a skin is being parsed
pub trait ParseContext {
    /// Reverse lookup of a host token name. `None` rejects the token.
    fn token_id(&self, name: &str) -> Option<u32>;

    /// Current text of a variable, for whole-value `#id` references
    fn variable_text(&self, id: &str) -> Option<String>;
}

/// Font metric reported by the `Font*` single-argument functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontMetric {
    TotalWidth,
    TotalHeight,
    TotalAscent,
    SpaceBetween,
    LineHeight,
}

/// Axis reported by `FontTextWidth` / `FontTextHeight`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Width,
    Height,
}

/// Lookups available while expressions are evaluated at render time
///
/// Missing fonts, images and variables are reported as `None`; the
/// evaluator turns them into `false` rather than failing.
pub trait EvalContext: ParseContext {
    /// Value of a host token (the implementation supplies any list index)
    fn token(&self, token: &Token) -> Value;

    /// Value of the first variable with this id whose condition holds
    fn variable(&self, id: &str) -> Option<Value>;

    fn translate(&self, text: &str) -> String;

    fn font_metric(&self, font: &str, metric: FontMetric) -> Option<i64>;

    fn text_extent(&self, font: &str, text: &str, extent: Extent) -> Option<i64>;

    /// Pixel size of an image, loading it through the image cache
    fn image_size(&self, path: &str) -> Option<(u32, u32)>;

    /// Display driver capability query
    fn query_feature(&self, feature: &str) -> Option<i64>;

    /// Wall clock in milliseconds
    fn now(&self) -> u64;

    /// Reference timestamp for `evaluate="tick"` variables
    fn tick_timestamp(&self) -> u64;

    /// Reference timestamp for `evaluate="switch"` variables
    fn switch_timestamp(&self) -> u64;
}
