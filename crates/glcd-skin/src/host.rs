//! The host side of a skin: token data and display capabilities

use std::time::{SystemTime, UNIX_EPOCH};

use glcd_expr::{Token, Value};
use glcd_xml::Charset;

/// Data and capabilities a skin consumes from the application driving it
pub trait SkinHost {
    /// Current value of a token; `list_index` is set while a list row renders
    fn token(&self, token: &Token, list_index: Option<usize>) -> Value;

    /// Id for a token name, `None` when the host does not know it
    fn token_id(&self, name: &str) -> Option<u32>;

    /// Backing for the `trans()` function
    fn translate(&self, text: &str) -> String {
        text.to_string()
    }

    /// Pixel offset of tab stop `index` for a text box `width` pixels wide
    fn tab_position(&self, _index: usize, _width: i32) -> Option<i32> {
        None
    }

    /// Wall clock in milliseconds
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }

    /// Display driver capability query for `QueryFeature()`
    fn query_feature(&self, _feature: &str) -> Option<i64> {
        None
    }

    /// Encoding applied to skin text before it is parsed
    fn charset(&self) -> Option<&dyn Charset> {
        None
    }
}
