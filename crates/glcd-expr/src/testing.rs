//! In-memory context for unit tests

use std::cell::Cell;
use std::collections::HashMap;

use crate::template::Token;
use crate::{EvalContext, Extent, FontMetric, ParseContext, Value};

#[derive(Default)]
pub(crate) struct MapContext {
    tokens: Vec<(String, Value)>,
    variables: HashMap<String, Value>,
    images: HashMap<String, (u32, u32)>,
    features: HashMap<String, i64>,
    pub now: Cell<u64>,
    pub tick: Cell<u64>,
    pub switch: Cell<u64>,
    pub token_reads: Cell<u32>,
}

impl MapContext {
    pub fn token(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.tokens.push((name.to_string(), value.into()));
        self
    }

    pub fn variable(mut self, id: &str, value: impl Into<Value>) -> Self {
        self.variables.insert(id.to_string(), value.into());
        self
    }

    pub fn image(mut self, path: &str, size: (u32, u32)) -> Self {
        self.images.insert(path.to_string(), size);
        self
    }

    pub fn feature(mut self, name: &str, value: i64) -> Self {
        self.features.insert(name.to_string(), value);
        self
    }
}

impl ParseContext for MapContext {
    fn token_id(&self, name: &str) -> Option<u32> {
        self.tokens.iter().position(|(n, _)| n == name).map(|i| i as u32)
    }

    fn variable_text(&self, id: &str) -> Option<String> {
        self.variables.get(id).map(Value::to_string)
    }
}

impl EvalContext for MapContext {
    fn token(&self, token: &Token) -> Value {
        self.token_reads.set(self.token_reads.get() + 1);
        self.tokens
            .get(token.id as usize)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn variable(&self, id: &str) -> Option<Value> {
        self.variables.get(id).cloned()
    }

    fn translate(&self, text: &str) -> String {
        format!("<{}>", text)
    }

    fn font_metric(&self, font: &str, metric: FontMetric) -> Option<i64> {
        if font != "f" {
            return None;
        }
        Some(match metric {
            FontMetric::TotalWidth => 6,
            FontMetric::TotalHeight => 8,
            FontMetric::TotalAscent => 7,
            FontMetric::SpaceBetween => 1,
            FontMetric::LineHeight => 9,
        })
    }

    fn text_extent(&self, font: &str, text: &str, extent: Extent) -> Option<i64> {
        if font != "f" {
            return None;
        }
        Some(match extent {
            Extent::Width => text.chars().count() as i64 * 6,
            Extent::Height => 9,
        })
    }

    fn image_size(&self, path: &str) -> Option<(u32, u32)> {
        self.images.get(path).copied()
    }

    fn query_feature(&self, feature: &str) -> Option<i64> {
        self.features.get(feature).copied()
    }

    fn now(&self) -> u64 {
        self.now.get()
    }

    fn tick_timestamp(&self) -> u64 {
        self.tick.get()
    }

    fn switch_timestamp(&self) -> u64 {
        self.switch.get()
    }
}
