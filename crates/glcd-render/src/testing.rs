//! Test doubles shared by the unit tests

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use glcd_expr::{EvalContext, Extent, FontMetric, ParseContext, Token, Value};

use crate::canvas::Surface;
use crate::font::{FontFace, Glyph};
use crate::image::{DecodedImage, ImageCache, ImageError, ImageFrame, ImageLoader};
use crate::object::RenderContext;
use crate::{Canvas, Color};

/// Monospace font: 6 px per character, solid 5 px wide glyphs
pub(crate) struct FixedFont {
    height: i32,
    glyph: Arc<Glyph>,
}

impl FixedFont {
    pub fn new(height: i32) -> Self {
        let rows = (height - 1).max(1);
        Self {
            height,
            glyph: Arc::new(Glyph {
                width: 5,
                height: rows as u32,
                bearing_x: 0,
                bearing_y: rows,
                coverage: vec![255; 5 * rows as usize],
            }),
        }
    }
}

impl FontFace for FixedFont {
    fn total_width(&self) -> i32 {
        6
    }

    fn total_height(&self) -> i32 {
        self.height
    }

    fn total_ascent(&self) -> i32 {
        self.height - 1
    }

    fn space_between(&self) -> i32 {
        1
    }

    fn line_height(&self) -> i32 {
        self.height + 1
    }

    fn char_width(&self, _c: char) -> i32 {
        6
    }

    fn glyph(&self, c: char) -> Option<Arc<Glyph>> {
        if c.is_whitespace() { None } else { Some(Arc::clone(&self.glyph)) }
    }
}

/// 8x4 black images; paths containing `anim` have three 100 ms frames,
/// paths containing `missing` fail
#[derive(Clone, Default)]
pub(crate) struct CountingImageLoader {
    loads: Rc<Cell<u32>>,
}

impl CountingImageLoader {
    pub fn loads(&self) -> u32 {
        self.loads.get()
    }
}

impl ImageLoader for CountingImageLoader {
    fn load(&self, path: &Path) -> Result<DecodedImage, ImageError> {
        self.loads.set(self.loads.get() + 1);
        let name = path.to_string_lossy();
        if name.contains("missing") {
            return Err(ImageError::Io {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        }
        let frame_count = if name.contains("anim") { 3 } else { 1 };
        let frames = (0..frame_count)
            .map(|_| ImageFrame {
                pixels: [0, 0, 0, 255].repeat(8 * 4),
                delay: 100,
            })
            .collect();
        Ok(DecodedImage {
            width: 8,
            height: 4,
            frames,
        })
    }
}

/// Context with settable tokens, one font `f` (8 px) and a counting
/// image cache
pub(crate) struct TestContext {
    tokens: RefCell<Vec<(String, Value)>>,
    variables: Vec<(String, Value)>,
    tab_stops: Vec<i32>,
    font: FixedFont,
    images: RefCell<ImageCache>,
    pub now: Cell<u64>,
    pub tick: Cell<u64>,
    pub switch: Cell<u64>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self {
            tokens: RefCell::new(Vec::new()),
            variables: Vec::new(),
            tab_stops: Vec::new(),
            font: FixedFont::new(8),
            images: RefCell::new(ImageCache::new(
                Box::new(CountingImageLoader::default()),
                "/skin",
                ImageCache::DEFAULT_CAPACITY,
            )),
            now: Cell::new(0),
            tick: Cell::new(0),
            switch: Cell::new(0),
        }
    }
}

impl TestContext {
    pub fn token(self, name: &str, value: impl Into<Value>) -> Self {
        self.set_token(name, value);
        self
    }

    pub fn set_token(&self, name: &str, value: impl Into<Value>) {
        let mut tokens = self.tokens.borrow_mut();
        let value = value.into();
        match tokens.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => tokens.push((name.to_string(), value)),
        }
    }

    pub fn variable(mut self, id: &str, value: impl Into<Value>) -> Self {
        self.variables.push((id.to_string(), value.into()));
        self
    }

    pub fn tab_stops(mut self, stops: &[i32]) -> Self {
        self.tab_stops = stops.to_vec();
        self
    }

    pub fn cached(&self, path: &str, width: Option<u32>, height: Option<u32>) -> bool {
        self.images.borrow().contains(path, width, height)
    }
}

impl ParseContext for TestContext {
    fn token_id(&self, name: &str) -> Option<u32> {
        self.tokens.borrow().iter().position(|(n, _)| n == name).map(|i| i as u32)
    }

    fn variable_text(&self, id: &str) -> Option<String> {
        self.variables.iter().find(|(n, _)| n == id).map(|(_, v)| v.to_string())
    }
}

impl EvalContext for TestContext {
    fn token(&self, token: &Token) -> Value {
        self.tokens
            .borrow()
            .get(token.id as usize)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    fn variable(&self, id: &str) -> Option<Value> {
        self.variables.iter().find(|(n, _)| n == id).map(|(_, v)| v.clone())
    }

    fn translate(&self, text: &str) -> String {
        text.to_string()
    }

    fn font_metric(&self, font: &str, metric: FontMetric) -> Option<i64> {
        let font = RenderContext::font(self, font)?;
        Some(i64::from(match metric {
            FontMetric::TotalWidth => font.total_width(),
            FontMetric::TotalHeight => font.total_height(),
            FontMetric::TotalAscent => font.total_ascent(),
            FontMetric::SpaceBetween => font.space_between(),
            FontMetric::LineHeight => font.line_height(),
        }))
    }

    fn text_extent(&self, font: &str, text: &str, extent: Extent) -> Option<i64> {
        let font = RenderContext::font(self, font)?;
        Some(i64::from(match extent {
            Extent::Width => font.text_width(text),
            Extent::Height => font.text_height(text),
        }))
    }

    fn image_size(&self, path: &str) -> Option<(u32, u32)> {
        RenderContext::image(self, path, None, None).map(|i| (i.width, i.height))
    }

    fn query_feature(&self, _feature: &str) -> Option<i64> {
        None
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

impl RenderContext for TestContext {
    fn as_eval(&self) -> &dyn EvalContext {
        self
    }

    fn font(&self, id: &str) -> Option<&dyn FontFace> {
        (id == "f").then_some(&self.font as &dyn FontFace)
    }

    fn image(&self, path: &str, width: Option<u32>, height: Option<u32>) -> Option<Arc<DecodedImage>> {
        self.images.borrow_mut().get(path, width, height)
    }

    fn indexed_token(&self, token: &Token, index: usize) -> Value {
        Value::String(format!("{}#{}", EvalContext::token(self, token), index))
    }

    fn tab_stop(&self, index: usize, _width: i32) -> Option<i32> {
        self.tab_stops.get(index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DrawnText {
    pub x: i32,
    pub y: i32,
    pub max_x: i32,
    pub text: String,
    pub skip: i32,
}

/// Canvas that also records text and image draw calls
pub(crate) struct RecordingSurface {
    pub canvas: Canvas,
    pub texts: Vec<DrawnText>,
    /// `(x, y, frame)`
    pub images: Vec<(i32, i32, usize)>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Canvas::new(width, height),
            texts: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.canvas.width
    }

    fn height(&self) -> u32 {
        self.canvas.height
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.canvas.draw_pixel(x, y, color);
    }

    fn draw_image(&mut self, x: i32, y: i32, _image: &DecodedImage, frame: usize, _clip: crate::Rect) {
        self.images.push((x, y, frame));
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        max_x: i32,
        text: &str,
        font: &dyn FontFace,
        _color: Color,
        _bg: Color,
        skip: i32,
    ) -> i32 {
        self.texts.push(DrawnText {
            x,
            y,
            max_x,
            text: text.to_string(),
            skip,
        });
        (font.text_width(text) - skip).clamp(0, (max_x - x + 1).max(0))
    }
}
