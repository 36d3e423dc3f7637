//! Everything a skin's expressions and objects look up while they run

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use glcd_expr::{EvalContext, Extent, FontMetric, ParseContext, Token, Value, VariableTable};
use glcd_render::{DecodedImage, FontFace, FontLoader, FontRegistry, ImageCache, ImageLoader, RenderContext};

use crate::host::SkinHost;
use crate::options::SkinOptions;

/// Lookup state of one skin: host, variables, fonts, images and the
/// tick/switch reference timestamps
pub struct SkinContext {
    pub(crate) host: Rc<dyn SkinHost>,
    pub(crate) variables: VariableTable,
    pub(crate) fonts: FontRegistry,
    images: RefCell<ImageCache>,
    tick: Cell<u64>,
    switch: Cell<u64>,
    base_dir: PathBuf,
    scroll_separator: String,
}

impl SkinContext {
    pub(crate) fn new(
        host: Rc<dyn SkinHost>,
        options: &SkinOptions,
        base_dir: PathBuf,
        image_loader: Box<dyn ImageLoader>,
        font_loader: Box<dyn FontLoader>,
    ) -> Self {
        Self {
            host,
            variables: VariableTable::new(),
            fonts: FontRegistry::new(font_loader, base_dir.clone()),
            images: RefCell::new(ImageCache::new(image_loader, base_dir.clone(), options.image_cache_size)),
            tick: Cell::new(0),
            switch: Cell::new(0),
            base_dir,
            scroll_separator: options.scroll_separator.clone(),
        }
    }

    /// Directory of the skin file; relative font and image paths start here
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// `(entries, hits, misses)` of the image cache
    pub fn image_cache_stats(&self) -> (usize, u64, u64) {
        let cache = self.images.borrow();
        (cache.len(), cache.hits(), cache.misses())
    }

    pub(crate) fn clear_images(&self) {
        self.images.borrow_mut().clear();
    }

    pub(crate) fn set_tick(&self, timestamp: u64) {
        self.tick.set(timestamp);
    }

    pub(crate) fn set_switch(&self, timestamp: u64) {
        self.switch.set(timestamp);
    }
}

impl ParseContext for SkinContext {
    fn token_id(&self, name: &str) -> Option<u32> {
        self.host.token_id(name)
    }

    fn variable_text(&self, id: &str) -> Option<String> {
        self.variables.value(id, self).map(|v| v.to_string())
    }
}

impl EvalContext for SkinContext {
    fn token(&self, token: &Token) -> Value {
        self.host.token(token, None)
    }

    fn variable(&self, id: &str) -> Option<Value> {
        self.variables.value(id, self)
    }

    fn translate(&self, text: &str) -> String {
        self.host.translate(text)
    }

    fn font_metric(&self, font: &str, metric: FontMetric) -> Option<i64> {
        let face = self.fonts.get(font, self)?;
        let value = match metric {
            FontMetric::TotalWidth => face.total_width(),
            FontMetric::TotalHeight => face.total_height(),
            FontMetric::TotalAscent => face.total_ascent(),
            FontMetric::SpaceBetween => face.space_between(),
            FontMetric::LineHeight => face.line_height(),
        };
        Some(i64::from(value))
    }

    fn text_extent(&self, font: &str, text: &str, extent: Extent) -> Option<i64> {
        let face = self.fonts.get(font, self)?;
        let value = match extent {
            Extent::Width => face.text_width(text),
            Extent::Height => face.text_height(text),
        };
        Some(i64::from(value))
    }

    fn image_size(&self, path: &str) -> Option<(u32, u32)> {
        self.images
            .borrow_mut()
            .get(path, None, None)
            .map(|image| (image.width, image.height))
    }

    fn query_feature(&self, feature: &str) -> Option<i64> {
        self.host.query_feature(feature)
    }

    fn now(&self) -> u64 {
        self.host.now()
    }

    fn tick_timestamp(&self) -> u64 {
        self.tick.get()
    }

    fn switch_timestamp(&self) -> u64 {
        self.switch.get()
    }
}

impl RenderContext for SkinContext {
    fn as_eval(&self) -> &dyn EvalContext {
        self
    }

    fn font(&self, id: &str) -> Option<&dyn FontFace> {
        self.fonts.get(id, self)
    }

    fn image(&self, path: &str, width: Option<u32>, height: Option<u32>) -> Option<Arc<DecodedImage>> {
        self.images.borrow_mut().get(path, width, height)
    }

    fn indexed_token(&self, token: &Token, index: usize) -> Value {
        self.host.token(token, Some(index))
    }

    fn tab_stop(&self, index: usize, width: i32) -> Option<i32> {
        self.host.tab_position(index, width)
    }

    fn scroll_separator(&self) -> &str {
        &self.scroll_separator
    }
}

impl std::fmt::Debug for SkinContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkinContext")
            .field("base_dir", &self.base_dir)
            .field("variables", &self.variables.len())
            .field("fonts", &self.fonts.len())
            .field("images", &self.images.borrow())
            .finish()
    }
}
