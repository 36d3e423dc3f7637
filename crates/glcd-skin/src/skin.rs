//! Skins and the skin loader

use std::path::{Path, PathBuf};
use std::rc::Rc;

use glcd_expr::{EvalContext, Function, Value, Variable};
use glcd_render::{CodecImageLoader, FontFace, FontLoader, ImageLoader, OutlineFontLoader, Surface};

use crate::builder::SkinBuilder;
use crate::context::SkinContext;
use crate::display::Display;
use crate::error::SkinError;
use crate::host::SkinHost;
use crate::options::SkinOptions;

/// Newest skin format version this engine reads
pub const SUPPORTED_VERSION: &str = "1.1";

/// A loaded skin: its displays plus everything they look up
///
/// Reloading means loading a new `Skin`; nothing is patched in place.
#[derive(Debug)]
pub struct Skin {
    version: String,
    name: String,
    enable: Option<Function>,
    displays: Vec<Display>,
    ctx: SkinContext,
}

impl Skin {
    pub(crate) fn new(
        version: String,
        name: String,
        enable: Option<Function>,
        displays: Vec<Display>,
        ctx: SkinContext,
    ) -> Self {
        Self {
            version,
            name,
            enable,
            displays,
            ctx,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context(&self) -> &SkinContext {
        &self.ctx
    }

    pub fn display(&self, id: &str) -> Option<&Display> {
        self.displays.iter().find(|d| d.id() == id)
    }

    pub fn displays(&self) -> impl Iterator<Item = &Display> {
        self.displays.iter()
    }

    /// Draw display `id` at the host's current time
    pub fn render(&mut self, id: &str, surface: &mut dyn Surface) -> Result<(), SkinError> {
        let now = self.ctx.now();
        let display = self
            .displays
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or_else(|| SkinError::UnknownDisplay(id.to_string()))?;
        display.render(&self.ctx, surface, now);
        Ok(())
    }

    /// True when rendering display `id` at `now` would change the output
    pub fn needs_update(&self, id: &str, now: u64) -> bool {
        self.display(id).is_some_and(|d| d.needs_update(&self.ctx, now))
    }

    /// First variable with this id whose condition holds
    pub fn variable(&self, id: &str) -> Option<&Variable> {
        self.ctx.variables.get(id, &self.ctx)
    }

    pub fn variable_value(&self, id: &str) -> Option<Value> {
        self.ctx.variables.value(id, &self.ctx)
    }

    /// First font with this id whose condition holds, loaded on first use
    pub fn font(&self, id: &str) -> Option<&dyn FontFace> {
        self.ctx.fonts.get(id, &self.ctx)
    }

    /// Value of the `enable` expression, true when there is none
    pub fn is_enabled(&self) -> bool {
        self.enable.as_ref().is_none_or(|e| e.evaluate_bool(&self.ctx))
    }

    /// Variables with `evaluate="tick"` recompute once older than this
    pub fn set_tick_timestamp(&self, timestamp: u64) {
        self.ctx.set_tick(timestamp);
    }

    /// Variables with `evaluate="switch"` recompute once older than this
    pub fn set_switch_timestamp(&self, timestamp: u64) {
        self.ctx.set_switch(timestamp);
    }

    /// Forget every cached variable value, so `once` and timestamped
    /// variables recompute on their next use
    pub fn invalidate_variables(&self) {
        self.ctx.variables.invalidate();
    }

    /// Drop decoded images and forget failed paths
    pub fn clear_image_cache(&self) {
        self.ctx.clear_images();
    }
}

/// Builds a [`Skin`] from a file or a string
pub struct SkinLoader {
    host: Rc<dyn SkinHost>,
    options: SkinOptions,
    image_loader: Box<dyn ImageLoader>,
    font_loader: Option<Box<dyn FontLoader>>,
}

impl SkinLoader {
    /// Loader with default options, the codec image loader and the outline
    /// font loader
    pub fn new(host: Rc<dyn SkinHost>) -> Self {
        Self {
            host,
            options: SkinOptions::default(),
            image_loader: Box::new(CodecImageLoader::new()),
            font_loader: None,
        }
    }

    pub fn options(mut self, options: SkinOptions) -> Self {
        self.options = options;
        self
    }

    pub fn image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.image_loader = Box::new(loader);
        self
    }

    pub fn font_loader(mut self, loader: impl FontLoader + 'static) -> Self {
        self.font_loader = Some(Box::new(loader));
        self
    }

    /// Load a skin file; relative paths inside it resolve against its directory
    pub fn load(self, path: impl AsRef<Path>) -> Result<Skin, SkinError> {
        let path = path.as_ref();
        tracing::debug!("Loading skin {}", path.display());
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut builder = self.builder(base_dir);
        builder.host_parser(|parser, builder| parser.parse_file(path, builder))?;
        Self::finish(builder)
    }

    /// Load a skin held in memory
    pub fn load_str(self, xml: &str, base_dir: impl Into<PathBuf>) -> Result<Skin, SkinError> {
        let mut builder = self.builder(base_dir.into());
        builder.host_parser(|parser, builder| parser.parse(xml.as_bytes(), builder))?;
        Self::finish(builder)
    }

    fn builder(self, base_dir: PathBuf) -> SkinBuilder {
        let font_loader = self.font_loader.unwrap_or_else(|| match &self.options.font_dir {
            Some(dir) => Box::new(OutlineFontLoader::with_font_dir(dir)),
            None => Box::new(OutlineFontLoader::new()),
        });
        let ctx = SkinContext::new(self.host, &self.options, base_dir, self.image_loader, font_loader);
        SkinBuilder::new(ctx, self.options.max_include_depth)
    }

    fn finish(builder: SkinBuilder) -> Result<Skin, SkinError> {
        let skin = builder.finish()?;
        tracing::info!(
            "Loaded skin '{}' (version {}, {} displays)",
            skin.name,
            skin.version,
            skin.displays.len()
        );
        Ok(skin)
    }
}
