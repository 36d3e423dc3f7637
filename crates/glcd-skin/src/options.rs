//! Skin loading options

use std::path::PathBuf;

use glcd_render::ImageCache;
use glcd_render::object::DEFAULT_SCROLL_SEPARATOR;

/// Skin configuration
#[derive(Debug, Clone)]
pub struct SkinOptions {
    /// Images kept decoded per skin
    pub image_cache_size: usize,
    /// Deepest allowed `<include>` nesting
    pub max_include_depth: u32,
    /// Extra directory searched for `ft2:` fonts and `fc:` patterns
    pub font_dir: Option<PathBuf>,
    /// Shown between the end and the restart of scrolling text
    pub scroll_separator: String,
}

impl Default for SkinOptions {
    fn default() -> Self {
        Self {
            image_cache_size: ImageCache::DEFAULT_CAPACITY,
            max_include_depth: 5,
            font_dir: None,
            scroll_separator: DEFAULT_SCROLL_SEPARATOR.to_string(),
        }
    }
}

impl SkinOptions {
    pub fn with_font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.font_dir = Some(dir.into());
        self
    }

    pub fn with_image_cache_size(mut self, size: usize) -> Self {
        self.image_cache_size = size;
        self
    }

    pub fn with_max_include_depth(mut self, depth: u32) -> Self {
        self.max_include_depth = depth;
        self
    }
}
