//! Fonts
//!
//! `<font id url condition>` declarations are kept in a [`FontRegistry`] in
//! declaration order. Faces are loaded on first use through a
//! [`FontLoader`]; a face that fails to load stays "not found".

mod outline;

use std::cell::OnceCell;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use glcd_expr::{EvalContext, Function};

pub use outline::{OutlineFont, OutlineFontLoader};

/// Font errors
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("invalid font url '{0}'")]
    InvalidUrl(String),

    #[error("unsupported font type: {0}")]
    Unsupported(String),

    #[error("no font matches '{0}'")]
    NotFound(String),

    #[error("cannot read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font: {0}")]
    Parse(String),
}

/// Where a font comes from, parsed from a `url` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSpec {
    /// `fnt:path`
    Bitmap { path: String },
    /// `ft2:path:size`
    Outline { path: String, size: u32 },
    /// `fc:pattern:size=N`
    Pattern { pattern: String, size: u32 },
}

impl FromStr for FontSpec {
    type Err = FontError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let invalid = || FontError::InvalidUrl(url.to_string());
        let (scheme, rest) = url.split_once(':').ok_or_else(invalid)?;
        match scheme {
            "fnt" if !rest.is_empty() => Ok(Self::Bitmap { path: rest.to_string() }),
            "ft2" => {
                let (path, size) = rest.rsplit_once(':').ok_or_else(invalid)?;
                let size = size.trim().parse().map_err(|_| invalid())?;
                if path.is_empty() || size == 0 {
                    return Err(invalid());
                }
                Ok(Self::Outline { path: path.to_string(), size })
            }
            "fc" => {
                let mut size = None;
                let mut pattern = Vec::new();
                for part in rest.split(':') {
                    match part.strip_prefix("size=") {
                        Some(n) => size = Some(n.trim().parse::<u32>().map_err(|_| invalid())?),
                        None => pattern.push(part),
                    }
                }
                let size = size.filter(|&s| s > 0).ok_or_else(invalid)?;
                let pattern = pattern.join(":");
                if pattern.is_empty() {
                    return Err(invalid());
                }
                Ok(Self::Pattern { pattern, size })
            }
            _ => Err(invalid()),
        }
    }
}

/// A rendered glyph: coverage bitmap positioned against the baseline
#[derive(Debug, Clone, Default)]
pub struct Glyph {
    pub width: u32,
    pub height: u32,
    /// Offset of the bitmap's left edge from the pen position
    pub bearing_x: i32,
    /// Distance from the baseline up to the bitmap's top edge
    pub bearing_y: i32,
    /// One byte per pixel, row-major
    pub coverage: Vec<u8>,
}

impl Glyph {
    pub fn coverage_at(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return 0;
        }
        self.coverage
            .get((y as u32 * self.width + x as u32) as usize)
            .copied()
            .unwrap_or(0)
    }
}

/// A loaded font face
pub trait FontFace {
    /// Widest character advance
    fn total_width(&self) -> i32;

    /// Height of the character cell (ascent plus descent)
    fn total_height(&self) -> i32;

    fn total_ascent(&self) -> i32;

    /// Extra spacing between characters, already included in advances
    fn space_between(&self) -> i32;

    fn line_height(&self) -> i32;

    /// Horizontal advance of one character
    fn char_width(&self, c: char) -> i32;

    fn glyph(&self, c: char) -> Option<Arc<Glyph>>;

    fn text_width(&self, text: &str) -> i32 {
        text.chars().map(|c| self.char_width(c)).sum()
    }

    /// Height of `text` laid out one line per `\n`
    fn text_height(&self, text: &str) -> i32 {
        if text.is_empty() {
            return 0;
        }
        let lines = text.lines().count().max(1) as i32;
        self.total_height() + (lines - 1) * self.line_height()
    }
}

/// Loads the face described by a [`FontSpec`]
pub trait FontLoader {
    /// `base_dir` is the directory of the skin file
    fn load(&self, spec: &FontSpec, base_dir: &Path) -> Result<Box<dyn FontFace>, FontError>;
}

/// One `<font>` declaration
pub struct FontDef {
    id: String,
    spec: FontSpec,
    condition: Option<Function>,
    face: OnceCell<Option<Box<dyn FontFace>>>,
}

impl FontDef {
    pub fn new(id: impl Into<String>, spec: FontSpec) -> Self {
        Self {
            id: id.into(),
            spec,
            condition: None,
            face: OnceCell::new(),
        }
    }

    pub fn with_condition(mut self, condition: Function) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn spec(&self) -> &FontSpec {
        &self.spec
    }

    /// True once a load was attempted, successful or not
    pub fn is_loaded(&self) -> bool {
        self.face.get().is_some()
    }
}

impl std::fmt::Debug for FontDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontDef")
            .field("id", &self.id)
            .field("spec", &self.spec)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Fonts of a skin, in declaration order
pub struct FontRegistry {
    fonts: Vec<FontDef>,
    loader: Box<dyn FontLoader>,
    base_dir: PathBuf,
}

impl FontRegistry {
    pub fn new(loader: Box<dyn FontLoader>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            fonts: Vec::new(),
            loader,
            base_dir: base_dir.into(),
        }
    }

    pub fn push(&mut self, font: FontDef) {
        self.fonts.push(font);
    }

    /// First font with this id whose condition holds, loading it if needed
    pub fn get(&self, id: &str, ctx: &dyn EvalContext) -> Option<&dyn FontFace> {
        let def = self
            .fonts
            .iter()
            .filter(|f| f.id == id)
            .find(|f| f.condition.as_ref().is_none_or(|c| c.evaluate_bool(ctx)))?;

        def.face
            .get_or_init(|| match self.loader.load(&def.spec, &self.base_dir) {
                Ok(face) => {
                    tracing::debug!("Loaded font '{}' ({:?})", def.id, def.spec);
                    Some(face)
                }
                Err(err) => {
                    tracing::warn!("Font '{}' unavailable: {}", def.id, err);
                    None
                }
            })
            .as_deref()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.fonts.iter().any(|f| f.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FontDef> {
        self.fonts.iter()
    }

    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry")
            .field("fonts", &self.fonts)
            .field("base_dir", &self.base_dir)
            .finish()
    }
}
