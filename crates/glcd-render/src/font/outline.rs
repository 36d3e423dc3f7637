//! Outline fonts via ttf-parser, rasterized with tiny-skia
//!
//! Glyphs are rendered without anti-aliasing since the targets are 1-bit
//! displays. `fc:` patterns are matched against the system font database.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ttf_parser::{Face, GlyphId, OutlineBuilder};

use super::{FontError, FontFace, FontLoader, FontSpec, Glyph};

/// An outline face scaled to a fixed pixel size
pub struct OutlineFont {
    data: Vec<u8>,
    index: u32,
    scale: f32,
    ascent: i32,
    height: i32,
    line_height: i32,
    max_advance: i32,
    glyphs: RefCell<HashMap<char, Option<Arc<Glyph>>>>,
}

impl OutlineFont {
    /// Parse face `index` of `data` at `size` pixels per em
    pub fn new(data: Vec<u8>, index: u32, size: u32) -> Result<Self, FontError> {
        let face = Face::parse(&data, index).map_err(|e| FontError::Parse(e.to_string()))?;
        let scale = size as f32 / f32::from(face.units_per_em());
        let ascender = f32::from(face.ascender());
        let descender = f32::from(face.descender());
        let line_gap = f32::from(face.line_gap());

        let ascent = (ascender * scale).ceil() as i32;
        let height = ((ascender - descender) * scale).ceil() as i32;
        let line_height = ((ascender - descender + line_gap) * scale).ceil() as i32;
        let max_advance = (' '..='~')
            .filter_map(|c| face.glyph_index(c))
            .filter_map(|g| face.glyph_hor_advance(g))
            .map(|a| (f32::from(a) * scale).round() as i32)
            .max()
            .unwrap_or(0);

        drop(face);
        Ok(Self {
            data,
            index,
            scale,
            ascent,
            height,
            line_height,
            max_advance,
            glyphs: RefCell::new(HashMap::new()),
        })
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, self.index).ok()
    }

    fn rasterize(&self, c: char) -> Option<Glyph> {
        let face = self.face()?;
        let glyph = face.glyph_index(c)?;

        // Whitespace has no outline
        let Some(bbox) = face.glyph_bounding_box(glyph) else {
            return Some(Glyph::default());
        };

        let width = (f32::from(bbox.x_max - bbox.x_min) * self.scale).ceil() as u32;
        let height = (f32::from(bbox.y_max - bbox.y_min) * self.scale).ceil() as u32;
        if width == 0 || height == 0 {
            return Some(Glyph::default());
        }

        let mut builder = PathBuilder::new(self.scale, f32::from(bbox.x_min), f32::from(bbox.y_max));
        face.outline_glyph(glyph, &mut builder)?;
        let path = builder.finish()?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)?;
        let mut paint = tiny_skia::Paint::default();
        paint.set_color(tiny_skia::Color::WHITE);
        paint.anti_alias = false;
        pixmap.fill_path(
            &path,
            &paint,
            tiny_skia::FillRule::Winding,
            tiny_skia::Transform::identity(),
            None,
        );

        Some(Glyph {
            width,
            height,
            bearing_x: (f32::from(bbox.x_min) * self.scale).floor() as i32,
            bearing_y: (f32::from(bbox.y_max) * self.scale).ceil() as i32,
            coverage: pixmap.pixels().iter().map(|p| p.alpha()).collect(),
        })
    }

    fn advance(&self, face: &Face<'_>, glyph: GlyphId) -> i32 {
        face.glyph_hor_advance(glyph)
            .map(|a| (f32::from(a) * self.scale).round() as i32)
            .unwrap_or(0)
    }
}

impl FontFace for OutlineFont {
    fn total_width(&self) -> i32 {
        self.max_advance
    }

    fn total_height(&self) -> i32 {
        self.height
    }

    fn total_ascent(&self) -> i32 {
        self.ascent
    }

    fn space_between(&self) -> i32 {
        0
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }

    fn char_width(&self, c: char) -> i32 {
        let Some(face) = self.face() else {
            return 0;
        };
        let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
        self.advance(&face, glyph)
    }

    fn glyph(&self, c: char) -> Option<Arc<Glyph>> {
        if let Some(cached) = self.glyphs.borrow().get(&c) {
            return cached.clone();
        }
        let glyph = self.rasterize(c).map(Arc::new);
        self.glyphs.borrow_mut().insert(c, glyph.clone());
        glyph
    }
}

/// Path builder that converts ttf-parser outlines to tiny-skia paths
struct PathBuilder {
    builder: tiny_skia::PathBuilder,
    scale: f32,
    offset_x: f32,
    offset_y: f32,
}

impl PathBuilder {
    fn new(scale: f32, offset_x: f32, offset_y: f32) -> Self {
        Self {
            builder: tiny_skia::PathBuilder::new(),
            scale,
            offset_x,
            offset_y,
        }
    }

    fn transform_x(&self, x: f32) -> f32 {
        (x - self.offset_x) * self.scale
    }

    fn transform_y(&self, y: f32) -> f32 {
        (self.offset_y - y) * self.scale // Flip Y axis
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.transform_x(x), self.transform_y(y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.transform_x(x), self.transform_y(y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(
            self.transform_x(x1),
            self.transform_y(y1),
            self.transform_x(x),
            self.transform_y(y),
        );
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.transform_x(x1),
            self.transform_y(y1),
            self.transform_x(x2),
            self.transform_y(y2),
            self.transform_x(x),
            self.transform_y(y),
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Default [`FontLoader`]: `ft2:` files and `fc:` patterns
///
/// `fnt:` bitmap fonts are reported as unsupported.
#[derive(Default)]
pub struct OutlineFontLoader {
    font_dir: Option<PathBuf>,
    db: OnceCell<fontdb::Database>,
}

impl OutlineFontLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look for relative `ft2:` paths in `dir` before the skin directory,
    /// and add its fonts to pattern matching
    pub fn with_font_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            font_dir: Some(dir.into()),
            db: OnceCell::new(),
        }
    }

    fn resolve(&self, path: &str, base_dir: &Path) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            return path.to_path_buf();
        }
        if let Some(dir) = &self.font_dir {
            let candidate = dir.join(path);
            if candidate.exists() {
                return candidate;
            }
        }
        base_dir.join(path)
    }

    fn database(&self) -> &fontdb::Database {
        self.db.get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            if let Some(dir) = &self.font_dir {
                db.load_fonts_dir(dir);
            }
            tracing::debug!("Font database ready with {} faces", db.len());
            db
        })
    }

    fn match_pattern(&self, pattern: &str, size: u32) -> Result<OutlineFont, FontError> {
        let mut parts = pattern.split(':');
        let family = parts.next().unwrap_or_default().trim();
        let mut weight = fontdb::Weight::NORMAL;
        let mut style = fontdb::Style::Normal;
        for part in parts {
            match part.trim().to_ascii_lowercase().as_str() {
                "bold" => weight = fontdb::Weight::BOLD,
                "light" => weight = fontdb::Weight::LIGHT,
                "italic" => style = fontdb::Style::Italic,
                "oblique" => style = fontdb::Style::Oblique,
                _ => {}
            }
        }

        let families = [match family.to_ascii_lowercase().as_str() {
            "sans" | "sans-serif" => fontdb::Family::SansSerif,
            "serif" => fontdb::Family::Serif,
            "mono" | "monospace" => fontdb::Family::Monospace,
            _ => fontdb::Family::Name(family),
        }];
        let db = self.database();
        let id = db
            .query(&fontdb::Query {
                families: &families,
                weight,
                stretch: fontdb::Stretch::Normal,
                style,
            })
            .ok_or_else(|| FontError::NotFound(pattern.to_string()))?;

        db.with_face_data(id, |data, index| OutlineFont::new(data.to_vec(), index, size))
            .ok_or_else(|| FontError::NotFound(pattern.to_string()))?
    }
}

impl FontLoader for OutlineFontLoader {
    fn load(&self, spec: &FontSpec, base_dir: &Path) -> Result<Box<dyn FontFace>, FontError> {
        match spec {
            FontSpec::Bitmap { path } => Err(FontError::Unsupported(format!("fnt:{}", path))),
            FontSpec::Outline { path, size } => {
                let path = self.resolve(path, base_dir);
                let data = std::fs::read(&path).map_err(|source| FontError::Io { path, source })?;
                Ok(Box::new(OutlineFont::new(data, 0, *size)?))
            }
            FontSpec::Pattern { pattern, size } => Ok(Box::new(self.match_pattern(pattern, *size)?)),
        }
    }
}
