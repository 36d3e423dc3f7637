//! glcd Render - drawing layer for skins
//!
//! - [`Surface`] / [`Canvas`]: drawing primitives over a pixel buffer
//! - [`ImageCache`]: decoded images with reuse-count eviction
//! - [`FontRegistry`]: conditional, lazily loaded fonts
//! - [`Object`]: the render object tree with scroll and animation state

mod canvas;
pub mod font;
pub mod image;
pub mod object;

#[cfg(test)]
mod testing;

pub use canvas::{Canvas, Surface};
pub use font::{FontDef, FontError, FontFace, FontLoader, FontRegistry, FontSpec, Glyph, OutlineFontLoader};
pub use self::image::{CodecImageLoader, DecodedImage, ImageCache, ImageError, ImageFrame, ImageKey, ImageLoader};
pub use object::{
    Align, Bar, ButtonObject, ColorSpec, Direction, Geometry, ImageObject, InvalidValue, LoopMode, Object, ObjectKind,
    RenderContext, Scale, Span, TextObject, VAlign,
};

/// Color (RGBA)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const MAGENTA: Color = Color { r: 255, g: 0, b: 255, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };
    pub const CYAN: Color = Color { r: 0, g: 255, b: 255, a: 255 };
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// `0xAARRGGBB`
    pub fn from_argb(argb: u32) -> Self {
        let [a, r, g, b] = argb.to_be_bytes();
        Self { r, g, b, a }
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Parse a color name, `0xRRGGBB`, `0xAARRGGBB` or a decimal value.
    ///
    /// Values without an alpha byte are opaque.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let named = match text.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::RED),
            "green" => Some(Self::GREEN),
            "blue" => Some(Self::BLUE),
            "magenta" => Some(Self::MAGENTA),
            "yellow" => Some(Self::YELLOW),
            "cyan" => Some(Self::CYAN),
            "transparent" => Some(Self::TRANSPARENT),
            _ => None,
        };
        if named.is_some() {
            return named;
        }

        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            let value = u32::from_str_radix(hex, 16).ok()?;
            return match hex.len() {
                1..=6 => Some(Self::from_argb(0xFF00_0000 | value)),
                7 | 8 => Some(Self::from_argb(value)),
                _ => None,
            };
        }

        let value: u32 = text.parse().ok()?;
        if value <= 0x00FF_FFFF {
            Some(Self::from_argb(0xFF00_0000 | value))
        } else {
            Some(Self::from_argb(value))
        }
    }
}

/// Pixel rectangle given by its inclusive corners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Rectangle at `(x, y)` with the given size
    pub fn sized(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width - 1, y + height - 1)
    }

    pub fn width(&self) -> i32 {
        self.x2.saturating_sub(self.x1).saturating_add(1)
    }

    pub fn height(&self) -> i32 {
        self.y2.saturating_sub(self.y1).saturating_add(1)
    }

    pub fn is_empty(&self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Overlap of both rectangles, empty when they are disjoint
    pub fn intersect(&self, other: Rect) -> Self {
        Self::new(
            self.x1.max(other.x1),
            self.y1.max(other.y1),
            self.x2.min(other.x2),
            self.y2.min(other.y2),
        )
    }

    /// Same size, moved down by `dy`
    pub fn offset_y(&self, dy: i32) -> Self {
        Self::new(self.x1, self.y1 + dy, self.x2, self.y2 + dy)
    }
}
