//! Canvas - pixel buffer and the drawing seam
//!
//! [`Surface`] only requires `draw_pixel`; every other primitive has a
//! default built on it. [`Canvas`] is the owned RGBA buffer that gets handed
//! to a display driver.

use crate::font::FontFace;
use crate::image::DecodedImage;
use crate::{Color, Rect};

/// Coverage at or above this value sets a pixel (displays are 1-bit deep)
const COVERAGE_THRESHOLD: u8 = 128;

/// Drawing target for render objects
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Set one pixel; out-of-range coordinates are ignored
    fn draw_pixel(&mut self, x: i32, y: i32, color: Color);

    /// Area that can receive pixels; primitives clip to it
    fn bounds(&self) -> Rect {
        Rect::sized(0, 0, self.width() as i32, self.height() as i32)
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: Color) {
        let bounds = self.bounds();
        let Some((x1, y1, x2, y2)) = clip_line(x1, y1, x2, y2, bounds) else {
            return;
        };
        // Bresenham
        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let sx = if x1 < x2 { 1 } else { -1 };
        let sy = if y1 < y2 { 1 } else { -1 };
        let (mut x, mut y) = (x1, y1);
        let mut err = dx + dy;
        loop {
            self.draw_pixel(x, y, color);
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn draw_rectangle(&mut self, rect: Rect, color: Color, filled: bool) {
        if rect.is_empty() {
            return;
        }
        if filled {
            let area = rect.intersect(self.bounds());
            for y in area.y1..=area.y2 {
                for x in area.x1..=area.x2 {
                    self.draw_pixel(x, y, color);
                }
            }
        } else {
            self.draw_line(rect.x1, rect.y1, rect.x2, rect.y1, color);
            self.draw_line(rect.x1, rect.y2, rect.x2, rect.y2, color);
            self.draw_line(rect.x1, rect.y1, rect.x1, rect.y2, color);
            self.draw_line(rect.x2, rect.y1, rect.x2, rect.y2, color);
        }
    }

    fn draw_round_rectangle(&mut self, rect: Rect, color: Color, filled: bool, radius: i32) {
        let radius = radius.clamp(0, rect.width().min(rect.height()) / 2);
        if radius == 0 {
            self.draw_rectangle(rect, color, filled);
            return;
        }
        let inside = |x: i32, y: i32| {
            if !rect.contains(x, y) {
                return false;
            }
            // Distance to the nearest corner center, only inside corner boxes
            let cx = if x < rect.x1 + radius {
                rect.x1 + radius
            } else if x > rect.x2 - radius {
                rect.x2 - radius
            } else {
                return true;
            };
            let cy = if y < rect.y1 + radius {
                rect.y1 + radius
            } else if y > rect.y2 - radius {
                rect.y2 - radius
            } else {
                return true;
            };
            let (dx, dy) = (i64::from(x - cx), i64::from(y - cy));
            dx * dx + dy * dy <= i64::from(radius) * i64::from(radius)
        };
        draw_shape(self, rect, color, filled, inside);
    }

    /// `quadrant`: 0 full, 1 top right, 2 top left, 3 bottom left,
    /// 4 bottom right. The ellipse fills `rect`; for a quadrant `rect` is
    /// the quarter's box.
    fn draw_ellipse(&mut self, rect: Rect, color: Color, filled: bool, quadrant: i32) {
        if rect.is_empty() {
            return;
        }
        // Center and radii in doubled coordinates keep the math integral
        let (x1, y1, x2, y2) = (i128::from(rect.x1), i128::from(rect.y1), i128::from(rect.x2), i128::from(rect.y2));
        let (w, h) = (i128::from(rect.width()), i128::from(rect.height()));
        let (cx2, cy2, rx2, ry2) = match quadrant {
            1 => (2 * x1, 2 * y2 + 1, 2 * w, 2 * h),
            2 => (2 * x2 + 1, 2 * y2 + 1, 2 * w, 2 * h),
            3 => (2 * x2 + 1, 2 * y1, 2 * w, 2 * h),
            4 => (2 * x1, 2 * y1, 2 * w, 2 * h),
            _ => (x1 + x2 + 1, y1 + y2 + 1, w, h),
        };
        let inside = |x: i32, y: i32| {
            if !rect.contains(x, y) {
                return false;
            }
            let dx = 2 * i128::from(x) + 1 - cx2;
            let dy = 2 * i128::from(y) + 1 - cy2;
            dx * dx * ry2 * ry2 + dy * dy * rx2 * rx2 <= rx2 * rx2 * ry2 * ry2
        };
        draw_shape(self, rect, color, filled, inside);
    }

    /// Quarter-cosine slope filling `rect`. `slope_type`: 0 rising, 1
    /// falling, 2 rising filled from the top, 3 falling filled from the top.
    fn draw_slope(&mut self, rect: Rect, color: Color, slope_type: i32) {
        if rect.is_empty() {
            return;
        }
        let width = rect.width();
        let height = rect.height();
        let area = rect.intersect(self.bounds());
        for x in area.x1..=area.x2 {
            let i = x - rect.x1;
            let t = if width > 1 { f64::from(i) / f64::from(width - 1) } else { 1.0 };
            let t = if slope_type % 2 == 1 { 1.0 - t } else { t };
            let level = ((1.0 - (t * std::f64::consts::PI).cos()) / 2.0 * f64::from(height)).round() as i32;
            let (top, bottom) = if slope_type >= 2 {
                (rect.y1, rect.y1.saturating_add(level - 1))
            } else {
                (rect.y2.saturating_sub(level - 1), rect.y2)
            };
            for y in top.max(area.y1)..=bottom.min(area.y2) {
                self.draw_pixel(x, y, color);
            }
        }
    }

    /// Draw one frame of `image` with its top-left corner at `(x, y)`,
    /// clipped to `clip`
    fn draw_image(&mut self, x: i32, y: i32, image: &DecodedImage, frame: usize, clip: Rect) {
        for iy in 0..image.height {
            for ix in 0..image.width {
                let (px, py) = (x + ix as i32, y + iy as i32);
                if !clip.contains(px, py) {
                    continue;
                }
                if let Some(color) = image.pixel(frame, ix, iy) {
                    if !color.is_transparent() {
                        self.draw_pixel(px, py, color);
                    }
                }
            }
        }
    }

    /// Draw `text` on one line starting at `x`, with the first `skip`
    /// pixel columns cut off and nothing drawn right of `max_x`.
    ///
    /// Returns the drawn width in pixels.
    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        max_x: i32,
        text: &str,
        font: &dyn FontFace,
        color: Color,
        bg: Color,
        skip: i32,
    ) -> i32 {
        let ascent = font.total_ascent();
        let cell_height = font.total_height();
        let mut pen = x - skip;
        for c in text.chars() {
            if pen > max_x {
                break;
            }
            let advance = font.char_width(c);
            if pen + advance <= x {
                pen += advance;
                continue;
            }
            if !bg.is_transparent() {
                for px in pen.max(x)..(pen + advance).min(max_x + 1) {
                    for py in y..y + cell_height {
                        self.draw_pixel(px, py, bg);
                    }
                }
            }
            if let Some(glyph) = font.glyph(c) {
                for row in 0..glyph.height as i32 {
                    for col in 0..glyph.width as i32 {
                        let px = pen + glyph.bearing_x + col;
                        if px < x || px > max_x || glyph.coverage_at(col, row) < COVERAGE_THRESHOLD {
                            continue;
                        }
                        self.draw_pixel(px, y + ascent - glyph.bearing_y + row, color);
                    }
                }
            }
            pen += advance;
        }
        (pen.min(max_x + 1) - x).max(0)
    }
}

/// Plot every pixel of `rect` that `inside` accepts; unfilled shapes keep
/// only pixels with a 4-neighbour outside the shape.
fn draw_shape<S: Surface + ?Sized>(
    surface: &mut S,
    rect: Rect,
    color: Color,
    filled: bool,
    inside: impl Fn(i32, i32) -> bool,
) {
    let area = rect.intersect(surface.bounds());
    for y in area.y1..=area.y2 {
        for x in area.x1..=area.x2 {
            if !inside(x, y) {
                continue;
            }
            let edge = !inside(x - 1, y) || !inside(x + 1, y) || !inside(x, y - 1) || !inside(x, y + 1);
            if filled || edge {
                surface.draw_pixel(x, y, color);
            }
        }
    }
}

/// Cut a line to `bounds` (Liang-Barsky); `None` when nothing is visible.
/// Lines already inside are returned unchanged.
fn clip_line(x1: i32, y1: i32, x2: i32, y2: i32, bounds: Rect) -> Option<(i32, i32, i32, i32)> {
    if bounds.is_empty() {
        return None;
    }
    if bounds.contains(x1, y1) && bounds.contains(x2, y2) {
        return Some((x1, y1, x2, y2));
    }
    let (fx1, fy1) = (f64::from(x1), f64::from(y1));
    let (dx, dy) = (f64::from(x2) - fx1, f64::from(y2) - fy1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-dx, fx1 - f64::from(bounds.x1)),
        (dx, f64::from(bounds.x2) - fx1),
        (-dy, fy1 - f64::from(bounds.y1)),
        (dy, f64::from(bounds.y2) - fy1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| ((fx1 + t * dx).round() as i32, (fy1 + t * dy).round() as i32);
    let (cx1, cy1) = at(t0);
    let (cx2, cy2) = at(t1);
    Some((cx1, cy1, cx2, cy2))
}

/// Pixel canvas
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Canvas {
    /// Create a new canvas cleared to white
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Color::WHITE)
    }

    pub fn with_background(width: u32, height: u32, background: Color) -> Self {
        let size = (width * height) as usize;
        Self {
            width,
            height,
            pixels: vec![background; size],
        }
    }

    /// Set a pixel color without blending
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            let idx = (y * self.width + x) as usize;
            self.pixels[idx] = color;
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }
}

impl Surface for Canvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: Color) {
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            return;
        };
        match color.a {
            0 => {}
            255 => self.set_pixel(x, y, color),
            alpha => {
                let Some(dst) = self.pixel(x, y) else {
                    return;
                };
                let mix = |s: u8, d: u8| ((u32::from(s) * u32::from(alpha) + u32::from(d) * (255 - u32::from(alpha))) / 255) as u8;
                let blended = Color::rgba(mix(color.r, dst.r), mix(color.g, dst.g), mix(color.b, dst.b), 255);
                self.set_pixel(x, y, blended);
            }
        }
    }
}
