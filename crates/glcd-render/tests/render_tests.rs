//! Integration tests for glcd-render
//!
//! Object trees drawn onto a real canvas, with images decoded from disk
//! through the cache.

use std::cell::RefCell;
use std::sync::Arc;

use glcd_expr::{EvalContext, Extent, FontMetric, Function, ParseContext, TemplateString, Token, Value};
use glcd_render::{
    Canvas, CodecImageLoader, Color, ColorSpec, DecodedImage, FontFace, Geometry, Glyph, ImageCache, ImageObject,
    Object, ObjectKind, Rect, RenderContext, Span, TextObject,
};

// ============================================================================
// Fixtures
// ============================================================================

/// Solid 3x5 glyphs in 4 px cells
struct TinyFont {
    glyph: Arc<Glyph>,
}

impl TinyFont {
    fn new() -> Self {
        Self {
            glyph: Arc::new(Glyph {
                width: 3,
                height: 5,
                bearing_x: 0,
                bearing_y: 5,
                coverage: vec![255; 15],
            }),
        }
    }
}

impl FontFace for TinyFont {
    fn total_width(&self) -> i32 {
        4
    }

    fn total_height(&self) -> i32 {
        6
    }

    fn total_ascent(&self) -> i32 {
        5
    }

    fn space_between(&self) -> i32 {
        1
    }

    fn line_height(&self) -> i32 {
        7
    }

    fn char_width(&self, _c: char) -> i32 {
        4
    }

    fn glyph(&self, c: char) -> Option<Arc<Glyph>> {
        (c != ' ').then(|| Arc::clone(&self.glyph))
    }
}

struct Scene {
    font: TinyFont,
    images: RefCell<ImageCache>,
    level: i64,
}

impl Scene {
    fn new(dir: &std::path::Path) -> Self {
        Self {
            font: TinyFont::new(),
            images: RefCell::new(ImageCache::new(Box::new(CodecImageLoader::new()), dir, 4)),
            level: 0,
        }
    }
}

impl ParseContext for Scene {
    fn token_id(&self, name: &str) -> Option<u32> {
        (name == "level").then_some(0)
    }

    fn variable_text(&self, _id: &str) -> Option<String> {
        None
    }
}

impl EvalContext for Scene {
    fn token(&self, _token: &Token) -> Value {
        Value::Number(self.level)
    }

    fn variable(&self, _id: &str) -> Option<Value> {
        None
    }

    fn translate(&self, text: &str) -> String {
        text.to_string()
    }

    fn font_metric(&self, _font: &str, _metric: FontMetric) -> Option<i64> {
        None
    }

    fn text_extent(&self, _font: &str, _text: &str, _extent: Extent) -> Option<i64> {
        None
    }

    fn image_size(&self, path: &str) -> Option<(u32, u32)> {
        self.images.borrow_mut().get(path, None, None).map(|i| (i.width, i.height))
    }

    fn query_feature(&self, _feature: &str) -> Option<i64> {
        None
    }

    fn now(&self) -> u64 {
        0
    }

    fn tick_timestamp(&self) -> u64 {
        0
    }

    fn switch_timestamp(&self) -> u64 {
        0
    }
}

impl RenderContext for Scene {
    fn as_eval(&self) -> &dyn EvalContext {
        self
    }

    fn font(&self, id: &str) -> Option<&dyn FontFace> {
        (id == "tiny").then_some(&self.font as &dyn FontFace)
    }

    fn image(&self, path: &str, width: Option<u32>, height: Option<u32>) -> Option<Arc<DecodedImage>> {
        self.images.borrow_mut().get(path, width, height)
    }

    fn indexed_token(&self, token: &Token, _index: usize) -> Value {
        self.token(token)
    }
}

fn count(canvas: &Canvas, color: Color) -> usize {
    canvas.pixels.iter().filter(|p| **p == color).count()
}

// ============================================================================
// Images
// ============================================================================

#[test]
fn test_png_drawn_and_cached() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbaImage::from_pixel(4, 2, image::Rgba([255, 0, 0, 255]))
        .save(dir.path().join("dot.png"))
        .unwrap();
    let scene = Scene::new(dir.path());

    let mut obj = Object::new(ObjectKind::Image(ImageObject::new(TemplateString::literal("dot.png"))));
    obj.geometry = Geometry {
        x1: Function::number(1),
        y1: Function::number(1),
        ..Geometry::default()
    };
    let mut canvas = Canvas::new(8, 8);
    obj.render(&scene, &mut canvas, Rect::sized(0, 0, 8, 8), 0);
    obj.render(&scene, &mut canvas, Rect::sized(0, 0, 8, 8), 10);

    assert_eq!(count(&canvas, Color::RED), 8);
    assert_eq!(canvas.pixel(1, 1), Some(Color::RED));
    assert_eq!(canvas.pixel(0, 0), Some(Color::WHITE));
    let cache = scene.images.borrow();
    assert_eq!((cache.len(), cache.hits(), cache.misses()), (1, 1, 1));
}

#[test]
fn test_image_scaled_to_box() {
    let dir = tempfile::tempdir().unwrap();
    image::RgbaImage::from_pixel(8, 4, image::Rgba([0, 0, 255, 255]))
        .save(dir.path().join("wide.png"))
        .unwrap();
    let scene = Scene::new(dir.path());

    let mut image = ImageObject::new(TemplateString::literal("wide.png"));
    image.scale = "width".parse().unwrap();
    let mut obj = Object::new(ObjectKind::Image(image));
    obj.geometry.x2 = Span::Length(Function::number(4));
    let mut canvas = Canvas::new(8, 8);
    obj.render(&scene, &mut canvas, Rect::sized(0, 0, 8, 8), 0);

    assert_eq!(count(&canvas, Color::BLUE), 4 * 2);
    assert_eq!(scene.image_size("wide.png"), Some((8, 4)));
}

#[test]
fn test_broken_image_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.png"), b"\x89PNG broken").unwrap();
    let scene = Scene::new(dir.path());

    let mut obj = Object::new(ObjectKind::Image(ImageObject::new(TemplateString::literal("bad.png"))));
    let mut canvas = Canvas::new(4, 4);
    obj.render(&scene, &mut canvas, Rect::sized(0, 0, 4, 4), 0);
    obj.render(&scene, &mut canvas, Rect::sized(0, 0, 4, 4), 100);

    assert_eq!(count(&canvas, Color::WHITE), 16);
    assert!(scene.images.borrow().has_failed("bad.png"));
}

// ============================================================================
// Text and shapes
// ============================================================================

#[test]
fn test_text_glyphs_clipped_to_box() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::new(dir.path());
    let mut obj = Object::new(ObjectKind::Text(TextObject::new("tiny", TemplateString::literal("ab"))));
    obj.geometry.x2 = Span::Length(Function::number(5));

    let mut canvas = Canvas::new(16, 8);
    obj.render(&scene, &mut canvas, Rect::sized(0, 0, 16, 8), 0);
    // one full glyph plus the first column of the second
    assert_eq!(count(&canvas, Color::BLACK), 3 * 5 + 5);
    assert_eq!(canvas.pixel(4, 0), Some(Color::BLACK));
    assert_eq!(canvas.pixel(5, 0), Some(Color::WHITE));
}

#[test]
fn test_block_background_and_children() {
    let dir = tempfile::tempdir().unwrap();
    let scene = Scene::new(dir.path());
    let child = Object::new(ObjectKind::Line);
    let mut block = Object::new(ObjectKind::Block(vec![child]));
    block.bgcolor = ColorSpec::Fixed(Color::YELLOW);
    block.geometry = Geometry {
        x1: Function::number(2),
        y1: Function::number(2),
        x2: Span::Length(Function::number(4)),
        y2: Span::Length(Function::number(1)),
    };

    let mut canvas = Canvas::new(8, 4);
    block.render(&scene, &mut canvas, Rect::sized(0, 0, 8, 4), 0);
    assert_eq!(count(&canvas, Color::BLACK), 4);
    assert_eq!(canvas.pixel(2, 2), Some(Color::BLACK));
    assert_eq!(canvas.pixel(1, 2), Some(Color::WHITE));
}

#[test]
fn test_progress_follows_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut scene = Scene::new(dir.path());
    let bar = glcd_render::Bar::new(
        Function::parse("{level}", &scene).unwrap(),
        Function::number(8),
    );
    let mut obj = Object::new(ObjectKind::Progress(bar));

    for (level, expected) in [(0, 0), (3, 3), (20, 8)] {
        scene.level = level;
        let mut canvas = Canvas::new(8, 1);
        obj.render(&scene, &mut canvas, Rect::sized(0, 0, 8, 1), 0);
        assert_eq!(count(&canvas, Color::BLACK), expected, "level {level}");
    }
}
