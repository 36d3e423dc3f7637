//! Render objects
//!
//! An [`Object`] is the common part every drawable shares (geometry, colors,
//! visibility condition) plus an [`ObjectKind`] holding what only that kind
//! needs. Containers own their children. Nothing keeps a pointer back to
//! its parent or skin: the [`RenderContext`] is passed into every call.
//!
//! Animated kinds (text, image) carry their own state, advanced by
//! [`Object::render`] and inspected by [`Object::needs_update`].

mod animated;
mod bar;
mod text;

use std::str::FromStr;
use std::sync::Arc;

use glcd_expr::{EvalContext, Extent, FontMetric, Function, ParseContext, Token, Value};

use crate::canvas::Surface;
use crate::font::FontFace;
use crate::image::DecodedImage;
use crate::{Color, Rect};

pub use animated::ImageObject;
pub use bar::Bar;
pub use text::{ButtonObject, TextObject};

/// Separator between the end and the restart of looping scroll text
pub const DEFAULT_SCROLL_SEPARATOR: &str = " *** ";

/// What a skin provides while its objects render
pub trait RenderContext: EvalContext {
    fn as_eval(&self) -> &dyn EvalContext;

    /// First font with this id whose condition holds
    fn font(&self, id: &str) -> Option<&dyn FontFace>;

    /// Image through the skin's cache
    fn image(&self, path: &str, width: Option<u32>, height: Option<u32>) -> Option<Arc<DecodedImage>>;

    /// Token value for row `index` of a list
    fn indexed_token(&self, token: &Token, index: usize) -> Value;

    /// Pixel offset of tab stop `index` inside a box `width` pixels wide
    fn tab_stop(&self, _index: usize, _width: i32) -> Option<i32> {
        None
    }

    fn scroll_separator(&self) -> &str {
        DEFAULT_SCROLL_SEPARATOR
    }
}

/// Invalid keyword in an object attribute
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
}

impl InvalidValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Align {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(InvalidValue::new("align", s)),
        }
    }
}

/// Vertical text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VAlign {
    #[default]
    Top,
    Middle,
    Bottom,
}

impl FromStr for VAlign {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "middle" | "center" => Ok(Self::Middle),
            "bottom" => Ok(Self::Bottom),
            _ => Err(InvalidValue::new("valign", s)),
        }
    }
}

/// Scroll and animation repeat policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Never,
    Once,
    Always,
}

impl FromStr for LoopMode {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" | "no" => Ok(Self::Never),
            "once" => Ok(Self::Once),
            "always" | "yes" => Ok(Self::Always),
            _ => Err(InvalidValue::new("loop mode", s)),
        }
    }
}

/// Growth direction of progress bars and scrollbars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    LeftToRight,
    TopToBottom,
    RightToLeft,
    BottomToTop,
}

impl Direction {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::TopToBottom | Self::BottomToTop)
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, Self::RightToLeft | Self::BottomToTop)
    }
}

impl FromStr for Direction {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "ltr" => Ok(Self::LeftToRight),
            "1" | "ttb" => Ok(Self::TopToBottom),
            "2" | "rtl" => Ok(Self::RightToLeft),
            "3" | "btt" => Ok(Self::BottomToTop),
            _ => Err(InvalidValue::new("direction", s)),
        }
    }
}

/// Which box sides an image is scaled to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    #[default]
    None,
    Fill,
    Width,
    Height,
}

impl Scale {
    /// Requested cache scale for a box
    pub fn request(self, rect: Rect) -> (Option<u32>, Option<u32>) {
        let w = u32::try_from(rect.width()).ok().filter(|&w| w > 0);
        let h = u32::try_from(rect.height()).ok().filter(|&h| h > 0);
        match self {
            Self::None => (None, None),
            Self::Fill => (w, h),
            Self::Width => (w, None),
            Self::Height => (None, h),
        }
    }
}

impl FromStr for Scale {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "fill" => Ok(Self::Fill),
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            _ => Err(InvalidValue::new("scale", s)),
        }
    }
}

/// Right or bottom bound of an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// `x2` / `y2`: a coordinate, negative counts from the far edge
    End(Function),
    /// `width` / `height`
    Length(Function),
}

/// Object box as expressions, resolved against the container at render time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub x1: Function,
    pub y1: Function,
    pub x2: Span,
    pub y2: Span,
}

impl Default for Geometry {
    /// The whole container
    fn default() -> Self {
        Self {
            x1: Function::number(0),
            y1: Function::number(0),
            x2: Span::End(Function::number(-1)),
            y2: Span::End(Function::number(-1)),
        }
    }
}

impl Geometry {
    pub fn resolve(&self, ctx: &dyn EvalContext, container: Rect) -> Rect {
        let coord = |f: &Function| f.evaluate_number(ctx).clamp(i64::from(i32::MIN / 2), i64::from(i32::MAX / 2)) as i32;
        let edge = |value: i32, origin: i32, size: i32| if value < 0 { origin + size + value } else { origin + value };

        let x1 = edge(coord(&self.x1), container.x1, container.width());
        let y1 = edge(coord(&self.y1), container.y1, container.height());
        let x2 = match &self.x2 {
            Span::End(f) => edge(coord(f), container.x1, container.width()),
            Span::Length(f) => x1 + coord(f) - 1,
        };
        let y2 = match &self.y2 {
            Span::End(f) => edge(coord(f), container.y1, container.height()),
            Span::Length(f) => y1 + coord(f) - 1,
        };
        Rect::new(x1, y1, x2, y2)
    }
}

/// A fixed color or a `#variable` looked up at render time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorSpec {
    Fixed(Color),
    Variable(String),
}

impl ColorSpec {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().strip_prefix('#') {
            Some(id) if !id.is_empty() => Some(Self::Variable(id.to_string())),
            Some(_) => None,
            None => Color::parse(text).map(Self::Fixed),
        }
    }

    pub fn resolve(&self, ctx: &dyn EvalContext, fallback: Color) -> Color {
        match self {
            Self::Fixed(color) => *color,
            Self::Variable(id) => ctx
                .variable(id)
                .and_then(|value| Color::parse(&value.to_string()))
                .unwrap_or(fallback),
        }
    }
}

/// Per-kind data of a render object
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Pixel,
    Line,
    Rectangle { filled: bool, radius: Function },
    Ellipse { filled: bool, arc: Function },
    Slope { arc: Function },
    Image(ImageObject),
    Progress(Bar),
    Scrollbar(Bar),
    Text(TextObject),
    Button(ButtonObject),
    Block(Vec<Object>),
    /// First child is the [`ObjectKind::Item`] row template; `rows` holds
    /// the per-row copies of the other children once rendered
    List {
        children: Vec<Object>,
        rows: Option<Vec<Vec<Object>>>,
    },
    /// Row template of a list; `height` is the row height
    Item { height: Function },
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pixel => "pixel",
            Self::Line => "line",
            Self::Rectangle { .. } => "rectangle",
            Self::Ellipse { .. } => "ellipse",
            Self::Slope { .. } => "slope",
            Self::Image(_) => "image",
            Self::Progress(_) => "progress",
            Self::Scrollbar(_) => "scrollbar",
            Self::Text(_) => "text",
            Self::Button(_) => "button",
            Self::Block(_) => "block",
            Self::List { .. } => "list",
            Self::Item { .. } => "item",
        }
    }

    /// List container with `children`, starting with its item template
    pub fn list(children: Vec<Object>) -> Self {
        Self::List { children, rows: None }
    }

    /// Child list of containers
    pub fn children_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Self::Block(children) | Self::List { children, .. } => Some(children),
            _ => None,
        }
    }
}

/// A drawable node of a display
#[derive(Debug, Clone)]
pub struct Object {
    pub geometry: Geometry,
    pub color: ColorSpec,
    pub bgcolor: ColorSpec,
    pub condition: Option<Function>,
    pub kind: ObjectKind,
}

impl Object {
    /// Object covering its whole container, black on transparent
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            geometry: Geometry::default(),
            color: ColorSpec::Fixed(Color::BLACK),
            bgcolor: ColorSpec::Fixed(Color::TRANSPARENT),
            condition: None,
            kind,
        }
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_condition(mut self, condition: Function) -> Self {
        self.condition = Some(condition);
        self
    }

    fn visible(&self, ctx: &dyn EvalContext) -> bool {
        self.condition.as_ref().is_none_or(|c| c.evaluate_bool(ctx))
    }

    /// Draw the object into `container`, advancing animation state to `now`
    pub fn render(&mut self, ctx: &dyn RenderContext, surface: &mut dyn Surface, container: Rect, now: u64) {
        let eval = ctx.as_eval();
        if !self.visible(eval) {
            return;
        }
        let rect = self.geometry.resolve(eval, container);
        let color = self.color.resolve(eval, Color::BLACK);
        let bg = self.bgcolor.resolve(eval, Color::TRANSPARENT);

        match &mut self.kind {
            ObjectKind::Pixel => surface.draw_pixel(rect.x1, rect.y1, color),
            ObjectKind::Line => surface.draw_line(rect.x1, rect.y1, rect.x2, rect.y2, color),
            ObjectKind::Rectangle { filled, radius } => {
                let radius = radius.evaluate_number(eval) as i32;
                if radius > 0 {
                    surface.draw_round_rectangle(rect, color, *filled, radius);
                } else {
                    surface.draw_rectangle(rect, color, *filled);
                }
            }
            ObjectKind::Ellipse { filled, arc } => {
                surface.draw_ellipse(rect, color, *filled, arc.evaluate_number(eval) as i32);
            }
            ObjectKind::Slope { arc } => surface.draw_slope(rect, color, arc.evaluate_number(eval) as i32),
            ObjectKind::Image(image) => image.render(ctx, surface, rect, now),
            ObjectKind::Progress(bar) => bar.render_progress(eval, surface, rect, color, bg),
            ObjectKind::Scrollbar(bar) => bar.render_scrollbar(eval, surface, rect, color, bg),
            ObjectKind::Text(text) => text.render(ctx, surface, rect, color, bg, now),
            ObjectKind::Button(button) => button.render(ctx, surface, rect, color, bg),
            ObjectKind::Block(children) => {
                if !bg.is_transparent() {
                    surface.draw_rectangle(rect, bg, true);
                }
                for child in children {
                    child.render(ctx, surface, rect, now);
                }
            }
            ObjectKind::List { children, rows } => render_list(children, rows, ctx, surface, rect, now),
            ObjectKind::Item { .. } => {}
        }
    }

    /// True when rendering at `now` would change the output: an animation
    /// step is due or displayed content changed.
    ///
    /// Never mutates state.
    pub fn needs_update(&self, ctx: &dyn RenderContext, now: u64) -> bool {
        if !self.visible(ctx.as_eval()) {
            return false;
        }
        match &self.kind {
            ObjectKind::Image(image) => image.needs_update(ctx, now),
            ObjectKind::Text(text) => text.needs_update(ctx, now),
            ObjectKind::Block(children) => children.iter().any(|c| c.needs_update(ctx, now)),
            ObjectKind::List { rows: None, .. } => true,
            ObjectKind::List { rows: Some(rows), .. } => rows.iter().enumerate().any(|(index, row)| {
                let row_ctx = ListRow { inner: ctx, index };
                row.iter().any(|c| c.needs_update(&row_ctx, now))
            }),
            _ => false,
        }
    }
}

/// Each row owns copies of the template children, kept between renders so
/// their animation state survives; rows are added or dropped only when the
/// row count changes.
fn render_list(
    children: &[Object],
    rows: &mut Option<Vec<Vec<Object>>>,
    ctx: &dyn RenderContext,
    surface: &mut dyn Surface,
    rect: Rect,
    now: u64,
) {
    let rows = rows.get_or_insert_with(Vec::new);
    let Some((item, template)) = children.split_first() else {
        return;
    };
    let ObjectKind::Item { height } = &item.kind else {
        tracing::warn!("List without an item template, skipped");
        return;
    };
    let item_height = height.evaluate_number(ctx.as_eval()) as i32;
    let count = if item_height > 0 { (rect.height() / item_height).max(0) as usize } else { 0 };
    rows.truncate(count);
    while rows.len() < count {
        rows.push(template.to_vec());
    }

    for (index, row) in rows.iter_mut().enumerate() {
        let row_ctx = ListRow { inner: ctx, index };
        let row_rect =
            Rect::new(rect.x1, rect.y1, rect.x2, rect.y1 + item_height - 1).offset_y(index as i32 * item_height);
        for child in row {
            child.render(&row_ctx, surface, row_rect, now);
        }
    }
}

/// Context for one list row: token lookups receive the row index
struct ListRow<'a> {
    inner: &'a dyn RenderContext,
    index: usize,
}

impl ParseContext for ListRow<'_> {
    fn token_id(&self, name: &str) -> Option<u32> {
        self.inner.token_id(name)
    }

    fn variable_text(&self, id: &str) -> Option<String> {
        self.inner.variable_text(id)
    }
}

impl EvalContext for ListRow<'_> {
    fn token(&self, token: &Token) -> Value {
        self.inner.indexed_token(token, self.index)
    }

    fn variable(&self, id: &str) -> Option<Value> {
        self.inner.variable(id)
    }

    fn translate(&self, text: &str) -> String {
        self.inner.translate(text)
    }

    fn font_metric(&self, font: &str, metric: FontMetric) -> Option<i64> {
        self.inner.font_metric(font, metric)
    }

    fn text_extent(&self, font: &str, text: &str, extent: Extent) -> Option<i64> {
        self.inner.text_extent(font, text, extent)
    }

    fn image_size(&self, path: &str) -> Option<(u32, u32)> {
        self.inner.image_size(path)
    }

    fn query_feature(&self, feature: &str) -> Option<i64> {
        self.inner.query_feature(feature)
    }

    fn now(&self) -> u64 {
        self.inner.now()
    }

    fn tick_timestamp(&self) -> u64 {
        self.inner.tick_timestamp()
    }

    fn switch_timestamp(&self) -> u64 {
        self.inner.switch_timestamp()
    }
}

impl RenderContext for ListRow<'_> {
    fn as_eval(&self) -> &dyn EvalContext {
        self
    }

    fn font(&self, id: &str) -> Option<&dyn FontFace> {
        self.inner.font(id)
    }

    fn image(&self, path: &str, width: Option<u32>, height: Option<u32>) -> Option<Arc<DecodedImage>> {
        self.inner.image(path, width, height)
    }

    fn indexed_token(&self, token: &Token, index: usize) -> Value {
        self.inner.indexed_token(token, index)
    }

    fn tab_stop(&self, index: usize, width: i32) -> Option<i32> {
        self.inner.tab_stop(index, width)
    }

    fn scroll_separator(&self) -> &str {
        self.inner.scroll_separator()
    }
}
