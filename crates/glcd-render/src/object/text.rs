//! Text and button objects
//!
//! Text that does not fit its box scrolls horizontally when the object asks
//! for it: every `scroll_time` ms the offset moves by `scroll_speed` pixels
//! over `text + separator + text`, wrapping after one full cycle. With
//! [`LoopMode::Once`] the text stops back at its start after one pass.

use glcd_expr::{Function, TemplateString};

use super::{Align, LoopMode, RenderContext, VAlign};
use crate::canvas::Surface;
use crate::font::FontFace;
use crate::{Color, Rect};

pub const DEFAULT_SCROLL_SPEED: i32 = 1;
pub const DEFAULT_SCROLL_TIME: u64 = 100;

#[derive(Debug, Clone, Default)]
struct TextState {
    /// Content last rendered, `None` before the first render
    content: Option<String>,
    offset: i32,
    last_change: u64,
    scrolling: bool,
    loop_reached: bool,
}

impl TextState {
    fn fresh(content: String, now: u64) -> Self {
        Self {
            content: Some(content),
            last_change: now,
            ..Self::default()
        }
    }
}

/// `<text>` and `<scrolltext>`
#[derive(Debug, Clone)]
pub struct TextObject {
    pub font: String,
    pub text: TemplateString,
    pub align: Align,
    pub valign: VAlign,
    pub multiline: bool,
    pub scroll: LoopMode,
    /// Pixels per step
    pub scroll_speed: i32,
    /// Milliseconds per step
    pub scroll_time: u64,
    state: TextState,
}

impl TextObject {
    pub fn new(font: impl Into<String>, text: TemplateString) -> Self {
        Self {
            font: font.into(),
            text,
            align: Align::Left,
            valign: VAlign::Top,
            multiline: false,
            scroll: LoopMode::Never,
            scroll_speed: DEFAULT_SCROLL_SPEED,
            scroll_time: DEFAULT_SCROLL_TIME,
            state: TextState::default(),
        }
    }

    /// Text that scrolls forever when it does not fit
    pub fn scrolling(font: impl Into<String>, text: TemplateString) -> Self {
        Self {
            scroll: LoopMode::Always,
            ..Self::new(font, text)
        }
    }

    /// Current scroll offset in pixels
    pub fn scroll_offset(&self) -> i32 {
        self.state.offset
    }

    /// True once a `Once` scroll finished, or the text needs no scrolling
    pub fn loop_reached(&self) -> bool {
        self.state.loop_reached
    }

    pub(crate) fn render(
        &mut self,
        ctx: &dyn RenderContext,
        surface: &mut dyn Surface,
        rect: Rect,
        color: Color,
        bg: Color,
        now: u64,
    ) {
        let content = self.text.evaluate(ctx.as_eval()).to_string();
        if self.state.content.as_deref() != Some(content.as_str()) {
            self.state = TextState::fresh(content.clone(), now);
        }
        let Some(font) = ctx.font(&self.font) else {
            tracing::debug!("Text font '{}' not available", self.font);
            self.state.scrolling = false;
            self.state.loop_reached = true;
            return;
        };
        if !bg.is_transparent() {
            surface.draw_rectangle(rect, bg, true);
        }

        if self.multiline {
            self.state.loop_reached = true;
            let lines = wrap(&content, font, rect.width());
            let max_lines = (rect.height() / font.line_height().max(1)).max(1) as usize;
            let lines = &lines[..lines.len().min(max_lines)];
            let height = font.total_height() + (lines.len() as i32 - 1).max(0) * font.line_height();
            let mut y = valign_y(self.valign, rect, height);
            for line in lines {
                draw_line(ctx, surface, font, rect, y, line, self.align, color);
                y += font.line_height();
            }
            return;
        }

        let y = valign_y(self.valign, rect, font.total_height());
        let width = font.text_width(&content);
        if width <= rect.width() || self.scroll == LoopMode::Never {
            self.state.scrolling = false;
            self.state.loop_reached = true;
            draw_line(ctx, surface, font, rect, y, &content, self.align, color);
            return;
        }

        self.state.scrolling = true;
        if !self.state.loop_reached && now.saturating_sub(self.state.last_change) >= self.scroll_time {
            self.state.offset += self.scroll_speed.max(1);
            self.state.last_change = now;
            let cycle = width + font.text_width(ctx.scroll_separator());
            if self.state.offset >= cycle {
                if self.scroll == LoopMode::Once {
                    self.state.offset = 0;
                    self.state.loop_reached = true;
                } else {
                    self.state.offset -= cycle;
                }
            }
        }

        let flat = content.replace('\t', " ");
        if self.state.loop_reached {
            surface.draw_text(rect.x1, y, rect.x2, &flat, font, color, Color::TRANSPARENT, 0);
        } else {
            let looped = format!("{flat}{}{flat}", ctx.scroll_separator());
            surface.draw_text(rect.x1, y, rect.x2, &looped, font, color, Color::TRANSPARENT, self.state.offset);
        }
    }

    pub(crate) fn needs_update(&self, ctx: &dyn RenderContext, now: u64) -> bool {
        let content = self.text.evaluate(ctx.as_eval()).to_string();
        if self.state.content.as_deref() != Some(content.as_str()) {
            return true;
        }
        self.state.scrolling
            && !self.state.loop_reached
            && now.saturating_sub(self.state.last_change) >= self.scroll_time
    }
}

/// `<button>`: a framed, centered label
#[derive(Debug, Clone)]
pub struct ButtonObject {
    pub font: String,
    pub text: TemplateString,
    pub radius: Function,
}

impl ButtonObject {
    pub fn new(font: impl Into<String>, text: TemplateString) -> Self {
        Self {
            font: font.into(),
            text,
            radius: Function::number(0),
        }
    }

    pub(crate) fn render(
        &self,
        ctx: &dyn RenderContext,
        surface: &mut dyn Surface,
        rect: Rect,
        color: Color,
        bg: Color,
    ) {
        let radius = self.radius.evaluate_number(ctx.as_eval()) as i32;
        if !bg.is_transparent() {
            surface.draw_round_rectangle(rect, bg, true, radius);
        }
        surface.draw_round_rectangle(rect, color, false, radius);

        let Some(font) = ctx.font(&self.font) else {
            return;
        };
        let label = self.text.evaluate(ctx.as_eval()).to_string();
        let inner = Rect::new(rect.x1 + 1, rect.y1 + 1, rect.x2 - 1, rect.y2 - 1);
        let y = valign_y(VAlign::Middle, inner, font.total_height());
        draw_line(ctx, surface, font, inner, y, &label, Align::Center, color);
    }
}

fn valign_y(valign: VAlign, rect: Rect, height: i32) -> i32 {
    match valign {
        VAlign::Top => rect.y1,
        VAlign::Middle => rect.y1 + ((rect.height() - height) / 2).max(0),
        VAlign::Bottom => (rect.y2 - height + 1).max(rect.y1),
    }
}

/// One line, aligned in `rect`. Tab characters jump to the host's tab stops,
/// or one space width when it has none.
#[allow(clippy::too_many_arguments)]
fn draw_line(
    ctx: &dyn RenderContext,
    surface: &mut dyn Surface,
    font: &dyn FontFace,
    rect: Rect,
    y: i32,
    line: &str,
    align: Align,
    color: Color,
) {
    if line.contains('\t') {
        let mut x = rect.x1;
        for (i, column) in line.split('\t').enumerate() {
            if i > 0 {
                x = match ctx.tab_stop(i - 1, rect.width()) {
                    Some(stop) => (rect.x1 + stop).max(x),
                    None => x + font.char_width(' '),
                };
            }
            if x > rect.x2 {
                break;
            }
            x += surface.draw_text(x, y, rect.x2, column, font, color, Color::TRANSPARENT, 0);
        }
        return;
    }

    let width = font.text_width(line);
    let x = match align {
        Align::Left => rect.x1,
        Align::Center => rect.x1 + ((rect.width() - width) / 2).max(0),
        Align::Right => (rect.x2 - width + 1).max(rect.x1),
    };
    surface.draw_text(x, y, rect.x2, line, font, color, Color::TRANSPARENT, 0);
}

/// Greedy word wrap; explicit newlines always break. Words wider than the
/// box get a line of their own.
fn wrap(text: &str, font: &dyn FontFace, width: i32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if font.text_width(&candidate) <= width {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Object, ObjectKind};
    use crate::testing::{FixedFont, RecordingSurface, TestContext};

    fn text(ctx: &TestContext, template: &str) -> TextObject {
        TextObject::new("f", TemplateString::parse(template, ctx).unwrap())
    }

    fn box_of(width: i32) -> Rect {
        Rect::sized(0, 0, width, 8)
    }

    #[test]
    fn test_static_alignment() {
        let ctx = TestContext::default();
        for (align, x) in [(Align::Left, 0), (Align::Center, 12), (Align::Right, 24)] {
            let mut t = text(&ctx, "abc");
            t.align = align;
            let mut surface = RecordingSurface::new(64, 8);
            t.render(&ctx, &mut surface, box_of(42), Color::BLACK, Color::TRANSPARENT, 0);
            assert_eq!(surface.texts[0].x, x, "{align:?}");
            assert!(t.loop_reached());
        }
    }

    #[test]
    fn test_vertical_alignment() {
        let ctx = TestContext::default();
        let mut t = text(&ctx, "a");
        t.valign = VAlign::Bottom;
        let mut surface = RecordingSurface::new(64, 32);
        t.render(&ctx, &mut surface, Rect::sized(0, 0, 64, 20), Color::BLACK, Color::TRANSPARENT, 0);
        assert_eq!(surface.texts[0].y, 12);
    }

    #[test]
    fn test_long_text_without_scroll_is_clipped() {
        let ctx = TestContext::default();
        let mut t = text(&ctx, "abcdefgh");
        let mut surface = RecordingSurface::new(64, 8);
        t.render(&ctx, &mut surface, box_of(20), Color::BLACK, Color::TRANSPARENT, 0);
        assert_eq!(surface.texts[0].max_x, 19);
        assert_eq!(surface.texts[0].skip, 0);
        assert!(!t.needs_update(&ctx, 10_000));
    }

    #[test]
    fn test_scroll_once_stops_after_one_pass() {
        let ctx = TestContext::default().token("title", "abcdef");
        let mut t = TextObject::new("f", TemplateString::parse("{title}", &ctx).unwrap());
        t.scroll = LoopMode::Once;
        t.scroll_speed = 6;
        let mut surface = RecordingSurface::new(64, 8);

        // 36 px of text plus 30 px of separator: 11 steps of 6 px
        let mut now = 0;
        t.render(&ctx, &mut surface, box_of(10), Color::BLACK, Color::TRANSPARENT, now);
        for step in 1..=11 {
            now += DEFAULT_SCROLL_TIME;
            assert!(t.needs_update(&ctx, now), "step {step}");
            t.render(&ctx, &mut surface, box_of(10), Color::BLACK, Color::TRANSPARENT, now);
        }
        assert!(t.loop_reached());
        assert_eq!(t.scroll_offset(), 0);
        assert!(!t.needs_update(&ctx, now + 60_000));

        ctx.set_token("title", "ghijkl");
        assert!(t.needs_update(&ctx, now + 60_000));
        t.render(&ctx, &mut surface, box_of(10), Color::BLACK, Color::TRANSPARENT, now + 60_000);
        assert!(!t.loop_reached());
    }

    #[test]
    fn test_scroll_always_wraps() {
        let ctx = TestContext::default();
        let mut t = TextObject::scrolling("f", TemplateString::parse("abcdef", &ctx).unwrap());
        t.scroll_speed = 30;
        let mut surface = RecordingSurface::new(64, 8);
        for now in [0, 100, 200, 300] {
            t.render(&ctx, &mut surface, box_of(10), Color::BLACK, Color::TRANSPARENT, now);
        }
        // 90 px travelled over a 66 px cycle
        assert_eq!(t.scroll_offset(), 24);
        assert!(!t.loop_reached());
        assert!(t.needs_update(&ctx, 400));
        let last = surface.texts.last().unwrap();
        assert_eq!(last.text, "abcdef *** abcdef");
        assert_eq!(last.skip, 24);
    }

    #[test]
    fn test_scroll_waits_for_step_time() {
        let ctx = TestContext::default();
        let mut t = TextObject::scrolling("f", TemplateString::parse("abcdef", &ctx).unwrap());
        let mut surface = RecordingSurface::new(64, 8);
        t.render(&ctx, &mut surface, box_of(10), Color::BLACK, Color::TRANSPARENT, 1_000);
        assert!(!t.needs_update(&ctx, 1_050));
        t.render(&ctx, &mut surface, box_of(10), Color::BLACK, Color::TRANSPARENT, 1_050);
        assert_eq!(t.scroll_offset(), 0);
        assert!(t.needs_update(&ctx, 1_100));
    }

    #[test]
    fn test_multiline_wraps_words() {
        let ctx = TestContext::default();
        let mut t = text(&ctx, "aa bb cc\ndd");
        t.multiline = true;
        let mut surface = RecordingSurface::new(64, 64);
        t.render(&ctx, &mut surface, Rect::sized(0, 0, 36, 64), Color::BLACK, Color::TRANSPARENT, 0);
        let lines: Vec<(&str, i32)> = surface.texts.iter().map(|t| (t.text.as_str(), t.y)).collect();
        assert_eq!(lines, vec![("aa bb", 0), ("cc", 9), ("dd", 18)]);
    }

    #[test]
    fn test_tab_stops() {
        let ctx = TestContext::default().tab_stops(&[20, 40]);
        let mut t = text(&ctx, "a\tb\tc");
        let mut surface = RecordingSurface::new(64, 8);
        t.render(&ctx, &mut surface, box_of(64), Color::BLACK, Color::TRANSPARENT, 0);
        let xs: Vec<i32> = surface.texts.iter().map(|t| t.x).collect();
        assert_eq!(xs, vec![0, 20, 40]);
    }

    #[test]
    fn test_wrap_keeps_long_words() {
        let font = FixedFont::new(8);
        assert_eq!(wrap("abcdefgh ij", &font, 24), vec!["abcdefgh", "ij"]);
        assert_eq!(wrap("", &font, 24), vec![""]);
    }

    #[test]
    fn test_button_centers_label() {
        let ctx = TestContext::default();
        let button = ButtonObject::new("f", TemplateString::literal("ok"));
        let mut obj = Object::new(ObjectKind::Button(button));
        let mut surface = RecordingSurface::new(40, 20);
        obj.render(&ctx, &mut surface, Rect::sized(0, 0, 40, 20), 0);
        assert_eq!(surface.texts.len(), 1);
        // inner box 38x18, label 12x8
        assert_eq!((surface.texts[0].x, surface.texts[0].y), (14, 6));
    }

    #[test]
    fn test_missing_font_draws_nothing() {
        let ctx = TestContext::default();
        let mut t = TextObject::new("nope", TemplateString::literal("x"));
        let mut surface = RecordingSurface::new(8, 8);
        t.render(&ctx, &mut surface, box_of(8), Color::BLACK, Color::TRANSPARENT, 0);
        assert!(surface.texts.is_empty());
    }

    #[test]
    fn test_missing_font_settles() {
        let ctx = TestContext::default().token("title", "x");
        let mut t = TextObject::scrolling("nope", TemplateString::parse("{title}", &ctx).unwrap());
        assert!(t.needs_update(&ctx, 0));

        let mut surface = RecordingSurface::new(8, 8);
        t.render(&ctx, &mut surface, box_of(8), Color::BLACK, Color::TRANSPARENT, 0);
        assert!(!t.needs_update(&ctx, 1_000_000));

        ctx.set_token("title", "y");
        assert!(t.needs_update(&ctx, 1_000_000));
    }
}
