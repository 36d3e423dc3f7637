//! Progress bars and scrollbars

use glcd_expr::{EvalContext, Function};

use super::Direction;
use crate::canvas::Surface;
use crate::{Color, Rect};

/// `<progress>` and `<scrollbar>`
#[derive(Debug, Clone)]
pub struct Bar {
    pub direction: Direction,
    pub current: Function,
    pub total: Function,
    /// Progress only: position of a marker line
    pub peak: Option<Function>,
}

impl Bar {
    pub fn new(current: Function, total: Function) -> Self {
        Self {
            direction: Direction::LeftToRight,
            current,
            total,
            peak: None,
        }
    }

    fn axis_length(&self, rect: Rect) -> i32 {
        if self.direction.is_vertical() { rect.height() } else { rect.width() }
    }

    /// Sub-rectangle covering `[start, start + len)` along the bar axis,
    /// measured from the edge the bar grows from
    fn segment(&self, rect: Rect, start: i32, len: i32) -> Rect {
        let (from, to) = (start, start + len - 1);
        match self.direction {
            Direction::LeftToRight => Rect::new(rect.x1 + from, rect.y1, rect.x1 + to, rect.y2),
            Direction::RightToLeft => Rect::new(rect.x2 - to, rect.y1, rect.x2 - from, rect.y2),
            Direction::TopToBottom => Rect::new(rect.x1, rect.y1 + from, rect.x2, rect.y1 + to),
            Direction::BottomToTop => Rect::new(rect.x1, rect.y2 - to, rect.x2, rect.y2 - from),
        }
    }

    /// Fill proportional to `current / total`, clamped to the box
    pub(crate) fn render_progress(
        &self,
        ctx: &dyn EvalContext,
        surface: &mut dyn Surface,
        rect: Rect,
        color: Color,
        bg: Color,
    ) {
        if !bg.is_transparent() {
            surface.draw_rectangle(rect, bg, true);
        }
        let total = self.total.evaluate_number(ctx);
        if total <= 0 {
            return;
        }
        // i128 keeps `length * value` exact for any token value
        let (length, total) = (i128::from(self.axis_length(rect)), i128::from(total));
        let fill = |value: i64| (length * i128::from(value).clamp(0, total) / total) as i32;

        let filled = fill(self.current.evaluate_number(ctx));
        if filled > 0 {
            surface.draw_rectangle(self.segment(rect, 0, filled), color, true);
        }
        if let Some(peak) = &self.peak {
            let at = fill(peak.evaluate_number(ctx));
            if at > 0 {
                surface.draw_rectangle(self.segment(rect, at - 1, 1), color, true);
            }
        }
    }

    /// Thumb on a centered track line. `current` is the position in
    /// `[0, total]`; the thumb shrinks as `total` grows.
    pub(crate) fn render_scrollbar(
        &self,
        ctx: &dyn EvalContext,
        surface: &mut dyn Surface,
        rect: Rect,
        color: Color,
        bg: Color,
    ) {
        if !bg.is_transparent() {
            surface.draw_rectangle(rect, bg, true);
        }
        let length = self.axis_length(rect);
        if length <= 0 {
            return;
        }
        if self.direction.is_vertical() {
            let x = rect.x1 + rect.width() / 2;
            surface.draw_line(x, rect.y1, x, rect.y2, color);
        } else {
            let y = rect.y1 + rect.height() / 2;
            surface.draw_line(rect.x1, y, rect.x2, y, color);
        }

        let total = i128::from(self.total.evaluate_number(ctx).max(0));
        let current = i128::from(self.current.evaluate_number(ctx)).clamp(0, total);
        let thumb = (i128::from(length) / (total + 1)).max(1) as i32;
        let start = if total == 0 { 0 } else { (i128::from(length - thumb) * current / total) as i32 };
        surface.draw_rectangle(self.segment(rect, start, thumb), color, true);
    }
}
