//! Image objects with frame animation

use glcd_expr::TemplateString;

use super::{LoopMode, RenderContext, Scale};
use crate::canvas::Surface;
use crate::Rect;

#[derive(Debug, Clone, Default)]
struct ImageState {
    /// Path last rendered, `None` before the first render
    path: Option<String>,
    frame: usize,
    frame_count: usize,
    /// Delay of the displayed frame in milliseconds
    delay: u64,
    last_change: u64,
    loop_reached: bool,
}

/// `<image>`
#[derive(Debug, Clone)]
pub struct ImageObject {
    pub path: TemplateString,
    pub loop_mode: LoopMode,
    pub scale: Scale,
    state: ImageState,
}

impl ImageObject {
    pub fn new(path: TemplateString) -> Self {
        Self {
            path,
            loop_mode: LoopMode::Always,
            scale: Scale::None,
            state: ImageState::default(),
        }
    }

    /// Frame shown by the last render
    pub fn frame(&self) -> usize {
        self.state.frame
    }

    fn animates(&self) -> bool {
        self.state.frame_count > 1
            && match self.loop_mode {
                LoopMode::Never => false,
                LoopMode::Once => !self.state.loop_reached,
                LoopMode::Always => true,
            }
    }

    pub(crate) fn render(&mut self, ctx: &dyn RenderContext, surface: &mut dyn Surface, rect: Rect, now: u64) {
        let path = self.path.evaluate(ctx.as_eval()).to_string();
        if path.is_empty() {
            return;
        }
        if self.state.path.as_deref() != Some(path.as_str()) {
            self.state = ImageState {
                path: Some(path.clone()),
                last_change: now,
                ..ImageState::default()
            };
        }

        let (width, height) = self.scale.request(rect);
        let Some(image) = ctx.image(&path, width, height) else {
            return;
        };
        self.state.frame_count = image.frame_count();
        if self.state.frame >= self.state.frame_count {
            self.state.frame = 0;
        }

        let delay = u64::from(image.delay(self.state.frame));
        if self.animates() && now.saturating_sub(self.state.last_change) >= delay {
            if self.state.frame + 1 < self.state.frame_count {
                self.state.frame += 1;
            } else if self.loop_mode == LoopMode::Once {
                self.state.loop_reached = true;
            } else {
                self.state.frame = 0;
            }
            self.state.last_change = now;
        }
        self.state.delay = u64::from(image.delay(self.state.frame));

        surface.draw_image(rect.x1, rect.y1, &image, self.state.frame, rect);
    }

    pub(crate) fn needs_update(&self, ctx: &dyn RenderContext, now: u64) -> bool {
        let path = self.path.evaluate(ctx.as_eval()).to_string();
        if self.state.path.as_deref() != Some(path.as_str()) {
            return !path.is_empty();
        }
        self.animates() && now.saturating_sub(self.state.last_change) >= self.state.delay
    }
}
