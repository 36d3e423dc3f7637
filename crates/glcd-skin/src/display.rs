//! Displays: named layouts of a skin

use glcd_render::{Object, Rect, RenderContext, Surface};

/// One layout, drawn onto the whole surface
#[derive(Debug, Clone)]
pub struct Display {
    id: String,
    objects: Vec<Object>,
}

impl Display {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            objects: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    pub fn push(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// Draw every object in declaration order
    pub fn render(&mut self, ctx: &dyn RenderContext, surface: &mut dyn Surface, now: u64) {
        let screen = Rect::sized(0, 0, surface.width() as i32, surface.height() as i32);
        for object in &mut self.objects {
            object.render(ctx, surface, screen, now);
        }
    }

    /// True when any object has an animation step due or changed content
    pub fn needs_update(&self, ctx: &dyn RenderContext, now: u64) -> bool {
        self.objects.iter().any(|o| o.needs_update(ctx, now))
    }
}
