use crate::context::TextureHandle;
use crate::coords::{Rect, Vec2};
use crate::paint::Color;

/// One recorded drawing operation, already in logical-pixel space.
///
/// `Image` keeps its texture alive for as long as the primitive is recorded.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Filled rectangle; `radius > 0` rounds every corner.
    Rect { rect: Rect, radius: f32, color: Color },
    Circle { center: Vec2, radius: f32, color: Color },
    /// Single line of text anchored at its top-left `origin`; `size` is the font size.
    Text { text: String, origin: Vec2, size: f32, color: Color },
    Image { rect: Rect, texture: TextureHandle, opacity: f32 },
}

impl Primitive {
    /// Short name used in logs and tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Primitive::Rect { radius, .. } if *radius > 0.0 => "rounded_rect",
            Primitive::Rect { .. } => "rect",
            Primitive::Circle { .. } => "circle",
            Primitive::Text { .. } => "text",
            Primitive::Image { .. } => "image",
        }
    }
}
