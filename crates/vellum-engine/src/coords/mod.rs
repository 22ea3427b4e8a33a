//! Coordinate and geometry types shared by the scene, renderers and submitters.
//!
//! Canonical CPU space:
//! - Logical pixels (DPI-aware)
//! - Origin top-left
//! - +X right, +Y down
//!
//! Device pixels only appear where GPU resources are sized (`PixelSize`).

mod rect;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::{PixelSize, Viewport};
