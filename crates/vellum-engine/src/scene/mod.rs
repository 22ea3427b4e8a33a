//! Recording render context.
//!
//! Responsibilities:
//! - record primitives between `begin` and encode, in call order
//! - apply the current transform at record time so encoders see logical-pixel geometry
//! - own the texture registry behind [`crate::context::TextureHandle`]
//!
//! The scene is renderer-agnostic; `render::SceneRenderer` turns it into wgpu work.

mod primitive;
mod recorder;
mod registry;
mod transform;

pub use primitive::Primitive;
pub use recorder::Scene;
pub use registry::{PendingUpload, TextureRegistry};
pub use transform::Transform;
