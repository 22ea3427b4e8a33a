//! GPU rendering of recorded scenes.
//!
//! [`SceneRenderer`] is the wgpu [`crate::context::RenderContext`]: it owns a
//! [`crate::scene::Scene`] for recording and the pipelines that draw it.
//!
//! Convention:
//! - CPU geometry is in logical pixels (top-left origin, +Y down).
//! - Vertex shaders convert to NDC using a viewport uniform.
//! - Colors and texels are premultiplied.

mod batch;
mod common;
mod images;
mod scene_renderer;
mod shapes;

pub use scene_renderer::SceneRenderer;
