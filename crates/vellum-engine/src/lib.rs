//! Vellum engine crate.
//!
//! A GPU frame-submission scheduler: callers record primitives once per frame,
//! a submitter bounds how many frames are in flight on the device and commits
//! them either straight into the swap chain or through an offscreen texture
//! that is composited full-screen.
//!
//! Layers, leaves first:
//! - [`gate`]: counting gate bounding in-flight frames
//! - [`context`]: render-context contract and shared texture handles
//! - [`device`]: narrow backend capability plus the wgpu implementation
//! - [`submit`]: direct and tile submitters
//! - [`compositor`]: full-screen texture compositing
//! - [`scene`] / [`render`]: the recording context and its wgpu renderer
//! - [`window`]: winit runtime acting as frame trigger

pub mod compositor;
pub mod context;
pub mod coords;
pub mod core;
pub mod device;
pub mod gate;
pub mod logging;
pub mod paint;
pub mod render;
pub mod scene;
pub mod submit;
pub mod time;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;
