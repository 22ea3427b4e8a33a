//! Device capability layer.
//!
//! Submitters are written against the narrow [`GpuBackend`] / [`CommandBuffer`]
//! interface: make a one-shot command buffer, fetch the current drawable,
//! allocate an offscreen texture, commit. [`WgpuBackend`] implements it on top
//! of a wgpu device, queue and window surface.

mod backend;
mod error;
mod init;
mod poller;
mod surface;
mod wgpu_backend;

pub use backend::{CommandBuffer, CompletionHandler, GpuBackend};
pub use error::{SurfaceErrorAction, TextureAllocError};
pub use init::GpuInit;
pub use wgpu_backend::{RenderTexture, WgpuBackend, WgpuCommandBuffer, WgpuDrawable};
