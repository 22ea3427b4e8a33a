//! Full-screen texture compositing for the tile path.
//!
//! The tile submitter renders a frame into an offscreen texture, then asks a
//! [`Compositor`] to copy that texture onto the presentable drawable.

mod texture;

pub use texture::TextureCompositor;

use crate::device::GpuBackend;

/// Draws an offscreen texture over the whole presentable target.
pub trait Compositor<B: GpuBackend> {
    /// Encodes one full-screen pass into `buffer` that clears `target` and
    /// samples `source` across it.
    fn composite(&self, backend: &B, buffer: &mut B::CommandBuffer, target: &B::Drawable, source: &B::Texture);
}
