//! Render context contract.
//!
//! A render context records primitives between [`RenderContext::begin`] and an
//! encode call, then translates them into GPU commands. The submitters treat
//! it as opaque: they begin it once per frame, hand it to the caller's
//! [`FrameRecorder`], and ask it to encode into either the presentable target
//! or an offscreen texture.

mod texture;

pub use texture::{TextureHandle, TextureId, TextureOwner};

use crate::coords::Viewport;
use crate::device::GpuBackend;

/// Opaque primitive recorder bound to one device backend.
///
/// Owned and mutated by a single submitter.
pub trait RenderContext<B: GpuBackend> {
    /// Drops everything recorded for the previous frame and establishes the
    /// coordinate space for `viewport`. Called exactly once per frame.
    fn begin(&mut self, viewport: Viewport);

    /// Encodes the recorded primitives into `buffer`, drawing into the
    /// presentable `target`.
    fn encode(&mut self, backend: &B, buffer: &mut B::CommandBuffer, target: &B::Drawable);

    /// Encodes the recorded primitives into an offscreen `target`.
    fn encode_offscreen(&mut self, backend: &B, buffer: &mut B::CommandBuffer, target: &B::Texture);
}

/// Caller-supplied per-frame drawing.
///
/// Invoked exactly once per non-skipped frame, synchronously on the submission
/// thread. Implementations only record primitives; they must not block.
pub trait FrameRecorder<C: ?Sized> {
    fn record_frame(&mut self, ctx: &mut C, viewport: Viewport);
}

impl<C: ?Sized, F> FrameRecorder<C> for F
where
    F: FnMut(&mut C, Viewport),
{
    #[inline]
    fn record_frame(&mut self, ctx: &mut C, viewport: Viewport) {
        self(ctx, viewport)
    }
}
