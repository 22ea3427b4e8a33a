use anyhow::{Context, Result};

use crate::compositor::Compositor;
use crate::context::{FrameRecorder, RenderContext};
use crate::coords::{PixelSize, Viewport};
use crate::device::{CommandBuffer, GpuBackend, TextureAllocError};

use super::pacer::FramePacer;
use super::{FrameOutcome, FramePhase, SubmitterConfig};

/// Submitter that renders into an intermediate texture and composites it
/// full-screen onto the drawable.
///
/// The intermediate texture always matches the last successfully applied
/// size. A failed reallocation keeps the previous texture and is retried
/// before the next frame is encoded.
pub struct TileSubmitter<B: GpuBackend, C: RenderContext<B>, K: Compositor<B>> {
    context: C,
    compositor: K,
    intermediate: B::Texture,
    pending_size: Option<PixelSize>,
    backend: B,
    pacer: FramePacer,
}

impl<B, C, K> TileSubmitter<B, C, K>
where
    B: GpuBackend,
    C: RenderContext<B>,
    K: Compositor<B>,
{
    /// Allocates the first intermediate texture at `initial_size`.
    ///
    /// # Panics
    /// Panics if `config.max_frames_in_flight` is zero.
    pub fn new(
        mut backend: B,
        context: C,
        compositor: K,
        initial_size: PixelSize,
        config: &SubmitterConfig,
    ) -> Result<Self> {
        let intermediate = backend
            .create_render_texture(initial_size)
            .with_context(|| format!("allocating the initial {initial_size} intermediate texture"))?;

        log::debug!(
            "tile submitter: {initial_size} intermediate, {} frame(s) in flight",
            config.max_frames_in_flight
        );

        Ok(Self {
            context,
            compositor,
            intermediate,
            pending_size: None,
            backend,
            pacer: FramePacer::new("tile", config),
        })
    }

    /// Produces one frame.
    ///
    /// Blocks while the maximum number of frames is in flight. `recorder` runs
    /// exactly once unless the frame is skipped.
    pub fn draw_frame<R>(&mut self, viewport: Viewport, recorder: &mut R) -> Result<FrameOutcome>
    where
        R: FrameRecorder<C> + ?Sized,
    {
        let Some(slot) = self.pacer.admit(viewport) else {
            return Ok(FrameOutcome::Skipped);
        };
        let frame_index = slot.frame_index();

        self.context.begin(viewport);
        self.pacer.enter(FramePhase::Recording, frame_index);

        let mut buffer = self.backend.make_command_buffer("vellum tile frame");
        buffer.add_completed_handler(slot.into_completion_handler());

        recorder.record_frame(&mut self.context, viewport);

        if let Err(err) = self.apply_pending_size() {
            log::debug!("frame {frame_index}: rendering at the previous size ({err})");
        }

        let drawable = self
            .backend
            .current_drawable()
            .with_context(|| format!("frame {frame_index}: acquiring drawable"))?;

        let presented = match drawable {
            Some(drawable) => {
                self.context
                    .encode_offscreen(&self.backend, &mut buffer, &self.intermediate);
                self.pacer.enter(FramePhase::Encoded, frame_index);

                self.compositor
                    .composite(&self.backend, &mut buffer, &drawable, &self.intermediate);
                self.pacer.enter(FramePhase::Composited, frame_index);

                buffer.present(drawable);
                self.pacer.enter(FramePhase::Presented, frame_index);
                true
            }
            None => {
                log::debug!("frame {frame_index}: no drawable, committing without present");
                false
            }
        };

        buffer.commit();
        self.pacer.enter(FramePhase::Committed, frame_index);

        Ok(FrameOutcome::Committed { frame_index, presented })
    }

    /// Applies a new drawable size.
    ///
    /// The surface is always resized. The intermediate texture is reallocated
    /// when `size` differs from it; on failure the old texture stays in use
    /// and the error is returned. A retryable failure keeps `size` pending
    /// for the next frame; a size the device can never allocate is dropped.
    /// Zero sizes never allocate (such frames are skipped anyway).
    pub fn resize(&mut self, size: PixelSize) -> Result<(), TextureAllocError> {
        self.backend.resize_surface(size);

        if size.is_empty() {
            log::debug!("tile submitter: ignoring zero intermediate size");
            return Ok(());
        }
        if self.intermediate_size() == size {
            self.pending_size = None;
            return Ok(());
        }

        self.pending_size = Some(size);
        self.apply_pending_size().inspect_err(|err| {
            log::warn!("keeping the {} intermediate texture: {err}", self.intermediate_size());
        })
    }

    fn apply_pending_size(&mut self) -> Result<(), TextureAllocError> {
        let Some(size) = self.pending_size else {
            return Ok(());
        };

        match self.backend.create_render_texture(size) {
            Ok(texture) => {
                log::debug!("intermediate texture {} -> {size}", self.intermediate_size());
                self.intermediate = texture;
                self.pending_size = None;
                Ok(())
            }
            Err(err) => {
                if !err.is_retryable() {
                    self.pending_size = None;
                }
                Err(err)
            }
        }
    }

    /// Size of the texture the next frame renders into.
    #[inline]
    pub fn intermediate_size(&self) -> PixelSize {
        self.backend.texture_size(&self.intermediate)
    }

    /// Size requested by a resize that has not been applied yet.
    #[inline]
    pub fn pending_size(&self) -> Option<PixelSize> {
        self.pending_size
    }

    /// Stops producing frames and waits for in-flight ones.
    ///
    /// Returns `false` if frames were still outstanding when the wait timed out.
    pub fn shutdown(mut self) -> bool {
        self.pacer.drain()
    }

    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.pacer.phase()
    }

    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.pacer.gate().outstanding()
    }

    #[inline]
    pub fn frames_submitted(&self) -> u64 {
        self.pacer.frames_submitted()
    }

    #[inline]
    pub fn context(&self) -> &C {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B, C, K> Drop for TileSubmitter<B, C, K>
where
    B: GpuBackend,
    C: RenderContext<B>,
    K: Compositor<B>,
{
    fn drop(&mut self) {
        self.pacer.drain();
    }
}
