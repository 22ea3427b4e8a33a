use anyhow::Result;

use crate::coords::PixelSize;

use super::TextureAllocError;

/// Callback run once when the device finishes a committed command buffer.
///
/// May run on any thread.
pub type CompletionHandler = Box<dyn FnOnce() + Send + 'static>;

/// One-shot unit of GPU work.
///
/// Owned by the submitter until [`commit`](CommandBuffer::commit) hands it to
/// the device queue. Buffers are committed in the order `commit` is called;
/// completion order is up to the device.
pub trait CommandBuffer {
    /// Presentable image this buffer may present.
    type Drawable;

    /// Registers a callback for when the device finishes this buffer.
    ///
    /// A buffer dropped without being committed drops its handlers unrun.
    fn add_completed_handler(&mut self, handler: CompletionHandler);

    /// Schedules `drawable` to be presented once this buffer's work is done.
    fn present(&mut self, drawable: Self::Drawable);

    /// Submits the buffer to the device queue.
    fn commit(self);
}

/// Device, queue and surface as seen by the frame submitters.
pub trait GpuBackend {
    /// Presentable surface image for one frame, including its pass target.
    type Drawable;
    /// Offscreen render target.
    type Texture;
    type CommandBuffer: CommandBuffer<Drawable = Self::Drawable>;

    /// Creates a fresh command buffer for one frame.
    fn make_command_buffer(&mut self, label: &str) -> Self::CommandBuffer;

    /// Returns the drawable for this frame, or `None` when the surface is not
    /// currently drawable.
    ///
    /// Errors are unrecoverable surface failures.
    fn current_drawable(&mut self) -> Result<Option<Self::Drawable>>;

    /// Allocates a texture that can be rendered into and then sampled.
    fn create_render_texture(&mut self, size: PixelSize) -> Result<Self::Texture, TextureAllocError>;

    fn texture_size(&self, texture: &Self::Texture) -> PixelSize;

    /// Resizes the presentable surface. A zero size defers reconfiguration.
    fn resize_surface(&mut self, size: PixelSize);
}
