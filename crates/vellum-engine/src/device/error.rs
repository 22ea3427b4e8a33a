use crate::coords::PixelSize;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; no drawable this frame.
    SkipFrame,
    /// Unrecoverable (commonly OOM); stop rendering.
    Fatal,
}

/// Recoverable failure to allocate an offscreen render texture.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureAllocError {
    #[error("cannot allocate a {0} texture")]
    ZeroSize(PixelSize),

    #[error("texture size {size} exceeds the device limit of {max} pixels per side")]
    TooLarge { size: PixelSize, max: u32 },

    #[error("device rejected a {size} texture: {message}")]
    Device { size: PixelSize, message: String },
}

impl TextureAllocError {
    /// Whether the same request may succeed later. Size errors never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Device { .. })
    }
}
