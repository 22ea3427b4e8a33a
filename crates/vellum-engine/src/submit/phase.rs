use std::fmt;

/// Progress of the most recent frame through a submitter.
///
/// `Composited` only occurs on the tile path. After `Committed` the frame
/// belongs to the device; its permit comes back asynchronously.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FramePhase {
    #[default]
    Idle,
    Admitted,
    Recording,
    Encoded,
    Composited,
    Presented,
    Committed,
}

impl fmt::Display for FramePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of one `draw_frame` call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The viewport had zero area; nothing was acquired or submitted.
    Skipped,
    /// A command buffer was committed. `presented` is false when the surface
    /// had no drawable for this frame.
    Committed { frame_index: u64, presented: bool },
}

impl FrameOutcome {
    #[inline]
    pub fn is_presented(self) -> bool {
        matches!(self, FrameOutcome::Committed { presented: true, .. })
    }
}
