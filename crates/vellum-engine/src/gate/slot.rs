use std::fmt;
use std::sync::Arc;

use crate::device::CompletionHandler;

use super::FrameGate;

/// An acquired admission permit for one frame.
///
/// Dropping the slot releases the permit, so it is returned exactly once
/// whether the frame's completion handler runs or its command buffer is
/// discarded before commit.
pub struct FrameSlot {
    gate: Arc<FrameGate>,
    frame_index: u64,
}

impl FrameSlot {
    pub(super) fn new(gate: Arc<FrameGate>, frame_index: u64) -> Self {
        Self { gate, frame_index }
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Moves the slot into a completion callback for a command buffer.
    ///
    /// The permit returns to the gate when the callback runs, or when it is
    /// dropped unrun.
    pub fn into_completion_handler(self) -> CompletionHandler {
        Box::new(move || {
            log::trace!("frame {} completed on the device", self.frame_index);
            drop(self);
        })
    }
}

impl Drop for FrameSlot {
    fn drop(&mut self) {
        self.gate.release();
    }
}

impl fmt::Debug for FrameSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameSlot")
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}
