//! Frame admission.
//!
//! A counting gate bounds how many frames may be in flight on the GPU at once.
//! The submission thread takes a permit before it starts a frame; the device's
//! completion callback gives it back. Only the count matters: completions may
//! arrive in any order and from any thread.

mod error;
mod frame_gate;
mod slot;

pub use error::GateError;
pub use frame_gate::{FrameGate, DEFAULT_MAX_FRAMES_IN_FLIGHT};
pub use slot::FrameSlot;
