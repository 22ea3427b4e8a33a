//! Frame timing for recorders that animate.

mod clock;

pub use clock::{FrameClock, FrameTime};
