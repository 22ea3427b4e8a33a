//! Frame submission.
//!
//! A submitter owns a render context and a device backend and turns one
//! caller request into one committed command buffer:
//!
//! 1. skip zero-area viewports without touching the device
//! 2. admit the frame through the [`crate::gate::FrameGate`] (blocks when N frames are in flight)
//! 3. begin the context and let the caller record
//! 4. encode, present when a drawable exists, commit
//!
//! The frame's permit is carried by the command buffer's completion handler and
//! returns to the gate when the device finishes the buffer.
//!
//! [`DirectSubmitter`] encodes straight into the drawable. [`TileSubmitter`]
//! encodes into an intermediate texture and composites it onto the drawable.

mod any;
mod config;
mod direct;
mod pacer;
mod phase;
mod tile;

pub use any::FrameSubmitter;
pub use config::{SubmitMode, SubmitterConfig};
pub use direct::DirectSubmitter;
pub use phase::{FrameOutcome, FramePhase};
pub use tile::TileSubmitter;
