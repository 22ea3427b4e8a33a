//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window and acts as the frame trigger and
//! resize source for the submitters.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, WgpuSubmitter};
