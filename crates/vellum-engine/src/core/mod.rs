//! Contract between the runtime and applications built on the engine.

mod app;

pub use app::{App, AppControl, FrameInfo};
