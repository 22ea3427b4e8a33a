use anyhow::Result;
use winit::event::WindowEvent;

use crate::coords::Viewport;
use crate::scene::Scene;
use crate::time::FrameTime;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// What the runtime knows about the frame being recorded.
#[derive(Debug, Copy, Clone)]
pub struct FrameInfo {
    pub viewport: Viewport,
    pub time: FrameTime,
}

/// Application contract driven by [`crate::window::Runtime`].
///
/// Texture handles created from the scene must be dropped in
/// [`App::shutdown`] at the latest; they may not outlive the scene.
pub trait App {
    /// Called once the device and scene exist, before the first frame.
    fn init(&mut self, scene: &Scene) -> Result<()> {
        let _ = scene;
        Ok(())
    }

    /// Called for every window event before the runtime handles it.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Records one frame. Runs on the submission thread; must not block.
    fn draw(&mut self, scene: &mut Scene, frame: &FrameInfo);

    /// Called before the scene and device are torn down.
    fn shutdown(&mut self) {}
}
