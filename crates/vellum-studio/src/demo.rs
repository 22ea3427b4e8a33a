use std::f32::consts::TAU;

use anyhow::Result;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{Key, NamedKey};

use vellum_engine::context::TextureHandle;
use vellum_engine::coords::{Rect, Vec2};
use vellum_engine::core::{App, AppControl, FrameInfo};
use vellum_engine::paint::Color;
use vellum_engine::scene::Scene;

const CHECKER_CELLS: u32 = 8;

/// Animated shapes, a panel with a label and a checkerboard image.
#[derive(Default)]
pub struct Demo {
    checker: Option<TextureHandle>,
}

impl App for Demo {
    fn init(&mut self, scene: &Scene) -> Result<()> {
        let pixels = checker_pixels(CHECKER_CELLS);
        let handle = scene.create_texture(&pixels, CHECKER_CELLS, CHECKER_CELLS)?;
        log::info!("checker texture {:?}", scene.texture_size(&handle));
        self.checker = Some(handle);
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn draw(&mut self, scene: &mut Scene, frame: &FrameInfo) {
        let vp = frame.viewport;
        let t = frame.time.elapsed;

        // Backdrop stripes.
        let stripes = 12;
        let h = vp.height / stripes as f32;
        for i in 0..stripes {
            let k = i as f32 / stripes as f32;
            scene.fill_rect(
                Rect::new(0.0, i as f32 * h, vp.width, h),
                Color::from_straight(0.10 + 0.05 * k, 0.12, 0.20 - 0.06 * k, 1.0),
            );
        }

        // Orbiting circles around the center.
        let center = Vec2::new(vp.width * 0.5, vp.height * 0.5);
        let orbit = vp.width.min(vp.height) * 0.3;
        for i in 0..6 {
            let a = t * 0.8 + i as f32 * TAU / 6.0;
            let p = center + Vec2::new(a.cos(), a.sin()) * orbit;
            scene.fill_circle(p, 18.0 + 6.0 * (t * 2.0 + i as f32).sin(), Color::from_straight(0.95, 0.55, 0.25, 0.9));
        }

        // Panel drawn in its own coordinate space.
        scene.save();
        scene.translate(32.0, 32.0);
        let pulse = 1.0 + 0.03 * (t * 3.0).sin();
        scene.scale(pulse, pulse);
        scene.fill_rounded_rect(Rect::new(0.0, 0.0, 260.0, 120.0), 14.0, Color::from_straight(0.9, 0.92, 0.96, 0.85));
        scene.text("vellum studio", Vec2::new(16.0, 16.0), 20.0, Color::BLACK);
        if let Some(checker) = self.checker.as_ref() {
            scene.image(Rect::new(16.0, 48.0, 56.0, 56.0), checker, 1.0);
        }
        scene.restore();
    }

    fn shutdown(&mut self) {
        self.checker = None;
    }
}

/// `cells` x `cells` premultiplied RGBA8 checkerboard.
fn checker_pixels(cells: u32) -> Vec<u8> {
    (0..cells * cells)
        .flat_map(|i| {
            let (x, y) = (i % cells, i / cells);
            if (x + y) % 2 == 0 {
                [240, 240, 240, 255]
            } else {
                [40, 44, 60, 255]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checker_is_tightly_packed_rgba() {
        let px = checker_pixels(4);
        assert_eq!(px.len(), 4 * 4 * 4);
        assert_eq!(&px[0..4], &[240, 240, 240, 255]);
        assert_eq!(&px[4..8], &[40, 44, 60, 255]);
    }

    #[test]
    fn demo_records_and_releases_its_texture() {
        let mut scene = Scene::new();
        let mut demo = Demo::default();
        demo.init(&scene).unwrap();

        let viewport = vellum_engine::coords::Viewport::new(640.0, 480.0, 1.0);
        scene.begin(viewport);
        let frame = FrameInfo {
            viewport,
            time: vellum_engine::time::FrameTime { dt: 0.016, elapsed: 1.0 },
        };
        demo.draw(&mut scene, &frame);
        assert!(scene.primitives().iter().any(|p| p.kind() == "image"));

        demo.shutdown();
        scene.begin(scene.viewport());
        assert_eq!(scene.texture_registry().live_count(), 0);
    }
}
