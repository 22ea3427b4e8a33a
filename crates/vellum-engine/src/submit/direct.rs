use anyhow::{Context, Result};

use crate::context::{FrameRecorder, RenderContext};
use crate::coords::{PixelSize, Viewport};
use crate::device::{CommandBuffer, GpuBackend};

use super::pacer::FramePacer;
use super::{FrameOutcome, FramePhase, SubmitterConfig};

/// Submitter that encodes each frame straight into the presentable drawable.
///
/// Owns its render context exclusively. Dropping the submitter waits (bounded)
/// for in-flight frames before the context and backend are released.
pub struct DirectSubmitter<B: GpuBackend, C: RenderContext<B>> {
    context: C,
    backend: B,
    pacer: FramePacer,
}

impl<B: GpuBackend, C: RenderContext<B>> DirectSubmitter<B, C> {
    /// # Panics
    /// Panics if `config.max_frames_in_flight` is zero.
    pub fn new(backend: B, context: C, config: &SubmitterConfig) -> Self {
        log::debug!("direct submitter: {} frame(s) in flight", config.max_frames_in_flight);
        Self {
            context,
            backend,
            pacer: FramePacer::new("direct", config),
        }
    }

    /// Produces one frame.
    ///
    /// Blocks while the maximum number of frames is in flight. `recorder` runs
    /// exactly once unless the frame is skipped.
    pub fn draw_frame<R>(&mut self, viewport: Viewport, recorder: &mut R) -> Result<FrameOutcome>
    where
        R: FrameRecorder<C> + ?Sized,
    {
        let Some(slot) = self.pacer.admit(viewport) else {
            return Ok(FrameOutcome::Skipped);
        };
        let frame_index = slot.frame_index();

        self.context.begin(viewport);
        self.pacer.enter(FramePhase::Recording, frame_index);

        let mut buffer = self.backend.make_command_buffer("vellum direct frame");
        buffer.add_completed_handler(slot.into_completion_handler());

        recorder.record_frame(&mut self.context, viewport);

        // On error the uncommitted buffer drops its handler, which returns the permit.
        let drawable = self
            .backend
            .current_drawable()
            .with_context(|| format!("frame {frame_index}: acquiring drawable"))?;

        let presented = match drawable {
            Some(drawable) => {
                self.context.encode(&self.backend, &mut buffer, &drawable);
                self.pacer.enter(FramePhase::Encoded, frame_index);
                buffer.present(drawable);
                self.pacer.enter(FramePhase::Presented, frame_index);
                true
            }
            None => {
                log::debug!("frame {frame_index}: no drawable, committing without present");
                false
            }
        };

        buffer.commit();
        self.pacer.enter(FramePhase::Committed, frame_index);

        Ok(FrameOutcome::Committed { frame_index, presented })
    }

    /// Forwards a new drawable size to the backend surface.
    pub fn resize(&mut self, size: PixelSize) {
        log::debug!("direct submitter resized to {size}");
        self.backend.resize_surface(size);
    }

    /// Stops producing frames and waits for in-flight ones.
    ///
    /// Returns `false` if frames were still outstanding when the wait timed out.
    pub fn shutdown(mut self) -> bool {
        self.pacer.drain()
    }

    #[inline]
    pub fn phase(&self) -> FramePhase {
        self.pacer.phase()
    }

    /// Frames committed whose completion has not been observed yet.
    #[inline]
    pub fn frames_in_flight(&self) -> usize {
        self.pacer.gate().outstanding()
    }

    #[inline]
    pub fn frames_submitted(&self) -> u64 {
        self.pacer.frames_submitted()
    }

    #[inline]
    pub fn context(&self) -> &C {
        &self.context
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: GpuBackend, C: RenderContext<B>> Drop for DirectSubmitter<B, C> {
    fn drop(&mut self) {
        self.pacer.drain();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::coords::{Rect, Vec2};
    use crate::paint::Color;
    use crate::scene::{Primitive, Scene};
    use crate::testing::{MockBackend, MockOp};

    fn config() -> SubmitterConfig {
        SubmitterConfig::default()
    }

    fn viewport() -> Viewport {
        Viewport::new(320.0, 200.0, 2.0)
    }

    fn noop() -> impl FnMut(&mut Scene, Viewport) {
        |_: &mut Scene, _: Viewport| {}
    }

    #[test]
    fn zero_area_viewport_is_skipped_without_device_work() {
        let (backend, mock) = MockBackend::completing_immediately();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        let mut calls = 0;
        let mut recorder = |_: &mut Scene, _: Viewport| calls += 1;
        submitter.draw_frame(viewport(), &mut recorder).unwrap();
        assert_eq!(submitter.phase(), FramePhase::Committed);

        for vp in [Viewport::new(0.0, 100.0, 1.0), Viewport::new(100.0, 0.0, 2.0)] {
            let outcome = submitter.draw_frame(vp, &mut recorder).unwrap();
            assert_eq!(outcome, FrameOutcome::Skipped);
        }

        assert_eq!(calls, 1);
        assert_eq!(mock.buffers_created(), 1);
        assert_eq!(submitter.frames_in_flight(), 0);
        assert_eq!(submitter.frames_submitted(), 1);
        assert_eq!(submitter.phase(), FramePhase::Idle);
    }

    #[test]
    fn records_encodes_presents_and_commits() {
        let (backend, mock) = MockBackend::completing_immediately();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        let rect = Rect::new(1.0, 2.0, 3.0, 4.0);
        let outcome = submitter
            .draw_frame(viewport(), &mut |scene: &mut Scene, vp: Viewport| {
                assert_eq!(vp, viewport());
                scene.fill_rect(rect, Color::WHITE);
                scene.text("label", Vec2::new(5.0, 6.0), 14.0, Color::BLACK);
            })
            .unwrap();

        assert_eq!(outcome, FrameOutcome::Committed { frame_index: 0, presented: true });
        assert_eq!(submitter.phase(), FramePhase::Committed);

        let committed = mock.committed();
        assert_eq!(committed.len(), 1);
        let MockOp::Encode { primitives, drawable } = &committed[0].ops[0] else {
            panic!("expected a direct encode, got {:?}", committed[0].ops);
        };
        assert_eq!(committed[0].presented, Some(*drawable));
        assert_eq!(
            primitives,
            &[
                Primitive::Rect { rect, radius: 0.0, color: Color::WHITE },
                Primitive::Text {
                    text: "label".into(),
                    origin: Vec2::new(5.0, 6.0),
                    size: 14.0,
                    color: Color::BLACK,
                },
            ]
        );

        // Nothing recorded this time; nothing from the last frame may leak in.
        submitter.draw_frame(viewport(), &mut noop()).unwrap();
        let committed = mock.committed();
        assert_eq!(committed[1].ops, vec![MockOp::Encode { drawable: committed[1].presented.unwrap(), primitives: vec![] }]);
    }

    #[test]
    fn missing_drawable_commits_without_present() {
        let (backend, mock) = MockBackend::new();
        mock.set_drawable_available(false);
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        let outcome = submitter.draw_frame(viewport(), &mut noop()).unwrap();

        assert_eq!(outcome, FrameOutcome::Committed { frame_index: 0, presented: false });
        let committed = mock.committed();
        assert_eq!(committed.len(), 1);
        assert!(committed[0].ops.is_empty());
        assert_eq!(committed[0].presented, None);

        // The permit still rides on the committed buffer.
        assert_eq!(submitter.frames_in_flight(), 1);
        mock.complete_all();
        assert_eq!(submitter.frames_in_flight(), 0);
    }

    #[test]
    fn surface_failure_returns_error_and_releases_the_permit() {
        let (backend, mock) = MockBackend::new();
        mock.set_drawable_error(true);
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        assert!(submitter.draw_frame(viewport(), &mut noop()).is_err());
        assert!(mock.committed().is_empty());
        assert_eq!(submitter.frames_in_flight(), 0);
    }

    #[test]
    fn immediate_completions_never_block() {
        let (backend, mock) = MockBackend::completing_immediately();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        for i in 0..10 {
            let outcome = submitter.draw_frame(viewport(), &mut noop()).unwrap();
            assert_eq!(outcome, FrameOutcome::Committed { frame_index: i, presented: true });
        }
        assert_eq!(mock.committed().len(), 10);
        assert_eq!(submitter.frames_in_flight(), 0);
    }

    #[test]
    fn fourth_frame_blocks_until_a_completion() {
        let (backend, mock) = MockBackend::new();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        for _ in 0..3 {
            submitter.draw_frame(viewport(), &mut noop()).unwrap();
        }
        assert_eq!(submitter.frames_in_flight(), 3);

        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let outcome = submitter.draw_frame(viewport(), &mut noop()).unwrap();
            tx.send(outcome).unwrap();
            submitter
        });

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(mock.committed().len(), 3);

        mock.complete_oldest();
        let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(outcome, FrameOutcome::Committed { frame_index: 3, presented: true });

        let submitter = worker.join().unwrap();
        assert_eq!(submitter.frames_in_flight(), 3);
        mock.complete_all();
        assert!(submitter.shutdown());
    }

    #[test]
    fn completions_may_arrive_out_of_order() {
        let (backend, mock) = MockBackend::new();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());

        for _ in 0..3 {
            submitter.draw_frame(viewport(), &mut noop()).unwrap();
        }
        mock.complete_newest();
        mock.complete_at(0);
        assert_eq!(submitter.frames_in_flight(), 1);

        // Two permits free: neither frame blocks.
        submitter.draw_frame(viewport(), &mut noop()).unwrap();
        submitter.draw_frame(viewport(), &mut noop()).unwrap();
        assert_eq!(submitter.frames_in_flight(), 3);

        mock.complete_at(1);
        mock.complete_all();
        assert_eq!(submitter.frames_in_flight(), 0);
    }

    #[test]
    fn resize_reaches_the_surface() {
        let (backend, mock) = MockBackend::new();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());
        submitter.resize(PixelSize::new(800, 600));
        assert_eq!(mock.surface_sizes(), vec![PixelSize::new(800, 600)]);
    }

    #[test]
    fn shutdown_waits_for_late_completions() {
        let (backend, mock) = MockBackend::new();
        let mut submitter = DirectSubmitter::new(backend, Scene::new(), &config());
        submitter.draw_frame(viewport(), &mut noop()).unwrap();
        submitter.draw_frame(viewport(), &mut noop()).unwrap();

        let completer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            mock.complete_all();
        });

        assert!(submitter.shutdown());
        completer.join().unwrap();
    }
}
