use anyhow::Result;

use crate::compositor::Compositor;
use crate::context::{FrameRecorder, RenderContext};
use crate::coords::{PixelSize, Viewport};
use crate::device::{GpuBackend, TextureAllocError};

use super::{DirectSubmitter, FrameOutcome, FramePhase, SubmitMode, SubmitterConfig, TileSubmitter};

/// Either submitter, chosen at runtime from [`SubmitterConfig::mode`].
pub enum FrameSubmitter<B: GpuBackend, C: RenderContext<B>, K: Compositor<B>> {
    Direct(DirectSubmitter<B, C>),
    Tile(TileSubmitter<B, C, K>),
}

impl<B, C, K> FrameSubmitter<B, C, K>
where
    B: GpuBackend,
    C: RenderContext<B>,
    K: Compositor<B>,
{
    /// Builds the submitter selected by `config.mode`.
    ///
    /// `make_compositor` only runs in tile mode.
    pub fn new<F>(
        backend: B,
        context: C,
        make_compositor: F,
        initial_size: PixelSize,
        config: &SubmitterConfig,
    ) -> Result<Self>
    where
        F: FnOnce(&B) -> Result<K>,
    {
        log::info!("frame submission mode: {}", config.mode);
        Ok(match config.mode {
            SubmitMode::Direct => Self::Direct(DirectSubmitter::new(backend, context, config)),
            SubmitMode::Tile => {
                let compositor = make_compositor(&backend)?;
                Self::Tile(TileSubmitter::new(backend, context, compositor, initial_size, config)?)
            }
        })
    }

    pub fn mode(&self) -> SubmitMode {
        match self {
            Self::Direct(_) => SubmitMode::Direct,
            Self::Tile(_) => SubmitMode::Tile,
        }
    }

    pub fn draw_frame<R>(&mut self, viewport: Viewport, recorder: &mut R) -> Result<FrameOutcome>
    where
        R: FrameRecorder<C> + ?Sized,
    {
        match self {
            Self::Direct(s) => s.draw_frame(viewport, recorder),
            Self::Tile(s) => s.draw_frame(viewport, recorder),
        }
    }

    /// Forwards a size change. Only the tile path can fail (intermediate texture).
    pub fn resize(&mut self, size: PixelSize) -> Result<(), TextureAllocError> {
        match self {
            Self::Direct(s) => {
                s.resize(size);
                Ok(())
            }
            Self::Tile(s) => s.resize(size),
        }
    }

    pub fn shutdown(self) -> bool {
        match self {
            Self::Direct(s) => s.shutdown(),
            Self::Tile(s) => s.shutdown(),
        }
    }

    pub fn phase(&self) -> FramePhase {
        match self {
            Self::Direct(s) => s.phase(),
            Self::Tile(s) => s.phase(),
        }
    }

    pub fn frames_in_flight(&self) -> usize {
        match self {
            Self::Direct(s) => s.frames_in_flight(),
            Self::Tile(s) => s.frames_in_flight(),
        }
    }

    pub fn frames_submitted(&self) -> u64 {
        match self {
            Self::Direct(s) => s.frames_submitted(),
            Self::Tile(s) => s.frames_submitted(),
        }
    }

    pub fn context(&self) -> &C {
        match self {
            Self::Direct(s) => s.context(),
            Self::Tile(s) => s.context(),
        }
    }

    pub fn context_mut(&mut self) -> &mut C {
        match self {
            Self::Direct(s) => s.context_mut(),
            Self::Tile(s) => s.context_mut(),
        }
    }

    pub fn backend(&self) -> &B {
        match self {
            Self::Direct(s) => s.backend(),
            Self::Tile(s) => s.backend(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::testing::{MockBackend, MockCompositor, MockOp};

    fn build(mode: SubmitMode, backend: MockBackend) -> FrameSubmitter<MockBackend, Scene, MockCompositor> {
        let config = SubmitterConfig { mode, ..SubmitterConfig::default() };
        FrameSubmitter::new(backend, Scene::new(), |_| Ok(MockCompositor), PixelSize::new(8, 8), &config).unwrap()
    }

    #[test]
    fn direct_mode_never_builds_a_compositor_or_texture() {
        let (backend, mock) = MockBackend::completing_immediately();
        let config = SubmitterConfig::default();
        let mut submitter: FrameSubmitter<MockBackend, Scene, MockCompositor> = FrameSubmitter::new(
            backend,
            Scene::new(),
            |_| anyhow::bail!("compositor requested in direct mode"),
            PixelSize::new(8, 8),
            &config,
        )
        .unwrap();

        assert_eq!(submitter.mode(), SubmitMode::Direct);
        submitter.draw_frame(Viewport::new(8.0, 8.0, 1.0), &mut |_: &mut Scene, _: Viewport| {}).unwrap();
        assert!(mock.allocations().is_empty());
        assert!(matches!(mock.committed()[0].ops[0], MockOp::Encode { .. }));
    }

    #[test]
    fn tile_mode_dispatches_to_the_offscreen_path() {
        let (backend, mock) = MockBackend::completing_immediately();
        let mut submitter = build(SubmitMode::Tile, backend);

        assert_eq!(submitter.mode(), SubmitMode::Tile);
        submitter.draw_frame(Viewport::new(8.0, 8.0, 1.0), &mut |_: &mut Scene, _: Viewport| {}).unwrap();
        submitter.resize(PixelSize::new(16, 16)).unwrap();

        assert!(matches!(mock.committed()[0].ops[0], MockOp::EncodeOffscreen { .. }));
        assert_eq!(mock.allocations().len(), 2);
        assert_eq!(submitter.frames_submitted(), 1);
    }

    #[test]
    fn direct_resize_never_fails() {
        let (backend, mock) = MockBackend::new();
        mock.set_fail_texture_alloc(true);
        let mut submitter = build(SubmitMode::Direct, backend);
        assert!(submitter.resize(PixelSize::new(1, 1)).is_ok());
    }
}
