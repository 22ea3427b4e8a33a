use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::compositor::TextureCompositor;
use crate::coords::{PixelSize, Viewport};
use crate::core::{App, AppControl, FrameInfo};
use crate::device::{GpuInit, WgpuBackend};
use crate::paint::Color;
use crate::render::SceneRenderer;
use crate::submit::{FrameOutcome, FrameSubmitter, SubmitterConfig};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Clear color of the scene pass and the composite pass.
    pub clear_color: Color,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "vellum".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            clear_color: Color::BLACK,
        }
    }
}

/// Submitter type the runtime drives.
pub type WgpuSubmitter<'w> = FrameSubmitter<WgpuBackend<'w>, SceneRenderer, TextureCompositor>;

/// Entry point for the runtime.
///
/// Opens one window and requests a redraw continuously; every redraw is one
/// `draw_frame` call, so frame production is paced by the admission gate.
pub struct Runtime;

impl Runtime {
    /// Runs until the window closes, the app exits, or rendering fails.
    ///
    /// A fatal rendering error is returned after the event loop stops.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, submit: SubmitterConfig, app: A) -> Result<()>
    where
        A: App + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = RuntimeState::new(config, gpu_init, submit, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.finish()
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    // Invariant in the window lifetime (associated texture type).
    #[borrows(window)]
    #[not_covariant]
    submitter: WgpuSubmitter<'this>,
}

struct RuntimeState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    submit: SubmitterConfig,
    app: A,

    window: Option<WindowEntry>,
    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> RuntimeState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, submit: SubmitterConfig, app: A) -> Self {
        Self {
            config,
            gpu_init,
            submit,
            app,
            window: None,
            error: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        self.teardown();
        event_loop.exit();
    }

    /// App first (drops its texture handles), then submitter, then window.
    fn teardown(&mut self) {
        if let Some(entry) = self.window.take() {
            self.app.shutdown();
            let in_flight = entry.with_submitter(|s| s.frames_in_flight());
            // The submitter waits for in-flight frames before the device goes away.
            drop(entry);
            log::debug!("window closed ({in_flight} frame(s) were in flight)");
        }
    }

    fn finish(mut self) -> Result<()> {
        self.teardown();
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let submit = self.submit.clone();
        let clear = self.config.clear_color;

        let entry = WindowEntry::try_new(FrameClock::default(), window, |window| {
            build_submitter(window, gpu_init, &submit, clear)
        })?;

        entry.with_submitter(|s| self.app.init(s.context().scene()))?;
        entry.with_window(|w| w.request_redraw());

        self.window = Some(entry);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, window) = (&mut self.app, &mut self.window);
        let Some(entry) = window.as_mut() else {
            return;
        };

        let result = entry.with_mut(|fields| {
            let viewport = viewport_of(fields.window);
            let time = fields.clock.tick();

            fields.window.pre_present_notify();
            fields.submitter.draw_frame(viewport, &mut |renderer: &mut SceneRenderer, viewport: Viewport| {
                app.draw(renderer.scene_mut(), &FrameInfo { viewport, time });
            })
        });

        match result {
            Ok(FrameOutcome::Committed { frame_index, presented }) => {
                log::trace!("frame {frame_index} committed (presented: {presented})");
            }
            Ok(FrameOutcome::Skipped) => {}
            Err(err) => self.fail(event_loop, err.context("rendering stopped")),
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(entry) = self.window.as_mut() else {
            return;
        };
        let size = PixelSize::new(size.width, size.height);
        entry.with_submitter_mut(|s| {
            if let Err(err) = s.resize(size) {
                log::warn!("resize to {size} deferred: {err}");
            }
        });
        entry.with_window(|w| w.request_redraw());
    }
}

fn build_submitter<'w>(
    window: &'w Window,
    gpu_init: GpuInit,
    submit: &SubmitterConfig,
    clear: Color,
) -> Result<WgpuSubmitter<'w>> {
    let backend = pollster::block_on(WgpuBackend::new(window, gpu_init)).context("GPU initialization failed")?;
    let renderer = SceneRenderer::new(backend.device(), clear);
    let initial = backend.size();

    FrameSubmitter::new(
        backend,
        renderer,
        |b| TextureCompositor::new(b.device(), b.surface_format(), clear),
        initial,
        submit,
    )
}

/// Logical size and scale of the window's drawable area.
fn viewport_of(window: &Window) -> Viewport {
    let scale = window.scale_factor();
    let logical: LogicalSize<f64> = window.inner_size().to_logical(scale);
    Viewport::new(logical.width as f32, logical.height as f32, scale as f32)
}

impl<A> ApplicationHandler for RuntimeState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() || self.exit_requested {
            return;
        }

        if let Err(err) = self.create_window_entry(event_loop) {
            self.fail(event_loop, err.context("failed to create the initial window"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the admission gate paces us against the GPU.
        if let Some(entry) = self.window.as_ref() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let ours = self
            .window
            .as_ref()
            .is_some_and(|entry| entry.with_window(|w| w.id() == window_id));
        if !ours {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(new_size) = self.window.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(new_size);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}
