use anyhow::{Context, Result};
use winit::window::Window;

use crate::coords::PixelSize;

use super::poller::{DevicePoller, PollerHandle};
use super::surface;
use super::{CommandBuffer, CompletionHandler, GpuBackend, GpuInit, SurfaceErrorAction, TextureAllocError};

/// wgpu device, queue and window surface.
pub struct WgpuBackend<'w> {
    /// Surface bound to the window; the window must outlive the backend.
    surface: wgpu::Surface<'w>,

    device: wgpu::Device,
    queue: wgpu::Queue,

    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in device pixels. May be zero while minimized.
    size: PixelSize,

    offscreen_format: wgpu::TextureFormat,

    poller: DevicePoller,
}

impl<'w> WgpuBackend<'w> {
    /// Creates the device and configures a surface for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let inner = window.inner_size();
        anyhow::ensure!(inner.width > 0 && inner.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            present_mode,
            alpha_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
            offscreen_format,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("vellum device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps.formats, prefer_srgb)
            .context("surface reports no supported formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: inner.width,
            height: inner.height,
            present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps.alpha_modes, alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency,
        };
        surface.configure(&device, &config);

        let poller = DevicePoller::spawn(device.clone())?;

        let info = adapter.get_info();
        log::info!(
            "gpu ready: {} ({:?}), surface {:?} {}x{}",
            info.name,
            info.backend,
            format,
            config.width,
            config.height
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size: PixelSize::new(inner.width, inner.height),
            offscreen_format,
            poller,
        })
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size in device pixels.
    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn reconfigure(&self) {
        if !self.size.is_empty() {
            self.surface.configure(&self.device, &self.config);
        }
    }
}

impl<'w> GpuBackend for WgpuBackend<'w> {
    type Drawable = WgpuDrawable;
    type Texture = RenderTexture;
    type CommandBuffer = WgpuCommandBuffer;

    fn make_command_buffer(&mut self, label: &str) -> WgpuCommandBuffer {
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });

        WgpuCommandBuffer {
            encoder,
            queue: self.queue.clone(),
            poller: self.poller.handle(),
            drawable: None,
            completed: Vec::new(),
        }
    }

    fn current_drawable(&mut self) -> Result<Option<WgpuDrawable>> {
        if self.size.is_empty() {
            return Ok(None);
        }

        match self.surface.get_current_texture() {
            Ok(surface_texture) => {
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(Some(WgpuDrawable {
                    surface_texture,
                    view,
                    format: self.config.format,
                }))
            }
            Err(err) => match surface::classify_surface_error(&err) {
                SurfaceErrorAction::Fatal => {
                    Err(anyhow::anyhow!("surface acquisition failed unrecoverably: {err}"))
                }
                SurfaceErrorAction::Reconfigured => {
                    log::warn!("surface {err}; reconfiguring");
                    self.reconfigure();
                    Ok(None)
                }
                SurfaceErrorAction::SkipFrame => {
                    log::warn!("surface {err}; no drawable this frame");
                    Ok(None)
                }
            },
        }
    }

    fn create_render_texture(&mut self, size: PixelSize) -> Result<RenderTexture, TextureAllocError> {
        if size.is_empty() {
            return Err(TextureAllocError::ZeroSize(size));
        }
        let max = self.device.limits().max_texture_dimension_2d;
        if size.width > max || size.height > max {
            return Err(TextureAllocError::TooLarge { size, max });
        }

        let scope = self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("vellum offscreen target"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.offscreen_format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        if let Some(err) = pollster::block_on(scope.pop()) {
            return Err(TextureAllocError::Device {
                size,
                message: err.to_string(),
            });
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(RenderTexture {
            texture,
            view,
            size,
            format: self.offscreen_format,
        })
    }

    fn texture_size(&self, texture: &RenderTexture) -> PixelSize {
        texture.size
    }

    /// wgpu cannot configure a 0x0 surface; a zero size only updates state
    /// and configuration waits for the next non-zero size.
    fn resize_surface(&mut self, size: PixelSize) {
        self.size = size;
        if size.is_empty() {
            return;
        }
        self.config.width = size.width;
        self.config.height = size.height;
        self.surface.configure(&self.device, &self.config);
    }
}

/// Acquired swap-chain image plus the view render passes target.
pub struct WgpuDrawable {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    format: wgpu::TextureFormat,
}

impl WgpuDrawable {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Offscreen texture that can be rendered into and sampled.
pub struct RenderTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: PixelSize,
    format: wgpu::TextureFormat,
}

impl RenderTexture {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Command encoder for one frame plus what happens at commit.
pub struct WgpuCommandBuffer {
    encoder: wgpu::CommandEncoder,
    queue: wgpu::Queue,
    poller: PollerHandle,
    drawable: Option<WgpuDrawable>,
    completed: Vec<CompletionHandler>,
}

impl WgpuCommandBuffer {
    pub fn encoder_mut(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }
}

impl CommandBuffer for WgpuCommandBuffer {
    type Drawable = WgpuDrawable;

    fn add_completed_handler(&mut self, handler: CompletionHandler) {
        self.completed.push(handler);
    }

    fn present(&mut self, drawable: WgpuDrawable) {
        debug_assert!(self.drawable.is_none(), "command buffer already presents a drawable");
        self.drawable = Some(drawable);
    }

    fn commit(self) {
        let Self {
            encoder,
            queue,
            poller,
            drawable,
            completed,
        } = self;

        queue.submit(std::iter::once(encoder.finish()));

        // Registered after submit, so each callback covers this submission.
        for handler in completed {
            queue.on_submitted_work_done(handler);
        }

        if let Some(WgpuDrawable { surface_texture, view, .. }) = drawable {
            drop(view);
            surface_texture.present();
        }

        poller.notify_submitted();
    }
}
