use std::collections::HashMap;

use crate::context::{RenderContext, TextureId};
use crate::coords::Viewport;
use crate::device::{RenderTexture, WgpuBackend, WgpuCommandBuffer, WgpuDrawable};
use crate::paint::Color;
use crate::scene::Scene;

use super::batch::{DrawRun, FrameBatch};
use super::common::{InstanceBuffer, QUAD_INDEX_COUNT, QuadMesh, ViewportBinding};
use super::images::{GpuImage, ImagePipeline};
use super::shapes::ShapePipeline;

/// wgpu render context: a [`Scene`] plus the GPU resources that draw it.
///
/// Every encode clears the target to `clear_color` and draws the recorded
/// primitives in order within a single render pass.
pub struct SceneRenderer {
    scene: Scene,
    clear_color: Color,

    viewport: ViewportBinding,
    quad: QuadMesh,
    shapes: ShapePipeline,
    images: ImagePipeline,
    shape_instances: InstanceBuffer,
    image_instances: InstanceBuffer,
    batch: FrameBatch,

    textures: HashMap<TextureId, GpuImage>,
    warned_text: bool,
}

impl SceneRenderer {
    pub fn new(device: &wgpu::Device, clear_color: Color) -> Self {
        let viewport = ViewportBinding::new(device);
        let shapes = ShapePipeline::new(device, viewport.layout());
        let images = ImagePipeline::new(device, viewport.layout());

        Self {
            scene: Scene::new(),
            clear_color,
            quad: QuadMesh::new(device),
            viewport,
            shapes,
            images,
            shape_instances: InstanceBuffer::new("vellum shape instances"),
            image_instances: InstanceBuffer::new("vellum image instances"),
            batch: FrameBatch::default(),
            textures: HashMap::new(),
            warned_text: false,
        }
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The recording surface handed to frame recorders.
    #[inline]
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    #[inline]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// User textures currently resident on the device.
    pub fn resident_textures(&self) -> usize {
        self.textures.len()
    }

    fn free_deleted(&mut self) {
        for id in self.scene.texture_registry().take_deleted() {
            // wgpu keeps the texture until in-flight submissions using it finish.
            if self.textures.remove(&id).is_some() {
                log::trace!("freed {id}");
            }
        }
    }

    fn sync_textures(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        self.free_deleted();
        for upload in self.scene.texture_registry().take_pending_uploads() {
            if let Some(image) = self.images.upload(device, queue, &upload) {
                debug_assert_eq!(image.size(), upload.size);
                self.textures.insert(upload.id, image);
            }
        }
    }

    fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        format: wgpu::TextureFormat,
    ) {
        self.sync_textures(device, queue);

        self.batch.rebuild(self.scene.primitives());
        if self.batch.skipped_text > 0 && !self.warned_text {
            log::debug!(
                "text primitives need a glyph renderer; skipping {} this frame",
                self.batch.skipped_text
            );
            self.warned_text = true;
        }

        self.viewport.write(queue, self.scene.viewport());
        self.shape_instances.upload(device, queue, &self.batch.shapes);
        self.image_instances.upload(device, queue, &self.batch.images);

        let shape_pipeline = if self.batch.shapes.is_empty() {
            None
        } else {
            Some(self.shapes.ensure(device, format))
        };
        let image_pipeline = if self.batch.images.is_empty() {
            None
        } else {
            Some(self.images.ensure(device, format))
        };

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("vellum scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if self.batch.runs.is_empty() {
            return;
        }

        rpass.set_bind_group(0, self.viewport.bind_group(), &[]);
        self.quad.bind(&mut rpass);

        for run in &self.batch.runs {
            match run {
                DrawRun::Shapes(range) => {
                    let (Some(pipeline), Some(instances)) = (shape_pipeline, self.shape_instances.get()) else {
                        continue;
                    };
                    rpass.set_pipeline(pipeline);
                    rpass.set_vertex_buffer(1, instances.slice(..));
                    rpass.draw_indexed(0..QUAD_INDEX_COUNT, 0, range.clone());
                }
                DrawRun::Image { texture, instance } => {
                    let (Some(pipeline), Some(instances)) = (image_pipeline, self.image_instances.get()) else {
                        continue;
                    };
                    let Some(image) = self.textures.get(texture) else {
                        log::trace!("{texture} is not resident; image skipped");
                        continue;
                    };
                    rpass.set_pipeline(pipeline);
                    rpass.set_bind_group(1, image.bind_group(), &[]);
                    rpass.set_vertex_buffer(1, instances.slice(..));
                    rpass.draw_indexed(0..QUAD_INDEX_COUNT, 0, *instance..*instance + 1);
                }
            }
        }
    }
}

impl<'w> RenderContext<WgpuBackend<'w>> for SceneRenderer {
    fn begin(&mut self, viewport: Viewport) {
        self.scene.begin(viewport);
        self.free_deleted();
    }

    fn encode(&mut self, backend: &WgpuBackend<'w>, buffer: &mut WgpuCommandBuffer, target: &WgpuDrawable) {
        self.render(
            backend.device(),
            backend.queue(),
            buffer.encoder_mut(),
            target.view(),
            target.format(),
        );
    }

    fn encode_offscreen(&mut self, backend: &WgpuBackend<'w>, buffer: &mut WgpuCommandBuffer, target: &RenderTexture) {
        self.render(
            backend.device(),
            backend.queue(),
            buffer.encoder_mut(),
            target.view(),
            target.format(),
        );
    }
}
