use super::batch::ShapeInstance;
use super::common::{QuadVertex, premul_alpha_blend};

/// SDF pipeline for rects, rounded rects and circles.
///
/// The pipeline is built lazily for the target format and rebuilt if the
/// format changes.
pub(super) struct ShapePipeline {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl ShapePipeline {
    pub(super) fn new(device: &wgpu::Device, viewport_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vellum shape shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/shape.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("vellum shape pipeline layout"),
            bind_group_layouts: &[viewport_layout],
            immediate_size: 0,
        });

        Self { shader, layout, format: None, pipeline: None }
    }

    pub(super) fn ensure(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat) -> &wgpu::RenderPipeline {
        let pipeline = match self.pipeline.take() {
            Some(p) if self.format == Some(format) => p,
            _ => {
                log::debug!("building shape pipeline for {format:?}");
                build_pipeline(device, &self.layout, &self.shader, format)
            }
        };
        self.format = Some(format);
        self.pipeline.insert(pipeline)
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("vellum shape pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout(), ShapeInstance::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}
