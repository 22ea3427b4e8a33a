//! CPU side of scene encoding: turns recorded primitives into GPU instances
//! and an ordered list of draw runs.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::context::TextureId;
use crate::coords::Rect;
use crate::paint::Color;
use crate::scene::Primitive;

/// Instance layout (40 bytes):
///
///  offset  0  origin      [f32; 2]   loc 1
///  offset  8  size        [f32; 2]   loc 2
///  offset 16  radius_pad  [f32; 2]   loc 3  (.x = corner radius)
///  offset 24  color       [f32; 4]   loc 4  (premultiplied)
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct ShapeInstance {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub radius_pad: [f32; 2],
    pub color: [f32; 4],
}

impl ShapeInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2, // size
        3 => Float32x2, // radius_pad
        4 => Float32x4  // color
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Instance layout (24 bytes): origin, size, opacity_pad (.x = opacity).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct ImageInstance {
    pub origin: [f32; 2],
    pub size: [f32; 2],
    pub opacity_pad: [f32; 2],
}

impl ImageInstance {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        1 => Float32x2, // origin
        2 => Float32x2, // size
        3 => Float32x2  // opacity_pad
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ImageInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// One contiguous draw in paint order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum DrawRun {
    /// Consecutive shape instances drawn with one call.
    Shapes(Range<u32>),
    Image { texture: TextureId, instance: u32 },
}

/// Per-frame instance data. Buffers are reused across frames.
#[derive(Debug, Default)]
pub(super) struct FrameBatch {
    pub shapes: Vec<ShapeInstance>,
    pub images: Vec<ImageInstance>,
    pub runs: Vec<DrawRun>,
    /// Text primitives this renderer does not draw.
    pub skipped_text: usize,
}

impl FrameBatch {
    pub(super) fn rebuild(&mut self, primitives: &[Primitive]) {
        self.shapes.clear();
        self.images.clear();
        self.runs.clear();
        self.skipped_text = 0;

        for p in primitives {
            match p {
                Primitive::Rect { rect, radius, color } => {
                    let r = rect.normalized();
                    if is_drawable(r) && is_visible(*color) {
                        self.push_shape(r, *radius, *color);
                    }
                }
                Primitive::Circle { center, radius, color } => {
                    let r = Rect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
                    if is_drawable(r) && is_visible(*color) {
                        self.push_shape(r, *radius, *color);
                    }
                }
                Primitive::Image { rect, texture, opacity } => {
                    let r = rect.normalized();
                    if is_drawable(r) && *opacity > 0.0 {
                        self.push_image(r, texture.id(), *opacity);
                    }
                }
                Primitive::Text { .. } => self.skipped_text += 1,
            }
        }
    }

    fn push_shape(&mut self, r: Rect, radius: f32, color: Color) {
        let index = self.shapes.len() as u32;
        self.shapes.push(ShapeInstance {
            origin: [r.origin.x, r.origin.y],
            size: [r.size.x, r.size.y],
            radius_pad: [radius.max(0.0), 0.0],
            color: color.to_array(),
        });

        match self.runs.last_mut() {
            Some(DrawRun::Shapes(range)) => range.end = index + 1,
            _ => self.runs.push(DrawRun::Shapes(index..index + 1)),
        }
    }

    fn push_image(&mut self, r: Rect, texture: TextureId, opacity: f32) {
        let instance = self.images.len() as u32;
        self.images.push(ImageInstance {
            origin: [r.origin.x, r.origin.y],
            size: [r.size.x, r.size.y],
            opacity_pad: [opacity, 0.0],
        });
        self.runs.push(DrawRun::Image { texture, instance });
    }
}

#[inline]
fn is_drawable(r: Rect) -> bool {
    !r.is_empty() && r.origin.is_finite() && r.size.is_finite()
}

#[inline]
fn is_visible(c: Color) -> bool {
    c.a > 0.0
}
