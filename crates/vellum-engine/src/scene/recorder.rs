use std::sync::Arc;

use anyhow::{Result, ensure};

use crate::context::TextureHandle;
use crate::coords::{PixelSize, Rect, Vec2, Viewport};
use crate::paint::Color;

use super::{Primitive, TextureRegistry, Transform};

/// Records primitives for one frame.
///
/// Geometry is given in the current user space and stored in logical pixels.
/// [`Scene::begin`] discards the previous frame's primitives and resets the
/// transform stack; nothing recorded in one frame is visible in the next.
#[derive(Debug)]
pub struct Scene {
    viewport: Viewport,
    transform: Transform,
    saved: Vec<Transform>,
    primitives: Vec<Primitive>,
    textures: Arc<TextureRegistry>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::default(),
            transform: Transform::IDENTITY,
            saved: Vec::new(),
            primitives: Vec::new(),
            textures: TextureRegistry::new(),
        }
    }

    /// Starts a new frame. Keeps allocated capacity for reuse.
    pub fn begin(&mut self, viewport: Viewport) {
        if !self.saved.is_empty() {
            log::debug!("{} unbalanced save() calls discarded", self.saved.len());
        }
        self.viewport = viewport;
        self.transform = Transform::IDENTITY;
        self.saved.clear();
        self.primitives.clear();
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Primitives recorded since the last `begin`, in call order.
    #[inline]
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    #[inline]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    // ── transform stack ───────────────────────────────────────────────────

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.then_translate(Vec2::new(dx, dy));
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.transform = self.transform.then_scale(Vec2::new(sx, sy));
    }

    pub fn save(&mut self) {
        self.saved.push(self.transform);
    }

    /// Restores the transform saved by the matching [`Scene::save`].
    ///
    /// # Panics
    /// Panics (debug only) if called without a matching `save`.
    pub fn restore(&mut self) {
        debug_assert!(!self.saved.is_empty(), "restore called without matching save");
        self.transform = self.saved.pop().unwrap_or(Transform::IDENTITY);
    }

    // ── primitives ────────────────────────────────────────────────────────

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.fill_rounded_rect(rect, 0.0, color);
    }

    pub fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        let t = self.transform;
        self.primitives.push(Primitive::Rect {
            rect: t.apply_rect(rect),
            radius: t.apply_length(radius.max(0.0)),
            color,
        });
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let t = self.transform;
        self.primitives.push(Primitive::Circle {
            center: t.apply_point(center),
            radius: t.apply_length(radius.max(0.0)),
            color,
        });
    }

    pub fn text(&mut self, text: impl Into<String>, origin: Vec2, size: f32, color: Color) {
        let t = self.transform;
        self.primitives.push(Primitive::Text {
            text: text.into(),
            origin: t.apply_point(origin),
            size: t.apply_length(size),
            color,
        });
    }

    pub fn image(&mut self, rect: Rect, texture: &TextureHandle, opacity: f32) {
        self.primitives.push(Primitive::Image {
            rect: self.transform.apply_rect(rect),
            texture: texture.clone(),
            opacity: opacity.clamp(0.0, 1.0),
        });
    }

    // ── textures ──────────────────────────────────────────────────────────

    /// Creates a texture from tightly packed, premultiplied RGBA8 pixels.
    ///
    /// The returned handle (and its clones) keep the texture alive; dropping
    /// the last one frees it. Handles must be dropped before the scene.
    pub fn create_texture(&self, rgba: &[u8], width: u32, height: u32) -> Result<TextureHandle> {
        let size = PixelSize::new(width, height);
        ensure!(!size.is_empty(), "texture size must be non-zero, got {size}");
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        ensure!(
            expected == Some(rgba.len()),
            "texture {size} needs {} bytes of RGBA8, got {}",
            expected.map_or_else(|| "too many".to_owned(), |n| n.to_string()),
            rgba.len()
        );
        Ok(self.textures.register(size, rgba.to_vec()))
    }

    pub fn texture_size(&self, texture: &TextureHandle) -> Option<PixelSize> {
        self.textures.size(texture.id())
    }

    #[inline]
    pub fn texture_registry(&self) -> &Arc<TextureRegistry> {
        &self.textures
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(100.0, 50.0, 1.0)
    }

    #[test]
    fn records_in_call_order_and_resets_on_begin() {
        let mut scene = Scene::new();
        scene.begin(vp());
        scene.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        scene.text("hi", Vec2::new(1.0, 2.0), 12.0, Color::BLACK);

        let kinds: Vec<_> = scene.primitives().iter().map(Primitive::kind).collect();
        assert_eq!(kinds, ["rect", "text"]);

        scene.begin(vp());
        assert!(scene.primitives().is_empty());
    }

    #[test]
    fn transform_applies_at_record_time() {
        let mut scene = Scene::new();
        scene.begin(vp());
        scene.save();
        scene.translate(10.0, 20.0);
        scene.scale(2.0, 2.0);
        scene.fill_circle(Vec2::new(1.0, 1.0), 3.0, Color::WHITE);
        scene.restore();
        scene.fill_circle(Vec2::new(1.0, 1.0), 3.0, Color::WHITE);

        assert_eq!(
            scene.primitives(),
            &[
                Primitive::Circle { center: Vec2::new(12.0, 22.0), radius: 6.0, color: Color::WHITE },
                Primitive::Circle { center: Vec2::new(1.0, 1.0), radius: 3.0, color: Color::WHITE },
            ]
        );
    }

    #[test]
    fn begin_resets_transform_stack() {
        let mut scene = Scene::new();
        scene.begin(vp());
        scene.save();
        scene.translate(5.0, 5.0);

        scene.begin(vp());
        assert_eq!(scene.transform(), Transform::IDENTITY);
    }

    #[test]
    fn create_texture_validates_pixel_data() {
        let scene = Scene::new();
        assert!(scene.create_texture(&[0; 16], 2, 2).is_ok());
        assert!(scene.create_texture(&[0; 15], 2, 2).is_err());
        assert!(scene.create_texture(&[], 0, 2).is_err());
    }

    #[test]
    fn texture_size_follows_handle_lifetime() {
        let scene = Scene::new();
        let h = scene.create_texture(&[0; 24], 3, 2).unwrap();
        assert_eq!(scene.texture_size(&h), Some(PixelSize::new(3, 2)));
        drop(h);
        assert_eq!(scene.texture_registry().live_count(), 0);
    }

    #[test]
    fn recorded_image_keeps_texture_until_next_begin() {
        let mut scene = Scene::new();
        let h = scene.create_texture(&[0; 4], 1, 1).unwrap();
        scene.begin(vp());
        scene.image(Rect::new(0.0, 0.0, 8.0, 8.0), &h, 1.0);
        drop(h);
        assert_eq!(scene.texture_registry().live_count(), 1);

        scene.begin(vp());
        assert_eq!(scene.texture_registry().live_count(), 0);
        assert_eq!(scene.texture_registry().take_deleted().len(), 1);
    }
}
