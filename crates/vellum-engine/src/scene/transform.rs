use crate::coords::{Rect, Vec2};

/// Axis-aligned affine transform: scale, then translate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub translation: Vec2,
    pub scale: Vec2,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec2::ZERO,
        scale: Vec2::ONE,
    };

    /// Appends a translation expressed in the current (already transformed) space.
    #[inline]
    pub fn then_translate(self, d: Vec2) -> Self {
        Self {
            translation: self.translation + d.scaled_by(self.scale),
            scale: self.scale,
        }
    }

    #[inline]
    pub fn then_scale(self, s: Vec2) -> Self {
        Self {
            translation: self.translation,
            scale: self.scale.scaled_by(s),
        }
    }

    #[inline]
    pub fn apply_point(self, p: Vec2) -> Vec2 {
        p.scaled_by(self.scale) + self.translation
    }

    /// Maps a rectangle; negative scales are normalized back to a positive extent.
    #[inline]
    pub fn apply_rect(self, r: Rect) -> Rect {
        Rect::from_corners(self.apply_point(r.origin), self.apply_point(r.max()))
    }

    /// Maps a length (radius, font size) by the geometric mean of the scale factors.
    #[inline]
    pub fn apply_length(self, l: f32) -> f32 {
        l * (self.scale.x * self.scale.y).abs().sqrt()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_is_applied_in_scaled_space() {
        let t = Transform::IDENTITY
            .then_scale(Vec2::splat(2.0))
            .then_translate(Vec2::new(5.0, 1.0));
        assert_eq!(t.apply_point(Vec2::new(1.0, 1.0)), Vec2::new(12.0, 4.0));
    }

    #[test]
    fn mirrored_rect_is_normalized() {
        let t = Transform::IDENTITY.then_scale(Vec2::new(-1.0, 1.0));
        let r = t.apply_rect(Rect::new(2.0, 0.0, 3.0, 4.0));
        assert_eq!(r, Rect::new(-5.0, 0.0, 3.0, 4.0));
    }

    #[test]
    fn lengths_use_geometric_mean() {
        let t = Transform::IDENTITY.then_scale(Vec2::new(4.0, 1.0));
        assert_eq!(t.apply_length(3.0), 6.0);
    }
}
