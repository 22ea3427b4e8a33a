use core::fmt;

/// Frame viewport: logical size plus the device pixel scale.
///
/// Supplied at the start of every frame. A zero (or non-finite) width or height
/// is a valid input meaning "skip this frame".
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device pixels per logical pixel.
    pub scale: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32, scale: f32) -> Self {
        Self { width, height, scale }
    }

    /// Returns `true` when no frame should be produced for this viewport.
    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite())
    }

    /// Extent in device pixels, rounded to the nearest pixel.
    ///
    /// A non-positive or non-finite scale is treated as `1.0`.
    #[inline]
    pub fn pixel_size(self) -> PixelSize {
        if self.is_empty() {
            return PixelSize::new(0, 0);
        }
        let scale = if self.scale > 0.0 && self.scale.is_finite() { self.scale } else { 1.0 };
        PixelSize::new(
            (self.width * scale).round() as u32,
            (self.height * scale).round() as u32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

/// Size in device pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_width_or_height_is_empty() {
        assert!(Viewport::new(0.0, 10.0, 1.0).is_empty());
        assert!(Viewport::new(10.0, 0.0, 2.0).is_empty());
        assert!(Viewport::new(f32::NAN, 10.0, 1.0).is_empty());
        assert!(!Viewport::new(1.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn pixel_size_applies_scale() {
        let vp = Viewport::new(400.0, 300.0, 2.0);
        assert_eq!(vp.pixel_size(), PixelSize::new(800, 600));
    }

    #[test]
    fn pixel_size_rounds_fractional_scale() {
        let vp = Viewport::new(101.0, 33.0, 1.5);
        assert_eq!(vp.pixel_size(), PixelSize::new(152, 50));
    }

    #[test]
    fn pixel_size_of_empty_viewport_is_zero() {
        assert!(Viewport::new(0.0, 300.0, 2.0).pixel_size().is_empty());
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        assert_eq!(Viewport::new(10.0, 20.0, 0.0).pixel_size(), PixelSize::new(10, 20));
    }

    #[test]
    fn pixel_size_display() {
        assert_eq!(PixelSize::new(1280, 720).to_string(), "1280x720");
    }
}
