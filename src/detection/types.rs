use image::GrayImage;

use crate::error::Result;

/// Axis-aligned face candidate in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point, truncated to whole pixels.
    pub const fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Strict containment: a point on the border is outside.
    pub const fn contains_strict(&self, x: u32, y: u32) -> bool {
        x > self.x && x < self.right() && y > self.y && y < self.bottom()
    }

    /// Shrink to fit inside a `width`x`height` frame.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }
}

/// Trait for face detectors
/// Lets the region tracker run against a real backend or a deterministic fake
pub trait FaceDetector {
    /// Return every face candidate found in a grayscale frame (possibly none)
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Rect>>;
}

impl<D: FaceDetector + ?Sized> FaceDetector for Box<D> {
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Rect>> {
        (**self).detect(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_truncates() {
        assert_eq!(Rect::new(10, 10, 41, 41).center(), (30, 30));
    }

    #[test]
    fn border_points_are_outside() {
        let rect = Rect::new(10, 10, 40, 40);
        assert!(rect.contains_strict(30, 30));
        assert!(!rect.contains_strict(10, 30));
        assert!(!rect.contains_strict(50, 30));
        assert!(!rect.contains_strict(30, 50));
        assert!(rect.contains_strict(49, 49));
    }

    #[test]
    fn clamp_shrinks_to_frame() {
        let rect = Rect::new(80, 90, 40, 40).clamp_to(100, 100);
        assert_eq!(rect, Rect::new(80, 90, 20, 10));

        let outside = Rect::new(120, 10, 40, 40).clamp_to(100, 100);
        assert!(outside.is_empty());
    }
}
