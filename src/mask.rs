use crate::region::CanonicalRegion;
use image::{imageops, ImageBuffer, Pixel};

/// Filled ellipse inscribed in a crop, narrower horizontally than vertically.
///
/// Center is `(width / 2, height / 2)`, semi-axes are `0.4 * width` and
/// `0.5 * height`, both truncated to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EllipseMask {
    center: (u32, u32),
    axes: (u32, u32),
}

impl EllipseMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            center: (width / 2, height / 2),
            axes: ((width as f64 * 0.4) as u32, (height as f64 * 0.5) as u32),
        }
    }

    pub fn axes(&self) -> (u32, u32) {
        self.axes
    }

    /// Whether pixel `(x, y)` lies on or inside the ellipse.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        let (a, b) = (self.axes.0 as u64, self.axes.1 as u64);
        if a == 0 || b == 0 {
            return false;
        }

        let dx = (x as i64 - self.center.0 as i64).unsigned_abs();
        let dy = (y as i64 - self.center.1 as i64).unsigned_abs();

        dx * dx * b * b + dy * dy * a * a <= a * a * b * b
    }

    /// Zero every pixel outside the ellipse; pixels inside are untouched.
    pub fn apply<P>(&self, image: &mut ImageBuffer<P, Vec<u8>>)
    where
        P: Pixel<Subpixel = u8>,
    {
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            if !self.contains(x, y) {
                pixel.channels_mut().fill(0);
            }
        }
    }
}

/// Crop a frame to the canonical region and black out everything outside the
/// inscribed ellipse.
///
/// Works for grayscale and color frames alike. The region is expected to be
/// clamped to the frame already.
pub fn crop_and_mask<P>(
    frame: &ImageBuffer<P, Vec<u8>>,
    region: &CanonicalRegion,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let rect = region.rect;
    let mut cropped = imageops::crop_imm(frame, rect.x, rect.y, rect.width, rect.height).to_image();

    let (width, height) = cropped.dimensions();
    EllipseMask::new(width, height).apply(&mut cropped);

    cropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Rect;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn region(x: u32, y: u32, width: u32, height: u32) -> CanonicalRegion {
        CanonicalRegion {
            rect: Rect::new(x, y, width, height),
            count: 1,
        }
    }

    #[test]
    fn ellipse_is_narrower_than_crop() {
        let mask = EllipseMask::new(40, 40);
        assert_eq!(mask.axes(), (16, 20));

        assert!(mask.contains(20, 20));
        assert!(mask.contains(20, 0));
        assert!(mask.contains(20, 39));
        assert!(mask.contains(4, 20));
        assert!(mask.contains(36, 20));
        assert!(!mask.contains(3, 20));
        assert!(!mask.contains(37, 20));
        assert!(!mask.contains(0, 0));
        assert!(!mask.contains(39, 39));
    }

    #[test]
    fn degenerate_ellipse_masks_everything() {
        let mask = EllipseMask::new(2, 1);
        assert!(!mask.contains(1, 0));
    }

    #[test]
    fn gray_crop_matches_region() {
        let frame = GrayImage::from_fn(100, 80, |x, y| Luma([((x + y) % 200 + 1) as u8]));
        let out = crop_and_mask(&frame, &region(10, 10, 40, 40));

        assert_eq!(out.dimensions(), (40, 40));
        // Center pixel passes through unchanged.
        assert_eq!(out.get_pixel(20, 20), frame.get_pixel(30, 30));
        // Corners are outside the ellipse.
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(39, 0)[0], 0);
    }

    #[test]
    fn color_crop_zeroes_all_channels() {
        let frame = RgbImage::from_pixel(64, 64, Rgb([200, 100, 50]));
        let out = crop_and_mask(&frame, &region(0, 0, 32, 48));

        assert_eq!(out.dimensions(), (32, 48));
        assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*out.get_pixel(16, 24), Rgb([200, 100, 50]));
    }

    #[test]
    fn crop_never_exceeds_frame() {
        let frame = GrayImage::from_pixel(50, 50, Luma([9]));
        let clamped = Rect::new(30, 30, 40, 40).clamp_to(50, 50);
        let out = crop_and_mask(
            &frame,
            &region(clamped.x, clamped.y, clamped.width, clamped.height),
        );

        assert!(out.width() <= frame.width());
        assert!(out.height() <= frame.height());
        assert_eq!(out.dimensions(), (20, 20));
    }

    #[test]
    fn masking_twice_changes_nothing() {
        let frame = GrayImage::from_fn(60, 60, |x, y| Luma([(x * 3 + y) as u8 | 1]));
        let once = crop_and_mask(&frame, &region(5, 5, 50, 50));

        let mut twice = once.clone();
        EllipseMask::new(50, 50).apply(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn output_is_deterministic() {
        let frame = RgbImage::from_fn(80, 80, |x, y| Rgb([x as u8, y as u8, (x ^ y) as u8]));
        let r = region(12, 7, 41, 53);
        assert_eq!(crop_and_mask(&frame, &r), crop_and_mask(&frame, &r));
    }
}
