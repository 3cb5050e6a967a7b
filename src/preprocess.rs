use image::{GrayImage, Luma, Rgb, RgbImage};

/// Splits decoded frames into the grayscale and color streams
pub struct Preprocessor {
    equalize_gray: bool,
    equalize_color: bool,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl Preprocessor {
    pub fn new(equalize_gray: bool, equalize_color: bool) -> Self {
        Self {
            equalize_gray,
            equalize_color,
        }
    }

    /// Turn one decoded RGB frame into its grayscale and color variants
    ///
    /// Steps:
    /// 1. Grayscale via BT.601 luma, optionally histogram-equalized
    /// 2. Color frame with only its luma histogram-equalized (chroma kept)
    pub fn process(&self, frame: &RgbImage) -> (GrayImage, RgbImage) {
        let _span = tracing::debug_span!("preprocess").entered();

        let mut gray = to_gray(frame);
        if self.equalize_gray {
            equalize_histogram(&mut gray);
        }

        let color = if self.equalize_color {
            equalize_luma(frame)
        } else {
            frame.clone()
        };

        (gray, color)
    }
}

/// BT.601 grayscale conversion
pub fn to_gray(frame: &RgbImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let Rgb([r, g, b]) = *frame.get_pixel(x, y);
        Luma([luma(r, g, b)])
    })
}

fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Spread intensities over the full 0-255 range using the cumulative histogram
///
/// A constant image has nothing to spread and is left as is.
pub fn equalize_histogram(image: &mut GrayImage) {
    let lut = match equalization_lut(image.as_raw()) {
        Some(lut) => lut,
        None => return,
    };

    for pixel in image.pixels_mut() {
        pixel[0] = lut[pixel[0] as usize];
    }
}

fn equalization_lut(values: &[u8]) -> Option<[u8; 256]> {
    let mut histogram = [0u64; 256];
    for &v in values {
        histogram[v as usize] += 1;
    }

    let total = values.len() as u64;
    let cdf_min = histogram.iter().copied().find(|&count| count > 0)?;
    if total == cdf_min {
        return None;
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0u64;
    for (value, count) in histogram.iter().enumerate() {
        cdf += count;
        let scaled = (cdf.saturating_sub(cdf_min) * 255) as f64 / (total - cdf_min) as f64;
        lut[value] = scaled.round().clamp(0.0, 255.0) as u8;
    }

    Some(lut)
}

/// Equalize the Y channel of a YCrCb view of the frame and convert back
fn equalize_luma(frame: &RgbImage) -> RgbImage {
    let ycrcb: Vec<(u8, u8, u8)> = frame
        .pixels()
        .map(|&Rgb([r, g, b])| rgb_to_ycrcb(r, g, b))
        .collect();

    let luma: Vec<u8> = ycrcb.iter().map(|&(y, _, _)| y).collect();
    let lut = equalization_lut(&luma);

    let mut out = RgbImage::new(frame.width(), frame.height());
    for (pixel, &(y, cr, cb)) in out.pixels_mut().zip(ycrcb.iter()) {
        let y = lut.map_or(y, |lut| lut[y as usize]);
        *pixel = Rgb(ycrcb_to_rgb(y, cr, cb));
    }

    out
}

fn rgb_to_ycrcb(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (r as f32, g as f32, b as f32);
    let y = 0.299 * rf + 0.587 * gf + 0.114 * bf;
    let cr = (rf - y) * 0.713 + 128.0;
    let cb = (bf - y) * 0.564 + 128.0;

    (to_u8(y), to_u8(cr), to_u8(cb))
}

fn ycrcb_to_rgb(y: u8, cr: u8, cb: u8) -> [u8; 3] {
    let y = y as f32;
    let cr = cr as f32 - 128.0;
    let cb = cb as f32 - 128.0;

    [
        to_u8(y + 1.403 * cr),
        to_u8(y - 0.714 * cr - 0.344 * cb),
        to_u8(y + 1.773 * cb),
    ]
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_uses_bt601_weights() {
        let frame = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        assert_eq!(to_gray(&frame).get_pixel(0, 0)[0], 76);

        let white = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        assert_eq!(to_gray(&white).get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn equalization_stretches_range() {
        let mut image = GrayImage::from_fn(4, 1, |x, _| Luma([100 + x as u8]));
        equalize_histogram(&mut image);

        let values: Vec<u8> = image.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 85, 170, 255]);
    }

    #[test]
    fn constant_image_is_untouched() {
        let mut image = GrayImage::from_pixel(8, 8, Luma([42]));
        equalize_histogram(&mut image);
        assert!(image.pixels().all(|p| p[0] == 42));
    }

    #[test]
    fn gray_passthrough_by_default() {
        let frame = RgbImage::from_fn(4, 1, |x, _| Rgb([100 + x as u8; 3]));
        let (gray, _) = Preprocessor::default().process(&frame);
        let values: Vec<u8> = gray.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![100, 101, 102, 103]);

        let (gray, _) = Preprocessor::new(true, false).process(&frame);
        let values: Vec<u8> = gray.pixels().map(|p| p[0]).collect();
        assert_eq!(values, vec![0, 85, 170, 255]);
    }

    #[test]
    fn color_equalization_keeps_neutral_gray() {
        let frame = RgbImage::from_fn(2, 1, |x, _| Rgb([if x == 0 { 60 } else { 180 }; 3]));
        let (_, color) = Preprocessor::default().process(&frame);

        assert_eq!(*color.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*color.get_pixel(1, 0), Rgb([255, 255, 255]));
    }
}
