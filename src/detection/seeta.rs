use super::types::{FaceDetector, Rect};
use crate::error::{Error, Result};
use image::GrayImage;
use rustface::{Detector, ImageData};
use std::path::Path;

/// SeetaFace frontal face detector backed by `rustface`
pub struct SeetaDetector {
    detector: Box<dyn Detector>,
}

impl SeetaDetector {
    /// Load the detector from a SeetaFace model file
    ///
    /// # Default Configuration
    /// - Minimum face size: `min_face_size` pixels
    /// - Score threshold: 2.0
    /// - Pyramid scale factor: 0.8
    /// - Slide window step: 4x4
    pub fn new<P: AsRef<Path>>(model_path: P, min_face_size: u32) -> Result<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading face detector from {}", path.display());

        let path_str = path
            .to_str()
            .ok_or_else(|| Error::Detector(format!("non UTF-8 model path {}", path.display())))?;

        let mut detector = rustface::create_detector(path_str).map_err(|e| {
            Error::Detector(format!("failed to load model {}: {}", path.display(), e))
        })?;
        detector.set_min_face_size(min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        tracing::info!("Face detector loaded successfully");

        Ok(Self { detector })
    }
}

impl FaceDetector for SeetaDetector {
    fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Rect>> {
        let _span = tracing::debug_span!("seeta_detect").entered();

        let (width, height) = frame.dimensions();
        let image = ImageData::new(frame.as_raw(), width, height);

        let faces = self
            .detector
            .detect(&image)
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                to_rect(bbox.x(), bbox.y(), bbox.width(), bbox.height())
            })
            .collect();

        Ok(faces)
    }
}

/// Detector boxes may start left of or above the frame; cut them at the origin.
fn to_rect(x: i32, y: i32, width: u32, height: u32) -> Option<Rect> {
    let cut_x = x.min(0).unsigned_abs();
    let cut_y = y.min(0).unsigned_abs();
    let rect = Rect::new(
        x.max(0) as u32,
        y.max(0) as u32,
        width.saturating_sub(cut_x),
        height.saturating_sub(cut_y),
    );

    (!rect.is_empty()).then_some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_origin_is_cut() {
        assert_eq!(to_rect(-5, 10, 40, 40), Some(Rect::new(0, 10, 35, 40)));
        assert_eq!(to_rect(3, -40, 40, 40), None);
        assert_eq!(to_rect(3, 4, 40, 40), Some(Rect::new(3, 4, 40, 40)));
    }
}
