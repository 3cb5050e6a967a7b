mod seeta;
pub mod types;

pub use seeta::SeetaDetector;
pub use types::{FaceDetector, Rect};

use crate::error::Result;
use std::path::Path;

/// Create the default face detector (SeetaFace)
pub fn create_default_detector<P: AsRef<Path>>(
    model_path: P,
    min_face_size: u32,
) -> Result<Box<dyn FaceDetector>> {
    let detector = SeetaDetector::new(model_path, min_face_size)?;
    Ok(Box::new(detector))
}
