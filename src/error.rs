use thiserror::Error;

use crate::detection::Rect;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no face detected in {frames_scanned} scanned frame(s)")]
    NoFaceDetected { frames_scanned: usize },

    #[error("face region {region:?} lies outside the {width}x{height} frame")]
    RegionOutOfBounds { region: Rect, width: u32, height: u32 },

    #[error("{}", source_read_message(.index, .message))]
    SourceRead {
        index: Option<usize>,
        message: String,
    },

    #[error("face detector error: {0}")]
    Detector(String),

    #[error("flow solver error: {0}")]
    Flow(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("probe output error: {0}")]
    Probe(#[from] serde_json::Error),
}

fn source_read_message(index: &Option<usize>, message: &str) -> String {
    match index {
        Some(index) => format!("failed to read frame {}: {}", index, message),
        None => format!("failed to open frame source: {}", message),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
