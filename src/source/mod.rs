mod ffmpeg;

pub use ffmpeg::{FfmpegSource, FfmpegTools};

use crate::error::{Error, Result};
use crate::preprocess::Preprocessor;
use image::{GrayImage, RgbImage};

/// Trait for ordered, finite frame sources
///
/// Opening happens in the implementor's constructor and closing on drop.
pub trait FrameSource {
    /// Next frame in order, or `None` at end of stream
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Total number of frames, if the container reports it
    fn frame_count(&self) -> Option<usize>;

    /// Get the resolution of produced frames
    fn resolution(&self) -> (u32, u32);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).read_frame()
    }

    fn frame_count(&self) -> Option<usize> {
        (**self).frame_count()
    }

    fn resolution(&self) -> (u32, u32) {
        (**self).resolution()
    }
}

/// Every frame of one clip, as parallel grayscale and color streams
#[derive(Debug, Clone, Default)]
pub struct Clip {
    pub gray: Vec<GrayImage>,
    pub color: Vec<RgbImage>,
}

impl Clip {
    /// Drain a source completely, preprocessing each frame
    ///
    /// Any read failure aborts the clip; frames read so far are dropped.
    pub fn read<S>(source: &mut S, preprocessor: &Preprocessor) -> Result<Self>
    where
        S: FrameSource + ?Sized,
    {
        let capacity = source.frame_count().unwrap_or(0);
        let mut clip = Clip {
            gray: Vec::with_capacity(capacity),
            color: Vec::with_capacity(capacity),
        };
        let expected = source.resolution();

        loop {
            let index = clip.len();
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Frame source failed at frame {}: {}", index, e);
                    return Err(e);
                }
            };

            let dimensions = frame.dimensions();
            if dimensions != expected {
                tracing::error!("Frame {} does not match the source resolution", index);
                return Err(Error::SourceRead {
                    index: Some(index),
                    message: format!("frame is {:?}, source reports {:?}", dimensions, expected),
                });
            }

            let (gray, color) = preprocessor.process(&frame);
            clip.gray.push(gray);
            clip.color.push(color);
        }

        if clip.is_empty() {
            tracing::error!("Frame source yielded no frames");
            return Err(Error::SourceRead {
                index: Some(0),
                message: "source yielded no frames".to_string(),
            });
        }

        if let Some(reported) = source.frame_count() {
            if reported != clip.len() {
                tracing::warn!(
                    "Source reported {} frames but yielded {}",
                    reported,
                    clip.len()
                );
            }
        }

        tracing::info!("Read {} frame(s)", clip.len());

        Ok(clip)
    }

    pub fn len(&self) -> usize {
        self.gray.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gray.is_empty()
    }
}
