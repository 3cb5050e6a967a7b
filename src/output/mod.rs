mod png;

pub use png::PngDirectory;

use crate::error::Result;
use image::DynamicImage;

/// Artifact streams produced for every clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stream {
    /// Cropped, masked color frames
    FrameColor,
    /// Cropped, masked grayscale frames
    FrameGray,
    /// Horizontal flow component
    FlowX,
    /// Vertical flow component
    FlowY,
}

impl Stream {
    pub const ALL: [Stream; 4] = [
        Stream::FrameColor,
        Stream::FrameGray,
        Stream::FlowX,
        Stream::FlowY,
    ];

    /// File name prefix; `frame-bgr` is kept so existing consumers still match
    pub fn name(self) -> &'static str {
        match self {
            Stream::FrameColor => "frame-bgr",
            Stream::FrameGray => "frame-gray",
            Stream::FlowX => "flow-x",
            Stream::FlowY => "flow-y",
        }
    }

    /// `<stream>_<index>.png`
    pub fn file_name(self, index: usize) -> String {
        format!("{}_{}.png", self.name(), index)
    }
}

/// Trait for artifact destinations
pub trait OutputSink {
    /// Persist the frame at source index `index` of `stream`
    fn write_frame(&mut self, stream: Stream, index: usize, frame: &DynamicImage) -> Result<()>;
}

impl<O: OutputSink + ?Sized> OutputSink for &mut O {
    fn write_frame(&mut self, stream: Stream, index: usize, frame: &DynamicImage) -> Result<()> {
        (**self).write_frame(stream, index, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_carry_stream_and_index() {
        assert_eq!(Stream::FrameColor.file_name(0), "frame-bgr_0.png");
        assert_eq!(Stream::FrameGray.file_name(12), "frame-gray_12.png");
        assert_eq!(Stream::FlowX.file_name(3), "flow-x_3.png");
        assert_eq!(Stream::FlowY.file_name(45), "flow-y_45.png");
    }
}
