use super::{OutputSink, Stream};
use crate::error::{Error, Result};
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

/// Writes every artifact as a PNG file into one directory
pub struct PngDirectory {
    dir: PathBuf,
    written: usize,
}

impl PngDirectory {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            return Err(Error::InvalidInput(format!(
                "output path {} is not a directory",
                dir.display()
            )));
        }

        tracing::info!("Writing artifacts to {}", dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            written: 0,
        })
    }

    pub fn path_for(&self, stream: Stream, index: usize) -> PathBuf {
        self.dir.join(stream.file_name(index))
    }

    /// Number of files written so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl OutputSink for PngDirectory {
    fn write_frame(&mut self, stream: Stream, index: usize, frame: &DynamicImage) -> Result<()> {
        let path = self.path_for(stream, index);
        tracing::debug!("Writing {}", path.display());

        frame.save_with_format(&path, ImageFormat::Png)?;
        self.written += 1;

        Ok(())
    }
}
