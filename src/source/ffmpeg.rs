use super::FrameSource;
use crate::error::{Error, Result};
use image::RgbImage;
use serde::Deserialize;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

/// Decodes a video file by piping raw RGB24 frames out of the ffmpeg CLI
pub struct FfmpegSource {
    child: Child,
    stdout: ChildStdout,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    frame_count: Option<usize>,
    next_index: usize,
}

/// Locations of the ffmpeg and ffprobe executables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl FfmpegTools {
    /// Look both tools up in `PATH`
    pub fn from_path() -> Result<Self> {
        Ok(Self {
            ffmpeg: which::which("ffmpeg").map_err(|_| open_error("ffmpeg not found in PATH"))?,
            ffprobe: which::which("ffprobe")
                .map_err(|_| open_error("ffprobe not found in PATH"))?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
}

fn open_error(message: impl Into<String>) -> Error {
    Error::SourceRead {
        index: None,
        message: message.into(),
    }
}

impl FfmpegSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(&FfmpegTools::from_path()?, path)
    }

    pub fn open_with<P: AsRef<Path>>(tools: &FfmpegTools, path: P) -> Result<Self> {
        let path = path.as_ref();

        let (width, height, frame_count) = probe(&tools.ffprobe, path)?;
        tracing::info!(
            "Opening {} ({}x{}, {} frames)",
            path.display(),
            width,
            height,
            frame_count.map_or_else(|| "unknown".to_string(), |n| n.to_string())
        );

        let mut child = decode_command(&tools.ffmpeg, path)
            .spawn()
            .map_err(|e| open_error(format!("failed to spawn ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| open_error("failed to capture ffmpeg stdout"))?;

        // Drained on its own thread so a chatty decoder never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            child,
            stdout,
            stderr,
            width,
            height,
            frame_count,
            next_index: 0,
        })
    }

    fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Reap ffmpeg at end of stream and turn a failed exit into a read error
    fn finish(&mut self, index: usize) -> Result<()> {
        let status = self.child.wait().map_err(|e| Error::SourceRead {
            index: Some(index),
            message: format!("failed to wait for ffmpeg: {}", e),
        })?;

        if status.success() {
            return Ok(());
        }

        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        Err(Error::SourceRead {
            index: Some(index),
            message: exit_message(status, &stderr),
        })
    }
}

fn exit_message(status: ExitStatus, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("ffmpeg exited with {}", status)
    } else {
        format!("ffmpeg exited with {}: {}", status, stderr)
    }
}

/// Raw RGB24 decode of the first video stream to stdout
///
/// Autorotation stays off so frames keep the coded size ffprobe reports.
fn decode_command(ffmpeg: &Path, path: &Path) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-hide_banner", "-loglevel", "error", "-noautorotate", "-i"])
        .arg(path)
        .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

fn probe(ffprobe: &Path, path: &Path) -> Result<(u32, u32, Option<usize>)> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,nb_frames",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| open_error(format!("failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(open_error(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe(&output.stdout)
}

fn parse_probe(json: &[u8]) -> Result<(u32, u32, Option<usize>)> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;

    let stream = probe
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| open_error("no video stream found"))?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            let frame_count = stream.nb_frames.and_then(|n| n.parse::<usize>().ok());
            Ok((width, height, frame_count))
        }
        _ => Err(open_error("video stream has no dimensions")),
    }
}

impl FrameSource for FfmpegSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let index = self.next_index;
        let mut buffer = vec![0u8; self.frame_bytes()];
        let mut filled = 0;

        while filled < buffer.len() {
            match self.stdout.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(Error::SourceRead {
                        index: Some(index),
                        message: e.to_string(),
                    })
                }
            }
        }

        if filled == 0 {
            self.finish(index)?;
            return Ok(None);
        }

        if filled < buffer.len() {
            return Err(Error::SourceRead {
                index: Some(index),
                message: format!("truncated frame: {} of {} bytes", filled, buffer.len()),
            });
        }

        let frame = RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(|| {
            Error::SourceRead {
                index: Some(index),
                message: "frame buffer does not match resolution".to_string(),
            }
        })?;

        self.next_index += 1;
        Ok(Some(frame))
    }

    fn frame_count(&self) -> Option<usize> {
        self.frame_count
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        // ffmpeg may still be decoding if the clip was aborted early.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
