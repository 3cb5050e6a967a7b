//! # faceflow
//!
//! Turns short face-video clips into training samples:
//!
//! 1. Detect faces on every n-th frame and fold the boxes into one canonical
//!    region for the whole clip ([`region`])
//! 2. Crop every frame to that region and black out everything outside an
//!    inscribed ellipse ([`mask`])
//! 3. Compute dense optical flow against the first or the previous frame
//!    ([`flow`])
//! 4. Keep an evenly spaced subset of frames and write color, gray, flow-x and
//!    flow-y images under the same indices ([`sampler`], [`output`])
//!
//! Face detection, video decoding and the flow solver sit behind the
//! [`FaceDetector`], [`FrameSource`] and [`FlowSolver`] traits so the pipeline
//! can be driven by fakes.

pub mod config;
pub mod detection;
mod error;
pub mod flow;
pub mod mask;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod region;
pub mod sampler;
pub mod source;

pub use config::PipelineConfig;
pub use detection::{FaceDetector, Rect, SeetaDetector};
pub use error::{Error, Result};
pub use flow::{FlowDeriver, FlowField, FlowPolicy, FlowSolver, HornSchunck};
pub use mask::{crop_and_mask, EllipseMask};
pub use output::{OutputSink, PngDirectory, Stream};
pub use pipeline::{ClipPipeline, ClipReport};
pub use region::{track, CanonicalRegion, RegionCluster, RegionTracker};
pub use sampler::sample;
pub use source::{Clip, FfmpegSource, FfmpegTools, FrameSource};
