//! Dense motion fields over a cropped grayscale sequence.
//!
//! A [`FlowSolver`] turns two frames into raw per-pixel displacement. The
//! [`FlowDeriver`] decides which frame every frame is compared against
//! ([`FlowPolicy`]) and rescales the raw field into displayable 8-bit images.

mod horn_schunck;

pub use horn_schunck::HornSchunck;

use crate::error::{Error, Result};
use image::{GrayImage, Luma};
use ndarray::Array2;

/// Displacement that maps to the ends of the 0-255 display range.
pub const DEFAULT_FLOW_RANGE: f32 = 10.0;

/// Default multiplier applied before shifting to the display midpoint.
pub const DEFAULT_FLOW_SCALE: f32 = 128.0 / DEFAULT_FLOW_RANGE;

/// Display value for zero displacement.
pub const FLOW_MIDPOINT: f32 = 128.0;

/// Raw per-pixel displacement, shaped `(height, width)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowField {
    pub x: Array2<f32>,
    pub y: Array2<f32>,
}

impl FlowField {
    pub fn zeros(width: u32, height: u32) -> Self {
        let shape = (height as usize, width as usize);
        Self {
            x: Array2::zeros(shape),
            y: Array2::zeros(shape),
        }
    }

    /// (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        let (rows, cols) = self.x.dim();
        (cols as u32, rows as u32)
    }
}

/// Trait for dense optical-flow backends
pub trait FlowSolver {
    /// Displacement of every pixel from `prev` to `next`
    ///
    /// Both frames have the same dimensions; the field matches them.
    fn compute(&mut self, prev: &GrayImage, next: &GrayImage) -> Result<FlowField>;
}

impl<S: FlowSolver + ?Sized> FlowSolver for Box<S> {
    fn compute(&mut self, prev: &GrayImage, next: &GrayImage) -> Result<FlowField> {
        (**self).compute(prev, next)
    }
}

/// Which frame each frame's motion is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FlowPolicy {
    /// Cumulative motion relative to the first frame of the clip
    #[default]
    Static,
    /// Frame-to-frame motion relative to the previous frame
    Continuous,
}

impl FlowPolicy {
    /// Index of the reference frame for frame `index`.
    pub fn reference(self, index: usize) -> usize {
        match self {
            FlowPolicy::Static => 0,
            FlowPolicy::Continuous => index.saturating_sub(1),
        }
    }
}

/// Flow fields of a clip as display images, one per input frame.
#[derive(Debug, Clone, Default)]
pub struct FlowStreams {
    pub x: Vec<GrayImage>,
    pub y: Vec<GrayImage>,
}

/// Computes display-ready flow for whole sequences under one policy
pub struct FlowDeriver<S> {
    solver: S,
    policy: FlowPolicy,
    scale: f32,
}

impl<S: FlowSolver> FlowDeriver<S> {
    pub fn new(solver: S, policy: FlowPolicy) -> Self {
        Self {
            solver,
            policy,
            scale: DEFAULT_FLOW_SCALE,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Flow for every frame against its policy reference
    ///
    /// The output has exactly one x and one y image per input frame; the first
    /// frame is compared to itself under both policies.
    pub fn derive(&mut self, frames: &[GrayImage]) -> Result<FlowStreams> {
        let mut streams = FlowStreams {
            x: Vec::with_capacity(frames.len()),
            y: Vec::with_capacity(frames.len()),
        };

        for (index, frame) in frames.iter().enumerate() {
            let _span = tracing::debug_span!("flow", index).entered();

            let reference = &frames[self.policy.reference(index)];
            if reference.dimensions() != frame.dimensions() {
                return Err(Error::Flow(format!(
                    "frame {} is {:?}, reference is {:?}",
                    index,
                    frame.dimensions(),
                    reference.dimensions()
                )));
            }

            let field = self.solver.compute(reference, frame)?;
            if field.dimensions() != frame.dimensions() {
                return Err(Error::Flow(format!(
                    "solver returned {:?} field for {:?} frame {}",
                    field.dimensions(),
                    frame.dimensions(),
                    index
                )));
            }

            streams.x.push(to_display(&field.x, self.scale));
            streams.y.push(to_display(&field.y, self.scale));
        }

        tracing::info!(
            "Derived {} flow field(s) with {:?} policy",
            streams.x.len(),
            self.policy
        );

        Ok(streams)
    }
}

/// Map raw displacement into 0-255 around the 128 midpoint
pub fn to_display(raw: &Array2<f32>, scale: f32) -> GrayImage {
    let (rows, cols) = raw.dim();
    GrayImage::from_fn(cols as u32, rows as u32, |x, y| {
        let value = raw[[y as usize, x as usize]];
        Luma([display_value(value, scale)])
    })
}

fn display_value(raw: f32, scale: f32) -> u8 {
    (raw * scale + FLOW_MIDPOINT).round().clamp(0.0, 255.0) as u8
}
