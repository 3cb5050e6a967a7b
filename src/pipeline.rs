use crate::config::PipelineConfig;
use crate::detection::FaceDetector;
use crate::error::Result;
use crate::flow::{FlowDeriver, FlowSolver};
use crate::mask::crop_and_mask;
use crate::output::{OutputSink, Stream};
use crate::preprocess::Preprocessor;
use crate::region::{track, CanonicalRegion};
use crate::sampler::sample;
use crate::source::{Clip, FrameSource};
use image::DynamicImage;
use std::time::Instant;

/// Summary of one processed clip
#[derive(Debug, Clone, PartialEq)]
pub struct ClipReport {
    pub frames: usize,
    pub region: CanonicalRegion,
    pub indices: Vec<usize>,
    pub written: usize,
}

/// Runs a clip end to end: read, locate face, crop and mask, flow, write
pub struct ClipPipeline<D, S> {
    detector: D,
    deriver: FlowDeriver<S>,
    preprocessor: Preprocessor,
    config: PipelineConfig,
}

impl<D, S> ClipPipeline<D, S>
where
    D: FaceDetector,
    S: FlowSolver,
{
    pub fn new(detector: D, solver: S, config: PipelineConfig) -> Self {
        let deriver = FlowDeriver::new(solver, config.policy).with_scale(config.flow_scale);
        let preprocessor = Preprocessor::new(config.equalize_gray, config.equalize_color);

        Self {
            detector,
            deriver,
            preprocessor,
            config,
        }
    }

    /// Process every frame of `source` and hand the sampled artifacts to `sink`
    ///
    /// Nothing is written unless every stage before persistence succeeds.
    pub fn run<Src, O>(&mut self, source: &mut Src, sink: &mut O) -> Result<ClipReport>
    where
        Src: FrameSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        let started = Instant::now();

        let clip = Clip::read(source, &self.preprocessor)?;
        let frames = clip.len();

        let region = track(&clip.gray, &mut self.detector, self.config.detect_stride)?;

        let (gray, color) = {
            let _span = tracing::debug_span!("crop_and_mask").entered();
            let gray: Vec<_> = clip.gray.iter().map(|f| crop_and_mask(f, &region)).collect();
            let color: Vec<_> = clip.color.iter().map(|f| crop_and_mask(f, &region)).collect();
            (gray, color)
        };
        drop(clip);
        tracing::info!(
            "Cropped {} frame(s) to {}x{} at ({}, {})",
            frames,
            region.rect.width,
            region.rect.height,
            region.rect.x,
            region.rect.y
        );

        let flow = self.deriver.derive(&gray)?;

        let indices = sample(frames, self.config.max_frame_count);
        tracing::info!("Writing {} of {} frame(s) per stream", indices.len(), frames);

        let mut written = 0;
        written += write_stream(sink, Stream::FrameColor, color, &indices)?;
        written += write_stream(sink, Stream::FrameGray, gray, &indices)?;
        written += write_stream(sink, Stream::FlowX, flow.x, &indices)?;
        written += write_stream(sink, Stream::FlowY, flow.y, &indices)?;

        tracing::info!(
            "Clip done: {} file(s) in {:.1}s",
            written,
            started.elapsed().as_secs_f64()
        );

        Ok(ClipReport {
            frames,
            region,
            indices,
            written,
        })
    }
}

/// Write the frames of one stream whose index is in `indices` (sorted)
fn write_stream<I, O>(
    sink: &mut O,
    stream: Stream,
    frames: Vec<I>,
    indices: &[usize],
) -> Result<usize>
where
    I: Into<DynamicImage>,
    O: OutputSink + ?Sized,
{
    let mut written = 0;

    for (index, frame) in frames.into_iter().enumerate() {
        if indices.binary_search(&index).is_err() {
            continue;
        }
        sink.write_frame(stream, index, &frame.into())?;
        written += 1;
    }

    Ok(written)
}
