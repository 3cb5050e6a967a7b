use anyhow::{bail, Context, Result};
use clap::Parser;
use faceflow::flow::{FlowPolicy, DEFAULT_FLOW_SCALE};
use faceflow::region::DEFAULT_DETECT_STRIDE;
use faceflow::{
    detection, ClipPipeline, FfmpegSource, HornSchunck, PipelineConfig, PngDirectory,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "extract", author, version, long_about = None)]
#[command(about = "Crop, mask and compute optical flow for face video clips")]
struct Args {
    /// Maximum frames written per stream (0 writes every frame)
    max_frame_count: usize,

    /// Input video file
    path_to_video: PathBuf,

    /// Existing directory receiving the PNG artifacts
    output_path: PathBuf,

    /// SeetaFace detector model
    #[arg(long, default_value = "seeta_fd_frontal_v1.0.bin")]
    detector_model: PathBuf,

    /// Minimum face size for detection
    #[arg(long, default_value_t = 30)]
    min_face_size: u32,

    /// Run face detection on every n-th frame
    #[arg(long, default_value_t = DEFAULT_DETECT_STRIDE)]
    detect_stride: usize,

    /// Frame each flow field is measured against
    #[arg(long, value_enum, default_value_t = FlowPolicy::Static)]
    policy: FlowPolicy,

    /// Display units per pixel of displacement (default maps +-10 px to 0-255)
    #[arg(long, default_value_t = DEFAULT_FLOW_SCALE)]
    flow_scale: f32,

    /// Histogram-equalize the grayscale frames
    #[arg(long)]
    equalize_gray: bool,

    /// Keep color frames as decoded instead of equalizing their luma
    #[arg(long)]
    no_equalize_color: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if !args.path_to_video.is_file() {
        bail!(
            "The specified <path_to_video> {} is not a valid filename",
            args.path_to_video.display()
        );
    }

    if !args.output_path.is_dir() {
        bail!(
            "The specified <output_path> {} is not a valid directory",
            args.output_path.display()
        );
    }

    let video = args.path_to_video.display().to_string();
    tracing::info!("Processing {}", video);
    tracing::info!(
        "Max frames: {}, detect stride: {}, flow policy: {:?}",
        args.max_frame_count,
        args.detect_stride,
        args.policy
    );

    let config = PipelineConfig {
        max_frame_count: args.max_frame_count,
        detect_stride: args.detect_stride,
        policy: args.policy,
        flow_scale: args.flow_scale,
        equalize_gray: args.equalize_gray,
        equalize_color: !args.no_equalize_color,
    };

    let detector = detection::create_default_detector(&args.detector_model, args.min_face_size)
        .context("Failed to initialize face detector")?;

    let mut source = FfmpegSource::open(&args.path_to_video)
        .with_context(|| format!("Failed to open video {}", video))?;

    let mut sink = PngDirectory::new(&args.output_path)
        .with_context(|| format!("Failed to prepare output {}", args.output_path.display()))?;

    let mut pipeline = ClipPipeline::new(detector, HornSchunck::default(), config);
    let report = pipeline
        .run(&mut source, &mut sink)
        .with_context(|| format!("Failed to process clip {}", video))?;

    tracing::info!(
        "Wrote {} file(s) for {} frame(s), face region {:?} from {} detection(s)",
        report.written,
        report.frames,
        report.region.rect,
        report.region.count
    );

    Ok(())
}
