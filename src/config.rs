use crate::flow::{FlowPolicy, DEFAULT_FLOW_SCALE};
use crate::region::DEFAULT_DETECT_STRIDE;

/// Knobs for one clip run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Maximum frames written per stream; 0 writes all
    pub max_frame_count: usize,
    /// Run the detector on every n-th frame
    pub detect_stride: usize,
    /// Reference frame policy for flow
    pub policy: FlowPolicy,
    /// Multiplier mapping raw displacement into the display range
    pub flow_scale: f32,
    /// Histogram-equalize the grayscale stream
    pub equalize_gray: bool,
    /// Histogram-equalize the luma of the color stream
    pub equalize_color: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frame_count: 0,
            detect_stride: DEFAULT_DETECT_STRIDE,
            policy: FlowPolicy::Static,
            flow_scale: DEFAULT_FLOW_SCALE,
            equalize_gray: false,
            equalize_color: true,
        }
    }
}
