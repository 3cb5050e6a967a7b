//! Face-region consensus across a clip.
//!
//! Detections from sampled frames are folded into clusters with a greedy
//! first-fit rule: a candidate joins the first cluster whose envelope strictly
//! contains its center, otherwise it opens a new cluster. The cluster that
//! absorbed the most detections becomes the canonical region for the clip.

use crate::detection::{FaceDetector, Rect};
use crate::error::{Error, Result};
use image::GrayImage;

/// Default interval between frames handed to the detector.
pub const DEFAULT_DETECT_STRIDE: usize = 10;

/// Bounding envelope of every detection merged into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionCluster {
    pub min_x: u32,
    pub min_y: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub count: usize,
}

impl RegionCluster {
    fn from_rect(rect: Rect) -> Self {
        Self {
            min_x: rect.x,
            min_y: rect.y,
            max_width: rect.width,
            max_height: rect.height,
            count: 1,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_width, self.max_height)
    }

    fn absorb(&mut self, rect: Rect) {
        self.min_x = self.min_x.min(rect.x);
        self.min_y = self.min_y.min(rect.y);
        self.max_width = self.max_width.max(rect.width);
        self.max_height = self.max_height.max(rect.height);
        self.count += 1;
    }
}

/// Online clusterer holding clip-local state.
#[derive(Debug, Default)]
pub struct RegionTracker {
    clusters: Vec<RegionCluster>,
}

impl RegionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one detection into the first cluster containing its center.
    pub fn observe(&mut self, rect: Rect) {
        let (cx, cy) = rect.center();

        for cluster in self.clusters.iter_mut() {
            if cluster.rect().contains_strict(cx, cy) {
                cluster.absorb(rect);
                return;
            }
        }

        self.clusters.push(RegionCluster::from_rect(rect));
    }

    pub fn clusters(&self) -> &[RegionCluster] {
        &self.clusters
    }

    /// Highest-count cluster; the earliest one wins a tie.
    pub fn canonical(&self) -> Option<RegionCluster> {
        select_canonical(&self.clusters)
    }
}

/// Pick the cluster with the highest count, first occurrence on ties.
pub fn select_canonical(clusters: &[RegionCluster]) -> Option<RegionCluster> {
    clusters.iter().fold(None, |best: Option<RegionCluster>, cluster| match best {
        Some(best) if best.count >= cluster.count => Some(best),
        _ => Some(*cluster),
    })
}

/// The region every frame of a clip is cropped to, already clamped to the
/// frame bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalRegion {
    pub rect: Rect,
    pub count: usize,
}

impl CanonicalRegion {
    /// Clamp a cluster envelope into a `width`x`height` frame.
    pub fn clamped(cluster: RegionCluster, width: u32, height: u32) -> Result<Self> {
        let rect = cluster.rect().clamp_to(width, height);

        if rect.is_empty() {
            return Err(Error::RegionOutOfBounds {
                region: cluster.rect(),
                width,
                height,
            });
        }

        if rect != cluster.rect() {
            tracing::warn!(
                "Face region {:?} exceeds {}x{} frame, clamped to {:?}",
                cluster.rect(),
                width,
                height,
                rect
            );
        }

        Ok(Self {
            rect,
            count: cluster.count,
        })
    }
}

/// Run the detector on every `stride`-th frame and return the clip's
/// canonical face region.
pub fn track<D>(frames: &[GrayImage], detector: &mut D, stride: usize) -> Result<CanonicalRegion>
where
    D: FaceDetector + ?Sized,
{
    let stride = stride.max(1);
    let mut tracker = RegionTracker::new();
    let mut frames_scanned = 0;

    for (index, frame) in frames.iter().enumerate().step_by(stride) {
        let _span = tracing::debug_span!("detect", index).entered();

        let faces = detector.detect(frame)?;
        tracing::debug!("Frame {}: {} face candidate(s)", index, faces.len());

        for face in faces {
            tracker.observe(face);
        }
        frames_scanned += 1;
    }

    let cluster = tracker
        .canonical()
        .ok_or(Error::NoFaceDetected { frames_scanned })?;

    tracing::info!(
        "Scanned {} frame(s), {} cluster(s), canonical {:?} with {} detection(s)",
        frames_scanned,
        tracker.clusters().len(),
        cluster.rect(),
        cluster.count
    );

    let (width, height) = frames
        .first()
        .map(|frame| frame.dimensions())
        .unwrap_or((0, 0));

    CanonicalRegion::clamped(cluster, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(count: usize) -> RegionCluster {
        RegionCluster {
            min_x: count as u32,
            min_y: 0,
            max_width: 10,
            max_height: 10,
            count,
        }
    }

    struct ScriptedDetector {
        hits: Vec<(usize, Rect)>,
        calls: Vec<usize>,
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&mut self, frame: &GrayImage) -> Result<Vec<Rect>> {
            // Frame index is encoded in the first pixel.
            let index = frame.get_pixel(0, 0)[0] as usize;
            self.calls.push(index);
            Ok(self
                .hits
                .iter()
                .filter(|(i, _)| *i == index)
                .map(|(_, rect)| *rect)
                .collect())
        }
    }

    fn indexed_frames(len: usize) -> Vec<GrayImage> {
        (0..len)
            .map(|i| GrayImage::from_pixel(100, 100, image::Luma([i as u8])))
            .collect()
    }

    #[test]
    fn overlapping_detections_merge() {
        let mut tracker = RegionTracker::new();
        tracker.observe(Rect::new(10, 10, 40, 40));
        tracker.observe(Rect::new(12, 8, 44, 38));

        assert_eq!(tracker.clusters().len(), 1);
        let merged = tracker.clusters()[0];
        assert_eq!(merged.count, 2);
        assert_eq!((merged.min_x, merged.min_y), (10, 8));
        assert_eq!((merged.max_width, merged.max_height), (44, 40));
    }

    #[test]
    fn envelope_never_shrinks() {
        let mut tracker = RegionTracker::new();
        tracker.observe(Rect::new(10, 10, 60, 60));
        let mut previous = tracker.clusters()[0];

        for rect in [
            Rect::new(20, 20, 30, 30),
            Rect::new(5, 15, 50, 70),
            Rect::new(25, 25, 20, 20),
        ] {
            tracker.observe(rect);
            let current = tracker.clusters()[0];
            assert!(current.min_x <= previous.min_x);
            assert!(current.min_y <= previous.min_y);
            assert!(current.max_width >= previous.max_width);
            assert!(current.max_height >= previous.max_height);
            assert!(current.count > previous.count);
            previous = current;
        }
    }

    #[test]
    fn center_on_border_opens_new_cluster() {
        let mut tracker = RegionTracker::new();
        tracker.observe(Rect::new(0, 0, 20, 20));
        // Center lands at (20, 10), exactly on the right edge.
        tracker.observe(Rect::new(10, 0, 20, 20));

        assert_eq!(tracker.clusters().len(), 2);
        assert!(tracker.clusters().iter().all(|c| c.count == 1));
    }

    #[test]
    fn first_fit_wins_over_better_fit() {
        let mut tracker = RegionTracker::new();
        tracker.observe(Rect::new(0, 0, 100, 100));
        tracker.observe(Rect::new(40, 40, 10, 10));
        tracker.observe(Rect::new(42, 42, 10, 10));

        assert_eq!(tracker.clusters().len(), 1);
        assert_eq!(tracker.clusters()[0].count, 3);
    }

    #[test]
    fn canonical_prefers_first_on_tie() {
        let clusters = [cluster(3), cluster(5), cluster(5)];
        let chosen = select_canonical(&clusters).unwrap();
        assert_eq!(chosen, clusters[1]);

        assert_eq!(select_canonical(&[cluster(7), cluster(2)]), Some(cluster(7)));
        assert_eq!(select_canonical(&[]), None);
    }

    #[test]
    fn track_visits_strided_frames() {
        let mut detector = ScriptedDetector {
            hits: vec![(0, Rect::new(10, 10, 40, 40)), (20, Rect::new(11, 9, 40, 42))],
            calls: Vec::new(),
        };

        let region = track(&indexed_frames(25), &mut detector, 10).unwrap();

        assert_eq!(detector.calls, vec![0, 10, 20]);
        assert_eq!(region.count, 2);
        assert_eq!(region.rect, Rect::new(10, 9, 40, 42));
    }

    #[test]
    fn track_without_faces_fails() {
        let mut detector = ScriptedDetector {
            hits: Vec::new(),
            calls: Vec::new(),
        };

        let err = track(&indexed_frames(12), &mut detector, 10).unwrap_err();
        assert!(matches!(err, Error::NoFaceDetected { frames_scanned: 2 }));
    }

    #[test]
    fn track_clamps_to_frame() {
        let mut detector = ScriptedDetector {
            hits: vec![(0, Rect::new(70, 80, 50, 50))],
            calls: Vec::new(),
        };

        let region = track(&indexed_frames(1), &mut detector, 10).unwrap();
        assert_eq!(region.rect, Rect::new(70, 80, 30, 20));
    }

    #[test]
    fn region_past_frame_edge_is_rejected() {
        let cluster = RegionCluster {
            min_x: 100,
            min_y: 0,
            max_width: 20,
            max_height: 20,
            count: 1,
        };

        let err = CanonicalRegion::clamped(cluster, 100, 100).unwrap_err();
        assert!(matches!(err, Error::RegionOutOfBounds { .. }));
    }
}
