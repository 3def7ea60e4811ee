use cylinder_core::{Keypoint, MatchConfig, NormalizedImage};
use log::debug;

use crate::error::{DetectError, DetectResult};
use crate::peaks::LocalMaxima;
use crate::types::ScoredPeak;

/// Finds the brightest well-separated local maxima of a normalized fingerprint
#[derive(Debug, Clone)]
pub struct PeakDetector {
    pub(crate) size: u32,
    pub(crate) min_distance: usize,
    pub(crate) max_keypoints: usize,
    pub(crate) exclude_border: usize,
}

impl PeakDetector {
    /// Creates a detector from a validated configuration. Peaks closer than
    /// `min_distance` to the border are excluded.
    pub fn new(cfg: &MatchConfig) -> DetectResult<Self> {
        cfg.validate()?;
        Ok(Self {
            size: cfg.canonical_size,
            min_distance: cfg.min_distance,
            max_keypoints: cfg.max_keypoints,
            exclude_border: cfg.min_distance,
        })
    }

    fn validate_image(&self, img: &NormalizedImage) -> DetectResult<()> {
        if img.size() != self.size as usize {
            return Err(DetectError::UnexpectedImageSize {
                size: img.size(),
                expected: self.size,
            });
        }
        Ok(())
    }

    /// Peaks in detection order (row, column), strongest first
    pub fn detect_peaks(&self, img: &NormalizedImage) -> DetectResult<Vec<ScoredPeak>> {
        self.validate_image(img)?;

        let candidates = LocalMaxima::candidates(img, self.min_distance, self.exclude_border);
        let n_candidates = candidates.len();
        let peaks = LocalMaxima::select(candidates, self.min_distance, self.max_keypoints);
        debug!("{} local maxima, kept {}", n_candidates, peaks.len());

        Ok(peaks)
    }

    /// Keypoints as (x, y) = (column, row). An empty result is not an error.
    pub fn detect_keypoints(&self, img: &NormalizedImage) -> DetectResult<Vec<Keypoint>> {
        Ok(self.detect_peaks(img)?.iter().map(ScoredPeak::keypoint).collect())
    }

    pub fn min_distance(&self) -> usize {
        self.min_distance
    }

    pub fn max_keypoints(&self) -> usize {
        self.max_keypoints
    }

    pub fn exclude_border(&self) -> usize {
        self.exclude_border
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.size as usize, self.size as usize)
    }
}
