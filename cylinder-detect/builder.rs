use cylinder_core::MatchConfig;

use crate::detector::PeakDetector;
use crate::error::DetectResult;

/// Builder for creating a `PeakDetector`
#[derive(Debug, Clone)]
pub struct DetectorBuilder {
    config: MatchConfig,
    exclude_border: Option<usize>,
}

impl Default for DetectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            config: MatchConfig::default(),
            exclude_border: None,
        }
    }

    /// Create a builder from an existing `MatchConfig`
    pub fn from_config(config: MatchConfig) -> Self {
        Self {
            config,
            exclude_border: None,
        }
    }

    /// Set the side length of the normalized images the detector accepts
    pub fn canonical_size(mut self, size: u32) -> Self {
        self.config.canonical_size = size;
        self
    }

    /// Set the minimum separation between peaks
    pub fn min_distance(mut self, distance: usize) -> Self {
        self.config.min_distance = distance;
        self
    }

    /// Set the maximum number of keypoints returned
    pub fn max_keypoints(mut self, cap: usize) -> Self {
        self.config.max_keypoints = cap;
        self
    }

    /// Override the border band in which peaks are ignored (defaults to the minimum distance)
    pub fn exclude_border(mut self, border: usize) -> Self {
        self.exclude_border = Some(border);
        self
    }

    /// Build the `PeakDetector`
    pub fn build(self) -> DetectResult<PeakDetector> {
        let mut detector = PeakDetector::new(&self.config)?;
        if let Some(border) = self.exclude_border {
            detector.exclude_border = border;
        }
        Ok(detector)
    }

    /// Generate a summary of the builder's configuration
    pub fn summary(&self) -> String {
        format!(
            "DetectorBuilder: {}x{}, min_distance={}, max_keypoints={}, exclude_border={}",
            self.config.canonical_size,
            self.config.canonical_size,
            self.config.min_distance,
            self.config.max_keypoints,
            self.exclude_border.unwrap_or(self.config.min_distance)
        )
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }
}
