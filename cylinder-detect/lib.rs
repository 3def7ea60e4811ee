//! Fingerprint normalization and keypoint detection.
//!
//! Images are converted to grayscale and resampled to a square canonical grid,
//! then the brightest local maxima that are far enough apart become keypoints.

pub mod builder;
pub mod detector;
pub mod error;
pub mod peaks;
pub mod preprocessing;
pub mod types;

pub use builder::DetectorBuilder;
pub use detector::PeakDetector;
pub use error::{DetectError, DetectResult};
pub use peaks::LocalMaxima;
pub use preprocessing::ImagePreprocessing;
pub use types::ScoredPeak;
