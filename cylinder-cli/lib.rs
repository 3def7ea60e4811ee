use std::path::{Path, PathBuf};

use cylinder_code::{aggregate, CodeError, CylinderCodeBuilder};
use cylinder_core::{CoreError, CylinderCode, NormalizedImage, Similarity};
use cylinder_detect::{DetectError, ImagePreprocessing, PeakDetector};
use image::DynamicImage;
use log::debug;

pub mod corpus;
pub mod orchestrator;
pub mod report;

pub use corpus::{list_images, ImageEntry};
pub use orchestrator::{percent, Orchestrator, PairJob, PairOutcome, PairResult, ProgressObserver};
pub use report::Report;

pub use cylinder_core::{self, Keypoint, MatchConfig};

#[derive(Debug)]
pub enum MatchError {
    Detect(DetectError),
    Code(CodeError),
    Core(CoreError),
    ThreadPool(rayon::ThreadPoolBuildError),
    Corpus { dir: PathBuf, reason: String },
    Io(std::io::Error),
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::Detect(e) => write!(f, "Detection error: {}", e),
            MatchError::Code(e) => write!(f, "Cylinder code error: {}", e),
            MatchError::Core(e) => write!(f, "Configuration error: {}", e),
            MatchError::ThreadPool(e) => write!(f, "Thread pool error: {}", e),
            MatchError::Corpus { dir, reason } => write!(f, "Cannot list {}: {}", dir.display(), reason),
            MatchError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for MatchError {}

impl From<DetectError> for MatchError {
    fn from(err: DetectError) -> Self {
        MatchError::Detect(err)
    }
}

impl From<CodeError> for MatchError {
    fn from(err: CodeError) -> Self {
        MatchError::Code(err)
    }
}

impl From<CoreError> for MatchError {
    fn from(err: CoreError) -> Self {
        MatchError::Core(err)
    }
}

impl From<rayon::ThreadPoolBuildError> for MatchError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        MatchError::ThreadPool(err)
    }
}

impl From<std::io::Error> for MatchError {
    fn from(err: std::io::Error) -> Self {
        MatchError::Io(err)
    }
}

pub type MatchResult<T> = Result<T, MatchError>;

/// Full per-image pipeline: normalization, peak detection and cylinder codes
#[derive(Debug)]
pub struct FingerprintMatcher {
    size: u32,
    detector: PeakDetector,
    code_builder: CylinderCodeBuilder,
}

impl FingerprintMatcher {
    pub fn new(cfg: &MatchConfig) -> MatchResult<Self> {
        cfg.validate()?;
        Ok(Self {
            size: cfg.canonical_size,
            detector: PeakDetector::new(cfg)?,
            code_builder: CylinderCodeBuilder::from_config(cfg)?,
        })
    }

    pub fn normalize(&self, img: &DynamicImage) -> MatchResult<NormalizedImage> {
        Ok(ImagePreprocessing::normalize(img, self.size)?)
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> MatchResult<NormalizedImage> {
        Ok(ImagePreprocessing::load(path, self.size)?)
    }

    /// Cylinder codes for every keypoint; empty when nothing was detected
    pub fn describe(&self, img: &NormalizedImage) -> MatchResult<Vec<CylinderCode>> {
        let keypoints = self.detector.detect_keypoints(img)?;
        if keypoints.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.code_builder.generate_codes(img, &keypoints)?)
    }

    pub fn compare_normalized(&self, a: &NormalizedImage, b: &NormalizedImage) -> MatchResult<Similarity> {
        let codes_a = self.describe(a)?;
        let codes_b = self.describe(b)?;
        debug!("{} x {} cylinder codes", codes_a.len(), codes_b.len());
        Ok(aggregate(&codes_a, &codes_b)?)
    }

    pub fn compare_images(&self, a: &DynamicImage, b: &DynamicImage) -> MatchResult<Similarity> {
        self.compare_normalized(&self.normalize(a)?, &self.normalize(b)?)
    }

    /// Decodes both files and compares them. Nothing is cached between calls.
    pub fn compare_files<P: AsRef<Path>, Q: AsRef<Path>>(&self, a: P, b: Q) -> MatchResult<Similarity> {
        let a = self.load(a)?;
        let b = self.load(b)?;
        self.compare_normalized(&a, &b)
    }

    pub fn detector(&self) -> &PeakDetector {
        &self.detector
    }

    pub fn code_builder(&self) -> &CylinderCodeBuilder {
        &self.code_builder
    }
}
