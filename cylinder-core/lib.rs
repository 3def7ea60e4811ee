use image::GrayImage;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Side length of the square grid every fingerprint is resampled to
pub const CANONICAL_SIZE: u32 = 128;
/// Upper bound on keypoints reported per image
pub const MAX_KEYPOINTS: usize = 10;
/// Minimum separation between two reported keypoints, in pixels
pub const MIN_DISTANCE: usize = 20;
/// Side length of the square patch described around each keypoint
pub const PATCH_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    InvalidImageSize { width: u32, height: u32, expected: u32 },
    InvalidCodeLength(usize),
    InvalidCodeBit { index: usize, value: u8 },
    InvalidPatchSize { patch_size: usize, image_size: u32 },
    InvalidKeypointCap(usize),
    InvalidMinDistance(usize),
    InvalidThreadCount(usize),
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidImageSize { width, height, expected } => {
                write!(f, "Normalized image is {}x{}, expected {}x{}", width, height, expected, expected)
            }
            CoreError::InvalidCodeLength(len) => {
                write!(f, "Cylinder code length {} is not a positive even number", len)
            }
            CoreError::InvalidCodeBit { index, value } => {
                write!(f, "Cylinder code element {} is {} (must be 0 or 1)", index, value)
            }
            CoreError::InvalidPatchSize { patch_size, image_size } => {
                write!(f, "Patch size {} must be odd, at least 3 and fit in a {}x{} image", patch_size, image_size, image_size)
            }
            CoreError::InvalidKeypointCap(cap) => {
                write!(f, "Invalid keypoint cap: {} (must be > 0)", cap)
            }
            CoreError::InvalidMinDistance(d) => {
                write!(f, "Invalid minimum keypoint distance: {} (must be > 0)", d)
            }
            CoreError::InvalidThreadCount(n) => {
                write!(f, "Invalid thread count: {} (must be > 0)", n)
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;

/// Grayscale fingerprint resampled to a square canonical grid
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pixels: GrayImage,
}

impl NormalizedImage {
    /// Wraps `pixels`, rejecting anything that is not exactly `size`x`size`
    pub fn new(pixels: GrayImage, size: u32) -> CoreResult<Self> {
        let (width, height) = pixels.dimensions();
        if size == 0 || width != size || height != size {
            return Err(CoreError::InvalidImageSize { width, height, expected: size });
        }
        Ok(Self { pixels })
    }

    /// Side length in pixels
    pub fn size(&self) -> usize {
        self.pixels.width() as usize
    }

    pub fn width(&self) -> usize {
        self.pixels.width() as usize
    }

    pub fn height(&self) -> usize {
        self.pixels.height() as usize
    }

    /// Intensity at column `x`, row `y`
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.pixels.as_raw()[y * self.width() + x]
    }

    /// Row-major samples
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    pub fn into_gray(self) -> GrayImage {
        self.pixels
    }
}

/// Keypoint in image coordinates: `x` is the column, `y` the row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: usize,
    pub y: usize,
}

impl Keypoint {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Converts a detector coordinate given as (row, column)
    #[inline]
    pub fn from_row_col(row: usize, col: usize) -> Self {
        Self { x: col, y: row }
    }
}

/// Binary descriptor: magnitude bitmap followed by direction bitmap
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CylinderCode {
    bits: Vec<u8>,
}

impl CylinderCode {
    /// Builds a code from 0/1 elements; the length must be even and non-zero
    pub fn from_bits(bits: Vec<u8>) -> CoreResult<Self> {
        if bits.is_empty() || bits.len() % 2 != 0 {
            return Err(CoreError::InvalidCodeLength(bits.len()));
        }
        if let Some(index) = bits.iter().position(|&b| b > 1) {
            return Err(CoreError::InvalidCodeBit { index, value: bits[index] });
        }
        Ok(Self { bits })
    }

    /// Concatenates two equally sized bitmaps, magnitude first
    pub fn from_bitmaps(magnitude: &[bool], direction: &[bool]) -> CoreResult<Self> {
        if magnitude.len() != direction.len() {
            return Err(CoreError::InvalidCodeLength(magnitude.len() + direction.len()));
        }
        let bits = magnitude
            .iter()
            .chain(direction.iter())
            .map(|&b| b as u8)
            .collect();
        Self::from_bits(bits)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn magnitude_bits(&self) -> &[u8] {
        &self.bits[..self.bits.len() / 2]
    }

    pub fn direction_bits(&self) -> &[u8] {
        &self.bits[self.bits.len() / 2..]
    }
}

/// Aggregated comparison of two fingerprints
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    Score(f64),
    /// At least one side produced no usable cylinder codes
    NoFeatures,
}

impl Similarity {
    pub fn score(&self) -> Option<f64> {
        match self {
            Similarity::Score(s) => Some(*s),
            Similarity::NoFeatures => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    pub canonical_size: u32,
    pub max_keypoints: usize,
    pub min_distance: usize,
    pub patch_size: usize,
    pub n_threads: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            canonical_size: CANONICAL_SIZE,
            max_keypoints: MAX_KEYPOINTS,
            min_distance: MIN_DISTANCE,
            patch_size: PATCH_SIZE,
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl MatchConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> CoreResult<()> {
        if self.canonical_size == 0 {
            return Err(CoreError::InvalidImageSize { width: 0, height: 0, expected: 0 });
        }
        if self.patch_size < 3 || self.patch_size % 2 == 0 || self.patch_size > self.canonical_size as usize {
            return Err(CoreError::InvalidPatchSize {
                patch_size: self.patch_size,
                image_size: self.canonical_size,
            });
        }
        if self.max_keypoints == 0 {
            return Err(CoreError::InvalidKeypointCap(self.max_keypoints));
        }
        if self.min_distance == 0 {
            return Err(CoreError::InvalidMinDistance(self.min_distance));
        }
        if self.n_threads == 0 {
            return Err(CoreError::InvalidThreadCount(self.n_threads));
        }
        Ok(())
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "MatchConfig: {}x{}, keypoints<={}, min_distance={}, patch={}x{}, threads={}",
            self.canonical_size, self.canonical_size, self.max_keypoints, self.min_distance,
            self.patch_size, self.patch_size, self.n_threads
        )
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build a Rayon thread pool with the specified number of threads
pub fn build_thread_pool(n_threads: usize) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .thread_name(|i| format!("cylinder-worker-{}", i))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_image_rejects_wrong_size() {
        let img = GrayImage::new(128, 64);
        assert!(matches!(
            NormalizedImage::new(img, 128),
            Err(CoreError::InvalidImageSize { width: 128, height: 64, expected: 128 })
        ));
        assert!(NormalizedImage::new(GrayImage::new(128, 128), 128).is_ok());
    }

    #[test]
    fn test_normalized_image_indexing() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(3, 1, image::Luma([200]));
        let norm = NormalizedImage::new(img, 4).unwrap();
        assert_eq!(norm.get(3, 1), 200);
        assert_eq!(norm.get(1, 3), 0);
        assert_eq!(norm.size(), 4);
    }

    #[test]
    fn test_keypoint_axis_swap() {
        let kp = Keypoint::from_row_col(7, 42);
        assert_eq!(kp, Keypoint { x: 42, y: 7 });
    }

    #[test]
    fn test_cylinder_code_validation() {
        assert_eq!(CylinderCode::from_bits(vec![]), Err(CoreError::InvalidCodeLength(0)));
        assert_eq!(CylinderCode::from_bits(vec![0, 1, 1]), Err(CoreError::InvalidCodeLength(3)));
        assert_eq!(
            CylinderCode::from_bits(vec![0, 2]),
            Err(CoreError::InvalidCodeBit { index: 1, value: 2 })
        );
    }

    #[test]
    fn test_cylinder_code_from_bitmaps() {
        let code = CylinderCode::from_bitmaps(&[true, false], &[false, false]).unwrap();
        assert_eq!(code.bits(), &[1, 0, 0, 0]);
        assert_eq!(code.magnitude_bits(), &[1, 0]);
        assert_eq!(code.direction_bits(), &[0, 0]);
        assert!(CylinderCode::from_bitmaps(&[true], &[true, false]).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let cfg = MatchConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.canonical_size, 128);
        assert_eq!(cfg.max_keypoints, 10);
        assert_eq!(cfg.min_distance, 20);
        assert_eq!(cfg.patch_size, 5);
        assert!(cfg.n_threads >= 1);
    }

    #[test]
    fn test_invalid_config() {
        let mut cfg = MatchConfig::default();
        cfg.patch_size = 4;
        assert!(matches!(cfg.validate(), Err(CoreError::InvalidPatchSize { .. })));

        let mut cfg = MatchConfig::default();
        cfg.max_keypoints = 0;
        assert_eq!(cfg.validate(), Err(CoreError::InvalidKeypointCap(0)));

        let mut cfg = MatchConfig::default();
        cfg.n_threads = 0;
        assert_eq!(cfg.validate(), Err(CoreError::InvalidThreadCount(0)));
    }

    #[test]
    fn test_similarity_score() {
        assert_eq!(Similarity::Score(0.25).score(), Some(0.25));
        assert_eq!(Similarity::NoFeatures.score(), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg = MatchConfig::from_toml("min_distance = 12\nn_threads = 2\n").unwrap();
        assert_eq!(cfg.min_distance, 12);
        assert_eq!(cfg.n_threads, 2);
        assert_eq!(cfg.patch_size, PATCH_SIZE);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.toml");
        let cfg = MatchConfig { max_keypoints: 6, min_distance: 14, patch_size: 7, n_threads: 3, ..MatchConfig::default() };
        cfg.save_toml(&path).unwrap();
        assert_eq!(MatchConfig::load_toml(&path).unwrap(), cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_round_trip() {
        let cfg = MatchConfig { canonical_size: 96, n_threads: 2, ..MatchConfig::default() };
        let json = cfg.to_json().unwrap();
        assert!(json.contains("\"canonical_size\": 96"));
        assert_eq!(MatchConfig::from_json(&json).unwrap(), cfg);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_invalid_serialized_config_is_rejected() {
        assert!(MatchConfig::from_toml("patch_size = 4\n").is_err());
        assert!(MatchConfig::from_json(r#"{"n_threads": 0}"#).is_err());
        assert!(MatchConfig::from_json("not json").is_err());
    }
}
