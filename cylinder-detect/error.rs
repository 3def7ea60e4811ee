use std::path::PathBuf;

use cylinder_core::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum DetectError {
    InvalidImageSize { width: u32, height: u32 },
    InvalidImageData { expected_len: usize, actual_len: usize },
    UnexpectedImageSize { size: usize, expected: u32 },
    Decode { path: PathBuf, reason: String },
    Core(CoreError),
}

impl std::fmt::Display for DetectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            DetectError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            DetectError::UnexpectedImageSize { size, expected } => {
                write!(f, "Detector configured for {}x{} images, got {}x{}", expected, expected, size, size)
            }
            DetectError::Decode { path, reason } => {
                write!(f, "Cannot decode {}: {}", path.display(), reason)
            }
            DetectError::Core(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for DetectError {}

impl From<CoreError> for DetectError {
    fn from(err: CoreError) -> Self {
        DetectError::Core(err)
    }
}

pub type DetectResult<T> = Result<T, DetectError>;
