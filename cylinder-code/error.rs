use cylinder_core::CoreError;

#[derive(Debug, Clone, PartialEq)]
pub enum CodeError {
    InvalidPatchSize { patch_size: usize, width: usize, height: usize },
    InvalidSampleCount { expected: usize, actual: usize },
    PatchSizeMismatch { expected: usize, actual: usize },
    LengthMismatch { left: usize, right: usize },
    Core(CoreError),
}

impl std::fmt::Display for CodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeError::InvalidPatchSize { patch_size, width, height } => {
                write!(f, "Patch size {} must be odd and fit in a {}x{} image", patch_size, width, height)
            }
            CodeError::InvalidSampleCount { expected, actual } => {
                write!(f, "Patch needs {} samples, got {}", expected, actual)
            }
            CodeError::PatchSizeMismatch { expected, actual } => {
                write!(f, "Builder expects {}x{} patches, got {}x{}", expected, expected, actual, actual)
            }
            CodeError::LengthMismatch { left, right } => {
                write!(f, "Cylinder codes differ in length: {} vs {}", left, right)
            }
            CodeError::Core(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CodeError {}

impl From<CoreError> for CodeError {
    fn from(err: CoreError) -> Self {
        CodeError::Core(err)
    }
}

pub type CodeResult<T> = Result<T, CodeError>;
