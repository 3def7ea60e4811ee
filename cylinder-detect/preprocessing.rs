use std::path::Path;

use cylinder_core::NormalizedImage;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use log::debug;

use crate::error::{DetectError, DetectResult};

/// Grayscale conversion and resampling to the canonical grid
pub struct ImagePreprocessing;

impl ImagePreprocessing {
    /// Converts to luminance and resamples to `size`x`size` with a Lanczos filter
    pub fn normalize(img: &DynamicImage, size: u32) -> DetectResult<NormalizedImage> {
        Self::normalize_gray(&img.to_luma8(), size)
    }

    /// Resamples an already grayscale image
    pub fn normalize_gray(gray: &GrayImage, size: u32) -> DetectResult<NormalizedImage> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidImageSize { width, height });
        }
        if size == 0 {
            return Err(DetectError::InvalidImageSize { width: size, height: size });
        }

        let resized = imageops::resize(gray, size, size, FilterType::Lanczos3);
        Ok(NormalizedImage::new(resized, size)?)
    }

    /// Normalizes a row-major 8-bit buffer of the given dimensions
    pub fn normalize_raw(data: &[u8], width: u32, height: u32, size: u32) -> DetectResult<NormalizedImage> {
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidImageSize { width, height });
        }
        let expected_len = width as usize * height as usize;
        if data.len() != expected_len {
            return Err(DetectError::InvalidImageData {
                expected_len,
                actual_len: data.len(),
            });
        }
        let gray = GrayImage::from_raw(width, height, data.to_vec()).ok_or(DetectError::InvalidImageData {
            expected_len,
            actual_len: data.len(),
        })?;
        Self::normalize_gray(&gray, size)
    }

    /// Decodes the file at `path` and normalizes it
    pub fn load<P: AsRef<Path>>(path: P, size: u32) -> DetectResult<NormalizedImage> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| DetectError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("decoded {} ({}x{})", path.display(), img.width(), img.height());
        Self::normalize(&img, size)
    }
}
