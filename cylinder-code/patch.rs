use cylinder_core::{Keypoint, NormalizedImage};
use image::GrayImage;

use crate::error::{CodeError, CodeResult};

/// Sample types that can be brought into the 8-bit intensity range
pub trait ToUbyte: Copy {
    fn to_ubyte(self) -> u8;
}

impl ToUbyte for u8 {
    #[inline]
    fn to_ubyte(self) -> u8 {
        self
    }
}

impl ToUbyte for u16 {
    #[inline]
    fn to_ubyte(self) -> u8 {
        ((self as u32 * 255 + 32767) / 65535) as u8
    }
}

/// Floats are intensities in [0, 1]; anything outside is clipped.
impl ToUbyte for f32 {
    #[inline]
    fn to_ubyte(self) -> u8 {
        (self as f64).to_ubyte()
    }
}

impl ToUbyte for f64 {
    #[inline]
    fn to_ubyte(self) -> u8 {
        if self.is_nan() {
            return 0;
        }
        (self.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

/// Clamps one coordinate so a window of half-width `half` stays inside `[0, dim)`
#[inline]
pub fn clamp_center(coord: usize, dim: usize, half: usize) -> usize {
    coord.clamp(half, dim - 1 - half)
}

/// Square 8-bit neighborhood, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    side: usize,
    samples: Vec<u8>,
}

impl Patch {
    /// Extracts the `side`x`side` window around `kp`. Keypoints near the border
    /// are moved inward so the window never leaves the image.
    pub fn extract(img: &NormalizedImage, kp: Keypoint, side: usize) -> CodeResult<Self> {
        let (w, h) = (img.width(), img.height());
        if side % 2 == 0 || side > w || side > h {
            return Err(CodeError::InvalidPatchSize { patch_size: side, width: w, height: h });
        }

        let half = side / 2;
        let cx = clamp_center(kp.x, w, half);
        let cy = clamp_center(kp.y, h, half);

        let raw = img.as_raw();
        let mut samples = Vec::with_capacity(side * side);
        for y in cy - half..=cy + half {
            samples.extend_from_slice(&raw[y * w + cx - half..=y * w + cx + half]);
        }
        Ok(Self { side, samples })
    }

    /// Builds a patch from samples of any supported type, converting to 8-bit
    pub fn from_samples<T: ToUbyte>(side: usize, samples: &[T]) -> CodeResult<Self> {
        if side == 0 {
            return Err(CodeError::InvalidPatchSize { patch_size: side, width: 0, height: 0 });
        }
        if samples.len() != side * side {
            return Err(CodeError::InvalidSampleCount {
                expected: side * side,
                actual: samples.len(),
            });
        }
        Ok(Self {
            side,
            samples: samples.iter().map(|s| s.to_ubyte()).collect(),
        })
    }

    pub fn side(&self) -> usize {
        self.side
    }

    pub fn area(&self) -> usize {
        self.side * self.side
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.samples[y * self.side + x]
    }

    pub fn to_gray(&self) -> GrayImage {
        let side = self.side as u32;
        GrayImage::from_fn(side, side, |x, y| image::Luma([self.get(x as usize, y as usize)]))
    }
}
