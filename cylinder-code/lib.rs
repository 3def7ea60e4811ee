//! Cylinder codes: binary descriptors built from thresholded gradient
//! magnitude and direction around each keypoint.

pub mod error;
pub mod matcher;
pub mod patch;

use cylinder_core::{CylinderCode, Keypoint, MatchConfig, NormalizedImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use log::trace;

pub use error::{CodeError, CodeResult};
pub use matcher::{aggregate, pairwise_distance};
pub use patch::{clamp_center, Patch, ToUbyte};

#[derive(Debug, Clone)]
pub struct CylinderCodeBuilder {
    patch_size: usize,
}

impl CylinderCodeBuilder {
    pub fn new(patch_size: usize) -> CodeResult<Self> {
        if patch_size == 0 || patch_size % 2 == 0 {
            return Err(CodeError::InvalidPatchSize { patch_size, width: 0, height: 0 });
        }
        Ok(Self { patch_size })
    }

    pub fn from_config(cfg: &MatchConfig) -> CodeResult<Self> {
        cfg.validate()?;
        Self::new(cfg.patch_size)
    }

    pub fn patch_size(&self) -> usize {
        self.patch_size
    }

    /// Code length produced by this builder: two bitmaps of the patch area
    pub fn code_len(&self) -> usize {
        2 * self.patch_size * self.patch_size
    }

    pub fn extract_patch(&self, img: &NormalizedImage, kp: Keypoint) -> CodeResult<Patch> {
        Patch::extract(img, kp, self.patch_size)
    }

    /// Describes one patch.
    ///
    /// Sobel gradients (edge pixels replicated) give a magnitude and a
    /// direction per pixel; each is binarized against its own mean over this
    /// patch. Magnitude bits come first, both bitmaps row-major.
    pub fn build(&self, patch: &Patch) -> CodeResult<CylinderCode> {
        if patch.side() != self.patch_size {
            return Err(CodeError::PatchSizeMismatch { expected: self.patch_size, actual: patch.side() });
        }
        let gray = patch.to_gray();
        let gx = horizontal_sobel(&gray);
        let gy = vertical_sobel(&gray);

        let (magnitude, direction): (Vec<f64>, Vec<f64>) = gx
            .as_raw()
            .iter()
            .zip(gy.as_raw())
            .map(|(&x, &y)| {
                let (x, y) = (x as f64, y as f64);
                (x.hypot(y), y.atan2(x))
            })
            .unzip();

        let magnitude_bits = above_mean(&magnitude);
        let direction_bits = above_mean(&direction);
        Ok(CylinderCode::from_bitmaps(&magnitude_bits, &direction_bits)?)
    }

    /// One code per keypoint, in keypoint order
    pub fn generate_codes(&self, img: &NormalizedImage, kps: &[Keypoint]) -> CodeResult<Vec<CylinderCode>> {
        kps.iter()
            .map(|&kp| {
                let patch = self.extract_patch(img, kp)?;
                let code = self.build(&patch)?;
                trace!("code at ({}, {}): {:?}", kp.x, kp.y, code.bits());
                Ok(code)
            })
            .collect()
    }
}

fn above_mean(values: &[f64]) -> Vec<bool> {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|&v| v > mean).collect()
}
