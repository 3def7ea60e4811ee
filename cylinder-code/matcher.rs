use cylinder_core::{CylinderCode, Similarity};

use crate::error::{CodeError, CodeResult};

/// Fraction of positions at which two equally long codes differ
pub fn pairwise_distance(a: &CylinderCode, b: &CylinderCode) -> CodeResult<f64> {
    if a.len() != b.len() {
        return Err(CodeError::LengthMismatch { left: a.len(), right: b.len() });
    }
    let differing = a
        .bits()
        .iter()
        .zip(b.bits())
        .filter(|(x, y)| x != y)
        .count();
    Ok(differing as f64 / a.len() as f64)
}

/// Mean distance over every (a, b) combination of the two code sets.
///
/// Either set being empty yields [`Similarity::NoFeatures`].
pub fn aggregate(codes_a: &[CylinderCode], codes_b: &[CylinderCode]) -> CodeResult<Similarity> {
    if codes_a.is_empty() || codes_b.is_empty() {
        return Ok(Similarity::NoFeatures);
    }

    let mut total = 0.0;
    for a in codes_a {
        for b in codes_b {
            total += pairwise_distance(a, b)?;
        }
    }
    Ok(Similarity::Score(total / (codes_a.len() * codes_b.len()) as f64))
}
