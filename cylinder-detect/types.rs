use cylinder_core::Keypoint;

/// Local maximum in detection order: (row, column) plus its intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredPeak {
    pub row: usize,
    pub col: usize,
    pub intensity: u8,
}

impl ScoredPeak {
    /// Reorders (row, column) into an (x, y) keypoint
    #[inline]
    pub fn keypoint(&self) -> Keypoint {
        Keypoint::from_row_col(self.row, self.col)
    }

    /// Chebyshev distance, the metric used for peak spacing
    #[inline]
    pub fn chebyshev_distance(&self, other: &ScoredPeak) -> usize {
        self.row.abs_diff(other.row).max(self.col.abs_diff(other.col))
    }
}
