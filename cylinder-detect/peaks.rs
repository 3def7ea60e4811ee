use cylinder_core::NormalizedImage;
use rayon::prelude::*;

use crate::types::ScoredPeak;

/// Local-maximum search and greedy peak spacing
pub struct LocalMaxima;

impl LocalMaxima {
    /// Maximum over the `(2 * radius + 1)` square window around every pixel.
    ///
    /// Out-of-range window samples take the value of the nearest edge pixel,
    /// which for a maximum is the same as shrinking the window at the border.
    /// Computed separably: a row pass followed by a column pass.
    pub fn maximum_filter(img: &NormalizedImage, radius: usize) -> Vec<u8> {
        let (w, h) = (img.width(), img.height());
        let src = img.as_raw();

        let rows: Vec<u8> = (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                let row = &src[y * w..(y + 1) * w];
                (0..w).map(move |x| {
                    let lo = x.saturating_sub(radius);
                    let hi = (x + radius).min(w - 1);
                    row[lo..=hi].iter().copied().max().unwrap_or(0)
                })
            })
            .collect();

        (0..h)
            .into_par_iter()
            .flat_map_iter(|y| {
                let lo = y.saturating_sub(radius);
                let hi = (y + radius).min(h - 1);
                let rows = &rows;
                (0..w).map(move |x| (lo..=hi).map(|yy| rows[yy * w + x]).max().unwrap_or(0))
            })
            .collect()
    }

    /// Pixels equal to their window maximum and brighter than the image minimum,
    /// at least `exclude_border` pixels away from every edge. Raster order.
    pub fn candidates(img: &NormalizedImage, radius: usize, exclude_border: usize) -> Vec<ScoredPeak> {
        let (w, h) = (img.width(), img.height());
        if 2 * exclude_border >= w || 2 * exclude_border >= h {
            return Vec::new();
        }

        let src = img.as_raw();
        let floor = src.iter().copied().min().unwrap_or(0);
        let max = Self::maximum_filter(img, radius);

        (exclude_border..h - exclude_border)
            .into_par_iter()
            .flat_map_iter(|row| {
                let max = &max;
                (exclude_border..w - exclude_border).filter_map(move |col| {
                    let intensity = src[row * w + col];
                    (intensity > floor && intensity == max[row * w + col])
                        .then_some(ScoredPeak { row, col, intensity })
                })
            })
            .collect()
    }

    /// Ranks peaks by intensity (ties keep their incoming order) and keeps each
    /// one only if it is at least `min_distance` away from all kept peaks.
    pub fn select(mut peaks: Vec<ScoredPeak>, min_distance: usize, max_peaks: usize) -> Vec<ScoredPeak> {
        peaks.sort_by(|a, b| b.intensity.cmp(&a.intensity));

        let mut kept: Vec<ScoredPeak> = Vec::with_capacity(max_peaks);
        for candidate in peaks {
            if kept.len() == max_peaks {
                break;
            }
            if kept.iter().all(|k| k.chebyshev_distance(&candidate) >= min_distance) {
                kept.push(candidate);
            }
        }
        kept
    }
}
