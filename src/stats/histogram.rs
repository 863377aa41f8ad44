//! Density Histogram
//! Equal-width bins normalised so the bar areas sum to one.

use serde::Serialize;

/// Default number of bins for the distribution chart.
pub const DEFAULT_BINS: usize = 30;

/// One histogram bar covering `[left, right)` (the last bar is closed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    pub count: usize,
    pub density: f64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Build a density histogram with NumPy's binning rules.
///
/// Bins span `[min, max]` of the finite values; a single repeated value `v`
/// is spread over `[v - 0.5, v + 0.5]`. Returns no bins for empty input or
/// `bins == 0`.
pub fn density_histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let total = finite.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| {
            let left = lo + i as f64 * width;
            let right = if i + 1 == bins { hi } else { lo + (i + 1) as f64 * width };
            HistogramBin {
                left,
                right,
                count,
                density: count as f64 / (total * width),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn areas_sum_to_one() {
        let values = [0.4, 1.1, 1.3, 2.0, 2.2, 3.9, 5.0, 0.9];
        let bins = density_histogram(&values, 5);

        let area: f64 = bins.iter().map(|b| b.density * b.width()).sum();
        assert!((area - 1.0).abs() < 1e-12);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), values.len());
    }

    #[test]
    fn maximum_lands_in_last_bin() {
        let bins = density_histogram(&[0.0, 1.0, 2.0], 2);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 2);
        assert_eq!(bins[1].right, 2.0);
    }

    #[test]
    fn constant_values_use_unit_range() {
        let bins = density_histogram(&[2.0, 2.0, 2.0], 4);
        assert_eq!(bins.first().unwrap().left, 1.5);
        assert_eq!(bins.last().unwrap().right, 2.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 3);
    }

    #[test]
    fn empty_input_has_no_bins() {
        assert!(density_histogram(&[], DEFAULT_BINS).is_empty());
        assert!(density_histogram(&[1.0], 0).is_empty());
    }
}
