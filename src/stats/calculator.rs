//! Statistics Calculator Module
//! Per-state time series smoothing, exponential fitting and descriptive stats.

use crate::data::{DataProcessor, SurveillanceTable};
use crate::stats::histogram::{density_histogram, HistogramBin};
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{Continuous, Exp};
use statrs::statistics::{Data, Distribution as _, Median};
use tracing::{debug, instrument};

/// Trailing window of the rolling mean, in weeks.
pub const ROLLING_WINDOW: usize = 5;

/// Plot domain extends this far past the largest observation.
pub const DOMAIN_PADDING: f64 = 1.1;

/// Default number of samples along the fitted density curve.
pub const DEFAULT_PDF_POINTS: usize = 300;

/// One point of a weekly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub index: u32,
    pub value: f64,
}

/// Exponential distribution fitted by the method of moments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    /// λ̂ = 1 / sample mean.
    pub rate: f64,
    pub sample_mean: f64,
    pub sample_count: usize,
    /// Observations the fit was computed from, for histogram construction.
    pub values: Vec<f64>,
    /// Upper end of the suggested plotting domain `[0, domain_max]`.
    pub domain_max: f64,
}

impl FitResult {
    /// Density of the fitted distribution at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        Exp::new(self.rate).map_or(f64::NAN, |dist| dist.pdf(x))
    }

    /// `points` evenly spaced `[x, pdf(x)]` samples over `[0, domain_max]`.
    pub fn pdf_curve(&self, points: usize) -> Vec<[f64; 2]> {
        let Ok(dist) = Exp::new(self.rate) else {
            return Vec::new();
        };

        match points {
            0 => Vec::new(),
            1 => vec![[0.0, dist.pdf(0.0)]],
            n => {
                let step = self.domain_max / (n - 1) as f64;
                (0..n)
                    .map(|i| {
                        let x = i as f64 * step;
                        [x, dist.pdf(x)]
                    })
                    .collect()
            }
        }
    }

    /// Density-normalised histogram of the observations.
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        density_histogram(&self.values, bins)
    }
}

/// Result of fitting: either a distribution or a signal that the data cannot
/// support one (no observations, or a mean that is not strictly positive).
#[derive(Debug, Clone, PartialEq)]
pub enum FitOutcome {
    Fitted(FitResult),
    NoFit,
}

impl FitOutcome {
    pub fn fitted(&self) -> Option<&FitResult> {
        match self {
            FitOutcome::Fitted(fit) => Some(fit),
            FitOutcome::NoFit => None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }
}

/// Descriptive statistics of one state's observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p95: f64,
    pub p05: f64,
}

impl Default for DescriptiveStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p95: f64::NAN,
            p05: f64::NAN,
        }
    }
}

/// Overview row for one state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateSummary {
    pub group: String,
    pub stats: DescriptiveStats,
    /// Fitted λ̂, absent when the state's data cannot support a fit.
    pub rate: Option<f64>,
}

/// Handles per-state analytics over a loaded table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Trailing rolling mean with a minimum period of one.
    ///
    /// Output has the same length as the input; point `i` averages
    /// `values[i + 1 - k ..= i]` with `k = min(window, i + 1)`. A window of
    /// zero behaves like one.
    pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
        let window = window.max(1);
        (0..values.len())
            .map(|i| {
                let start = (i + 1).saturating_sub(window);
                // Incremental mean keeps constant windows exact.
                values[start..=i]
                    .iter()
                    .enumerate()
                    .fold(0.0, |mean, (k, &v)| mean + (v - mean) / (k + 1) as f64)
            })
            .collect()
    }

    /// Weekly series for `group`, smoothed with a 5-week rolling mean when
    /// `smoothing_enabled`. An unknown group gives an empty series.
    pub fn time_series(
        table: &SurveillanceTable,
        group: &str,
        smoothing_enabled: bool,
    ) -> Vec<SeriesPoint> {
        Self::time_series_with_window(table, group, smoothing_enabled, ROLLING_WINDOW)
    }

    #[instrument(skip(table))]
    pub fn time_series_with_window(
        table: &SurveillanceTable,
        group: &str,
        smoothing_enabled: bool,
        window: usize,
    ) -> Vec<SeriesPoint> {
        let pairs = DataProcessor::get_indexed_values_for_group(table, group);
        let values: Vec<f64> = pairs.iter().map(|&(_, v)| v).collect();

        let values = if smoothing_enabled {
            Self::rolling_mean(&values, window)
        } else {
            values
        };

        debug!(points = pairs.len(), "built time series");
        pairs
            .iter()
            .zip(values)
            .map(|(&(index, _), value)| SeriesPoint { index, value })
            .collect()
    }

    /// Fit an exponential distribution to `group`'s observations.
    #[instrument(skip(table))]
    pub fn fit_exponential(table: &SurveillanceTable, group: &str) -> FitOutcome {
        let values = DataProcessor::get_values_for_group(table, group);
        let outcome = Self::fit_values(values);
        if let FitOutcome::Fitted(fit) = &outcome {
            debug!(rate = fit.rate, n = fit.sample_count, "fitted exponential");
        } else {
            debug!("not enough data to fit");
        }
        outcome
    }

    /// Method-of-moments fit: λ̂ = 1 / mean.
    pub fn fit_values(values: Vec<f64>) -> FitOutcome {
        if values.is_empty() {
            return FitOutcome::NoFit;
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        // Also rejects NaN.
        if !(mean > 0.0) {
            return FitOutcome::NoFit;
        }

        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FitOutcome::Fitted(FitResult {
            rate: 1.0 / mean,
            sample_mean: mean,
            sample_count: values.len(),
            domain_max: DOMAIN_PADDING * max,
            values,
        })
    }

    /// Count, mean, median, sample std and the 5th/95th percentiles.
    pub fn describe(values: &[f64]) -> DescriptiveStats {
        if values.is_empty() {
            return DescriptiveStats::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let p05 = linear_quantile(&sorted, 0.05);
        let p95 = linear_quantile(&sorted, 0.95);

        let data = Data::new(sorted);
        DescriptiveStats {
            count: values.len(),
            mean: data.mean().unwrap_or(f64::NAN),
            median: data.median(),
            // A single week has no spread.
            std: data.std_dev().filter(|s| s.is_finite()).unwrap_or(0.0),
            p95,
            p05,
        }
    }

    /// Overview of every state in the table, computed in parallel.
    #[instrument(skip_all)]
    pub fn summarize_all(table: &SurveillanceTable) -> Vec<StateSummary> {
        let groups = DataProcessor::get_groups(table);

        groups
            .par_iter()
            .map(|group| {
                let values = DataProcessor::get_values_for_group(table, group);
                let stats = Self::describe(&values);
                let rate = Self::fit_values(values).fitted().map(|fit| fit.rate);
                StateSummary {
                    group: group.clone(),
                    stats,
                    rate,
                }
            })
            .collect()
    }
}

/// Quantile `q` of ascending `sorted`, interpolating between neighbours.
fn linear_quantile(sorted: &[f64], q: f64) -> f64 {
    let Some(&last) = sorted.last() else {
        return f64::NAN;
    };
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    match sorted.get(lower + 1) {
        Some(&upper) => sorted[lower] + (upper - sorted[lower]) * (pos - lower as f64),
        None => last,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn rolling_mean_shrinks_at_series_start() {
        let smoothed = StatsCalculator::rolling_mean(&[1.0, 3.0, 5.0, 2.0, 4.0, 6.0], 5);
        assert_eq!(smoothed.len(), 6);
        assert_close(smoothed[0], 1.0);
        assert_close(smoothed[1], 2.0);
        assert_close(smoothed[2], 3.0);
        assert_close(smoothed[3], 2.75);
        assert_close(smoothed[4], 3.0);
        assert_close(smoothed[5], 4.0);
    }

    #[test]
    fn rolling_mean_of_constant_series_is_exact() {
        let values = vec![0.1; 12];
        assert_eq!(StatsCalculator::rolling_mean(&values, ROLLING_WINDOW), values);
    }

    #[test]
    fn rolling_mean_window_of_one_is_identity() {
        let values = [4.0, 1.0, 7.5];
        assert_eq!(StatsCalculator::rolling_mean(&values, 1), values);
        assert_eq!(StatsCalculator::rolling_mean(&values, 0), values);
    }

    #[test]
    fn rolling_mean_of_empty_series_is_empty() {
        assert!(StatsCalculator::rolling_mean(&[], ROLLING_WINDOW).is_empty());
    }

    #[test]
    fn fit_inverts_the_sample_mean() {
        let outcome = StatsCalculator::fit_values(vec![1.0, 2.0, 3.0]);
        let fit = outcome.fitted().unwrap();

        assert_close(fit.sample_mean, 2.0);
        assert_close(fit.rate, 0.5);
        assert_eq!(fit.sample_count, 3);
        assert_close(fit.domain_max, 3.3);
        assert_eq!(fit.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn fit_needs_a_positive_mean() {
        assert_eq!(StatsCalculator::fit_values(Vec::new()), FitOutcome::NoFit);
        assert_eq!(StatsCalculator::fit_values(vec![0.0, 0.0]), FitOutcome::NoFit);
        assert_eq!(StatsCalculator::fit_values(vec![-1.0, 0.5]), FitOutcome::NoFit);
        assert_eq!(StatsCalculator::fit_values(vec![f64::NAN]), FitOutcome::NoFit);
    }

    #[test]
    fn pdf_matches_exponential_density() {
        let outcome = StatsCalculator::fit_values(vec![2.0, 2.0]);
        let fit = outcome.fitted().unwrap();

        assert_close(fit.pdf(0.0), 0.5);
        assert_close(fit.pdf(2.0), 0.5 * (-1.0f64).exp());
    }

    #[test]
    fn pdf_curve_spans_the_domain() {
        let outcome = StatsCalculator::fit_values(vec![1.0, 2.0, 3.0]);
        let curve = outcome.fitted().unwrap().pdf_curve(DEFAULT_PDF_POINTS);

        assert_eq!(curve.len(), DEFAULT_PDF_POINTS);
        assert_close(curve[0][0], 0.0);
        assert_close(curve[0][1], 0.5);
        assert_close(curve[DEFAULT_PDF_POINTS - 1][0], 3.3);
        assert!(curve.windows(2).all(|w| w[1][1] < w[0][1]));
    }

    #[test]
    fn describe_matches_numpy_conventions() {
        let stats = StatsCalculator::describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert_close(stats.mean, 2.5);
        assert_close(stats.median, 2.5);
        assert_close(stats.std, (5.0f64 / 3.0).sqrt());
        assert_close(stats.p05, 1.15);
        assert_close(stats.p95, 3.85);
    }

    #[test]
    fn describe_single_week_has_zero_spread() {
        let stats = StatsCalculator::describe(&[2.5]);
        assert_eq!(stats.count, 1);
        assert_close(stats.median, 2.5);
        assert_close(stats.std, 0.0);
        assert_close(stats.p05, 2.5);
        assert_close(stats.p95, 2.5);
    }

    #[test]
    fn describe_empty_is_nan() {
        let stats = StatsCalculator::describe(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
    }
}
