//! Statistics module - smoothing, exponential fitting and summaries

mod calculator;
mod histogram;

pub use calculator::{
    DescriptiveStats, FitOutcome, FitResult, SeriesPoint, StateSummary, StatsCalculator,
    DEFAULT_PDF_POINTS, DOMAIN_PADDING, ROLLING_WINDOW,
};
pub use histogram::{density_histogram, HistogramBin, DEFAULT_BINS};
