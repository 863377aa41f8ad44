//! Report Export Module
//! Saves the current selection as a PNG chart image and a JSON summary.

use crate::charts::{ChartData, RenderError, StaticChartRenderer};
use crate::stats::{DescriptiveStats, FitResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Default PNG export size.
pub const EXPORT_WIDTH: u32 = 1000;
pub const EXPORT_HEIGHT: u32 = 1000;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Fitted parameters without the raw observations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitSummary {
    pub rate: f64,
    pub sample_mean: f64,
    pub sample_count: usize,
    pub domain_max: f64,
}

impl From<&FitResult> for FitSummary {
    fn from(fit: &FitResult) -> Self {
        Self {
            rate: fit.rate,
            sample_mean: fit.sample_mean,
            sample_count: fit.sample_count,
            domain_max: fit.domain_max,
        }
    }
}

/// JSON document describing one state's analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateReport {
    pub group: String,
    pub label: String,
    pub smoothed: bool,
    pub rolling_window: usize,
    pub weeks: usize,
    pub stats: DescriptiveStats,
    /// `None` when the data could not support an exponential fit.
    pub exponential_fit: Option<FitSummary>,
}

impl From<&ChartData> for StateReport {
    fn from(data: &ChartData) -> Self {
        Self {
            group: data.group.clone(),
            label: data.label.clone(),
            smoothed: data.smoothed,
            rolling_window: data.window,
            weeks: data.series.len(),
            stats: data.stats.clone(),
            exponential_fit: data.fit.fitted().map(FitSummary::from),
        }
    }
}

/// Writes exported files for the dashboard.
pub struct ReportExporter;

impl ReportExporter {
    /// Write the JSON summary of `data` to `path`.
    pub fn export_json(data: &ChartData, path: &Path) -> Result<(), ReportError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &StateReport::from(data))?;
        info!(path = %path.display(), group = %data.group, "exported JSON report");
        Ok(())
    }

    /// Render both charts of `data` and write them as a PNG to `path`.
    pub fn export_png(
        data: &ChartData,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), ReportError> {
        let png = StaticChartRenderer::render_png(data, width, height)?;
        fs::write(path, png)?;
        info!(path = %path.display(), group = %data.group, "exported chart image");
        Ok(())
    }

    /// Suggested file name for an export of `group`.
    pub fn default_file_name(group: &str, extension: &str) -> String {
        let safe_name: String = group
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("ili_{}.{}", safe_name.to_lowercase(), extension)
    }
}
