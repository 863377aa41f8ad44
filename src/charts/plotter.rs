//! Chart Plotter Module
//! Interactive time series and distribution charts using egui_plot.

use crate::config::DashboardConfig;
use crate::data::{DataProcessor, SurveillanceTable};
use crate::stats::{
    DescriptiveStats, FitOutcome, HistogramBin, SeriesPoint, StatsCalculator,
};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

pub const SERIES_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const HISTOGRAM_COLOR: Color32 = Color32::from_rgb(52, 152, 219);
pub const PDF_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red

/// Everything the two charts need for one selected state.
#[derive(Debug, Clone)]
pub struct ChartData {
    pub group: String,
    pub label: String,
    pub smoothed: bool,
    pub window: usize,
    pub series: Vec<SeriesPoint>,
    pub stats: DescriptiveStats,
    pub fit: FitOutcome,
    pub histogram: Vec<HistogramBin>,
    pub pdf_curve: Vec<[f64; 2]>,
}

impl ChartData {
    /// Run both analytics passes for `group`.
    pub fn build(
        table: &SurveillanceTable,
        group: &str,
        label: &str,
        smoothing_enabled: bool,
        config: &DashboardConfig,
    ) -> Self {
        let series = StatsCalculator::time_series_with_window(
            table,
            group,
            smoothing_enabled,
            config.rolling_window,
        );
        let values = DataProcessor::get_values_for_group(table, group);
        let stats = StatsCalculator::describe(&values);
        let fit = StatsCalculator::fit_values(values);
        let (histogram, pdf_curve) = match fit.fitted() {
            Some(result) => (
                result.histogram(config.histogram_bins),
                result.pdf_curve(config.pdf_points),
            ),
            None => (Vec::new(), Vec::new()),
        };

        Self {
            group: group.to_string(),
            label: label.to_string(),
            smoothed: smoothing_enabled,
            window: config.rolling_window,
            series,
            stats,
            fit,
            histogram,
            pdf_curve,
        }
    }

    /// Legend entry for the fitted curve.
    pub fn pdf_legend(&self) -> Option<String> {
        self.fit
            .fitted()
            .map(|fit| format!("Exponential PDF (λ̂ ≈ {:.2})", fit.rate))
    }

    /// Message shown in place of the distribution chart.
    pub fn no_fit_message(&self) -> String {
        format!(
            "Not enough data or zero mean ILI to plot distribution for {}.",
            self.label
        )
    }
}

/// Draws the dashboard charts with egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Weekly % ILI against week number.
    pub fn draw_time_series(ui: &mut egui::Ui, data: &ChartData, height: f32) {
        let name = if data.smoothed {
            format!("{}-week rolling mean", data.window)
        } else {
            "Weekly % ILI".to_string()
        };
        let points: PlotPoints = data
            .series
            .iter()
            .map(|p| [p.index as f64, p.value])
            .collect();

        Plot::new(format!("series_{}", data.group))
            .height(height)
            .x_axis_label("Week Number")
            .y_axis_label("% ILI")
            .legend(Legend::default())
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(points).color(SERIES_COLOR).width(1.5).name(name));
            });
    }

    /// Density histogram with the fitted exponential PDF on top, or the
    /// fallback message when there is no fit.
    pub fn draw_distribution(ui: &mut egui::Ui, data: &ChartData, height: f32) {
        let Some(legend) = data.pdf_legend() else {
            ui.label(
                RichText::new(data.no_fit_message())
                    .size(14.0)
                    .color(Color32::GRAY),
            );
            return;
        };

        let bars: Vec<Bar> = data
            .histogram
            .iter()
            .map(|bin| Bar::new(bin.center(), bin.density).width(bin.width()))
            .collect();
        let curve: PlotPoints = data.pdf_curve.iter().copied().collect();

        Plot::new(format!("distribution_{}", data.group))
            .height(height)
            .x_axis_label("Weekly ILI Percentage (%)")
            .y_axis_label("Density")
            .legend(Legend::default())
            .allow_scroll(false)
            .include_x(0.0)
            .include_y(0.0)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .color(HISTOGRAM_COLOR.gamma_multiply(0.6))
                        .name("Observed ILI %"),
                );
                plot_ui.line(Line::new(curve).color(PDF_COLOR).width(2.0).name(legend));
            });
    }

    /// Sample mean and λ̂ under the distribution chart.
    pub fn draw_fit_summary(ui: &mut egui::Ui, data: &ChartData) {
        let Some(fit) = data.fit.fitted() else {
            return;
        };

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("fit_summary_{}", data.group)))
                    .striped(true)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label(RichText::new("Weeks").strong());
                        ui.label(fit.sample_count.to_string());
                        ui.end_row();

                        ui.label(RichText::new("Average weekly ILI").strong());
                        ui.label(format!("{:.2}%", fit.sample_mean));
                        ui.end_row();

                        ui.label(RichText::new("Estimated λ̂ = 1 / mean").strong());
                        ui.label(format!("{:.2}", fit.rate));
                        ui.end_row();
                    });
            });
    }
}
