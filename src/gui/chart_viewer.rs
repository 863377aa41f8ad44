//! Chart Viewer Widget
//! Central scrollable panel with the time series card, the distribution card
//! and an overview table of every state.

use crate::charts::{ChartData, ChartPlotter};
use crate::gui::state_names::state_label;
use crate::stats::StateSummary;
use egui::{Color32, RichText, ScrollArea};

const CHART_SPACING: f32 = 15.0;
const CHART_HEIGHT: f32 = 300.0;

/// Scrollable chart display area.
#[derive(Default)]
pub struct ChartViewer {
    pub chart_data: Option<ChartData>,
    pub summaries: Vec<StateSummary>,
    /// Set when loading failed; replaces every chart.
    pub error: Option<String>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all charts
    pub fn clear(&mut self) {
        self.chart_data = None;
        self.summaries.clear();
        self.error = None;
    }

    pub fn set_chart_data(&mut self, chart_data: ChartData) {
        self.chart_data = Some(chart_data);
    }

    pub fn set_error(&mut self, error: String) {
        self.chart_data = None;
        self.summaries.clear();
        self.error = Some(error);
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        if let Some(error) = &self.error {
            ui.centered_and_justified(|ui| {
                ui.label(
                    RichText::new(format!("⚠ {}", error))
                        .size(18.0)
                        .color(Color32::from_rgb(220, 53, 69)),
                );
            });
            return;
        }

        let Some(data) = &self.chart_data else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new("Influenza-Like Illness (ILI) Trends")
                        .size(24.0)
                        .strong(),
                );
                ui.add_space(CHART_SPACING);

                Self::draw_card(ui, &format!("Weekly Percent ILI in {}", data.label), |ui| {
                    ChartPlotter::draw_time_series(ui, data, CHART_HEIGHT);
                });
                ui.add_space(CHART_SPACING);

                Self::draw_card(
                    ui,
                    &format!("Distribution of Weekly ILI % in {}", data.label),
                    |ui| {
                        ChartPlotter::draw_distribution(ui, data, CHART_HEIGHT);
                        ui.add_space(8.0);
                        ChartPlotter::draw_fit_summary(ui, data);
                    },
                );
                ui.add_space(CHART_SPACING);

                if let Some(fit) = data.fit.fitted() {
                    Self::draw_card(ui, "Interpretation", |ui| {
                        ui.label(format!(
                            "The average weekly ILI in {} is {:.2}%. For an exponential \
                             distribution the mean equals 1/λ, so the sample mean estimates \
                             λ̂ ≈ {:.2}. A smaller λ̂ means higher ILI percentages are more \
                             common; a larger λ̂ means they stay consistently low.",
                            data.label, fit.sample_mean, fit.rate
                        ));
                    });
                    ui.add_space(CHART_SPACING);
                }

                if !self.summaries.is_empty() {
                    egui::CollapsingHeader::new(RichText::new("All States").size(16.0).strong())
                        .default_open(false)
                        .show(ui, |ui| Self::draw_overview_table(ui, &self.summaries));
                }
            });
    }

    fn draw_card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_rgb(100, 149, 237)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.label(RichText::new(title).size(18.0).strong());
                ui.add_space(8.0);
                add_contents(ui);
            });
    }

    fn draw_overview_table(ui: &mut egui::Ui, summaries: &[StateSummary]) {
        egui::Grid::new("state_overview")
            .striped(true)
            .min_col_width(60.0)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                for header in ["State", "Weeks", "Mean", "Median", "Std", "λ̂"] {
                    ui.label(RichText::new(header).strong().size(11.0));
                }
                ui.end_row();

                for summary in summaries {
                    ui.label(RichText::new(state_label(&summary.group)).size(11.0));
                    ui.label(RichText::new(summary.stats.count.to_string()).size(11.0));
                    ui.label(RichText::new(format!("{:.3}", summary.stats.mean)).size(11.0));
                    ui.label(RichText::new(format!("{:.3}", summary.stats.median)).size(11.0));
                    ui.label(RichText::new(format!("{:.3}", summary.stats.std)).size(11.0));
                    match summary.rate {
                        Some(rate) => ui.label(RichText::new(format!("{:.3}", rate)).size(11.0)),
                        None => ui.label(RichText::new("-").size(11.0)),
                    };
                    ui.end_row();
                }
            });
    }
}
