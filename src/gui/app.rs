//! ILI Dashboard Main Application
//! Main window with control panel and chart viewer.

use crate::charts::ChartData;
use crate::config::DashboardConfig;
use crate::data::{DataProcessor, DatasetCache, SurveillanceTable};
use crate::gui::state_names::state_label;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::report::{ReportExporter, EXPORT_HEIGHT, EXPORT_WIDTH};
use crate::stats::{StateSummary, StatsCalculator};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete {
        table: Arc<SurveillanceTable>,
        groups: Vec<String>,
        summaries: Vec<StateSummary>,
    },
    Error(String),
}

/// Main application window.
pub struct IliDashboardApp {
    config: DashboardConfig,
    cache: Arc<DatasetCache>,
    table: Option<Arc<SurveillanceTable>>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl IliDashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        let control_panel = ControlPanel::new(
            config.csv_path.clone(),
            config.smoothing_default,
            config.rolling_window,
        );
        let mut app = Self {
            config,
            cache: Arc::new(DatasetCache::new()),
            table: None,
            control_panel,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        };

        let initial = app.config.csv_path.clone();
        app.start_loading(initial);
        app
    }

    /// Load `path` on a background thread through the shared cache.
    fn start_loading(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.table = None;
        self.control_panel.exports_enabled = false;
        self.control_panel.settings.csv_path = Some(path.clone());
        self.control_panel
            .set_status(&format!("Loading {}...", path.display()));
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        let cache = Arc::clone(&self.cache);
        let schema = self.config.schema.clone();

        thread::spawn(move || {
            let result = match cache.get_or_load_with_schema(&path, &schema) {
                Ok(table) => {
                    let groups = DataProcessor::get_groups(&table);
                    let summaries = StatsCalculator::summarize_all(&table);
                    LoadResult::Complete {
                        table,
                        groups,
                        summaries,
                    }
                }
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete {
                table,
                groups,
                summaries,
            }) => {
                info!(
                    rows = table.height(),
                    states = groups.len(),
                    "dataset ready"
                );
                self.control_panel.set_status(&format!(
                    "Loaded {} weeks across {} states ({} rows without ILI dropped)",
                    table.height(),
                    groups.len(),
                    table.dropped_rows()
                ));
                self.control_panel.update_groups(groups);
                self.chart_viewer.summaries = summaries;
                self.table = Some(table);
                self.is_loading = false;
                self.refresh_charts();
            }
            Ok(LoadResult::Error(message)) => {
                error!(%message, "failed to load dataset");
                self.control_panel.set_status(&format!("Error: {}", message));
                self.chart_viewer.set_error(message);
                self.is_loading = false;
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => {
                self.load_rx = Some(rx);
            }
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.control_panel
                    .set_status("Error: loader thread stopped unexpectedly");
                self.is_loading = false;
            }
        }
    }

    /// Recompute both charts for the current selection.
    fn refresh_charts(&mut self) {
        let (Some(table), Some(group)) = (
            self.table.as_ref(),
            self.control_panel.settings.selected_group.as_ref(),
        ) else {
            self.chart_viewer.chart_data = None;
            self.control_panel.exports_enabled = false;
            return;
        };

        let data = ChartData::build(
            table,
            group,
            &state_label(group),
            self.control_panel.settings.smoothing,
            &self.config,
        );
        self.chart_viewer.set_chart_data(data);
        self.control_panel.exports_enabled = true;
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    /// Handle PNG export of the current charts
    fn handle_export_png(&mut self) {
        let Some(data) = &self.chart_viewer.chart_data else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name(ReportExporter::default_file_name(&data.group, "png"))
            .save_file()
        else {
            return; // User cancelled
        };

        match ReportExporter::export_png(data, &path, EXPORT_WIDTH, EXPORT_HEIGHT) {
            Ok(()) => {
                self.control_panel
                    .set_status(&format!("Exported {}", path.display()));
                if let Err(e) = open::that(&path) {
                    warn!(error = %e, "could not open exported image");
                }
            }
            Err(e) => {
                self.control_panel
                    .set_status(&format!("Error: {}", e));
            }
        }
    }

    /// Handle JSON export of the current fit summary
    fn handle_export_json(&mut self) {
        let Some(data) = &self.chart_viewer.chart_data else {
            self.control_panel.set_status("No summary to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON", &["json"])
            .set_file_name(ReportExporter::default_file_name(&data.group, "json"))
            .save_file()
        else {
            return;
        };

        match ReportExporter::export_json(data, &path) {
            Ok(()) => self
                .control_panel
                .set_status(&format!("Exported {}", path.display())),
            Err(e) => self.control_panel.set_status(&format!("Error: {}", e)),
        }
    }
}

impl eframe::App for IliDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::SelectionChanged => self.refresh_charts(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::ExportJson => self.handle_export_json(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.is_loading {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
            self.chart_viewer.show(ui);
        });
    }
}
