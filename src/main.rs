//! ILI Dashboard - Weekly Influenza-Like Illness Explorer
//!
//! Desktop dashboard for exploring weekly ILI percentages per U.S. state.

use anyhow::{anyhow, Context};
use eframe::egui;
use ili_dashboard::config::{DashboardConfig, CONFIG_FILE};
use ili_dashboard::gui::IliDashboardApp;
use ili_dashboard::logging::init_logging;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = DashboardConfig::load_or_default(CONFIG_FILE)
        .with_context(|| format!("loading {}", CONFIG_FILE))?;
    init_logging(&config.log_filter).map_err(|e| anyhow!("initialising logging: {e}"))?;

    info!(csv = %config.csv_path.display(), "starting ILI dashboard");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 900.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("ILI Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "ILI Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(IliDashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("running dashboard: {e}"))
}
