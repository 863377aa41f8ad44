//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;
mod state_names;

pub use app::IliDashboardApp;
pub use chart_viewer::ChartViewer;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use state_names::state_label;
