//! Control Panel Widget
//! Left side panel with the data source, state selection and export controls.

use crate::gui::state_names::state_label;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Current user selection
#[derive(Default, Clone)]
pub struct UserSettings {
    pub csv_path: Option<PathBuf>,
    pub selected_group: Option<String>,
    pub smoothing: bool,
}

/// Left side control panel with file selection and per-state controls.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub groups: Vec<String>,
    pub window: usize,
    pub status: String,
    pub exports_enabled: bool,
}

impl ControlPanel {
    pub fn new(csv_path: PathBuf, smoothing: bool, window: usize) -> Self {
        Self {
            settings: UserSettings {
                csv_path: Some(csv_path),
                selected_group: None,
                smoothing,
            },
            groups: Vec::new(),
            window,
            status: "Ready".to_string(),
            exports_enabled: false,
        }
    }

    /// Replace the selectable states, keeping the current choice when it still exists.
    pub fn update_groups(&mut self, groups: Vec<String>) {
        self.groups = groups;
        let still_valid = self
            .settings
            .selected_group
            .as_ref()
            .is_some_and(|g| self.groups.contains(g));
        if !still_valid {
            self.settings.selected_group = self.groups.first().cloned();
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🦠 ILI Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Weekly Influenza-Like Illness")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== CSV File Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .csv_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📂 Browse").clicked() {
                            action = ControlPanelAction::BrowseCsv;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Selection Section =====
        ui.label(RichText::new("🗺 Choose a U.S. State").size(14.0).strong());
        ui.add_space(8.0);

        let selected_text = self
            .settings
            .selected_group
            .as_deref()
            .map(state_label)
            .unwrap_or_default();

        ComboBox::from_id_salt("state_select")
            .width(200.0)
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for group in &self.groups {
                    let selected = self.settings.selected_group.as_ref() == Some(group);
                    if ui.selectable_label(selected, state_label(group)).clicked() && !selected {
                        self.settings.selected_group = Some(group.clone());
                        action = ControlPanelAction::SelectionChanged;
                    }
                }
            });

        ui.add_space(8.0);

        let checkbox_label = format!("Show {}-Week Rolling Mean", self.window);
        if ui
            .checkbox(&mut self.settings.smoothing, checkbox_label)
            .changed()
        {
            action = ControlPanelAction::SelectionChanged;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.exports_enabled, |ui| {
                let png_button = egui::Button::new(RichText::new("🖼 Export Charts (PNG)").size(14.0))
                    .min_size(egui::vec2(200.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }

                ui.add_space(8.0);

                let json_button = egui::Button::new(RichText::new("📄 Export Summary (JSON)").size(14.0))
                    .min_size(egui::vec2(200.0, 30.0));
                if ui.add(json_button).clicked() {
                    action = ControlPanelAction::ExportJson;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Loaded") || self.status.contains("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseCsv,
    SelectionChanged,
    ExportPng,
    ExportJson,
}
