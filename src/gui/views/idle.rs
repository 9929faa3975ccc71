//! Idle view shown while no capture is pending

use egui::Ui;

use crate::gui::app::MarkDropApp;

/// Render the waiting screen
pub fn render_idle(ui: &mut Ui, app: &MarkDropApp) {
    ui.vertical_centered(|ui| {
        ui.add_space(60.0);

        if !app.has_store() {
            ui.colored_label(egui::Color32::RED, "⚠ No bookmark file found");
            ui.add_space(10.0);
            ui.label("MarkDrop needs a Chrome or Chromium profile with a Bookmarks file.");
            ui.add_space(5.0);
            ui.weak("Set MARKDROP_BOOKMARKS to point at one, then restart.");
            return;
        }

        ui.label("Waiting for a page capture…");
        ui.add_space(10.0);
        ui.weak("Trigger the capture shortcut in your browser to save the current tab.");

        if !app.folders.is_empty() {
            ui.add_space(20.0);
            ui.weak(format!("{} folders available", app.folders.len()));
        }
    });
}
