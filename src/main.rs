// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! MarkDrop Desktop Popup
//!
//! A resident egui window that files pages captured from the browser into
//! Chrome's bookmarks.

use eframe::egui;
use markdrop::gui::MarkDropApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("MarkDrop")
            .with_inner_size([420.0, 380.0])
            .with_min_inner_size([360.0, 300.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MarkDrop",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            Ok(Box::new(MarkDropApp::new(cc)))
        }),
    )
}
