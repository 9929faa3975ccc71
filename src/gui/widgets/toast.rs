//! Toast notification widget

use crate::gui::state::{Toast, ToastType};
use egui::{Color32, Context};

/// Render toast notifications along the bottom edge of the popup.
///
/// The window is small, so at most three toasts show at once, newest first.
pub fn render_toasts(ctx: &Context, toasts: &[Toast]) {
    if toasts.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("toast_area"))
        .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -8.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                for toast in toasts.iter().rev().take(3) {
                    egui::Frame::none()
                        .fill(toast_fill(toast.toast_type))
                        .rounding(4.0)
                        .inner_margin(egui::Margin::symmetric(10.0, 6.0))
                        .show(ui, |ui| {
                            ui.colored_label(Color32::WHITE, &toast.message);
                        });
                    ui.add_space(4.0);
                }
            });
        });
}

fn toast_fill(toast_type: ToastType) -> Color32 {
    match toast_type {
        ToastType::Info => Color32::from_rgb(54, 101, 140),
        ToastType::Success => Color32::from_rgb(46, 139, 87),
        ToastType::Error => Color32::from_rgb(178, 34, 52),
    }
}
