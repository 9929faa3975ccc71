//! Save form: captured page summary, folder choice, optional new-folder name

use egui::Ui;

use crate::gui::app::MarkDropApp;
use crate::gui::state::{FormAction, Selection};

const CREATE_NEW_LABEL: &str = "Create new folder…";

/// Render the save form and report what the user asked for this frame
pub fn render_save_form(ui: &mut Ui, app: &mut MarkDropApp) -> FormAction {
    let mut action = FormAction::None;

    let Some(tab) = app.current_tab.clone() else {
        // A capture was abandoned mid-frame; nothing to show.
        return action;
    };

    ui.add_space(8.0);
    ui.strong(&tab.title);
    ui.weak(truncate_middle(&tab.url, 64));
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);

    if app.folders.is_empty() {
        if app.is_loading_folders() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading folders…");
            });
        } else {
            ui.weak("No bookmark folders found — nothing to save into.");
        }
    } else {
        render_folder_picker(ui, app, &mut action);
    }

    ui.add_space(12.0);
    ui.separator();
    ui.add_space(8.0);

    ui.horizontal(|ui| {
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let can_save = app.selection.is_some() && !app.is_saving();
            ui.add_enabled_ui(can_save, |ui| {
                let label = if app.is_saving() { "Saving…" } else { "Save" };
                if ui.button(label).clicked() {
                    action = FormAction::Submit;
                }
            });

            ui.add_space(6.0);

            if ui.button("Cancel").clicked() {
                action = FormAction::Cancel;
            }
        });
    });

    action
}

fn render_folder_picker(ui: &mut Ui, app: &mut MarkDropApp, action: &mut FormAction) {
    // Clone the entries so the combo's closure can mutate the selection.
    let entries = app.folders.clone();

    ui.label("Save to folder:");

    let selected_text = match &app.selection {
        Some(Selection::Folder(id)) => entries
            .iter()
            .find(|e| &e.id == id)
            .map(|e| e.path.clone())
            .unwrap_or_else(|| id.clone()),
        Some(Selection::CreateNew) => CREATE_NEW_LABEL.to_string(),
        None => String::new(),
    };

    let combo = egui::ComboBox::from_id_salt("folder_select")
        .width(ui.available_width())
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            for entry in &entries {
                let checked =
                    matches!(&app.selection, Some(Selection::Folder(id)) if id == &entry.id);
                if ui.selectable_label(checked, &entry.path).clicked() {
                    // Picking a real folder also updates the remembered
                    // parent for any folder created later.
                    app.selection = Some(Selection::Folder(entry.id.clone()));
                    app.parent_for_new = Some(entry.id.clone());
                }
            }

            ui.separator();

            let creating = matches!(app.selection, Some(Selection::CreateNew));
            if ui.selectable_label(creating, CREATE_NEW_LABEL).clicked() {
                app.selection = Some(Selection::CreateNew);
                app.focus_new_folder = true;
            }
        });

    if app.focus_folder_select {
        combo.response.request_focus();
        app.focus_folder_select = false;
    }

    if matches!(app.selection, Some(Selection::CreateNew)) {
        ui.add_space(8.0);

        let parent_path = app
            .parent_for_new
            .as_ref()
            .and_then(|id| entries.iter().find(|e| &e.id == id))
            .map(|e| e.path.clone())
            .unwrap_or_else(|| "Bookmarks".to_string());
        ui.weak(format!("New folder in: {}", parent_path));

        let response = ui.add(
            egui::TextEdit::singleline(&mut app.new_folder_name)
                .hint_text("Folder name")
                .desired_width(ui.available_width()),
        );
        if app.focus_new_folder {
            response.request_focus();
            app.focus_new_folder = false;
        }

        // Enter in the name field submits the form.
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            *action = FormAction::Submit;
        }
    }
}

/// Shorten long URLs for the one-line summary, keeping both ends visible
fn truncate_middle(url: &str, max_chars: usize) -> String {
    let chars: Vec<char> = url.chars().collect();
    if chars.len() <= max_chars {
        return url.to_string();
    }
    let keep = max_chars.saturating_sub(1) / 2;
    let head: String = chars[..keep].iter().collect();
    let tail: String = chars[chars.len() - keep..].iter().collect();
    format!("{}…{}", head, tail)
}
