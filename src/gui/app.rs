//! Popup application state and eframe App implementation

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use eframe::egui;
use log::{error, info, warn};

use crate::bookmark::{self, BookmarkStore};
use crate::capture::{self, TabCapture};
use crate::folders::{self, FolderEntry};
use crate::prefs::Preferences;
use crate::save::{self, SavedBookmark, SaveTarget};

use super::state::{FormAction, Selection, Toast, View};
use super::views;
use super::widgets;

/// Folder list and stored preference, loaded together per popup open
type FolderLoad = Result<(Vec<FolderEntry>, Option<String>), String>;

/// Main application state holding all UI and backend references
pub struct MarkDropApp {
    /// Bookmark file access; `None` when no Chrome profile was found
    store: Option<Arc<BookmarkStore>>,

    /// Last-used-folder preference
    prefs: Arc<Preferences>,

    /// Active view (Idle or Save)
    pub view: View,

    /// The captured page the form is saving
    pub current_tab: Option<TabCapture>,

    /// Flattened folder list, rebuilt per popup open
    pub folders: Vec<FolderEntry>,

    /// Current folder picker state; `None` only while no folders exist
    pub selection: Option<Selection>,

    /// Last real folder picked, the parent for a newly created folder
    pub parent_for_new: Option<String>,

    /// New-folder name field text
    pub new_folder_name: String,

    /// Move focus to the name field next frame
    pub focus_new_folder: bool,

    /// Move focus to the folder selector next frame
    pub focus_folder_select: bool,

    /// Active toast notifications
    pub toasts: Vec<Toast>,

    /// Counter for generating unique toast IDs
    next_toast_id: u64,

    /// Tokio runtime handle for background work
    runtime: tokio::runtime::Handle,

    /// Captures posted by the browser companion
    capture_rx: Receiver<TabCapture>,

    /// Change signals from the bookmark file watcher
    reload_rx: Receiver<()>,

    /// Receiver for an in-flight folder load
    folders_rx: Option<Receiver<FolderLoad>>,

    /// Receiver for an in-flight save
    save_rx: Option<Receiver<Result<SavedBookmark, String>>>,
}

impl MarkDropApp {
    /// Create the app: background runtime, capture endpoint, file watcher
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to create tokio runtime");
        let handle = runtime.handle().clone();
        // The runtime must outlive the app; leak it.
        std::mem::forget(runtime);

        let prefs = Arc::new(Preferences::open_default().unwrap_or_else(|e| {
            warn!("falling back to a local preferences file: {}", e);
            Preferences::open("markdrop-prefs.json")
        }));

        let store = match BookmarkStore::open_default() {
            Ok(store) => {
                info!("using bookmark file at {}", store.path().display());
                Some(Arc::new(store))
            }
            Err(e) => {
                error!("no bookmark store available: {}", e);
                None
            }
        };

        // Capture endpoint: the browser companion posts the active tab here.
        let (capture_tx, capture_rx) = std::sync::mpsc::channel();
        let ctx = cc.egui_ctx.clone();
        handle.spawn(async move {
            let result = capture::serve(move |tab| {
                let _ = capture_tx.send(tab);
                ctx.request_repaint();
            })
            .await;
            if let Err(e) = result {
                error!("capture endpoint failed: {}", e);
            }
        });

        // Reload the folder list when Chrome rewrites the bookmark file.
        let (reload_tx, reload_rx) = std::sync::mpsc::channel();
        if let Some(store) = &store {
            let path = store.path().to_path_buf();
            let ctx = cc.egui_ctx.clone();
            handle.spawn_blocking(move || {
                bookmark::watch_changes(path, move || {
                    let _ = reload_tx.send(());
                    ctx.request_repaint();
                });
            });
        }

        let mut app = Self {
            store,
            prefs,
            view: View::Idle,
            current_tab: None,
            folders: Vec::new(),
            selection: None,
            parent_for_new: None,
            new_folder_name: String::new(),
            focus_new_folder: false,
            focus_folder_select: false,
            toasts: Vec::new(),
            next_toast_id: 0,
            runtime: handle,
            capture_rx,
            reload_rx,
            folders_rx: None,
            save_rx: None,
        };

        if app.store.is_none() {
            let id = app.next_toast_id();
            app.add_toast(Toast::error(
                id,
                "Chrome bookmarks not found; saving is disabled",
            ));
        } else {
            app.load_folders();
        }

        app
    }

    /// Add a toast notification
    pub fn add_toast(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }

    /// Remove expired toasts
    pub fn cleanup_toasts(&mut self) {
        self.toasts.retain(|t| !t.is_expired());
    }

    /// Get next unique toast ID
    pub fn next_toast_id(&mut self) -> u64 {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        id
    }

    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_saving(&self) -> bool {
        self.save_rx.is_some()
    }

    pub fn is_loading_folders(&self) -> bool {
        self.folders_rx.is_some()
    }

    /// Flatten the bookmark tree and read the stored preference in the
    /// background
    pub fn load_folders(&mut self) {
        if self.folders_rx.is_some() {
            return; // Already loading
        }
        let Some(store) = self.store.clone() else {
            return;
        };
        let prefs = self.prefs.clone();
        let (tx, rx) = std::sync::mpsc::channel();

        self.runtime.spawn(async move {
            let result = store
                .root_tree()
                .map(|root| (folders::flatten_folders(&root), prefs.last_folder()))
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });

        self.folders_rx = Some(rx);
    }

    /// Check if a folder load has finished and apply the preselection rule
    fn check_folders(&mut self) {
        let Some(rx) = &self.folders_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok((entries, last_used))) => {
                self.folders = entries;
                let picked = folders::default_selection(&self.folders, last_used.as_deref())
                    .map(|e| e.id.clone());
                self.parent_for_new = picked.clone();
                self.selection = picked.map(Selection::Folder);
                // The selector gets initial focus each time the form opens.
                self.focus_folder_select = self.view == View::Save;
                self.folders_rx = None;
            }
            Ok(Err(e)) => {
                self.folders_rx = None;
                let id = self.next_toast_id();
                self.add_toast(Toast::error(id, format!("Failed to read folders: {}", e)));
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.folders_rx = None;
            }
        }
    }

    /// Drain pending captures; the newest one wins and opens the popup
    fn check_captures(&mut self, ctx: &egui::Context) {
        let mut latest = None;
        while let Ok(tab) = self.capture_rx.try_recv() {
            latest = Some(tab);
        }
        let Some(tab) = latest else {
            return;
        };

        self.current_tab = Some(tab);
        self.view = View::Save;
        self.new_folder_name.clear();
        self.load_folders();

        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
        ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
    }

    /// Refresh the folder list after external bookmark changes, but only
    /// while idle — never underneath an open form
    fn check_reload(&mut self) {
        let mut changed = false;
        while self.reload_rx.try_recv().is_ok() {
            changed = true;
        }
        if changed && self.view == View::Idle {
            info!("bookmark file changed, refreshing folder list");
            self.load_folders();
        }
    }

    /// Start the save flow for the current form state
    pub fn submit(&mut self) {
        if self.save_rx.is_some() {
            return; // A save is already running
        }
        let (Some(store), Some(tab)) = (self.store.clone(), self.current_tab.clone()) else {
            return;
        };

        let target = match &self.selection {
            Some(Selection::Folder(id)) => SaveTarget::Existing(id.clone()),
            Some(Selection::CreateNew) => {
                let Some(name) = save::validate_folder_name(&self.new_folder_name) else {
                    // Silent validation failure: back to the name field.
                    self.focus_new_folder = true;
                    return;
                };
                let parent = self
                    .parent_for_new
                    .clone()
                    .or_else(|| self.folders.first().map(|e| e.id.clone()));
                let Some(parent_id) = parent else {
                    return;
                };
                SaveTarget::NewFolder { parent_id, name: name.to_string() }
            }
            None => return,
        };

        let prefs = self.prefs.clone();
        let (tx, rx) = std::sync::mpsc::channel();

        self.runtime.spawn(async move {
            let result = save::save_bookmark(&store, &prefs, &target, &tab.title, &tab.url)
                .map_err(|e| e.to_string());
            let _ = tx.send(result);
        });

        self.save_rx = Some(rx);
    }

    /// Check if a save has finished: hide on success, toast on failure
    fn check_save(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.save_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(saved)) => {
                self.save_rx = None;
                info!(
                    "bookmark {} saved into folder {}",
                    saved.bookmark_id, saved.folder_id
                );
                self.dismiss(ctx);
            }
            Ok(Err(e)) => {
                self.save_rx = None;
                let id = self.next_toast_id();
                self.add_toast(Toast::error(id, e));
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.save_rx = None;
                let id = self.next_toast_id();
                self.add_toast(Toast::error(id, "Saving failed unexpectedly; try again"));
            }
        }
    }

    /// Hide the popup and drop any pending capture. In-flight host calls are
    /// not cancelled; their results land in an idle window.
    pub fn dismiss(&mut self, ctx: &egui::Context) {
        self.current_tab = None;
        self.new_folder_name.clear();
        self.view = View::Idle;
        ctx.send_viewport_cmd(egui::ViewportCommand::Visible(false));
    }
}

impl eframe::App for MarkDropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for async updates
        self.check_captures(ctx);
        self.check_reload();
        self.check_folders();
        self.check_save(ctx);
        self.cleanup_toasts();

        // Escape dismisses the popup from anywhere
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.dismiss(ctx);
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("MarkDrop");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.is_saving() {
                        ui.spinner();
                        ui.label("Saving…");
                    } else if self.is_loading_folders() {
                        ui.spinner();
                    }
                });
            });
            ui.add_space(6.0);
        });

        let mut action = FormAction::None;
        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Idle => views::idle::render_idle(ui, self),
            View::Save => action = views::save::render_save_form(ui, self),
        });

        match action {
            FormAction::Submit => self.submit(),
            FormAction::Cancel => self.dismiss(ctx),
            FormAction::None => {}
        }

        // Toast overlay
        widgets::toast::render_toasts(ctx, &self.toasts);

        // Keep painting while background work or timed toasts are pending
        if self.folders_rx.is_some() || self.save_rx.is_some() {
            ctx.request_repaint();
        } else if !self.toasts.is_empty() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}
