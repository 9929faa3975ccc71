//! The save flow: what happens when the user confirms the popup.

use crate::bookmark::{BookmarkStore, ROOT_FOLDER_IDS};
use crate::prefs::Preferences;
use crate::Result;

/// Where the captured page goes.
#[derive(Debug, Clone)]
pub enum SaveTarget {
    /// An existing folder picked from the list.
    Existing(String),
    /// A folder to create first, under the last folder picked before the
    /// "create new" entry was chosen. The name arrives already trimmed and
    /// non-empty; the form rejects blank names before the flow starts.
    NewFolder { parent_id: String, name: String },
}

#[derive(Debug, Clone)]
pub struct SavedBookmark {
    pub bookmark_id: String,
    pub folder_id: String,
}

/// Trims a proposed folder name. `None` means the name is blank and the
/// submit must not proceed — the form silently refocuses the field instead
/// of surfacing an error.
pub fn validate_folder_name(name: &str) -> Option<&str> {
    let name = name.trim();
    (!name.is_empty()).then_some(name)
}

/// Creates the target folder if asked, remembers the choice, and files the
/// bookmark at the bottom of the folder.
///
/// Chrome keeps its three fixed containers ordered itself, so bookmarks
/// saved there pass no index; any other folder gets an explicit index equal
/// to its current child count, which pins the new bookmark after everything
/// already in it.
pub fn save_bookmark(
    store: &BookmarkStore,
    prefs: &Preferences,
    target: &SaveTarget,
    title: &str,
    url: &str,
) -> Result<SavedBookmark> {
    let folder_id = match target {
        SaveTarget::Existing(id) => id.clone(),
        SaveTarget::NewFolder { parent_id, name } => store
            .create_folder(parent_id, name)
            .map_err(|e| format!("failed to create folder: {}", e))?,
    };

    // Best-effort: set_last_folder logs and swallows its own failures, so a
    // broken preference store cannot abort the save.
    prefs.set_last_folder(&folder_id);

    let index = if ROOT_FOLDER_IDS.contains(&folder_id.as_str()) {
        None
    } else {
        Some(store.children_of(&folder_id)?.len())
    };

    let bookmark_id = store
        .create_bookmark(&folder_id, title, url, index)
        .map_err(|e| format!("failed to create bookmark: {}", e))?;

    Ok(SavedBookmark { bookmark_id, folder_id })
}
