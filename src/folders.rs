//! Folder flattening for the popup's selection list.
//!
//! Turns the bookmark hierarchy into the flat, display-ordered list the
//! folder picker shows: one entry per folder, labelled with its full path.

use crate::bookmark::{BookmarkNode, ROOT_ID};

/// Chrome's id for the Bookmarks Bar, the fallback selection when the
/// last-used folder is gone.
pub const BOOKMARKS_BAR_ID: &str = "1";

/// A folder ready for display: id, resolved title, and the " / "-joined path
/// of resolved ancestor titles. Recomputed on every popup open, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    pub id: String,
    pub title: String,
    pub path: String,
}

/// Flattens the hierarchy rooted at the synthetic root into display order:
/// depth-first pre-order, parents before children, siblings in stored order.
/// The root itself is traversed but not listed, and bookmarks are skipped
/// outright. Assumes a well-formed tree; there is no cycle detection.
pub fn flatten_folders(root: &BookmarkNode) -> Vec<FolderEntry> {
    let mut entries = Vec::new();
    walk(std::slice::from_ref(root), &mut Vec::new(), &mut entries);
    entries
}

fn walk(nodes: &[BookmarkNode], path: &mut Vec<String>, entries: &mut Vec<FolderEntry>) {
    for node in nodes {
        let Some(children) = &node.children else {
            // A node without a children array is a bookmark: not listed,
            // nothing to descend into.
            continue;
        };

        if node.id == ROOT_ID {
            // The root contributes neither an entry nor a path segment.
            walk(children, path, entries);
            continue;
        }

        let title = display_name(node);
        path.push(title.clone());
        entries.push(FolderEntry {
            id: node.id.clone(),
            title,
            path: path.join(" / "),
        });
        walk(children, path, entries);
        path.pop();
    }
}

/// Chrome's built-in containers keep their well-known names no matter what
/// the stored title says; everything else falls back to "Untitled" when the
/// title is empty.
fn display_name(node: &BookmarkNode) -> String {
    match node.id.as_str() {
        "0" => "Bookmarks".to_string(),
        "1" => "Bookmarks Bar".to_string(),
        "2" => "Other Bookmarks".to_string(),
        "3" => "Mobile Bookmarks".to_string(),
        _ if node.name.is_empty() => "Untitled".to_string(),
        _ => node.name.clone(),
    }
}

/// Picks the folder to preselect: the last-used folder if it still exists,
/// else the Bookmarks Bar, else the first listed folder. `None` only when
/// there are no folders at all.
pub fn default_selection<'a>(
    entries: &'a [FolderEntry],
    last_used: Option<&str>,
) -> Option<&'a FolderEntry> {
    if let Some(last) = last_used {
        if let Some(entry) = entries.iter().find(|e| e.id == last) {
            return Some(entry);
        }
    }
    entries
        .iter()
        .find(|e| e.id == BOOKMARKS_BAR_ID)
        .or_else(|| entries.first())
}
