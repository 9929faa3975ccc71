use crate::Result;
use log::warn;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Synthetic root of the bookmark hierarchy. Never written to disk and never
/// shown in the folder list, but its children are the real top-level folders.
pub const ROOT_ID: &str = "0";

/// The three fixed top-level containers (Bookmarks Bar, Other Bookmarks,
/// Mobile Bookmarks). Bookmarks saved here use Chrome's own ordering.
pub const ROOT_FOLDER_IDS: [&str; 3] = ["1", "2", "3"];

/// Microseconds between the Windows epoch (1601) and the Unix epoch.
/// Chrome timestamps count from the former.
const WINDOWS_TO_UNIX_EPOCH_MICROS: i64 = 11_644_473_600 * 1_000_000;

/// One entry in Chrome's bookmark tree. A node with a `children` array is a
/// folder (even when the array is empty); a node without one is a bookmark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<String>,
    /// Fields Chrome writes that this tool does not interpret
    /// (`guid`, `type`, `meta_info`, ...). Preserved across rewrites.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl BookmarkNode {
    /// True iff the node can contain other nodes.
    pub fn is_folder(&self) -> bool {
        self.children.is_some()
    }

    fn new(id: &str, name: &str, url: Option<&str>) -> Self {
        let mut rest = Map::new();
        rest.insert("guid".into(), Value::String(uuid::Uuid::new_v4().to_string()));
        rest.insert(
            "type".into(),
            Value::String(if url.is_some() { "url" } else { "folder" }.into()),
        );
        BookmarkNode {
            id: id.to_string(),
            name: name.to_string(),
            url: url.map(str::to_string),
            children: if url.is_some() { None } else { Some(Vec::new()) },
            date_added: Some(webkit_now_micros()),
            date_modified: None,
            rest,
        }
    }
}

/// Top-level shape of Chrome's `Bookmarks` file.
///
/// The checksum is parsed but deliberately not written back: Chrome rebuilds
/// a missing or stale checksum on load, and recomputing it here would buy
/// nothing.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkFile {
    pub roots: BookmarkRoots,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    #[serde(default, skip_serializing)]
    pub checksum: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookmarkRoots {
    pub bookmark_bar: BookmarkNode,
    pub other: BookmarkNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced: Option<BookmarkNode>,
}

/// Read/write access to a Chrome `Bookmarks` file.
///
/// Every operation is a full read-modify-write of the file; Chrome's own
/// writes are debounced and atomic, so the worst case of racing the browser
/// is one side's change being overwritten, same as any other external editor.
pub struct BookmarkStore {
    path: PathBuf,
}

impl BookmarkStore {
    /// Opens the default profile's bookmark file. The `MARKDROP_BOOKMARKS`
    /// environment variable overrides the per-OS default location.
    pub fn open_default() -> Result<Self> {
        Ok(Self { path: chrome_bookmarks_path()? })
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BookmarkFile> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| format!("failed to read {}: {}", self.path.display(), e))?;
        let file = serde_json::from_str(&content)
            .map_err(|e| format!("failed to parse {}: {}", self.path.display(), e))?;
        Ok(file)
    }

    /// Writes via a sibling temp file and rename, so a crash mid-write never
    /// leaves a truncated bookmark file behind.
    fn store(&self, file: &BookmarkFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("markdrop.tmp");
        fs::write(&tmp, json)
            .map_err(|e| format!("failed to write {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("failed to replace {}: {}", self.path.display(), e))?;
        Ok(())
    }

    /// The full hierarchy wrapped under the synthetic root node.
    pub fn root_tree(&self) -> Result<BookmarkNode> {
        let file = self.load()?;
        let BookmarkRoots { bookmark_bar, other, synced } = file.roots;
        let mut children = vec![bookmark_bar, other];
        if let Some(synced) = synced {
            children.push(synced);
        }
        Ok(BookmarkNode {
            id: ROOT_ID.to_string(),
            name: "Bookmarks".to_string(),
            url: None,
            children: Some(children),
            date_added: None,
            date_modified: None,
            rest: Map::new(),
        })
    }

    /// Ordered direct children of a folder.
    pub fn children_of(&self, folder_id: &str) -> Result<Vec<BookmarkNode>> {
        let mut file = self.load()?;
        let folder = find_folder_mut(&mut file.roots, folder_id)
            .ok_or_else(|| format!("folder not found: {}", folder_id))?;
        Ok(folder.children.clone().unwrap_or_default())
    }

    /// Appends a new folder under `parent_id` and returns its id.
    pub fn create_folder(&self, parent_id: &str, title: &str) -> Result<String> {
        let mut file = self.load()?;
        let id = (max_id(&file.roots) + 1).to_string();
        let node = BookmarkNode::new(&id, title, None);
        let parent = find_folder_mut(&mut file.roots, parent_id)
            .ok_or_else(|| format!("folder not found: {}", parent_id))?;
        parent.children.get_or_insert_with(Vec::new).push(node);
        parent.date_modified = Some(webkit_now_micros());
        self.store(&file)?;
        Ok(id)
    }

    /// Creates a bookmark under `parent_id`. With `index` the bookmark is
    /// inserted at that position (clamped to the child count); without one it
    /// is appended, which is Chrome's default ordering.
    pub fn create_bookmark(
        &self,
        parent_id: &str,
        title: &str,
        url: &str,
        index: Option<usize>,
    ) -> Result<String> {
        let mut file = self.load()?;
        let id = (max_id(&file.roots) + 1).to_string();
        let node = BookmarkNode::new(&id, title, Some(url));
        let parent = find_folder_mut(&mut file.roots, parent_id)
            .ok_or_else(|| format!("folder not found: {}", parent_id))?;
        let children = parent.children.get_or_insert_with(Vec::new);
        let at = index.unwrap_or(children.len()).min(children.len());
        children.insert(at, node);
        parent.date_modified = Some(webkit_now_micros());
        self.store(&file)?;
        Ok(id)
    }
}

/// Locates the default Chrome profile's `Bookmarks` file, honoring the
/// `MARKDROP_BOOKMARKS` override. On Linux a Chromium profile is used when no
/// Chrome profile exists.
pub fn chrome_bookmarks_path() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var("MARKDROP_BOOKMARKS") {
        let path = PathBuf::from(override_path);
        if !path.exists() {
            return Err(format!("bookmark file not found at: {}", path.display()).into());
        }
        return Ok(path);
    }

    let home_dir = dirs::home_dir().ok_or("could not find home directory")?;

    #[cfg(target_os = "windows")]
    let candidates = vec![home_dir
        .join("AppData")
        .join("Local")
        .join("Google")
        .join("Chrome")
        .join("User Data")
        .join("Default")
        .join("Bookmarks")];

    #[cfg(target_os = "macos")]
    let candidates = vec![home_dir
        .join("Library")
        .join("Application Support")
        .join("Google")
        .join("Chrome")
        .join("Default")
        .join("Bookmarks")];

    #[cfg(target_os = "linux")]
    let candidates = vec![
        home_dir
            .join(".config")
            .join("google-chrome")
            .join("Default")
            .join("Bookmarks"),
        home_dir
            .join(".config")
            .join("chromium")
            .join("Default")
            .join("Bookmarks"),
    ];

    candidates
        .iter()
        .find(|p| p.exists())
        .cloned()
        .ok_or_else(|| {
            format!("Chrome bookmarks file not found at: {:?}", candidates[0]).into()
        })
}

/// Blocking watch loop over a bookmark file; run it on a blocking thread.
/// Chrome rewrites the file in bursts, so modify events are debounced and a
/// burst collapses into a single `on_change` call.
pub fn watch_changes(path: PathBuf, on_change: impl Fn() + Send + 'static) {
    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = match notify::recommended_watcher(move |res: notify::Result<Event>| {
        match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_)) {
                    let _ = tx.send(());
                }
            }
            Err(e) => warn!("bookmark watch error: {}", e),
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            warn!("failed to create bookmark watcher: {}", e);
            return;
        }
    };

    if let Err(e) = watcher.watch(&path, RecursiveMode::NonRecursive) {
        warn!("failed to watch {}: {}", path.display(), e);
        return;
    }

    while rx.recv().is_ok() {
        // Let the rewrite settle before reporting it.
        std::thread::sleep(Duration::from_millis(500));
        while rx.try_recv().is_ok() {}
        on_change();
    }
}

/// Current time in Chrome's timestamp format: microseconds since 1601,
/// serialized as a decimal string.
fn webkit_now_micros() -> String {
    let unix_micros = chrono::Utc::now().timestamp_micros();
    (unix_micros + WINDOWS_TO_UNIX_EPOCH_MICROS).to_string()
}

fn find_folder_mut<'a>(roots: &'a mut BookmarkRoots, id: &str) -> Option<&'a mut BookmarkNode> {
    if let Some(found) = find_in_nodes(std::slice::from_mut(&mut roots.bookmark_bar), id) {
        return Some(found);
    }
    if let Some(found) = find_in_nodes(std::slice::from_mut(&mut roots.other), id) {
        return Some(found);
    }
    if let Some(synced) = roots.synced.as_mut() {
        if let Some(found) = find_in_nodes(std::slice::from_mut(synced), id) {
            return Some(found);
        }
    }
    None
}

fn find_in_nodes<'a>(nodes: &'a mut [BookmarkNode], id: &str) -> Option<&'a mut BookmarkNode> {
    for node in nodes.iter_mut() {
        if node.children.is_none() {
            // Bookmarks cannot be parents.
            continue;
        }
        if node.id == id {
            return Some(node);
        }
        if let Some(children) = node.children.as_mut() {
            if let Some(found) = find_in_nodes(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn max_id(roots: &BookmarkRoots) -> u64 {
    let mut max = 0;
    max_id_in(&roots.bookmark_bar, &mut max);
    max_id_in(&roots.other, &mut max);
    if let Some(synced) = &roots.synced {
        max_id_in(synced, &mut max);
    }
    max
}

fn max_id_in(node: &BookmarkNode, max: &mut u64) {
    if let Ok(id) = node.id.parse::<u64>() {
        *max = (*max).max(id);
    }
    if let Some(children) = &node.children {
        for child in children {
            max_id_in(child, max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture_json() -> Value {
        json!({
            "checksum": "0123456789abcdef0123456789abcdef",
            "version": 1,
            "sync_metadata": "b3BhcXVl",
            "roots": {
                "bookmark_bar": {
                    "id": "1",
                    "guid": "0bc5d13f-2cba-5d74-951f-3f233fe6c908",
                    "name": "Bookmarks bar",
                    "type": "folder",
                    "date_added": "13350000000000000",
                    "children": [
                        {
                            "id": "5",
                            "guid": "f2a1061c-0d1e-4d62-b462-c973791be964",
                            "name": "Rust",
                            "type": "folder",
                            "date_added": "13350000000000001",
                            "children": [
                                {
                                    "id": "6",
                                    "name": "The Book",
                                    "type": "url",
                                    "url": "https://doc.rust-lang.org/book/",
                                    "date_added": "13350000000000002",
                                    "meta_info": { "power_bookmark_meta": "" }
                                }
                            ]
                        },
                        {
                            "id": "7",
                            "name": "crates.io",
                            "type": "url",
                            "url": "https://crates.io/",
                            "date_added": "13350000000000003"
                        }
                    ]
                },
                "other": {
                    "id": "2",
                    "name": "Other bookmarks",
                    "type": "folder",
                    "date_added": "13350000000000000",
                    "children": []
                },
                "synced": {
                    "id": "3",
                    "name": "Mobile bookmarks",
                    "type": "folder",
                    "date_added": "13350000000000000",
                    "children": []
                }
            }
        })
    }

    fn fixture_store() -> (tempfile::TempDir, BookmarkStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Bookmarks");
        fs::write(&path, serde_json::to_string_pretty(&fixture_json()).unwrap()).unwrap();
        (dir, BookmarkStore::open(path))
    }

    #[test]
    fn root_tree_wraps_file_roots_under_synthetic_root() {
        let (_dir, store) = fixture_store();
        let root = store.root_tree().unwrap();

        assert_eq!(root.id, ROOT_ID);
        let children = root.children.as_ref().unwrap();
        let ids: Vec<&str> = children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn children_of_preserves_order() {
        let (_dir, store) = fixture_store();
        let children = store.children_of("1").unwrap();
        let ids: Vec<&str> = children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "7"]);
    }

    #[test]
    fn children_of_unknown_folder_is_an_error() {
        let (_dir, store) = fixture_store();
        assert!(store.children_of("404").is_err());
        // The synthetic root is not addressable in the file.
        assert!(store.children_of(ROOT_ID).is_err());
    }

    #[test]
    fn create_folder_appends_and_allocates_next_id() {
        let (_dir, store) = fixture_store();
        let id = store.create_folder("1", "Reading list").unwrap();
        assert_eq!(id, "8"); // max id in fixture is 7

        let children = store.children_of("1").unwrap();
        let last = children.last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.name, "Reading list");
        assert!(last.is_folder());
        assert!(last.children.as_ref().unwrap().is_empty());
        assert_eq!(last.rest.get("type").and_then(Value::as_str), Some("folder"));
        assert!(last.rest.get("guid").and_then(Value::as_str).is_some());
        assert!(last.date_added.is_some());
    }

    #[test]
    fn create_bookmark_inserts_at_index() {
        let (_dir, store) = fixture_store();
        store
            .create_bookmark("1", "docs.rs", "https://docs.rs/", Some(1))
            .unwrap();

        let names: Vec<String> = store
            .children_of("1")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Rust", "docs.rs", "crates.io"]);
    }

    #[test]
    fn create_bookmark_without_index_appends() {
        let (_dir, store) = fixture_store();
        store
            .create_bookmark("5", "std", "https://doc.rust-lang.org/std/", None)
            .unwrap();

        let children = store.children_of("5").unwrap();
        assert_eq!(children.last().unwrap().name, "std");
        assert_eq!(
            children.last().unwrap().url.as_deref(),
            Some("https://doc.rust-lang.org/std/")
        );
    }

    #[test]
    fn create_bookmark_clamps_out_of_range_index() {
        let (_dir, store) = fixture_store();
        store
            .create_bookmark("2", "lobste.rs", "https://lobste.rs/", Some(99))
            .unwrap();

        let children = store.children_of("2").unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "lobste.rs");
    }

    #[test]
    fn rewrite_preserves_foreign_fields_and_drops_checksum() {
        let (_dir, store) = fixture_store();
        store.create_folder("2", "Archive").unwrap();

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw.get("checksum"), None);
        assert_eq!(raw.get("version"), Some(&json!(1)));
        assert_eq!(raw.get("sync_metadata"), Some(&json!("b3BhcXVl")));

        // Untouched nodes keep their guid and meta_info verbatim.
        let bar = &raw["roots"]["bookmark_bar"];
        assert_eq!(bar["guid"], json!("0bc5d13f-2cba-5d74-951f-3f233fe6c908"));
        assert_eq!(
            bar["children"][0]["children"][0]["meta_info"],
            json!({ "power_bookmark_meta": "" })
        );
    }

    #[test]
    fn operations_survive_a_reload() {
        let (_dir, store) = fixture_store();
        let folder_id = store.create_folder("3", "Phone reads").unwrap();
        store
            .create_bookmark(&folder_id, "HN", "https://news.ycombinator.com/", Some(0))
            .unwrap();

        // A second store over the same path sees the new nodes.
        let reopened = BookmarkStore::open(store.path());
        let children = reopened.children_of(&folder_id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "HN");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = BookmarkStore::open(dir.path().join("Bookmarks"));
        assert!(store.root_tree().is_err());
    }
}
