//! Popup preferences.
//!
//! One key matters: the folder the user last saved into. Reads that fail for
//! any reason act as if nothing was stored, and writes are best-effort — a
//! lost preference must never get in the way of saving a bookmark.

use log::warn;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const LAST_FOLDER_KEY: &str = "last_folder_id";

pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    /// Opens the preferences file under the user's config directory,
    /// creating the directory if needed.
    pub fn open_default() -> crate::Result<Self> {
        let dir = dirs::config_dir()
            .ok_or("could not find user config directory")?
            .join("markdrop");
        fs::create_dir_all(&dir)?;
        Ok(Self { path: dir.join("prefs.json") })
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The id of the folder the user last saved into, if one was recorded
    /// and the file is readable.
    pub fn last_folder(&self) -> Option<String> {
        self.read_map()?
            .get(LAST_FOLDER_KEY)?
            .as_str()
            .map(str::to_string)
    }

    /// Records the last-used folder. Failures are logged and swallowed.
    pub fn set_last_folder(&self, folder_id: &str) {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(
            LAST_FOLDER_KEY.to_string(),
            Value::String(folder_id.to_string()),
        );
        let json = match serde_json::to_string_pretty(&Value::Object(map)) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize preferences: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            warn!("failed to save last-used folder: {}", e);
        }
    }

    /// Reads the whole file as a JSON object so unrecognized keys survive a
    /// rewrite. Any failure reads as an empty store.
    fn read_map(&self) -> Option<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("failed to read {}: {}", self.path.display(), e);
                }
                return None;
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Some(map),
            Ok(_) => {
                warn!("{} is not a JSON object, ignoring it", self.path.display());
                None
            }
            Err(e) => {
                warn!("failed to parse {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn last_folder_roundtrip() {
        let dir = tempdir().unwrap();
        let prefs = Preferences::open(dir.path().join("prefs.json"));

        assert_eq!(prefs.last_folder(), None);
        prefs.set_last_folder("42");
        assert_eq!(prefs.last_folder(), Some("42".to_string()));

        prefs.set_last_folder("7");
        assert_eq!(prefs.last_folder(), Some("7".to_string()));
    }

    #[test]
    fn missing_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let prefs = Preferences::open(dir.path().join("nothing-here.json"));
        assert_eq!(prefs.last_folder(), None);
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();

        let prefs = Preferences::open(path);
        assert_eq!(prefs.last_folder(), None);
    }

    #[test]
    fn non_object_file_reads_as_absent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let prefs = Preferences::open(path);
        assert_eq!(prefs.last_folder(), None);
    }

    #[test]
    fn unknown_keys_survive_a_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"theme": "dark", "last_folder_id": "1"}"#).unwrap();

        let prefs = Preferences::open(path.clone());
        prefs.set_last_folder("9");

        let raw: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
        assert_eq!(raw["last_folder_id"], "9");
    }

    #[test]
    fn write_failure_does_not_panic() {
        let dir = tempdir().unwrap();
        // Parent directory does not exist, so the write must fail.
        let prefs = Preferences::open(dir.path().join("missing").join("prefs.json"));
        prefs.set_last_folder("1");
        assert_eq!(prefs.last_folder(), None);
    }
}
