use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::types::Bookmark;

pub const KEY_LAST_PAGE: &str = "last_selected_home_page";
pub const KEY_REPO_SORT: &str = "home_repo_list_sort";
const KEY_BOOKMARKS: &str = "bookmarks";

/// Small string key/value store for UI state that outlives a session.
pub trait PrefStore: Send + Sync + std::fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Preferences persisted as a JSON object in ~/.config/hubdeck/prefs.json
#[derive(Debug)]
pub struct FilePrefs {
    path: Option<PathBuf>,
    values: Mutex<HashMap<String, String>>,
}

impl FilePrefs {
    pub fn load() -> Self {
        let path = dirs::config_dir().map(|dir| dir.join("hubdeck").join("prefs.json"));
        let values = path
            .as_ref()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn flush(&self, values: &HashMap<String, String>) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(values) {
            Ok(data) => {
                if let Err(e) = std::fs::write(path, data) {
                    warn!(error = %e, "could not save preferences");
                }
            }
            Err(e) => warn!(error = %e, "could not encode preferences"),
        }
    }
}

impl PrefStore for FilePrefs {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().ok()?;
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let Ok(mut values) = self.values.lock() else {
            return;
        };
        values.insert(key.to_string(), value.to_string());
        self.flush(&values);
    }
}

/// In-memory store, used when nothing should touch the disk
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: Mutex<HashMap<String, String>>,
}

impl PrefStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }
}

pub fn bookmarks(prefs: &dyn PrefStore) -> Vec<Bookmark> {
    prefs
        .get(KEY_BOOKMARKS)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

/// Add a bookmark unless one with the same url exists. Returns true if added.
pub fn add_bookmark(prefs: &dyn PrefStore, bookmark: Bookmark) -> bool {
    let mut all = bookmarks(prefs);
    if all.iter().any(|b| b.url == bookmark.url) {
        return false;
    }
    all.push(bookmark);
    match serde_json::to_string(&all) {
        Ok(raw) => {
            prefs.set(KEY_BOOKMARKS, &raw);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookmarkKind;

    fn bookmark(name: &str) -> Bookmark {
        Bookmark {
            name: name.to_string(),
            url: format!("https://github.com/{}", name),
            kind: BookmarkKind::Repository,
        }
    }

    #[test]
    fn memory_prefs_round_trip() {
        let prefs = MemoryPrefs::default();
        assert_eq!(prefs.get(KEY_LAST_PAGE), None);
        prefs.set(KEY_LAST_PAGE, "gists");
        assert_eq!(prefs.get(KEY_LAST_PAGE).as_deref(), Some("gists"));
    }

    #[test]
    fn bookmarks_are_appended_once() {
        let prefs = MemoryPrefs::default();
        assert!(add_bookmark(&prefs, bookmark("rust-lang/rust")));
        assert!(add_bookmark(&prefs, bookmark("tokio-rs/tokio")));
        assert!(!add_bookmark(&prefs, bookmark("rust-lang/rust")));

        let names: Vec<_> = bookmarks(&prefs).into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["rust-lang/rust", "tokio-rs/tokio"]);
    }

    #[test]
    fn corrupt_bookmarks_read_as_empty() {
        let prefs = MemoryPrefs::default();
        prefs.set(KEY_BOOKMARKS, "not json");
        assert!(bookmarks(&prefs).is_empty());
    }
}
