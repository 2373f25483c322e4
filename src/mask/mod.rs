//! Column-visibility masks, persisted between runs.
//!
//! Each report variant keeps a header → visible mapping so a user's column
//! selection survives across runs. A mask is a JSON file under
//! `$CAMPREPORT_MASK_DIR` (default `~/.campreport/masks`), keyed by the
//! variant's mask key: read all on open, write through on change.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{MaskError, MaskResult};
use crate::report::Header;

/// Environment variable overriding the mask directory.
pub const MASK_DIR_ENV: &str = "CAMPREPORT_MASK_DIR";

const DEFAULT_MASK_DIR: &str = ".campreport/masks";

/// A stored column-visibility mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMask {
    /// Storage key, e.g. `"headersMask"`.
    pub key: String,
    /// Header → visible. Insertion order mirrors the report's header order.
    pub columns: IndexMap<Header, bool>,
    pub created_at: String,
    pub updated_at: String,
}

/// File-backed registry of visibility masks.
pub struct MaskStore {
    dir: PathBuf,
    masks: HashMap<String, StoredMask>,
}

impl MaskStore {
    /// Open the store at `$CAMPREPORT_MASK_DIR`, falling back to
    /// `~/.campreport/masks`.
    pub fn open() -> Self {
        let dir = std::env::var_os(MASK_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(DEFAULT_MASK_DIR)
            });
        Self::with_dir(dir)
    }

    /// Open a store rooted at a specific directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut store = Self {
            dir: dir.as_ref().to_path_buf(),
            masks: HashMap::new(),
        };
        store.load_all();
        store
    }

    fn load_all(&mut self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(mask) = serde_json::from_str::<StoredMask>(&content) {
                        self.masks.insert(mask.key.clone(), mask);
                    }
                }
            }
        }
    }

    /// All stored masks.
    pub fn list(&self) -> Vec<&StoredMask> {
        let mut masks: Vec<_> = self.masks.values().collect();
        masks.sort_by(|a, b| a.key.cmp(&b.key));
        masks
    }

    pub fn get(&self, key: &str) -> Option<&StoredMask> {
        self.masks.get(key)
    }

    /// Upsert the mask under `key`, preserving the original creation time.
    pub fn set(&mut self, key: &str, columns: IndexMap<Header, bool>) -> MaskResult<&StoredMask> {
        let now = chrono::Utc::now().to_rfc3339();
        let created_at = self
            .masks
            .get(key)
            .map(|m| m.created_at.clone())
            .unwrap_or_else(|| now.clone());

        let mask = StoredMask {
            key: key.to_string(),
            columns,
            created_at,
            updated_at: now,
        };
        self.persist(&mask)?;
        self.masks.insert(key.to_string(), mask);
        Ok(&self.masks[key])
    }

    /// Flip one header's visibility, creating the mask (and the entry) when
    /// missing. Returns the new visibility.
    pub fn toggle(&mut self, key: &str, header: &str) -> MaskResult<bool> {
        let mut columns = self
            .masks
            .get(key)
            .map(|m| m.columns.clone())
            .unwrap_or_default();
        let visible = !columns.get(header).copied().unwrap_or(false);
        columns.insert(header.to_string(), visible);
        self.set(key, columns)?;
        Ok(visible)
    }

    /// Delete the stored mask.
    pub fn clear(&mut self, key: &str) -> MaskResult<()> {
        if self.masks.remove(key).is_none() {
            return Err(MaskError::NotFound(key.to_string()));
        }
        fs::remove_file(self.path_for(key))?;
        Ok(())
    }

    fn persist(&self, mask: &StoredMask) -> MaskResult<()> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(mask)?;
        fs::write(self.path_for(&mask.key), content)?;
        Ok(())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

/// The default mask for a fresh report: every header hidden-flagged `false`,
/// which the consumers read as "no filter, show everything".
pub fn default_mask(headers: &[Header]) -> IndexMap<Header, bool> {
    headers
        .iter()
        .map(|header| (header.clone(), false))
        .collect()
}

/// Headers the mask marks visible, in report header order.
pub fn visible_headers(mask: &IndexMap<Header, bool>, headers: &[Header]) -> Vec<Header> {
    headers
        .iter()
        .filter(|header| mask.get(*header).copied().unwrap_or(false))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn columns(pairs: &[(&str, bool)]) -> IndexMap<Header, bool> {
        pairs
            .iter()
            .map(|(header, visible)| (header.to_string(), *visible))
            .collect()
    }

    #[test]
    fn test_set_get_round_trip() {
        let dir = tempdir().unwrap();
        let mut store = MaskStore::with_dir(dir.path());

        store
            .set("headersMask", columns(&[("Name", true), ("Text", false)]))
            .unwrap();

        let mask = store.get("headersMask").unwrap();
        assert_eq!(mask.columns["Name"], true);
        assert_eq!(mask.columns["Text"], false);

        // a fresh store sees the persisted file
        let reopened = MaskStore::with_dir(dir.path());
        assert_eq!(reopened.get("headersMask"), store.get("headersMask"));
    }

    #[test]
    fn test_set_preserves_created_at() {
        let dir = tempdir().unwrap();
        let mut store = MaskStore::with_dir(dir.path());

        store.set("headersMask", columns(&[("A", true)])).unwrap();
        let created = store.get("headersMask").unwrap().created_at.clone();

        store.set("headersMask", columns(&[("A", false)])).unwrap();
        let mask = store.get("headersMask").unwrap();
        assert_eq!(mask.created_at, created);
        assert_eq!(mask.columns["A"], false);
    }

    #[test]
    fn test_toggle_creates_and_flips() {
        let dir = tempdir().unwrap();
        let mut store = MaskStore::with_dir(dir.path());

        assert!(store.toggle("headersMask", "Cohort").unwrap());
        assert!(!store.toggle("headersMask", "Cohort").unwrap());
        assert_eq!(
            store.get("headersMask").unwrap().columns["Cohort"],
            false
        );
    }

    #[test]
    fn test_clear_removes_mask_and_file() {
        let dir = tempdir().unwrap();
        let mut store = MaskStore::with_dir(dir.path());

        store.set("headersMask", columns(&[("A", true)])).unwrap();
        store.clear("headersMask").unwrap();

        assert!(store.get("headersMask").is_none());
        assert!(matches!(
            store.clear("headersMask"),
            Err(MaskError::NotFound(_))
        ));
        assert!(MaskStore::with_dir(dir.path()).get("headersMask").is_none());
    }

    #[test]
    fn test_list_is_sorted_by_key() {
        let dir = tempdir().unwrap();
        let mut store = MaskStore::with_dir(dir.path());

        store
            .set("headersMaskAfterschool", columns(&[("A", true)]))
            .unwrap();
        store.set("headersMask", columns(&[("A", true)])).unwrap();

        let keys: Vec<_> = store.list().iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["headersMask", "headersMaskAfterschool"]);
    }

    #[test]
    fn test_default_mask_all_false() {
        let headers = vec!["A".to_string(), "B".to_string()];
        let mask = default_mask(&headers);
        assert!(mask.values().all(|visible| !visible));
        assert_eq!(mask.len(), 2);
    }

    #[test]
    fn test_visible_headers_in_report_order() {
        let headers = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let mask = columns(&[("C", true), ("A", true), ("B", false)]);

        assert_eq!(visible_headers(&mask, &headers), vec!["A", "C"]);
        assert!(visible_headers(&default_mask(&headers), &headers).is_empty());
    }
}
