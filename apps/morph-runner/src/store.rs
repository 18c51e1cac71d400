//! Item collection kept as a JSON file.

use morph_core::{ItemRecord, ItemStore, ItemUpdate, MorphError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// On-disk shape: the items plus the ordering index assigned to each.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    items: Vec<ItemRecord>,
    #[serde(default)]
    due: HashMap<i64, i64>,
}

/// JSON-file backed [`ItemStore`]. Updates stay in memory until [`save`](Self::save).
pub struct JsonItemStore {
    path: PathBuf,
    collection: Collection,
    dirty: bool,
}

impl JsonItemStore {
    pub fn open(path: &Path) -> morph_core::Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| MorphError::io(path, e))?;
        let collection: Collection = serde_json::from_str(&text)?;
        info!(path = %path.display(), items = collection.items.len(), "Loaded item collection");
        Ok(Self {
            path: path.to_path_buf(),
            collection,
            dirty: false,
        })
    }

    /// Ordering index assigned to an item, if any.
    pub fn due(&self, item_id: i64) -> Option<i64> {
        self.collection.due.get(&item_id).copied()
    }

    pub fn item(&self, item_id: i64) -> Option<&ItemRecord> {
        self.collection.items.iter().find(|i| i.id == item_id)
    }

    /// Write the collection back, replacing the file atomically.
    pub fn save(&mut self) -> morph_core::Result<()> {
        if !self.dirty {
            debug!("Item collection unchanged, not saving");
            return Ok(());
        }
        let tmp = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(&self.collection)?;
        fs::write(&tmp, text).map_err(|e| MorphError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| MorphError::io(&self.path, e))?;
        self.dirty = false;
        info!(path = %self.path.display(), "Saved item collection");
        Ok(())
    }
}

impl ItemStore for JsonItemStore {
    fn items(&self) -> morph_core::Result<Vec<ItemRecord>> {
        Ok(self.collection.items.clone())
    }

    fn apply(&mut self, update: ItemUpdate) -> morph_core::Result<()> {
        let item = self
            .collection
            .items
            .iter_mut()
            .find(|i| i.id == update.item_id)
            .ok_or_else(|| MorphError::Store(format!("item {} not found", update.item_id)))?;

        for (name, value) in update.fields {
            if let Some(slot) = item.fields.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = value;
            }
        }
        item.tags = update.tags;
        self.collection.due.insert(update.item_id, update.index);
        self.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const COLLECTION: &str = r#"{
        "items": [
            {
                "id": 7,
                "guid": "abc",
                "category": "Basic",
                "fields": [["Expression", "I have a cat."], ["Morph_Index", ""]],
                "tags": ["old"],
                "maturities": [3.0]
            }
        ]
    }"#;

    #[test]
    fn test_apply_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        fs::write(&path, COLLECTION).unwrap();

        let mut store = JsonItemStore::open(&path).unwrap();
        store
            .apply(ItemUpdate {
                item_id: 7,
                fields: vec![("Morph_Index".to_string(), "1234".to_string())],
                tags: vec!["mm_vocab".to_string()],
                index: 1234,
                modified_at: Utc::now(),
            })
            .unwrap();
        store.save().unwrap();

        let reopened = JsonItemStore::open(&path).unwrap();
        let item = reopened.item(7).unwrap();
        assert_eq!(item.field("Morph_Index"), Some("1234"));
        assert_eq!(item.tags, vec!["mm_vocab".to_string()]);
        assert_eq!(reopened.due(7), Some(1234));
        assert!(!dir.path().join("items.json.tmp").exists());
    }

    #[test]
    fn test_unknown_item_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("items.json");
        fs::write(&path, COLLECTION).unwrap();

        let mut store = JsonItemStore::open(&path).unwrap();
        let result = store.apply(ItemUpdate {
            item_id: 99,
            fields: Vec::new(),
            tags: Vec::new(),
            index: 0,
            modified_at: Utc::now(),
        });
        assert!(matches!(result, Err(MorphError::Store(_))));
    }
}
