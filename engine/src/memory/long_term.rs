//! Long-term Memory Store
//!
//! Persistent store that writes one JSON file per item, named `<id>.json`.
//! Each file holds the item payload plus a `_meta` block with the item id and
//! its creation and update timestamps. An optional in-memory index is loaded
//! at construction; without it every lookup goes to disk.

use super::{Memory, MemoryError, MemoryRecord, MemoryStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Key under which item metadata is stored
pub const META_KEY: &str = "_meta";

/// Metadata block stored alongside each item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// File-backed memory store
#[derive(Debug)]
pub struct LongTermMemory {
    storage_path: PathBuf,
    index: Option<Mutex<HashMap<String, Value>>>,
}

impl LongTermMemory {
    /// Open (or create) a store rooted at `storage_path`
    ///
    /// Fails only when the storage directory cannot be created, which is a
    /// startup-level problem rather than a per-operation one.
    pub fn new(storage_path: impl Into<PathBuf>, index_in_memory: bool) -> Result<Self, MemoryError> {
        let storage_path = storage_path.into();
        fs::create_dir_all(&storage_path)?;

        let index = if index_in_memory {
            Some(Mutex::new(load_index(&storage_path)))
        } else {
            None
        };

        let store = Self {
            storage_path,
            index,
        };

        info!(
            "Long-term memory opened at {} (indexed: {})",
            store.storage_path.display(),
            store.index.is_some()
        );

        Ok(store)
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn index(&self) -> Option<MutexGuard<'_, HashMap<String, Value>>> {
        self.index
            .as_ref()
            .map(|index| index.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn item_path(&self, id: &str) -> Result<PathBuf, MemoryError> {
        if !is_valid_id(id) {
            return Err(MemoryError::InvalidId(id.to_string()));
        }
        Ok(self.storage_path.join(format!("{}.json", id)))
    }

    fn save_item(&self, id: &str, item: &Value) -> Result<(), MemoryError> {
        let path = self.item_path(id)?;
        let contents = serde_json::to_string_pretty(item)?;
        fs::write(path, contents)?;
        Ok(())
    }

    fn load_item(&self, id: &str) -> Result<Option<Value>, MemoryError> {
        let path = self.item_path(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn item_ids(&self) -> Result<Vec<String>, MemoryError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.storage_path)? {
            let path = entry?.path();
            if let Some(id) = json_stem(&path) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn try_get(&self, id: &str) -> Result<Option<Value>, MemoryError> {
        if let Some(index) = self.index() {
            if let Some(item) = index.get(id) {
                return Ok(Some(item.clone()));
            }
        }
        self.load_item(id)
    }

    fn try_search(
        &self,
        query: &Map<String, Value>,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let candidates: Vec<(String, Value)> = match self.index() {
            Some(index) => index
                .iter()
                .map(|(id, item)| (id.clone(), item.clone()))
                .collect(),
            None => {
                let mut items = Vec::new();
                for id in self.item_ids()? {
                    match self.load_item(&id) {
                        Ok(Some(item)) => items.push((id, item)),
                        Ok(None) => {}
                        Err(e) => error!("Failed to load memory item {}: {}", id, e),
                    }
                }
                items
            }
        };

        let mut hits: Vec<MemoryRecord> = candidates
            .into_iter()
            .filter(|(_, item)| matches_path_query(item, query))
            .map(|(id, item)| {
                let created_at = meta_of(&item)
                    .map(|meta| meta.created_at)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                MemoryRecord {
                    id,
                    item,
                    created_at,
                }
            })
            .collect();

        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }

    fn try_update(&self, id: &str, item: Value) -> Result<bool, MemoryError> {
        let existing = match self.try_get(id)? {
            Some(existing) => existing,
            None => return Ok(false),
        };

        let now = Utc::now();
        let meta = match meta_of(&existing) {
            Some(meta) => ItemMeta {
                updated_at: now,
                ..meta
            },
            None => ItemMeta {
                id: id.to_string(),
                created_at: now,
                updated_at: now,
            },
        };

        let stored = with_meta(item, &meta)?;
        self.save_item(id, &stored)?;
        if let Some(mut index) = self.index() {
            index.insert(id.to_string(), stored);
        }
        Ok(true)
    }

    fn try_delete(&self, id: &str) -> Result<bool, MemoryError> {
        let path = self.item_path(id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path)?;
        if let Some(mut index) = self.index() {
            index.remove(id);
        }
        Ok(true)
    }

    fn total_size_bytes(&self) -> Result<u64, MemoryError> {
        let mut total = 0;
        for entry in fs::read_dir(&self.storage_path)? {
            let entry = entry?;
            let path = entry.path();
            if json_stem(&path).is_some() && path.is_file() {
                total += entry.metadata()?.len();
            }
        }
        Ok(total)
    }
}

impl Memory for LongTermMemory {
    fn add(&self, item: Value) -> Option<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let meta = ItemMeta {
            id: id.clone(),
            created_at: now,
            updated_at: now,
        };

        let result = with_meta(item, &meta).and_then(|stored| {
            self.save_item(&id, &stored)?;
            Ok(stored)
        });

        match result {
            Ok(stored) => {
                if let Some(mut index) = self.index() {
                    index.insert(id.clone(), stored);
                }
                debug!("Stored long-term memory item {}", id);
                Some(id)
            }
            Err(e) => {
                error!("Failed to save memory item {}: {}", id, e);
                None
            }
        }
    }

    fn get(&self, id: &str) -> Option<Value> {
        self.try_get(id).unwrap_or_else(|e| {
            error!("Failed to load memory item {}: {}", id, e);
            None
        })
    }

    fn search(&self, query: &Map<String, Value>, limit: usize) -> Vec<MemoryRecord> {
        self.try_search(query, limit).unwrap_or_else(|e| {
            error!("Long-term memory search failed: {}", e);
            Vec::new()
        })
    }

    fn update(&self, id: &str, item: Value) -> bool {
        self.try_update(id, item).unwrap_or_else(|e| {
            error!("Failed to update memory item {}: {}", id, e);
            false
        })
    }

    fn delete(&self, id: &str) -> bool {
        self.try_delete(id).unwrap_or_else(|e| {
            error!("Failed to delete memory item {}: {}", id, e);
            false
        })
    }

    fn clear(&self) {
        match self.item_ids() {
            Ok(ids) => {
                for id in ids {
                    if let Err(e) = self.try_delete(&id) {
                        error!("Failed to delete memory item {}: {}", id, e);
                    }
                }
            }
            Err(e) => error!("Failed to list long-term memory: {}", e),
        }

        if let Some(mut index) = self.index() {
            index.clear();
        }
    }

    fn stats(&self) -> MemoryStats {
        let item_count = match self.index() {
            Some(index) => index.len(),
            None => self.item_ids().map(|ids| ids.len()).unwrap_or_else(|e| {
                error!("Failed to list long-term memory: {}", e);
                0
            }),
        };

        let total_size_bytes = self.total_size_bytes().unwrap_or_else(|e| {
            error!("Failed to measure long-term memory: {}", e);
            0
        });

        MemoryStats::LongTerm {
            storage_path: self.storage_path.clone(),
            index_in_memory: self.index.is_some(),
            item_count,
            total_size_bytes,
        }
    }
}

fn load_index(storage_path: &Path) -> HashMap<String, Value> {
    let mut index = HashMap::new();

    let entries = match fs::read_dir(storage_path) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read {}: {}", storage_path.display(), e);
            return index;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Some(id) = json_stem(&path) else {
            continue;
        };

        let loaded = fs::read_to_string(&path)
            .map_err(MemoryError::from)
            .and_then(|contents| serde_json::from_str::<Value>(&contents).map_err(MemoryError::from));

        match loaded {
            Ok(item) => {
                index.insert(id, item);
            }
            Err(e) => error!("Failed to index memory item {}: {}", id, e),
        }
    }

    debug!("Loaded {} items into long-term memory index", index.len());
    index
}

fn json_stem(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(String::from)
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Attach metadata to a payload. Non-object payloads are wrapped under `value`.
fn with_meta(item: Value, meta: &ItemMeta) -> Result<Value, MemoryError> {
    let mut fields = match item {
        Value::Object(fields) => fields,
        other => {
            let mut fields = Map::new();
            fields.insert("value".to_string(), other);
            fields
        }
    };
    fields.insert(META_KEY.to_string(), serde_json::to_value(meta)?);
    Ok(Value::Object(fields))
}

fn meta_of(item: &Value) -> Option<ItemMeta> {
    item.get(META_KEY)
        .and_then(|meta| serde_json::from_value(meta.clone()).ok())
}

/// Field matching that also accepts dot-separated paths into nested objects
fn matches_path_query(item: &Value, query: &Map<String, Value>) -> bool {
    query.iter().all(|(key, expected)| {
        let mut current = item;
        for part in key.split('.') {
            match current.get(part) {
                Some(next) => current = next,
                None => return false,
            }
        }
        current == expected
    })
}
