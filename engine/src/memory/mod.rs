//! Memory System
//!
//! Two stores share the [`Memory`] contract:
//!
//! - [`ShortTermMemory`]: bounded, volatile store with lazy TTL expiry and
//!   least-recently-used eviction. Used by execution loops as working memory.
//! - [`LongTermMemory`]: file-per-item persistent store with an optional
//!   in-memory index.
//!
//! Memory failures never abort a task. Persistent I/O errors are logged and
//! surface as `None`, `false`, or empty results.

pub mod long_term;
pub mod short_term;

pub use long_term::LongTermMemory;
pub use short_term::ShortTermMemory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Default maximum number of items held by the short-term store
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default time-to-live for short-term items, in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Errors raised inside the persistent store before they are logged
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

/// A search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub item: Value,
    pub created_at: DateTime<Utc>,
}

/// Statistics reported by a memory store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemoryStats {
    ShortTerm {
        capacity: usize,
        ttl_secs: u64,
        size: usize,
        utilization: f64,
    },
    LongTerm {
        storage_path: PathBuf,
        index_in_memory: bool,
        item_count: usize,
        total_size_bytes: u64,
    },
}

impl MemoryStats {
    /// Number of items currently stored
    pub fn size(&self) -> usize {
        match self {
            Self::ShortTerm { size, .. } => *size,
            Self::LongTerm { item_count, .. } => *item_count,
        }
    }
}

/// Common contract for all memory stores
///
/// Methods take `&self`; implementations serialize access internally so a
/// store can be shared across concurrently running loops.
pub trait Memory: Send + Sync {
    /// Store an item and return its identifier
    fn add(&self, item: Value) -> Option<String>;

    /// Retrieve an item by identifier
    fn get(&self, id: &str) -> Option<Value>;

    /// Return up to `limit` items matching every field of `query`, newest first
    fn search(&self, query: &Map<String, Value>, limit: usize) -> Vec<MemoryRecord>;

    /// Replace an existing item
    fn update(&self, id: &str, item: Value) -> bool;

    /// Remove an item
    fn delete(&self, id: &str) -> bool;

    /// Remove every item
    fn clear(&self);

    fn stats(&self) -> MemoryStats;
}

/// Exact field equality between a query and an item.
///
/// Non-object items only match the empty query.
pub(crate) fn matches_exact(item: &Value, query: &Map<String, Value>) -> bool {
    if query.is_empty() {
        return true;
    }
    match item.as_object() {
        Some(fields) => query
            .iter()
            .all(|(key, expected)| fields.get(key) == Some(expected)),
        None => false,
    }
}
