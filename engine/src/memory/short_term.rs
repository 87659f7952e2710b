//! Short-term Memory Store
//!
//! Bounded key-value store with lazy time-to-live expiry and LRU eviction.
//!
//! Every read or write first prunes expired items; there is no background
//! timer. Recency is tracked with a logical clock: each touch of an item
//! stamps it with a fresh tick and pushes `(tick, id)` onto a min-heap.
//! Eviction pops the heap until it finds an entry whose tick still matches
//! the live item. Entries for deleted or re-touched items are skipped when
//! popped rather than removed eagerly.

use super::{matches_exact, Memory, MemoryRecord, MemoryStats, DEFAULT_CAPACITY, DEFAULT_TTL_SECS};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Capacity below which a warning is logged at construction
const SMALL_CAPACITY: usize = 100;

/// Capacity above which a warning is logged at construction
const LARGE_CAPACITY: usize = 10_000;

/// Utilization above which a warning is logged after insertion
const HIGH_UTILIZATION: f64 = 0.9;

/// Heap entries allowed beyond twice the live item count before compaction
const HEAP_SLACK: usize = 64;

#[derive(Debug)]
struct Entry {
    item: Value,
    created: Instant,
    created_at: DateTime<Utc>,
    /// Insertion sequence, used for newest-first ordering
    seq: u64,
    /// Tick of the most recent access; only the heap entry carrying this tick is live
    tick: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    lru: BinaryHeap<Reverse<(u64, String)>>,
    clock: u64,
    inserted: u64,
}

impl Inner {
    fn next_tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Record an access to `id`, making it the most recently used item
    fn touch(&mut self, id: &str) {
        let tick = self.next_tick();
        if let Some(entry) = self.entries.get_mut(id) {
            entry.tick = tick;
            self.lru.push(Reverse((tick, id.to_string())));
        }
    }

    fn prune_expired(&mut self, ttl: Duration) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.duration_since(entry.created) <= ttl);

        let expired = before - self.entries.len();
        if expired > 0 {
            debug!("Pruned {} expired memory items", expired);
        }
    }

    /// Evict the single least recently used item
    fn evict_lru(&mut self) -> Option<String> {
        while let Some(Reverse((tick, id))) = self.lru.pop() {
            let live = self
                .entries
                .get(&id)
                .map(|entry| entry.tick == tick)
                .unwrap_or(false);

            if live {
                self.entries.remove(&id);
                return Some(id);
            }
        }
        None
    }

    /// Rebuild the heap from live entries once stale entries dominate it
    fn compact_if_needed(&mut self) {
        if self.lru.len() <= self.entries.len() * 2 + HEAP_SLACK {
            return;
        }

        let stale = self.lru.len() - self.entries.len();
        self.lru = self
            .entries
            .iter()
            .map(|(id, entry)| Reverse((entry.tick, id.clone())))
            .collect();
        debug!("Compacted LRU heap, dropped {} stale entries", stale);
    }
}

/// Volatile memory store with TTL expiry and LRU eviction
///
/// # Examples
///
/// ```
/// use foreman_engine::memory::{Memory, ShortTermMemory};
/// use serde_json::json;
/// use std::time::Duration;
///
/// let memory = ShortTermMemory::new(2, Duration::from_secs(3600));
/// let a = memory.add(json!({"name": "A"})).unwrap();
/// memory.add(json!({"name": "B"}));
/// memory.add(json!({"name": "C"}));
///
/// assert!(memory.get(&a).is_none());
/// assert_eq!(memory.len(), 2);
/// ```
#[derive(Debug)]
pub struct ShortTermMemory {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl ShortTermMemory {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        if capacity < SMALL_CAPACITY {
            warn!(
                "Short-term memory capacity of {} is small, items may be evicted early",
                capacity
            );
        } else if capacity > LARGE_CAPACITY {
            warn!(
                "Short-term memory capacity of {} is unusually large",
                capacity
            );
        }

        info!(
            "Short-term memory initialized (capacity: {}, ttl: {}s)",
            capacity,
            ttl.as_secs()
        );

        Self {
            capacity,
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of live items, after pruning expired ones
    pub fn len(&self) -> usize {
        let mut inner = self.lock();
        inner.prune_expired(self.ttl);
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn utilization(&self, size: usize) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            size as f64 / self.capacity as f64
        }
    }
}

impl Default for ShortTermMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl Memory for ShortTermMemory {
    fn add(&self, item: Value) -> Option<String> {
        let mut inner = self.lock();
        inner.prune_expired(self.ttl);

        let id = uuid::Uuid::new_v4().to_string();
        let tick = inner.next_tick();
        inner.inserted += 1;
        let seq = inner.inserted;

        inner.entries.insert(
            id.clone(),
            Entry {
                item,
                created: Instant::now(),
                created_at: Utc::now(),
                seq,
                tick,
            },
        );
        inner.lru.push(Reverse((tick, id.clone())));

        if inner.entries.len() > self.capacity {
            if let Some(evicted) = inner.evict_lru() {
                debug!("Evicted least recently used memory item {}", evicted);
            }
        }
        inner.compact_if_needed();

        let utilization = self.utilization(inner.entries.len());
        if utilization > HIGH_UTILIZATION {
            warn!(
                "Short-term memory is {:.1}% full",
                utilization * 100.0
            );
        }

        Some(id)
    }

    fn get(&self, id: &str) -> Option<Value> {
        let mut inner = self.lock();
        inner.prune_expired(self.ttl);

        let item = inner.entries.get(id).map(|entry| entry.item.clone());
        if item.is_some() {
            inner.touch(id);
            inner.compact_if_needed();
        } else {
            debug!("Memory item {} not found", id);
        }
        item
    }

    fn search(&self, query: &Map<String, Value>, limit: usize) -> Vec<MemoryRecord> {
        let mut inner = self.lock();
        inner.prune_expired(self.ttl);

        let mut hits: Vec<(u64, MemoryRecord)> = inner
            .entries
            .iter()
            .filter(|(_, entry)| matches_exact(&entry.item, query))
            .map(|(id, entry)| {
                (
                    entry.seq,
                    MemoryRecord {
                        id: id.clone(),
                        item: entry.item.clone(),
                        created_at: entry.created_at,
                    },
                )
            })
            .collect();

        hits.sort_by(|a, b| b.0.cmp(&a.0));
        hits.truncate(limit);

        for (_, record) in &hits {
            inner.touch(&record.id);
        }
        inner.compact_if_needed();

        debug!("Memory search matched {} items", hits.len());
        hits.into_iter().map(|(_, record)| record).collect()
    }

    fn update(&self, id: &str, item: Value) -> bool {
        let mut inner = self.lock();
        inner.prune_expired(self.ttl);

        match inner.entries.get_mut(id) {
            Some(entry) => {
                entry.item = item;
                inner.touch(id);
                inner.compact_if_needed();
                true
            }
            None => {
                debug!("Cannot update missing memory item {}", id);
                false
            }
        }
    }

    fn delete(&self, id: &str) -> bool {
        let mut inner = self.lock();
        inner.prune_expired(self.ttl);
        // The heap entry stays behind and is skipped when popped
        inner.entries.remove(id).is_some()
    }

    fn clear(&self) {
        let mut inner = self.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.lru.clear();
        info!("Cleared {} items from short-term memory", count);
    }

    fn stats(&self) -> MemoryStats {
        let size = {
            let mut inner = self.lock();
            inner.prune_expired(self.ttl);
            inner.entries.len()
        };

        MemoryStats::ShortTerm {
            capacity: self.capacity,
            ttl_secs: self.ttl.as_secs(),
            size,
            utilization: self.utilization(size),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    fn query(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn store(capacity: usize) -> ShortTermMemory {
        ShortTermMemory::new(capacity, Duration::from_secs(3600))
    }

    #[test]
    fn test_add_and_get() {
        let memory = store(10);
        let id = memory.add(json!({"name": "A"})).unwrap();

        assert_eq!(memory.get(&id), Some(json!({"name": "A"})));
        assert!(memory.get("missing").is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let memory = store(2);
        let a = memory.add(json!({"name": "A"})).unwrap();
        let b = memory.add(json!({"name": "B"})).unwrap();
        let c = memory.add(json!({"name": "C"})).unwrap();

        assert!(memory.get(&a).is_none());
        assert!(memory.get(&b).is_some());
        assert!(memory.get(&c).is_some());
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_get_refreshes_recency() {
        let memory = store(2);
        let a = memory.add(json!({"name": "A"})).unwrap();
        let b = memory.add(json!({"name": "B"})).unwrap();

        // A becomes most recently used, so B is the eviction candidate
        assert!(memory.get(&a).is_some());
        let c = memory.add(json!({"name": "C"})).unwrap();

        assert!(memory.get(&a).is_some());
        assert!(memory.get(&b).is_none());
        assert!(memory.get(&c).is_some());
    }

    #[test]
    fn test_search_refreshes_recency() {
        let memory = store(2);
        let a = memory.add(json!({"name": "A", "tag": "keep"})).unwrap();
        let b = memory.add(json!({"name": "B"})).unwrap();

        assert_eq!(memory.search(&query(json!({"tag": "keep"})), 10).len(), 1);
        memory.add(json!({"name": "C"}));

        assert!(memory.get(&a).is_some());
        assert!(memory.get(&b).is_none());
    }

    #[test]
    fn test_ttl_expiry() {
        let memory = ShortTermMemory::new(10, Duration::from_millis(30));
        let id = memory.add(json!({"name": "A"})).unwrap();
        assert!(memory.get(&id).is_some());

        sleep(Duration::from_millis(80));

        assert!(memory.get(&id).is_none());
        assert_eq!(memory.len(), 0);
    }

    #[test]
    fn test_search_newest_first_with_limit() {
        let memory = store(10);
        for i in 0..5 {
            memory.add(json!({"kind": "step", "n": i}));
        }
        memory.add(json!({"kind": "other"}));

        let hits = memory.search(&query(json!({"kind": "step"})), 3);
        let ns: Vec<i64> = hits.iter().map(|h| h.item["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![4, 3, 2]);
    }

    #[test]
    fn test_update() {
        let memory = store(10);
        let id = memory.add(json!({"v": 1})).unwrap();

        assert!(memory.update(&id, json!({"v": 2})));
        assert_eq!(memory.get(&id), Some(json!({"v": 2})));
        assert!(!memory.update("missing", json!({})));
    }

    #[test]
    fn test_delete_leaves_tombstone_that_is_skipped() {
        let memory = store(2);
        let a = memory.add(json!({"name": "A"})).unwrap();
        let b = memory.add(json!({"name": "B"})).unwrap();

        assert!(memory.delete(&a));
        assert!(!memory.delete(&a));

        // Heap still holds A's entry; adding two more must evict B, not fail on A
        let c = memory.add(json!({"name": "C"})).unwrap();
        let d = memory.add(json!({"name": "D"})).unwrap();

        assert!(memory.get(&b).is_none());
        assert!(memory.get(&c).is_some());
        assert!(memory.get(&d).is_some());
    }

    #[test]
    fn test_clear_and_stats() {
        let memory = store(4);
        memory.add(json!({"a": 1}));
        memory.add(json!({"b": 2}));

        match memory.stats() {
            MemoryStats::ShortTerm {
                capacity,
                ttl_secs,
                size,
                utilization,
            } => {
                assert_eq!(capacity, 4);
                assert_eq!(ttl_secs, 3600);
                assert_eq!(size, 2);
                assert!((utilization - 0.5).abs() < f64::EPSILON);
            }
            other => panic!("unexpected stats: {:?}", other),
        }

        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_heap_compaction_keeps_order() {
        let memory = store(3);
        let a = memory.add(json!({"name": "A"})).unwrap();
        let b = memory.add(json!({"name": "B"})).unwrap();
        let c = memory.add(json!({"name": "C"})).unwrap();

        // Generate far more stale heap entries than the compaction threshold
        for _ in 0..200 {
            memory.get(&b);
            memory.get(&c);
        }
        {
            let inner = memory.lock();
            assert!(inner.lru.len() <= inner.entries.len() * 2 + HEAP_SLACK);
        }

        memory.add(json!({"name": "D"}));
        assert!(memory.get(&a).is_none());
        assert!(memory.get(&b).is_some());
        assert!(memory.get(&c).is_some());
    }

    #[test]
    fn test_zero_capacity_holds_nothing() {
        let memory = store(0);
        let id = memory.add(json!({"a": 1})).unwrap();
        assert!(memory.get(&id).is_none());
        assert!(matches!(
            memory.stats(),
            MemoryStats::ShortTerm { utilization, .. } if utilization == 0.0
        ));
    }
}
