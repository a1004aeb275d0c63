use std::collections::HashMap;
use std::hash::Hash;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sentinel index for the ends of the recency list.
const NIL: usize = usize::MAX;

/// Hooks invoked synchronously while the container mutates.
///
/// Listeners receive no handle to the container, so they cannot mutate it
/// reentrantly. An eviction hook fires exactly once per removed entry.
pub trait CacheListener<K, V> {
    fn on_added(&mut self, _key: &K, _value: &V) {}
    fn on_evicted(&mut self, _key: &K, _value: &V) {}
}

/// Eviction bound for an [`LruContainer`], chosen at construction.
///
/// The bound is re-evaluated after every insertion; while it reports true
/// the least-recently-used entry is evicted, until it reports false or the
/// container is empty.
#[derive(Debug, Clone)]
pub enum BoundStrategy {
    /// Never evicts.
    Unbounded,
    /// Evict while the live-entry count exceeds the given maximum.
    /// A maximum of 0 means unbounded.
    MaxEntries(usize),
    /// Evict while an externally accumulated byte total meets or exceeds
    /// the ceiling. The total is typically maintained by a listener on the
    /// wrapping cache. A ceiling of 0 means unbounded.
    MaxTotalBytes {
        ceiling: u64,
        total: Arc<AtomicU64>,
    },
}

impl BoundStrategy {
    fn exceeded(&self, len: usize) -> bool {
        match self {
            BoundStrategy::Unbounded => false,
            BoundStrategy::MaxEntries(max) => *max > 0 && len > *max,
            BoundStrategy::MaxTotalBytes { ceiling, total } => {
                *ceiling > 0 && total.load(Ordering::Relaxed) >= *ceiling
            }
        }
    }
}

/// A slot in the slab: the entry plus its links in the recency list.
struct Slot<K, V> {
    key: K,
    value: V,
    prev: usize,
    next: usize,
}

/// A recency-ordered cache with pluggable eviction bounds and listeners.
///
/// The container performs no synchronization; callers must serialize
/// access. This is a deliberate contract so wrapping types can choose their
/// own lock granularity.
pub struct LruContainer<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Option<Slot<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    bound: BoundStrategy,
    listener: Option<Box<dyn CacheListener<K, V> + Send>>,
}

impl<K: Hash + Eq + Clone, V> LruContainer<K, V> {
    pub fn new(bound: BoundStrategy) -> Self {
        Self {
            map: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            bound,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Box<dyn CacheListener<K, V> + Send>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Looks up a key, promoting the entry to most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Inserts a value.
    ///
    /// If the key already exists its old value is evicted (listener
    /// notified), the new value installed in the same slot (listener
    /// notified of the add), and the slot promoted. Otherwise a new entry
    /// is inserted at the front. Either way the bound is then enforced.
    pub fn add(&mut self, key: K, value: V) {
        if let Some(&idx) = self.map.get(&key) {
            self.promote(idx);
            let old = {
                let slot = self.slots[idx].as_mut().expect("mapped slot is live");
                mem::replace(&mut slot.value, value)
            };
            if let Some(listener) = self.listener.as_mut() {
                listener.on_evicted(&key, &old);
                let slot = self.slots[idx].as_ref().expect("mapped slot is live");
                listener.on_added(&key, &slot.value);
            }
        } else {
            let idx = self.alloc(key.clone(), value);
            self.map.insert(key, idx);
            self.attach_front(idx);
            if let Some(listener) = self.listener.as_mut() {
                let slot = self.slots[idx].as_ref().expect("new slot is live");
                listener.on_added(&slot.key, &slot.value);
            }
        }
        while self.bound.exceeded(self.map.len()) && !self.map.is_empty() {
            self.remove_oldest();
        }
    }

    /// Removes the entry for `key`, if any, firing the eviction listener.
    pub fn remove(&mut self, key: &K) {
        if let Some(idx) = self.map.get(key).copied() {
            self.remove_index(idx);
        }
    }

    /// Evicts the least-recently-used entry, if any.
    pub fn remove_oldest(&mut self) {
        if self.tail != NIL {
            self.remove_index(self.tail);
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Evicts every entry, oldest first, firing the listener for each.
    pub fn clear(&mut self) {
        while !self.map.is_empty() {
            self.remove_oldest();
        }
    }

    // ------------------------------------------------------------------
    // Recency list maintenance
    // ------------------------------------------------------------------

    fn alloc(&mut self, key: K, value: V) -> usize {
        let slot = Slot {
            key,
            value,
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head != idx {
            self.detach(idx);
            self.attach_front(idx);
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let slot = self.slots[idx].as_ref().expect("detached slot is live");
            (slot.prev, slot.next)
        };
        match prev {
            NIL => self.head = next,
            _ => self.slots[prev].as_mut().expect("prev slot is live").next = next,
        }
        match next {
            NIL => self.tail = prev,
            _ => self.slots[next].as_mut().expect("next slot is live").prev = prev,
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let slot = self.slots[idx].as_mut().expect("attached slot is live");
            slot.prev = NIL;
            slot.next = old_head;
        }
        match old_head {
            NIL => self.tail = idx,
            _ => self.slots[old_head].as_mut().expect("head slot is live").prev = idx,
        }
        self.head = idx;
    }

    fn remove_index(&mut self, idx: usize) {
        self.detach(idx);
        let slot = self.slots[idx].take().expect("removed slot is live");
        self.map.remove(&slot.key);
        self.free.push(idx);
        if let Some(listener) = self.listener.as_mut() {
            listener.on_evicted(&slot.key, &slot.value);
        }
    }
}
