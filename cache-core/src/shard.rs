//  Copyright 2024 Foyer Project Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! One lock domain: a slab of entries, a hash index over them, a min-heap
//! ordering them by expiration, and (optionally) a recency list for LRU
//! eviction. Every operation here assumes its caller already holds the
//! shard's mutex.

use cache_common::{Key, Reason, Value};
use cache_intrusive::{Heap, RecencyList, Slab};

use crate::entry::{Callback, Entry};
use crate::index::Indexer;

/// Outcome of a read-path lookup (spec: `Fetch`).
pub enum Fetched {
    /// No entry at all, or the resident entry had already expired (and was
    /// purged with [`Reason::Expired`] as a side effect of this call).
    Absent,
    /// The index hit a slot, but (hash-keyed backend only) the resident
    /// entry's key doesn't match the one requested — a collision. Carries
    /// the colliding handle so a write can evict it; a read treats this the
    /// same as [`Fetched::Absent`] without disturbing the resident entry.
    Collision(usize),
    Hit(usize),
}

pub struct Shard<K, V, I> {
    indexer: I,
    heap: Heap,
    list: RecencyList,
    slab: Slab<Entry<K, V>>,
    capacity: usize,
    lru_enabled: bool,
    _marker: std::marker::PhantomData<K>,
    _marker_v: std::marker::PhantomData<V>,
}

impl<K, V, I> Shard<K, V, I>
where
    K: Key,
    V: Value,
    I: Indexer<K>,
{
    pub fn new(indexer: I, capacity: usize, lru_enabled: bool) -> Self {
        Self {
            indexer,
            heap: Heap::with_capacity(capacity),
            list: RecencyList::new(!lru_enabled),
            slab: Slab::with_capacity(capacity),
            capacity,
            lru_enabled,
            _marker: std::marker::PhantomData,
            _marker_v: std::marker::PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }

    /// Look up `key`, purging it first if it has expired. This is the only
    /// way a resident entry is ever discovered stale outside the reaper.
    pub fn fetch(&mut self, now: i64, hash: u64, key: &K) -> Fetched {
        let Some(handle) = self.indexer.get(hash, key) else {
            return Fetched::Absent;
        };

        if self.indexer.keyed_by_hash() && self.slab.get(handle).key() != key {
            return Fetched::Collision(handle);
        }

        if self.slab.get(handle).expired(now) {
            self.purge(handle, Reason::Expired);
            return Fetched::Absent;
        }

        Fetched::Hit(handle)
    }

    pub fn get(&self, handle: usize) -> &Entry<K, V> {
        self.slab.get(handle)
    }

    pub fn touch(&mut self, handle: usize) {
        self.list.move_to_back(&mut self.slab, handle);
    }

    pub fn update_value_and_ttl(
        &mut self,
        handle: usize,
        value: V,
        expire_at: i64,
        callback: Option<Callback<K, V>>,
    ) {
        self.slab.get_mut(handle).set_value(value);
        self.slab.get_mut(handle).set_callback(callback);
        self.heap.update_key(&mut self.slab, handle, expire_at);
        self.list.move_to_back(&mut self.slab, handle);
    }

    pub fn update_ttl(&mut self, handle: usize, expire_at: i64) {
        self.heap.update_key(&mut self.slab, handle, expire_at);
        self.list.move_to_back(&mut self.slab, handle);
    }

    /// Insert a brand-new entry, evicting to make room first if the shard is
    /// at capacity. Callers must have already confirmed `key` is absent (via
    /// [`Self::fetch`]); if a hash collision displaced a resident entry, the
    /// caller purges it before calling this.
    pub fn insert(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        expire_at: i64,
        callback: Option<Callback<K, V>>,
    ) -> usize {
        if self.slab.len() >= self.capacity {
            self.evict_one();
        }

        let entry = Entry::new(key, value, hash, expire_at, callback);
        let handle = self.slab.insert(entry);
        self.heap.push(&mut self.slab, handle);
        self.list.push_back(&mut self.slab, handle);
        let evicted = self.indexer.insert(hash, self.slab.get(handle).key(), handle);
        debug_assert!(evicted.is_none(), "insert must only be called for absent keys");
        handle
    }

    /// Evict one entry to make room: the least-recently-touched one under
    /// LRU, otherwise whichever expires soonest.
    fn evict_one(&mut self) {
        let victim = if self.list.is_empty() {
            self.heap.front()
        } else {
            self.list.front()
        };
        if let Some(handle) = victim {
            self.purge(handle, Reason::Evicted);
        }
    }

    /// Unlink `handle` from every index, remove it from the slab, and fire
    /// its callback with `reason`.
    pub fn purge(&mut self, handle: usize, reason: Reason) {
        self.heap.delete_at(&mut self.slab, self.slab.get(handle).heap_index());
        self.list.unlink(&mut self.slab, handle);
        let (hash, key) = {
            let entry = self.slab.get(handle);
            (entry.hash(), entry.key().clone())
        };
        self.indexer.remove(hash, &key);
        let entry = self.slab.remove(handle);
        entry.notify(reason);
    }

    pub fn delete(&mut self, hash: u64, key: &K) -> bool {
        match self.indexer.get(hash, key) {
            Some(handle) if !self.indexer.keyed_by_hash() || self.slab.get(handle).key() == key => {
                self.purge(handle, Reason::Deleted);
                true
            }
            _ => false,
        }
    }

    /// Reap up to `limit` expired entries. Returns the number actually
    /// reaped; stops early once the heap's root is no longer expired.
    pub fn reap_expired(&mut self, now: i64, limit: usize) -> usize {
        let mut reaped = 0;
        while reaped < limit {
            let Some(handle) = self.heap.front() else {
                break;
            };
            if !self.slab.get(handle).expired(now) {
                break;
            }
            self.purge(handle, Reason::Expired);
            reaped += 1;
        }
        reaped
    }

    /// Visit every unexpired entry, stopping early if `f` returns `false`.
    pub fn for_each(&self, now: i64, mut f: impl FnMut(&K, &V) -> bool) -> bool {
        for (_, entry) in self.slab.iter() {
            if entry.expired(now) {
                continue;
            }
            if !f(entry.key(), entry.value()) {
                return false;
            }
        }
        true
    }

    /// Drop every entry and rebuild empty indices. Unlike [`Self::purge`],
    /// this never invokes callbacks (spec: `Clear` is a bulk reset, not a
    /// per-entry removal).
    pub fn clear(&mut self) {
        self.slab.drain();
        self.indexer.clear();
        self.heap = Heap::with_capacity(self.capacity);
        self.list = RecencyList::new(!self.lru_enabled);
    }

    /// Verify the shard-level invariants (spec §8): the hash index, heap and
    /// (when LRU is on) recency list all track the same population as the
    /// slab; every resident entry's key resolves back through the index to
    /// its own handle; the heap's `heap_index` bookkeeping and min-heap
    /// property both hold; and the shard is within capacity. `now` should be
    /// a timestamp no earlier than the last mutation, so that no entry
    /// reachable through the index is stale. Panics on the first violation.
    ///
    /// Plain `pub` rather than `cfg(test)`-gated: callers driving a `Shard`
    /// from outside this crate (integration tests) only see published API.
    pub fn assert_invariants(&self, now: i64) {
        let count = self.slab.len();
        assert!(count <= self.capacity, "shard holds {count} entries over capacity {}", self.capacity);
        assert_eq!(self.indexer.len(), count, "hash index count diverged from slab count");
        assert_eq!(self.heap.len(), count, "heap count diverged from slab count");
        if self.lru_enabled {
            assert_eq!(self.list.len(), count, "recency list count diverged from slab count");
        }

        for (handle, entry) in self.slab.iter() {
            assert!(!entry.expired(now), "expired entry (handle {handle}) still resident in shard");
            assert_eq!(
                self.indexer.get(entry.hash(), entry.key()),
                Some(handle),
                "hash index does not map a resident key back to its own handle"
            );
        }

        self.heap.assert_consistent(&self.slab);
    }
}
