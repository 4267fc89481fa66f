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

//! The top-level facade: picks a shard by hash, takes its lock, and
//! delegates. This is the only module that knows about both the index
//! choice and the background threads.

use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cache_common::{resolve_expire_at, CachedClock, DirectTime, Key, Reason, TimeSource, Value};
use parking_lot::Mutex;

use crate::config::{CacheBuilder, CacheConfig};
use crate::entry::Callback;
use crate::index::{Index, Indexer};
use crate::reaper::{self, StopSignal};
use crate::shard::{Fetched, Shard};

/// A concurrent, sharded cache with per-entry TTL, optional LRU eviction on
/// overflow, and a callback fired exactly once when an entry leaves the
/// cache for any reason.
///
/// Every operation takes only the lock of the shard `key` hashes to, so
/// callers on different shards never contend. Callbacks run synchronously
/// inside that lock — see [`Callback`] for the reentrancy contract this
/// imposes.
pub struct Cache<K, V, S = ahash::RandomState> {
    shards: Arc<Vec<Mutex<Shard<K, V, Index<K>>>>>,
    hash_builder: S,
    config: Arc<CacheConfig>,
    time: Arc<dyn TimeSource>,
    stop: Arc<StopSignal>,
    threads: Mutex<Option<Vec<JoinHandle<()>>>>,
}

impl CacheBuilder {
    /// Build a [`Cache`] keyed by `K` and valued by `V`, using `S` to hash
    /// keys (and, for [`SwissIndex`](crate::index::SwissIndex), to key the
    /// index itself).
    pub fn build<K, V, S>(self) -> Cache<K, V, S>
    where
        K: Key,
        V: Value,
        S: cache_common::HashBuilder + Default,
    {
        let config = Arc::new(self.into_config());
        tracing::debug!(
            bucket_num = config.bucket_num,
            bucket_cap = config.bucket_cap,
            lru = config.lru,
            swiss_table = config.swiss_table,
            "constructing cache shards"
        );
        let shards = Arc::new(
            (0..config.bucket_num)
                .map(|_| {
                    let indexer = Index::new(config.bucket_size, config.swiss_table);
                    Mutex::new(Shard::new(indexer, config.bucket_cap, config.lru))
                })
                .collect(),
        );

        let stop = StopSignal::new();
        let mut threads = vec![reaper::spawn_reaper(shards.clone(), config.clone(), stop.clone())];

        let time: Arc<dyn TimeSource> = if config.cached_time {
            let clock = Arc::new(CachedClock::new());
            threads.push(reaper::spawn_clock_refresh(clock.clone(), stop.clone()));
            clock
        } else {
            Arc::new(DirectTime)
        };

        Cache {
            shards,
            hash_builder: S::default(),
            config,
            time,
            stop,
            threads: Mutex::new(Some(threads)),
        }
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Key,
    V: Value,
    S: cache_common::HashBuilder + Default,
{
    /// Start building a cache keyed by `K`, valued by `V`, hashed by `S`.
    /// Equivalent to `CacheBuilder::new()`, spelled so call sites that
    /// already know their key/value/hasher types don't need to name
    /// `CacheBuilder` separately.
    pub fn builder() -> CacheBuilder {
        CacheBuilder::new()
    }
}

impl<K: Key, V: Value, S: cache_common::HashBuilder> Cache<K, V, S> {
    fn hash(&self, key: &K) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        key.hash(&mut hasher);
        hasher.finish()
    }

    fn shard_index(&self, hash: u64) -> usize {
        hash as usize & (self.shards.len() - 1)
    }

    fn now(&self) -> i64 {
        self.time.now_ms()
    }

    /// Insert or overwrite `key`, returning whether an existing entry was
    /// replaced. A zero `ttl` means "never expire".
    pub fn set(&self, key: K, value: V, ttl: Duration) -> bool {
        self.set_with_callback(key, value, ttl, None)
    }

    /// Like [`Self::set`], additionally registering `callback` to run when
    /// this entry is eventually expired, evicted, or deleted.
    pub fn set_with_callback(&self, key: K, value: V, ttl: Duration, callback: Option<Callback<K, V>>) -> bool {
        let hash = self.hash(&key);
        let idx = self.shard_index(hash);
        let expire_at = resolve_expire_at(self.now(), ttl.as_millis() as i64);
        let mut shard = self.shards[idx].lock();

        match shard.fetch(self.now(), hash, &key) {
            Fetched::Hit(handle) => {
                shard.update_value_and_ttl(handle, value, expire_at, callback);
                true
            }
            Fetched::Collision(handle) => {
                // A different key already occupies this hash slot: evict it
                // to make room, then insert as if the slot had been empty.
                shard.purge(handle, Reason::Evicted);
                shard.insert(hash, key, value, expire_at, callback);
                false
            }
            Fetched::Absent => {
                shard.insert(hash, key, value, expire_at, callback);
                false
            }
        }
    }

    /// Look up `key`. Does not refresh its TTL.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash(key);
        let idx = self.shard_index(hash);
        let now = self.now();
        let mut shard = self.shards[idx].lock();
        match shard.fetch(now, hash, key) {
            Fetched::Hit(handle) => {
                shard.touch(handle);
                Some(shard.get(handle).value().clone())
            }
            _ => None,
        }
    }

    /// Look up `key` and, if present, refresh its TTL to `ttl` from now.
    pub fn get_with_ttl(&self, key: &K, ttl: Duration) -> Option<V>
    where
        V: Clone,
    {
        let hash = self.hash(key);
        let idx = self.shard_index(hash);
        let now = self.now();
        let expire_at = resolve_expire_at(now, ttl.as_millis() as i64);
        let mut shard = self.shards[idx].lock();
        match shard.fetch(now, hash, key) {
            Fetched::Hit(handle) => {
                shard.update_ttl(handle, expire_at);
                Some(shard.get(handle).value().clone())
            }
            _ => None,
        }
    }

    /// Look up `key`, refreshing its TTL if present; otherwise insert
    /// `value` with TTL `ttl`. Returns the resident value and whether this
    /// call created it.
    ///
    /// If a resident entry is found to have already expired but not yet
    /// reaped, it is purged (as [`Reason::Expired`]) and treated as absent,
    /// so this call always succeeds in returning a value.
    pub fn get_or_create(&self, key: K, value: V, ttl: Duration) -> (V, bool)
    where
        V: Clone,
    {
        self.get_or_create_with_callback(key, value, ttl, None)
    }

    /// Like [`Self::get_or_create`], registering `callback` on the entry if
    /// this call creates it. An existing entry keeps whatever callback it
    /// already had.
    pub fn get_or_create_with_callback(
        &self,
        key: K,
        value: V,
        ttl: Duration,
        callback: Option<Callback<K, V>>,
    ) -> (V, bool)
    where
        V: Clone,
    {
        let hash = self.hash(&key);
        let idx = self.shard_index(hash);
        let now = self.now();
        let expire_at = resolve_expire_at(now, ttl.as_millis() as i64);
        let mut shard = self.shards[idx].lock();

        match shard.fetch(now, hash, &key) {
            Fetched::Hit(handle) => {
                shard.update_ttl(handle, expire_at);
                (shard.get(handle).value().clone(), false)
            }
            Fetched::Collision(handle) => {
                shard.purge(handle, Reason::Evicted);
                shard.insert(hash, key, value.clone(), expire_at, callback);
                (value, true)
            }
            Fetched::Absent => {
                shard.insert(hash, key, value.clone(), expire_at, callback);
                (value, true)
            }
        }
    }

    /// Remove `key` if present, firing its callback with [`Reason::Deleted`].
    /// Returns whether anything was removed.
    pub fn delete(&self, key: &K) -> bool {
        let hash = self.hash(key);
        let idx = self.shard_index(hash);
        self.shards[idx].lock().delete(hash, key)
    }

    /// Visit every unexpired entry across all shards, stopping early if `f`
    /// returns `false`. Shards are visited one at a time, each under its own
    /// lock, so this never blocks the whole cache at once but also never
    /// sees a single consistent snapshot.
    pub fn range(&self, mut f: impl FnMut(&K, &V) -> bool) {
        let now = self.now();
        for shard in self.shards.iter() {
            if !shard.lock().for_each(now, &mut f) {
                return;
            }
        }
    }

    /// Total number of resident (not necessarily unexpired) entries across
    /// all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry in every shard and rebuild empty indices, without
    /// invoking any callback.
    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().clear();
        }
    }

    /// Verify every shard's internal invariants (spec §8) hold right now:
    /// locks each shard in turn and checks it in isolation, so this only
    /// means something when the caller knows no other thread is mutating the
    /// cache concurrently. Intended for tests; panics on the first
    /// violation found in any shard.
    pub fn assert_invariants(&self) {
        let now = self.now();
        for shard in self.shards.iter() {
            shard.lock().assert_invariants(now);
        }
    }

    /// Stop the background reaper (and clock-refresh, if enabled) threads.
    /// Idempotent: calling this more than once, or after `Drop`, is a no-op.
    pub fn stop(&self) {
        let threads = self.threads.lock().take();
        if let Some(threads) = threads {
            tracing::debug!("stopping cache background threads");
            self.stop.signal();
            for thread in threads {
                let _ = thread.join();
            }
        }
    }
}

impl<K, V, S> Cache<K, V, S>
where
    K: Key + AsRef<str>,
    V: Value,
    S: cache_common::HashBuilder,
{
    /// Every unexpired key starting with `prefix`. Not part of the original
    /// distillation's core contract; kept for parity with the original
    /// implementation's `Keys(prefix)`.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<K> {
        let mut out = Vec::new();
        self.range(|k, _| {
            if k.as_ref().starts_with(prefix) {
                out.push(k.clone());
            }
            true
        });
        out
    }
}

impl<K, V, S> Drop for Cache<K, V, S> {
    fn drop(&mut self) {
        if let Some(threads) = self.threads.lock().take() {
            tracing::debug!("stopping cache background threads on drop");
            self.stop.signal();
            for thread in threads {
                let _ = thread.join();
            }
        }
    }
}
