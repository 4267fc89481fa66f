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

//! `corral` is a sharded, in-process key/value cache: per-entry TTL,
//! optional LRU eviction on overflow, and a callback fired exactly once
//! when an entry leaves the cache for any reason.
//!
//! ```
//! use std::time::Duration;
//! use corral::Cache;
//!
//! let cache: Cache<String, u64> = Cache::builder().bucket_num(16).build();
//! cache.set("views".to_string(), 1, Duration::from_secs(60));
//! assert_eq!(cache.get(&"views".to_string()), Some(1));
//! cache.stop();
//! ```
//!
//! # Sharding
//!
//! A cache is split into a power-of-two number of independently-locked
//! shards (`CacheBuilder::bucket_num`); a key's shard is picked by hashing
//! it, so operations on different keys that land in different shards never
//! contend with each other.
//!
//! # Callback reentrancy
//!
//! A [`Callback`] runs synchronously, inside the lock of the shard that is
//! releasing the entry. It must never call back into the same `Cache`
//! (directly or transitively) — doing so deadlocks, since the shard's mutex
//! is not reentrant. Dispatch the work to another thread if the callback
//! needs to touch the cache itself.
//!
//! # Backends
//!
//! The per-shard hash index is pluggable (`CacheBuilder::swiss_table`):
//! the default keys by the entry's actual key ([`StdIndex`]), while the
//! alternative keys by the precomputed 64-bit hash alone ([`SwissIndex`]),
//! trading an exact-match guarantee for a smaller, branch-light table. Both
//! are exposed for embedding; most callers only need [`Cache`] and
//! [`CacheBuilder`].

pub use cache_core::{Cache, CacheBuilder, CacheConfig, Callback, EntryView, Index, Indexer, Reason, Shard, StdIndex, SwissIndex};

/// The hash builder `Cache` uses when none is specified.
pub type DefaultHashBuilder = ahash::RandomState;
