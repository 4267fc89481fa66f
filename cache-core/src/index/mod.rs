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

//! The per-shard hash index: maps a key to the slab handle of its [`Entry`]
//! (../entry/struct.Entry.html). Two backends are provided; a shard is
//! generic over which one it uses.

mod std_index;
mod swiss_index;

pub use std_index::StdIndex;
pub use swiss_index::SwissIndex;

use cache_common::Key;

/// A per-shard key -> slab-handle index.
///
/// Implementations come in two flavors, distinguished by [`Indexer::keyed_by_hash`]:
///
/// - Key-keyed ([`StdIndex`]): the index itself compares keys, so a `Some`
///   from `get`/`remove` is always an exact match.
/// - Hash-keyed ([`SwissIndex`]): the index only ever compares the
///   precomputed 64-bit hash. A `Some` means "a slot exists for this hash",
///   not "this key is present" — the caller must additionally compare the
///   resident entry's key to rule out a collision between two distinct keys
///   that hash identically.
pub trait Indexer<K: Key>: Send + Sync + 'static {
    /// `true` if a hit from this index still needs a caller-side key
    /// comparison against the resident entry to confirm identity.
    fn keyed_by_hash(&self) -> bool;

    fn with_capacity(capacity: usize) -> Self;

    fn get(&self, hash: u64, key: &K) -> Option<usize>;

    /// Insert `handle` under `hash`/`key`, returning whatever handle
    /// previously occupied that slot, if any.
    fn insert(&mut self, hash: u64, key: &K, handle: usize) -> Option<usize>;

    fn remove(&mut self, hash: u64, key: &K) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Visit every resident handle. Order is unspecified.
    fn for_each(&self, f: impl FnMut(usize));
}

/// Picks between [`StdIndex`] and [`SwissIndex`] at construction time.
///
/// `CacheBuilder::swiss_table` is a runtime flag (spec §4.4/§4.5's
/// `SwissTable` option), but the two backends are different concrete types;
/// an enum is the straightforward way to let one value pick between them
/// without forcing callers to pick a generic parameter at compile time.
pub enum Index<K> {
    Std(StdIndex<K>),
    Swiss(SwissIndex<K>),
}

impl<K: Key> Indexer<K> for Index<K> {
    fn keyed_by_hash(&self) -> bool {
        match self {
            Index::Std(i) => i.keyed_by_hash(),
            Index::Swiss(i) => i.keyed_by_hash(),
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        // Only reached if a caller constructs an `Index<K>` directly rather
        // than through `Index::new`; default to the key-keyed backend.
        Index::Std(StdIndex::with_capacity(capacity))
    }

    fn get(&self, hash: u64, key: &K) -> Option<usize> {
        match self {
            Index::Std(i) => i.get(hash, key),
            Index::Swiss(i) => i.get(hash, key),
        }
    }

    fn insert(&mut self, hash: u64, key: &K, handle: usize) -> Option<usize> {
        match self {
            Index::Std(i) => i.insert(hash, key, handle),
            Index::Swiss(i) => i.insert(hash, key, handle),
        }
    }

    fn remove(&mut self, hash: u64, key: &K) -> Option<usize> {
        match self {
            Index::Std(i) => i.remove(hash, key),
            Index::Swiss(i) => i.remove(hash, key),
        }
    }

    fn len(&self) -> usize {
        match self {
            Index::Std(i) => i.len(),
            Index::Swiss(i) => i.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            Index::Std(i) => i.clear(),
            Index::Swiss(i) => i.clear(),
        }
    }

    fn for_each(&self, f: impl FnMut(usize)) {
        match self {
            Index::Std(i) => i.for_each(f),
            Index::Swiss(i) => i.for_each(f),
        }
    }
}

impl<K: Key> Index<K> {
    pub fn new(capacity: usize, swiss_table: bool) -> Self {
        if swiss_table {
            Index::Swiss(SwissIndex::with_capacity(capacity))
        } else {
            Index::Std(StdIndex::with_capacity(capacity))
        }
    }
}
