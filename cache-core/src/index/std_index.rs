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

//! A key-keyed index: a plain [`hashbrown::HashMap`], which is what the
//! teacher's own `HashTableIndexer` variant reduces to once refcounted
//! handles are stripped out. Exact key equality is guaranteed by the map
//! itself, so a hit here is never a collision.

use cache_common::Key;
use hashbrown::HashMap;

use super::Indexer;

pub struct StdIndex<K, S = ahash::RandomState> {
    map: HashMap<K, usize, S>,
}

impl<K: Key> Indexer<K> for StdIndex<K, ahash::RandomState> {
    fn keyed_by_hash(&self) -> bool {
        false
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, ahash::RandomState::default()),
        }
    }

    fn get(&self, _hash: u64, key: &K) -> Option<usize> {
        self.map.get(key).copied()
    }

    fn insert(&mut self, _hash: u64, key: &K, handle: usize) -> Option<usize> {
        self.map.insert(key.clone(), handle)
    }

    fn remove(&mut self, _hash: u64, key: &K) -> Option<usize> {
        self.map.remove(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn for_each(&self, mut f: impl FnMut(usize)) {
        for handle in self.map.values() {
            f(*handle);
        }
    }
}
