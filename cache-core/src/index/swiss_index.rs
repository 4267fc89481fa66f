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

//! A hash-keyed index: open addressing over the precomputed 64-bit hash
//! itself rather than the key. It never stores or compares a `K`, which is
//! the point — two distinct keys that hash identically land in the same
//! slot and are indistinguishable to this table. The shard is responsible
//! for comparing the resident entry's key against the requested key to tell
//! them apart (see [`Indexer::keyed_by_hash`](super::Indexer::keyed_by_hash)).

use std::marker::PhantomData;

use cache_common::Key;

use super::Indexer;

const DEFAULT_CAPACITY: usize = 16;
const MAX_LOAD_NUM: usize = 7;
const MAX_LOAD_DEN: usize = 10;

#[derive(Clone, Copy)]
enum Slot {
    Empty,
    Tombstone,
    Occupied(u64, usize),
}

pub struct SwissIndex<K> {
    slots: Vec<Slot>,
    mask: u64,
    len: usize,
    tombstones: usize,
    _marker: PhantomData<K>,
}

impl<K> SwissIndex<K> {
    fn probe(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    fn find_slot_for_insert(&self, hash: u64) -> (usize, bool) {
        let mut idx = self.probe(hash);
        let mut first_tombstone = None;
        loop {
            match self.slots[idx] {
                Slot::Empty => return (first_tombstone.unwrap_or(idx), false),
                Slot::Tombstone => {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(idx);
                    }
                }
                Slot::Occupied(h, _) if h == hash => return (idx, true),
                Slot::Occupied(_, _) => {}
            }
            idx = (idx + 1) & self.mask as usize;
        }
    }

    fn find_slot(&self, hash: u64) -> Option<usize> {
        let mut idx = self.probe(hash);
        let start = idx;
        loop {
            match self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied(h, _) if h == hash => return Some(idx),
                _ => {}
            }
            idx = (idx + 1) & self.mask as usize;
            if idx == start {
                return None;
            }
        }
    }

    fn grow(&mut self) {
        let new_capacity = (self.slots.len() * 2).max(DEFAULT_CAPACITY);
        let old = std::mem::replace(&mut self.slots, vec![Slot::Empty; new_capacity]);
        self.mask = (new_capacity - 1) as u64;
        self.tombstones = 0;
        for slot in old {
            if let Slot::Occupied(hash, handle) = slot {
                let (idx, _) = self.find_slot_for_insert(hash);
                self.slots[idx] = Slot::Occupied(hash, handle);
            }
        }
    }

    fn needs_grow(&self) -> bool {
        (self.len + self.tombstones + 1) * MAX_LOAD_DEN > self.slots.len() * MAX_LOAD_NUM
    }
}

impl<K: Key> Indexer<K> for SwissIndex<K> {
    fn keyed_by_hash(&self) -> bool {
        true
    }

    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two().max(DEFAULT_CAPACITY);
        Self {
            slots: vec![Slot::Empty; capacity],
            mask: (capacity - 1) as u64,
            len: 0,
            tombstones: 0,
            _marker: PhantomData,
        }
    }

    fn get(&self, hash: u64, _key: &K) -> Option<usize> {
        self.find_slot(hash).map(|idx| match self.slots[idx] {
            Slot::Occupied(_, handle) => handle,
            _ => unreachable!(),
        })
    }

    fn insert(&mut self, hash: u64, _key: &K, handle: usize) -> Option<usize> {
        if self.needs_grow() {
            self.grow();
        }
        let (idx, occupied) = self.find_slot_for_insert(hash);
        let previous = match self.slots[idx] {
            Slot::Occupied(_, prev) => Some(prev),
            Slot::Tombstone => {
                self.tombstones -= 1;
                None
            }
            Slot::Empty => None,
        };
        self.slots[idx] = Slot::Occupied(hash, handle);
        if !occupied && previous.is_none() {
            self.len += 1;
        }
        previous
    }

    fn remove(&mut self, hash: u64, _key: &K) -> Option<usize> {
        let idx = self.find_slot(hash)?;
        let handle = match self.slots[idx] {
            Slot::Occupied(_, handle) => handle,
            _ => unreachable!(),
        };
        self.slots[idx] = Slot::Tombstone;
        self.len -= 1;
        self.tombstones += 1;
        Some(handle)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = Slot::Empty);
        self.len = 0;
        self.tombstones = 0;
    }

    fn for_each(&self, mut f: impl FnMut(usize)) {
        for slot in &self.slots {
            if let Slot::Occupied(_, handle) = slot {
                f(*handle);
            }
        }
    }
}
