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

//! The unit a shard's slab owns: a key/value pair, its absolute expiration,
//! the hash it was filed under, and the bookkeeping each intrusive container
//! needs to keep it linked in place.

use std::sync::Arc;

use cache_intrusive::{HeapHandle, ListHandle};

use crate::Reason;

/// Invoked exactly once, synchronously, inside the shard lock that is
/// releasing the entry. Must not call back into the cache it was registered
/// on: the shard mutex is held for the duration of the call, so a reentrant
/// call deadlocks.
pub type Callback<K, V> = Arc<dyn Fn(&EntryView<'_, K, V>, Reason) + Send + Sync>;

/// A read-only look at an entry at the moment it is being released, handed
/// to its [`Callback`].
pub struct EntryView<'a, K, V> {
    key: &'a K,
    value: &'a V,
    expire_at: i64,
}

impl<'a, K, V> EntryView<'a, K, V> {
    pub fn key(&self) -> &'a K {
        self.key
    }

    pub fn value(&self) -> &'a V {
        self.value
    }

    /// Absolute expiration in milliseconds, or [`cache_common::NEVER`] if the
    /// entry was created without a TTL.
    pub fn expire_at(&self) -> i64 {
        self.expire_at
    }
}

pub struct Entry<K, V> {
    key: K,
    value: V,
    expire_at: i64,
    hash: u64,
    callback: Option<Callback<K, V>>,
    heap_index: usize,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> Entry<K, V> {
    pub fn new(key: K, value: V, hash: u64, expire_at: i64, callback: Option<Callback<K, V>>) -> Self {
        Self {
            key,
            value,
            expire_at,
            hash,
            callback,
            heap_index: 0,
            prev: None,
            next: None,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn expired(&self, now: i64) -> bool {
        now > self.expire_at
    }

    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    pub fn set_callback(&mut self, callback: Option<Callback<K, V>>) {
        self.callback = callback;
    }

    /// Run and drop this entry's callback, if it has one. The entry has
    /// already been unlinked from every index by the time this is called.
    pub fn notify(&self, reason: Reason) {
        if let Some(callback) = &self.callback {
            let view = EntryView {
                key: &self.key,
                value: &self.value,
                expire_at: self.expire_at,
            };
            callback(&view, reason);
        }
    }
}

impl<K, V> HeapHandle for Entry<K, V> {
    fn expire_at(&self) -> i64 {
        self.expire_at
    }

    fn set_expire_at(&mut self, expire_at: i64) {
        self.expire_at = expire_at;
    }

    fn heap_index(&self) -> usize {
        self.heap_index
    }

    fn set_heap_index(&mut self, index: usize) {
        self.heap_index = index;
    }
}

impl<K, V> ListHandle for Entry<K, V> {
    fn prev(&self) -> Option<usize> {
        self.prev
    }

    fn set_prev(&mut self, prev: Option<usize>) {
        self.prev = prev;
    }

    fn next(&self) -> Option<usize> {
        self.next
    }

    fn set_next(&mut self, next: Option<usize>) {
        self.next = next;
    }
}
