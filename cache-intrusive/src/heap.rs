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

//! A 4-ary min-heap over slab handles, ordered by expiration time.
//!
//! 4-ary rather than binary: it halves the tree depth for the same
//! population at the cost of up to 4 comparisons per level on sift-down.
//! That trade favors this workload — `ExpireAt` comparisons are a single
//! `i64` compare, and the reaper's access pattern is almost entirely
//! repeated `pop`, which is dominated by sift-down cost.

use crate::slab::Slab;

/// Implemented by whatever a [`Heap`] is built over: gives the heap a way to
/// read/write the key it orders by and the bookkeeping index it must keep
/// exact after every swap.
pub trait HeapHandle {
    fn expire_at(&self) -> i64;
    fn set_expire_at(&mut self, expire_at: i64);
    fn heap_index(&self) -> usize;
    fn set_heap_index(&mut self, index: usize);
}

#[derive(Debug, Default)]
pub struct Heap {
    data: Vec<usize>,
}

impl Heap {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Peek the root handle. Callers must check `len() > 0` first.
    pub fn front(&self) -> Option<usize> {
        self.data.first().copied()
    }

    fn expire_at<T: HeapHandle>(&self, slab: &Slab<T>, pos: usize) -> i64 {
        slab.get(self.data[pos]).expire_at()
    }

    fn swap<T: HeapHandle>(&mut self, slab: &mut Slab<T>, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.data.swap(i, j);
        slab.get_mut(self.data[i]).set_heap_index(i);
        slab.get_mut(self.data[j]).set_heap_index(j);
    }

    /// Append `handle` at the end and sift it up into place.
    pub fn push<T: HeapHandle>(&mut self, slab: &mut Slab<T>, handle: usize) {
        let pos = self.data.len();
        self.data.push(handle);
        slab.get_mut(handle).set_heap_index(pos);
        self.sift_up(slab, pos);
    }

    /// Remove and return the root handle.
    pub fn pop<T: HeapHandle>(&mut self, slab: &mut Slab<T>) -> Option<usize> {
        if self.data.is_empty() {
            return None;
        }
        let last = self.data.len() - 1;
        self.swap(slab, 0, last);
        let handle = self.data.pop().unwrap();
        if !self.data.is_empty() {
            self.sift_down(slab, 0);
        }
        Some(handle)
    }

    /// Remove the element currently at heap position `pos` (not a handle —
    /// callers pass `entry.heap_index()`).
    pub fn delete_at<T: HeapHandle>(&mut self, slab: &mut Slab<T>, pos: usize) {
        let last = self.data.len() - 1;
        if pos == last {
            self.data.pop();
            return;
        }

        // The moved-in element could belong above or below its new spot;
        // decide by comparing against the key that used to occupy `pos`.
        let old_key = self.expire_at(slab, pos);
        self.swap(slab, pos, last);
        self.data.pop();

        let new_key = self.expire_at(slab, pos);
        if new_key < old_key {
            self.sift_up(slab, pos);
        } else {
            self.sift_down(slab, pos);
        }
    }

    /// Change `handle`'s expiration and restore the heap property.
    pub fn update_key<T: HeapHandle>(&mut self, slab: &mut Slab<T>, handle: usize, new_expire_at: i64) {
        let pos = slab.get(handle).heap_index();
        let old_expire_at = slab.get(handle).expire_at();
        slab.get_mut(handle).set_expire_at(new_expire_at);

        if new_expire_at < old_expire_at {
            self.sift_up(slab, pos);
        } else {
            self.sift_down(slab, pos);
        }
    }

    fn sift_up<T: HeapHandle>(&mut self, slab: &mut Slab<T>, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 4;
            if self.expire_at(slab, i) < self.expire_at(slab, parent) {
                self.swap(slab, i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down<T: HeapHandle>(&mut self, slab: &mut Slab<T>, mut i: usize) {
        let len = self.data.len();
        loop {
            let first_child = i * 4 + 1;
            if first_child >= len {
                break;
            }
            let last_child = (first_child + 3).min(len - 1);

            let mut smallest = first_child;
            for child in (first_child + 1)..=last_child {
                if self.expire_at(slab, child) < self.expire_at(slab, smallest) {
                    smallest = child;
                }
            }

            if self.expire_at(slab, smallest) < self.expire_at(slab, i) {
                self.swap(slab, i, smallest);
                i = smallest;
            } else {
                break;
            }
        }
    }

    /// Verify both the `heap_index` bookkeeping and the min-heap property
    /// hold for every live slot. Unlike [`Self::assert_heap_property`] below
    /// (this crate's own unit tests only), this is plain `pub` so a
    /// dependent crate's integration tests — which only see published API,
    /// not `cfg(test)` items — can check a heap they didn't build directly.
    pub fn assert_consistent<T: HeapHandle>(&self, slab: &Slab<T>) {
        let len = self.data.len();
        for pos in 0..len {
            let handle = self.data[pos];
            assert_eq!(
                slab.get(handle).heap_index(),
                pos,
                "heap_index bookkeeping diverged from actual position {pos}"
            );
            for child in (pos * 4 + 1)..(pos * 4 + 5).min(len) {
                assert!(
                    self.expire_at(slab, pos) <= self.expire_at(slab, child),
                    "heap property violated at {pos} -> {child}"
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_heap_property<T: HeapHandle>(&self, slab: &Slab<T>) {
        let len = self.data.len();
        for i in 0..len {
            for child in (i * 4 + 1)..(i * 4 + 5).min(len) {
                assert!(
                    self.expire_at(slab, i) <= self.expire_at(slab, child),
                    "heap property violated at {i} -> {child}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};

    #[derive(Debug)]
    struct Node {
        expire_at: i64,
        heap_index: usize,
    }

    impl HeapHandle for Node {
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

    fn push(slab: &mut Slab<Node>, heap: &mut Heap, expire_at: i64) -> usize {
        let handle = slab.insert(Node {
            expire_at,
            heap_index: 0,
        });
        heap.push(slab, handle);
        handle
    }

    #[test]
    fn pop_returns_ascending_order() {
        let mut slab = Slab::new();
        let mut heap = Heap::new();
        for v in [5, 1, 9, 3, 7, 2, 8, 4, 6, 0] {
            push(&mut slab, &mut heap, v);
        }
        heap.assert_heap_property(&slab);

        let mut popped = Vec::new();
        while let Some(handle) = heap.pop(&mut slab) {
            popped.push(slab.get(handle).expire_at());
        }
        assert_eq!(popped, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn delete_at_last_index_does_not_sift() {
        let mut slab = Slab::new();
        let mut heap = Heap::new();
        push(&mut slab, &mut heap, 1);
        let last = push(&mut slab, &mut heap, 2);
        assert_eq!(slab.get(last).heap_index(), heap.len() - 1);

        heap.delete_at(&mut slab, slab.get(last).heap_index());
        assert_eq!(heap.len(), 1);
        heap.assert_heap_property(&slab);
    }

    #[test]
    fn update_key_restores_heap_property() {
        let mut slab = Slab::new();
        let mut heap = Heap::new();
        let handles: Vec<_> = (0..20).map(|v| push(&mut slab, &mut heap, v)).collect();

        heap.update_key(&mut slab, handles[0], 1_000);
        heap.assert_heap_property(&slab);
        heap.update_key(&mut slab, handles[19], -1);
        heap.assert_heap_property(&slab);
        assert_eq!(heap.front().map(|h| slab.get(h).expire_at()), Some(-1));
    }

    #[test]
    fn random_sequence_of_ops_preserves_invariants() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut slab: Slab<Node> = Slab::new();
        let mut heap = Heap::new();
        let mut live = Vec::new();

        for _ in 0..2_000 {
            let op = rng.gen_range(0..4);
            match op {
                0 => {
                    let handle = push(&mut slab, &mut heap, rng.gen_range(-100..100));
                    live.push(handle);
                }
                1 => {
                    if let Some(handle) = heap.pop(&mut slab) {
                        slab.remove(handle);
                        live.retain(|h| *h != handle);
                    }
                }
                2 => {
                    if !live.is_empty() {
                        let idx = rng.gen_range(0..live.len());
                        let handle = live.remove(idx);
                        heap.delete_at(&mut slab, slab.get(handle).heap_index());
                        slab.remove(handle);
                    }
                }
                _ => {
                    if !live.is_empty() {
                        live.shuffle(&mut rng);
                        let handle = live[0];
                        heap.update_key(&mut slab, handle, rng.gen_range(-100..100));
                    }
                }
            }
            heap.assert_heap_property(&slab);
            assert_eq!(heap.len(), live.len());
        }
    }
}
