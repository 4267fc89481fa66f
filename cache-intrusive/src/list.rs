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

//! An intrusive doubly-linked list of slab handles in last-touched order:
//! front is least recently touched, back is most recently touched.

use crate::slab::Slab;

/// Implemented by whatever a [`RecencyList`] is built over.
pub trait ListHandle {
    fn prev(&self) -> Option<usize>;
    fn set_prev(&mut self, prev: Option<usize>);
    fn next(&self) -> Option<usize>;
    fn set_next(&mut self, next: Option<usize>);
}

#[derive(Debug)]
pub struct RecencyList {
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    /// When disabled, every mutator is a no-op. Used by the shard when LRU
    /// eviction is turned off (spec §4.3): no recency bookkeeping is paid
    /// for, and eviction falls back to the heap's front.
    disabled: bool,
}

impl RecencyList {
    pub fn new(disabled: bool) -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            disabled,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn front(&self) -> Option<usize> {
        self.head
    }

    pub fn push_back<T: ListHandle>(&mut self, slab: &mut Slab<T>, handle: usize) {
        if self.disabled {
            return;
        }
        slab.get_mut(handle).set_prev(self.tail);
        slab.get_mut(handle).set_next(None);
        match self.tail {
            Some(tail) => slab.get_mut(tail).set_next(Some(handle)),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);
        self.len += 1;
    }

    pub fn unlink<T: ListHandle>(&mut self, slab: &mut Slab<T>, handle: usize) {
        if self.disabled {
            return;
        }
        let (prev, next) = {
            let node = slab.get(handle);
            (node.prev(), node.next())
        };

        match prev {
            Some(prev) => slab.get_mut(prev).set_next(next),
            None => self.head = next,
        }
        match next {
            Some(next) => slab.get_mut(next).set_prev(prev),
            None => self.tail = prev,
        }

        let node = slab.get_mut(handle);
        node.set_prev(None);
        node.set_next(None);
        self.len -= 1;
    }

    pub fn move_to_back<T: ListHandle>(&mut self, slab: &mut Slab<T>, handle: usize) {
        if self.disabled {
            return;
        }
        self.unlink(slab, handle);
        self.push_back(slab, handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Node {
        prev: Option<usize>,
        next: Option<usize>,
    }

    impl ListHandle for Node {
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

    fn collect(slab: &Slab<Node>, list: &RecencyList) -> Vec<usize> {
        let mut out = Vec::new();
        let mut cur = list.front();
        while let Some(handle) = cur {
            out.push(handle);
            cur = slab.get(handle).next();
        }
        out
    }

    #[test]
    fn push_back_preserves_order() {
        let mut slab = Slab::new();
        let mut list = RecencyList::new(false);
        let handles: Vec<_> = (0..5).map(|_| slab.insert(Node::default())).collect();
        for &h in &handles {
            list.push_back(&mut slab, h);
        }
        assert_eq!(collect(&slab, &list), handles);
        assert_eq!(list.len(), 5);
    }

    #[test]
    fn move_to_back_reorders_single_touch() {
        let mut slab = Slab::new();
        let mut list = RecencyList::new(false);
        let handles: Vec<_> = (0..3).map(|_| slab.insert(Node::default())).collect();
        for &h in &handles {
            list.push_back(&mut slab, h);
        }

        list.move_to_back(&mut slab, handles[0]);
        assert_eq!(collect(&slab, &list), vec![handles[1], handles[2], handles[0]]);
    }

    #[test]
    fn unlink_middle_head_tail() {
        let mut slab = Slab::new();
        let mut list = RecencyList::new(false);
        let handles: Vec<_> = (0..3).map(|_| slab.insert(Node::default())).collect();
        for &h in &handles {
            list.push_back(&mut slab, h);
        }

        list.unlink(&mut slab, handles[1]);
        assert_eq!(collect(&slab, &list), vec![handles[0], handles[2]]);

        list.unlink(&mut slab, handles[0]);
        assert_eq!(collect(&slab, &list), vec![handles[2]]);

        list.unlink(&mut slab, handles[2]);
        assert_eq!(collect(&slab, &list), vec![]);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn disabled_list_is_a_no_op() {
        let mut slab = Slab::new();
        let mut list = RecencyList::new(true);
        let handle = slab.insert(Node::default());
        list.push_back(&mut slab, handle);
        assert_eq!(list.len(), 0);
        assert_eq!(list.front(), None);
    }
}
