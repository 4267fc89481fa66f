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

//! Intrusive, slab-addressed containers shared by every shard: a 4-ary
//! min-heap ordered by expiration and a doubly-linked recency list. Neither
//! container owns its elements — both index into a [`Slab`](slab::Slab)
//! that the shard owns, which is what lets one entry sit in three indices
//! at once without reference counting.

pub mod heap;
pub mod list;
pub mod slab;

pub use heap::{Heap, HeapHandle};
pub use list::{ListHandle, RecencyList};
pub use slab::Slab;
