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

use std::hash::{BuildHasher, Hash};

/// Trait bound for cache keys.
///
/// A key is hashed once per bucket at insert time and compared on every
/// lookup that lands in the same bucket, so both need to be cheap.
pub trait Key: Hash + Eq + Clone + Send + Sync + 'static {}
impl<T: Hash + Eq + Clone + Send + Sync + 'static> Key for T {}

/// Trait bound for cache values. Values carry no hashing or ordering
/// requirement: they never participate in any of the shard's three indices.
pub trait Value: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Value for T {}

/// Trait bound for the hash builder used to pick a shard and, for
/// [`SwissIndex`](../../cache_core/index/struct.SwissIndex.html)-style
/// backends, to key the index itself.
pub trait HashBuilder: BuildHasher + Send + Sync + 'static {}
impl<T: BuildHasher + Send + Sync + 'static> HashBuilder for T {}
