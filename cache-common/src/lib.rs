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

//! Components shared by `cache-intrusive` and `cache-core`: the `Key`/`Value`
//! trait bounds, the entry-death `Reason`, and the cached wall-clock source.

pub mod code;
pub mod reason;
pub mod time;

pub use code::{HashBuilder, Key, Value};
pub use reason::{resolve_expire_at, Reason, NEVER};
pub use time::{now_ms, CachedClock, DirectTime, TimeSource};
