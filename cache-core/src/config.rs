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

//! Tuning knobs and their defaults, lifted from the original `Option`
//! functions: `BucketNum`, `BucketSize`, `BucketCap`, the reaper's
//! `MinInterval`/`MaxInterval`/`DeleteLimits`, and the `CachedTime`/
//! `SwissTable`/`LRU` toggles.

use std::time::Duration;

pub(crate) const DEFAULT_BUCKET_NUM: usize = 16;
pub(crate) const DEFAULT_BUCKET_SIZE: usize = 1_000;
pub(crate) const DEFAULT_BUCKET_CAP: usize = 100_000;
pub(crate) const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_DELETE_LIMITS: usize = 1_000;

/// Normalized construction parameters for a [`Cache`](crate::cache::Cache).
///
/// Built with [`CacheBuilder`]; never constructed directly.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub(crate) bucket_num: usize,
    pub(crate) bucket_size: usize,
    pub(crate) bucket_cap: usize,
    pub(crate) min_interval: Duration,
    pub(crate) max_interval: Duration,
    pub(crate) delete_limits: usize,
    pub(crate) cached_time: bool,
    pub(crate) swiss_table: bool,
    pub(crate) lru: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket_num: DEFAULT_BUCKET_NUM,
            bucket_size: DEFAULT_BUCKET_SIZE,
            bucket_cap: DEFAULT_BUCKET_CAP,
            min_interval: DEFAULT_MIN_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
            delete_limits: DEFAULT_DELETE_LIMITS,
            cached_time: true,
            swiss_table: false,
            lru: true,
        }
    }
}

/// Builds a [`Cache`](crate::cache::Cache), one setter per tunable.
///
/// Mirrors the original's functional-options pattern (`WithBucketNum`,
/// `WithTTLCheckInterval`, ...) as plain builder methods, which is the
/// idiomatic Rust equivalent.
#[derive(Debug, Clone, Default)]
pub struct CacheBuilder {
    config: CacheConfig,
}

impl CacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of shards. Rounded up to the next power of two so shard
    /// selection can mask instead of mod. `0` is normalized to the default
    /// at build time, same as every other tunable here.
    pub fn bucket_num(mut self, bucket_num: usize) -> Self {
        self.config.bucket_num = bucket_num;
        self
    }

    /// Initial hash-index capacity hint, per shard. `0` normalizes to the
    /// default.
    pub fn bucket_size(mut self, bucket_size: usize) -> Self {
        self.config.bucket_size = bucket_size;
        self
    }

    /// Per-shard entry cap. Once reached, `Insert` evicts one entry to make
    /// room. `0` normalizes to the default rather than meaning "unbounded".
    pub fn bucket_cap(mut self, bucket_cap: usize) -> Self {
        self.config.bucket_cap = bucket_cap;
        self
    }

    /// Floor for the reaper's polling interval, used once its last sweep
    /// reaped enough to suggest more work is queued up. A non-positive
    /// duration normalizes to the default.
    pub fn min_interval(mut self, min_interval: Duration) -> Self {
        self.config.min_interval = min_interval;
        self
    }

    /// Ceiling for the reaper's polling interval, used while the cache looks
    /// quiet. A non-positive duration normalizes to the default.
    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.config.max_interval = max_interval;
        self
    }

    /// Upper bound on expired entries reaped per shard per sweep, and the
    /// load-threshold unit the reaper's interval adaptation is measured
    /// against. `0` normalizes to the default.
    pub fn delete_limits(mut self, delete_limits: usize) -> Self {
        self.config.delete_limits = delete_limits;
        self
    }

    /// Back reads of "now" by a once-a-second cached clock instead of a
    /// real clock read. Trades a second of slop in TTL accuracy for no
    /// syscall on the read path.
    pub fn cached_time(mut self, cached_time: bool) -> Self {
        self.config.cached_time = cached_time;
        self
    }

    /// Key the hash index by the precomputed 64-bit hash rather than the key
    /// itself, trading exact-match guarantees for a smaller, branch-light
    /// index (see [`SwissIndex`](crate::index::SwissIndex)).
    pub fn swiss_table(mut self, swiss_table: bool) -> Self {
        self.config.swiss_table = swiss_table;
        self
    }

    /// Evict the least-recently-touched entry on overflow instead of the one
    /// expiring soonest.
    pub fn lru(mut self, lru: bool) -> Self {
        self.config.lru = lru;
        self
    }

    /// Normalize every tunable: non-positive values fall back to their
    /// documented default (matching the original's `withInitialize`), then
    /// `bucket_num` is rounded up to the next power of two.
    pub(crate) fn into_config(self) -> CacheConfig {
        let mut config = self.config;
        if config.bucket_num == 0 {
            config.bucket_num = DEFAULT_BUCKET_NUM;
        }
        config.bucket_num = config.bucket_num.next_power_of_two();
        if config.bucket_size == 0 {
            config.bucket_size = DEFAULT_BUCKET_SIZE;
        }
        if config.bucket_cap == 0 {
            config.bucket_cap = DEFAULT_BUCKET_CAP;
        }
        if config.min_interval.is_zero() {
            config.min_interval = DEFAULT_MIN_INTERVAL;
        }
        if config.max_interval.is_zero() {
            config.max_interval = DEFAULT_MAX_INTERVAL;
        }
        if config.delete_limits == 0 {
            config.delete_limits = DEFAULT_DELETE_LIMITS;
        }
        config
    }
}
