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

use std::{
    sync::atomic::{AtomicI64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

/// Wall time, in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_millis() as i64
}

/// An atomically-refreshed view of [`now_ms`].
///
/// Reading `now_ms()` on every cache operation costs a `clock_gettime` per
/// call. [`CachedClock`] amortizes that by refreshing a single atomic once
/// per second from a background thread; hot-path readers pay only an
/// atomic load, at the cost of up to ~1s of staleness (see spec §4.7 /
/// §9 "Cached time vs. exact time").
///
/// The reaper never reads through this type: it always uses [`now_ms`]
/// directly so its own reap-or-not decisions are exact.
#[derive(Debug)]
pub struct CachedClock {
    millis: AtomicI64,
}

impl CachedClock {
    pub fn new() -> Self {
        let millis = now_ms();
        tracing::debug!(millis, "cached clock started");
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    /// Fast-path read of the cached time.
    #[inline]
    pub fn load(&self) -> i64 {
        self.millis.load(Ordering::Relaxed)
    }

    /// Refresh the cached value from the real clock. Called once per tick
    /// by the cache's background time-refresh loop.
    pub fn refresh(&self) {
        self.millis.store(now_ms(), Ordering::Relaxed);
    }
}

impl Default for CachedClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A source of "now", abstracting over the cached and direct clocks so
/// shard code doesn't need to branch on `CachedTime` at every call site.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Always reads the real clock. Used when `CachedTime` is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectTime;

impl TimeSource for DirectTime {
    #[inline]
    fn now_ms(&self) -> i64 {
        now_ms()
    }
}

impl TimeSource for CachedClock {
    #[inline]
    fn now_ms(&self) -> i64 {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cached_clock_starts_near_now() {
        let clock = CachedClock::new();
        assert!((clock.load() - now_ms()).abs() < 1_000);
    }

    #[test]
    fn refresh_tracks_real_clock() {
        let clock = CachedClock::new();
        let before = clock.load();
        std::thread::sleep(std::time::Duration::from_millis(5));
        clock.refresh();
        assert!(clock.load() >= before);
    }
}
