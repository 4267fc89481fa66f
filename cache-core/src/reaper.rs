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

//! The two background loops a [`Cache`](crate::cache::Cache) owns: a reaper
//! that sweeps expired entries on an adaptive cadence, and (when
//! `cached_time` is on) a once-a-second refresh of the shared [`CachedClock`].
//!
//! Neither loop needs an async runtime — both just sleep and occasionally do
//! O(shards) work, so plain OS threads are used instead of pulling in tokio
//! for what would be two always-on tasks.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cache_common::{now_ms, CachedClock, Key, Value};
use parking_lot::{Condvar, Mutex};
use rand::Rng;

use crate::config::CacheConfig;
use crate::index::Indexer;
use crate::shard::Shard;

/// Shared cancellation signal and completion handshake for the background
/// threads. Stands in for the channel-based stop signal the original uses: a
/// `notify_all` wakes every sleeping thread at once, and `Cache::stop` joins
/// the handles it kept at spawn time to know when they've actually exited.
#[derive(Default)]
pub(crate) struct StopSignal {
    stopped: Mutex<bool>,
    cvar: Condvar,
}

impl StopSignal {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sleep up to `timeout`, waking early if signalled. Returns whether a
    /// stop was signalled (by timeout of the sleep itself never indicates
    /// stop; only an explicit [`Self::signal`] does).
    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if *stopped {
            return true;
        }
        self.cvar.wait_for(&mut stopped, timeout);
        *stopped
    }

    pub(crate) fn signal(&self) {
        *self.stopped.lock() = true;
        self.cvar.notify_all();
    }
}

pub(crate) fn spawn_reaper<K, V, I>(
    shards: Arc<Vec<Mutex<Shard<K, V, I>>>>,
    config: Arc<CacheConfig>,
    stop: Arc<StopSignal>,
) -> JoinHandle<()>
where
    K: Key,
    V: Value,
    I: Indexer<K>,
{
    std::thread::Builder::new()
        .name("cache-reaper".into())
        .spawn(move || {
            // Jitter the first tick so a fleet of caches started together
            // (e.g. by a test suite, or by many workers restarting at once)
            // don't all sweep on the same tick forever after.
            let jitter_ms = rand::thread_rng().gen_range(0..=config.max_interval.as_millis() as u64);
            if stop.wait(Duration::from_millis(jitter_ms)) {
                return;
            }

            let threshold = config.bucket_num * config.delete_limits * 7 / 10;
            let mut interval = config.max_interval;

            loop {
                if stop.wait(interval) {
                    return;
                }

                let now = now_ms();
                let mut reaped = 0usize;
                for shard in shards.iter() {
                    reaped += shard.lock().reap_expired(now, config.delete_limits);
                }

                interval = if reaped > threshold {
                    config.min_interval
                } else {
                    config.max_interval
                };
                tracing::trace!(reaped, threshold, next_interval = ?interval, "reap sweep complete");
            }
        })
        .expect("failed to spawn cache reaper thread")
}

pub(crate) fn spawn_clock_refresh(clock: Arc<CachedClock>, stop: Arc<StopSignal>) -> JoinHandle<()> {
    std::thread::Builder::new()
        .name("cache-clock".into())
        .spawn(move || loop {
            if stop.wait(Duration::from_secs(1)) {
                return;
            }
            clock.refresh();
        })
        .expect("failed to spawn cache clock-refresh thread")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn signal_wakes_a_waiting_thread_immediately() {
        let stop = StopSignal::new();
        let waiter = {
            let stop = stop.clone();
            std::thread::spawn(move || stop.wait(Duration::from_secs(60)))
        };
        std::thread::sleep(Duration::from_millis(20));
        stop.signal();
        assert!(waiter.join().unwrap());
    }

    #[test_log::test]
    fn wait_returns_false_on_plain_timeout() {
        let stop = StopSignal::new();
        assert!(!stop.wait(Duration::from_millis(5)));
    }
}
