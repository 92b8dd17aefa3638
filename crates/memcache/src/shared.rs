// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A [`MemCache`] shared between threads.
//!
//! One call can touch the quota map, both block indices and the trust
//! graph, so the whole allocator sits behind a single lock.

use crate::MemCache;
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable, thread-safe handle to one [`MemCache`].
///
/// # Example
/// ```
/// use memcache::{MemCache, SharedMemCache};
///
/// let shared = SharedMemCache::new(MemCache::new());
/// shared.with(|mc| mc.add_user("jbond007", 100)).unwrap();
///
/// let worker = shared.clone();
/// let block = std::thread::spawn(move || worker.with(|mc| mc.allocate("jbond007", 10)))
///     .join()
///     .unwrap();
/// assert!(block.is_some());
/// assert_eq!(shared.with(|mc| mc.remaining_quota("jbond007")), Some(90));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedMemCache {
    inner: Arc<Mutex<MemCache>>,
}

impl SharedMemCache {
    pub fn new(cache: MemCache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Runs `f` with exclusive access to the allocator.
    ///
    /// A panic inside an earlier `f` does not lock the allocator out: every
    /// operation either completes or returns before mutating, so the state
    /// behind a poisoned lock is still consistent.
    pub fn with<R>(&self, f: impl FnOnce(&mut MemCache) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_allocations_respect_quota() {
        let shared = SharedMemCache::new(MemCache::new());
        shared.with(|mc| mc.add_user("jbond007", 1000)).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let worker = shared.clone();
                thread::spawn(move || {
                    (0..50)
                        .filter(|_| worker.with(|mc| mc.allocate("jbond007", 4)).is_some())
                        .count()
                })
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(granted, 250);
        shared.with(|mc| {
            assert_eq!(mc.remaining_quota("jbond007"), Some(0));
            assert_eq!(mc.allocated_count(), 250);
        });
    }

    #[test]
    fn test_survives_poisoning() {
        let shared = SharedMemCache::new(MemCache::new());
        let poisoner = shared.clone();
        let _ = thread::spawn(move || poisoner.with(|_| panic!("boom"))).join();

        shared.with(|mc| mc.add_user("gammaray", 10)).unwrap();
        assert!(shared.with(|mc| mc.user_exists("gammaray")));
    }
}
