// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memcache
//!
//! A simulated memory manager that shares bounded quotas among named users,
//! guards each block with an owner / trust-group / everyone access mode, and
//! recycles small freed blocks instead of allocating fresh memory.
//!
//! # Key Components
//!
//! - [`MemCache`]: the allocator: user registration, trust edges,
//!   allocate / free with quota accounting, mode changes, and two
//!   first/next/current walks over allocated and free-cached blocks.
//! - [`BlockHandle`] / [`BlockHeader`]: the reference handed to callers
//!   and the fixed 16-byte header stored in front of every payload.
//! - [`Username`]: an exactly-eight-alphanumerics user id.
//! - [`Quota`]: byte quotas with human-readable parsing (`"4K"`).
//! - [`MemCacheConfig`]: TOML configuration: cache threshold, index size,
//!   and users / trust edges to seed.
//! - [`CacheStats`]: hit ratio, refusals, live and cached bytes.
//! - [`SharedMemCache`]: the allocator behind one mutex for use across
//!   threads.
//!
//! # Block Flow
//!
//! ```text
//! allocate(user, size)
//!       │  quota check
//!       ▼
//!   free cache[size] ──hit──► reuse lowest handle ─┐
//!       │ miss                                      ├─► header rewritten
//!       ▼                                           │   allocated index
//!   fresh zeroed region ────────────────────────────┘   quota -= size
//!
//! free(user, block)
//!       │  access check (mode + trust graph)
//!       ▼
//!   size ≤ threshold ? ──yes──► free cache[size]
//!       │ no                                    quota of owner += size
//!       ▼
//!   region released
//! ```
//!
//! # Example
//! ```
//! use memcache::{BlockMode, MemCache};
//!
//! let mut mc = MemCache::new();
//! mc.add_user("jbond007", 1000).unwrap();
//!
//! let block = mc.allocate("jbond007", 10).unwrap();
//! mc.payload_mut(block).unwrap()[..9].copy_from_slice(b"A string.");
//! assert_eq!(mc.header(block).unwrap().mode, BlockMode::Owner);
//!
//! mc.free("jbond007", block).unwrap();
//! // Same size, same user: the cached block comes back.
//! assert_eq!(mc.allocate("jbond007", 10), Some(block));
//! ```

mod arena;
pub mod block;
mod cache;
mod config;
mod error;
mod quota;
mod shared;
mod stats;
mod user;

pub use block::{BlockHandle, BlockHeader, BlockMode, HEADER_LEN};
pub use cache::MemCache;
pub use config::{
    MemCacheConfig, TrustEntry, UserEntry, DEFAULT_ALLOCATED_BUCKETS,
    DEFAULT_CACHEABLE_THRESHOLD,
};
pub use error::{ErrorKind, MemCacheError};
pub use quota::Quota;
pub use shared::SharedMemCache;
pub use stats::CacheStats;
pub use user::{Username, USERNAME_LEN};
