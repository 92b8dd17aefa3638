// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The quota-enforcing, trust-aware block allocator.
//!
//! A [`MemCache`]:
//!
//! 1. Registers users, each with a quota. A user's live allocations never
//!    exceed the quota given at registration.
//! 2. Keeps a directed trust graph. `trust(a, b)` lets `b` release `a`'s
//!    group-mode blocks.
//! 3. Hands out blocks with a [header](crate::block) in front of the payload
//!    and parks freed small blocks in a free cache keyed by size, so a later
//!    request of the same size reuses the lowest-addressed one.
//!
//! # Block lifecycle
//! ```text
//!             allocate                         free (size ≤ threshold)
//!   (none) ───────────► allocated ───────────────────────────► free-cached
//!                          ▲   │                                    │
//!                          │   │ free (size > threshold)            │
//!                          │   ▼                                    │
//!                          │ released                               │
//!                          └────────────────────────────────────────┘
//!                                  allocate (same size, reused)
//! ```
//!
//! # Bookkeeping
//! For every registered user: remaining quota + sizes of that user's
//! allocated blocks == quota limit. The trust graph and the quota map
//! always hold the same set of users.

use crate::arena::BlockArena;
use crate::block::{BlockHeader, BlockMode, MAX_BLOCK_SIZE};
use crate::config::{DEFAULT_ALLOCATED_BUCKETS, DEFAULT_CACHEABLE_THRESHOLD};
use crate::{BlockHandle, CacheStats, MemCacheConfig, MemCacheError, Username};
use containers::{BucketedCache, DirectedGraph};
use std::collections::HashMap;

/// An entry of the two block indices.
///
/// Ordered by handle first, so within a bucket the lowest address wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct BlockEntry {
    handle: BlockHandle,
    size: usize,
}

#[derive(Debug, Clone, Copy)]
struct UserQuota {
    limit: usize,
    remaining: usize,
}

/// The block allocator.
///
/// # Example
/// ```
/// use memcache::MemCache;
///
/// let mut mc = MemCache::new();
/// mc.add_user("jbond007", 1000).unwrap();
/// mc.add_user("j0walker", 500).unwrap();
///
/// let p1 = mc.allocate("jbond007", 10).unwrap();
/// let p2 = mc.allocate("j0walker", 50).unwrap();
/// mc.set_block_mode("jbond007", p1, 'G').unwrap();
/// mc.trust("jbond007", "j0walker").unwrap();
///
/// assert!(mc.free("jbond007", p2).is_err());
/// assert!(mc.free("j0walker", p1).is_ok());
/// assert_eq!(mc.remaining_quota("jbond007"), Some(1000));
/// ```
pub struct MemCache {
    cacheable_threshold: usize,
    arena: BlockArena,
    /// Free-cached blocks, keyed by size.
    free_blocks: BucketedCache<BlockEntry>,
    /// Allocated blocks, keyed by address hash.
    allocated_blocks: BucketedCache<BlockEntry>,
    trust: DirectedGraph<Username>,
    quotas: HashMap<Username, UserQuota>,
    stats: CacheStats,
}

impl MemCache {
    /// Creates an allocator with the default threshold and index size.
    pub fn new() -> Self {
        Self::build(DEFAULT_CACHEABLE_THRESHOLD, DEFAULT_ALLOCATED_BUCKETS)
    }

    /// Creates an allocator sized by `config`. Users and trust edges in the
    /// config are ignored; see [`from_config`](Self::from_config).
    ///
    /// Fails if the threshold is zero or larger than the largest block
    /// size, or if the index has no buckets.
    pub fn with_config(config: &MemCacheConfig) -> Result<Self, MemCacheError> {
        config.validate()?;
        Ok(Self::build(
            config.cacheable_threshold,
            config.allocated_buckets,
        ))
    }

    /// Creates an allocator sized by `config` and registers its users and
    /// trust edges.
    pub fn from_config(config: &MemCacheConfig) -> Result<Self, MemCacheError> {
        let mut mc = Self::with_config(config)?;
        for (name, quota) in config.user_quotas()? {
            mc.add_user(name, quota.as_bytes())?;
        }
        for edge in &config.trust {
            mc.trust(&edge.truster, &edge.trustee)?;
        }
        tracing::info!(
            "memcache configured: {} users, {} trust edges, threshold {} B",
            mc.user_count(),
            config.trust.len(),
            mc.cacheable_threshold,
        );
        Ok(mc)
    }

    fn build(cacheable_threshold: usize, allocated_buckets: usize) -> Self {
        Self {
            cacheable_threshold,
            arena: BlockArena::default(),
            free_blocks: BucketedCache::new(
                cacheable_threshold.saturating_add(1),
                |e: &BlockEntry| e.size,
            ),
            allocated_blocks: BucketedCache::new(allocated_buckets, move |e: &BlockEntry| {
                e.handle.index() % allocated_buckets
            }),
            trust: DirectedGraph::new(),
            quotas: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    // ── Users and trust ────────────────────────────────────────────

    /// Registers `name` with a quota of `limit` bytes.
    ///
    /// Fails if `limit` is zero, the name is not eight ASCII alphanumerics,
    /// or the name is already registered. The user is added to the trust
    /// graph and the quota map together; if the second step fails the
    /// first is undone.
    pub fn add_user(&mut self, name: &str, limit: usize) -> Result<(), MemCacheError> {
        if limit == 0 {
            return Err(MemCacheError::InvalidArgument(
                "memory limit must be positive".into(),
            ));
        }
        let user = Username::parse(name)?;
        if self.quotas.contains_key(&user) {
            return Err(MemCacheError::UsernameAlreadyUsed(name.to_string()));
        }

        self.trust.add_vertex(user)?;
        if let Err(e) = self.quotas.try_reserve(1) {
            self.trust.remove_vertex(&user)?;
            tracing::warn!("rolled back registration of '{user}': {e}");
            return Err(MemCacheError::OutOfMemory(format!(
                "cannot store quota for '{user}': {e}"
            )));
        }
        self.quotas.insert(
            user,
            UserQuota {
                limit,
                remaining: limit,
            },
        );

        tracing::info!("registered user '{user}' with {limit} B quota");
        Ok(())
    }

    /// Lets `trustee` release `truster`'s group-mode blocks. Idempotent.
    pub fn trust(&mut self, truster: &str, trustee: &str) -> Result<(), MemCacheError> {
        let from = self.lookup(truster)?;
        let to = self.lookup(trustee)?;
        if self.trust.add_edge(&from, &to)? {
            tracing::debug!("'{from}' now trusts '{to}'");
        }
        Ok(())
    }

    /// Withdraws trust from `truster` to `trustee`. Idempotent.
    pub fn untrust(&mut self, truster: &str, trustee: &str) -> Result<(), MemCacheError> {
        let from = self.lookup(truster)?;
        let to = self.lookup(trustee)?;
        if self.trust.remove_edge(&from, &to)? {
            tracing::debug!("'{from}' no longer trusts '{to}'");
        }
        Ok(())
    }

    // ── Allocation ─────────────────────────────────────────────────

    /// Allocates a `size`-byte block owned by `user`.
    ///
    /// Returns `None` on any failure, including an exhausted quota; use
    /// [`try_allocate`](Self::try_allocate) to learn why.
    pub fn allocate(&mut self, user: &str, size: usize) -> Option<BlockHandle> {
        match self.try_allocate(user, size) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::debug!("allocation of {size} B for '{user}' refused: {e}");
                None
            }
        }
    }

    /// Allocates a `size`-byte block owned by `user`.
    ///
    /// A free-cached block of exactly `size` bytes is reused if one exists
    /// (lowest handle first), with its payload left as it was. Otherwise a
    /// fresh, zeroed region is obtained. The block starts in owner-only
    /// mode and its size is charged to the user's quota.
    pub fn try_allocate(&mut self, user: &str, size: usize) -> Result<BlockHandle, MemCacheError> {
        let owner = self.lookup(user)?;
        if size == 0 || size > MAX_BLOCK_SIZE {
            return Err(MemCacheError::InvalidArgument(format!(
                "block size must be in 1..={MAX_BLOCK_SIZE}, got {size}"
            )));
        }

        let available = self.quota(&owner)?.remaining;
        if size > available {
            self.stats.record_quota_rejection();
            return Err(MemCacheError::QuotaExceeded {
                user: owner.to_string(),
                requested_bytes: size,
                available_bytes: available,
            });
        }

        let (handle, previous) = match self.free_blocks.extract_by_key(size) {
            Some(entry) => (entry.handle, self.arena.header(entry.handle)),
            None => (self.arena.allocate(size)?, None),
        };
        let reused = previous.is_some();

        let header = BlockHeader {
            size,
            mode: BlockMode::Owner,
            owner,
        };
        self.arena.write_header(handle, &header);

        let entry = BlockEntry { handle, size };
        if let Err(e) = self.allocated_blocks.push(entry) {
            self.undo_allocation(entry, previous);
            tracing::warn!("rolled back allocation of {handle}: {e}");
            return Err(e.into());
        }

        self.quota_mut(&owner)?.remaining -= size;
        self.stats.record_allocation(size, reused);
        tracing::debug!(
            "allocated {handle} ({size} B) for '{owner}'{}",
            if reused { " from free cache" } else { "" }
        );
        Ok(handle)
    }

    /// Puts back a block taken by a failed allocation. A reused block
    /// returns to the free cache under its old header; a fresh one is
    /// released.
    fn undo_allocation(&mut self, entry: BlockEntry, previous: Option<BlockHeader>) {
        let Some(header) = previous else {
            self.arena.release(entry.handle);
            return;
        };
        self.arena.write_header(entry.handle, &header);
        if let Err(e) = self.free_blocks.push(entry) {
            self.arena.release(entry.handle);
            self.stats.record_evicted(entry.size);
            tracing::warn!("released {} after free cache insertion failed: {e}", entry.handle);
        }
    }

    /// Changes the mode of an allocated block. Only the owner may do so.
    pub fn set_block_mode(
        &mut self,
        user: &str,
        block: BlockHandle,
        mode: char,
    ) -> Result<(), MemCacheError> {
        let requester = self.lookup(user)?;
        let header = self.allocated_header(block)?;
        if header.owner != requester {
            return Err(MemCacheError::PermissionDenied {
                user: requester.to_string(),
                block,
            });
        }
        let mode = BlockMode::try_from(mode)?;

        self.arena.write_mode(block, mode);
        tracing::debug!("{block} of '{requester}' set to mode {mode}");
        Ok(())
    }

    /// Releases an allocated block on behalf of `user`.
    ///
    /// The block's owner is credited with its size. Blocks no larger than
    /// the cacheable threshold move to the free cache with their header and
    /// payload intact; larger ones are physically released.
    pub fn free(&mut self, user: &str, block: BlockHandle) -> Result<(), MemCacheError> {
        let requester = self.lookup(user)?;
        let header = self.allocated_header(block)?;
        if !self.permits(&requester, &header) {
            self.stats.record_permission_denial();
            tracing::debug!(
                "'{requester}' denied freeing {block} (owner '{}', mode {})",
                header.owner,
                header.mode
            );
            return Err(MemCacheError::PermissionDenied {
                user: requester.to_string(),
                block,
            });
        }

        let entry = BlockEntry {
            handle: block,
            size: header.size,
        };
        let cached = header.size <= self.cacheable_threshold;
        if cached {
            self.free_blocks.push(entry)?;
        }
        self.allocated_blocks.remove(&entry);
        if !cached {
            self.arena.release(block);
        }

        self.quota_mut(&header.owner)?.remaining += header.size;
        self.stats.record_free(header.size, cached);
        tracing::debug!(
            "'{requester}' freed {block} ({} B) of '{}'{}",
            header.size,
            header.owner,
            if cached { " into free cache" } else { "" }
        );
        Ok(())
    }

    /// Returns whether `user` may free `block` under its current mode.
    pub fn can_free(&self, user: &str, block: BlockHandle) -> Result<bool, MemCacheError> {
        let requester = self.lookup(user)?;
        let header = self.allocated_header(block)?;
        Ok(self.permits(&requester, &header))
    }

    /// The access rule: everyone-mode blocks are open to all; owner-mode
    /// blocks only to the owner; group-mode blocks to the owner and to
    /// users the owner trusts directly.
    fn permits(&self, requester: &Username, header: &BlockHeader) -> bool {
        match header.mode {
            BlockMode::Everyone => true,
            BlockMode::Owner => *requester == header.owner,
            BlockMode::Group => {
                *requester == header.owner || self.trust.edge_exists(&header.owner, requester)
            }
        }
    }

    // ── Iteration ──────────────────────────────────────────────────

    /// Restarts the walk over allocated blocks and returns the first.
    ///
    /// Blocks come in ascending address-hash bucket order, lowest handle
    /// first within a bucket.
    pub fn first_allocated(&mut self) -> Option<BlockHandle> {
        self.allocated_blocks.first().map(|e| e.handle)
    }

    /// Advances the walk over allocated blocks.
    pub fn next_allocated(&mut self) -> Option<BlockHandle> {
        self.allocated_blocks.next().map(|e| e.handle)
    }

    /// Returns the allocated block under the walk without advancing.
    pub fn current_allocated(&self) -> Option<BlockHandle> {
        self.allocated_blocks.current().map(|e| e.handle)
    }

    /// Restarts the walk over free-cached blocks and returns the first.
    ///
    /// Blocks come in ascending size order, lowest handle first within a
    /// size.
    pub fn first_free(&mut self) -> Option<BlockHandle> {
        self.free_blocks.first().map(|e| e.handle)
    }

    /// Advances the walk over free-cached blocks.
    pub fn next_free(&mut self) -> Option<BlockHandle> {
        self.free_blocks.next().map(|e| e.handle)
    }

    /// Returns the free-cached block under the walk without advancing.
    pub fn current_free(&self) -> Option<BlockHandle> {
        self.free_blocks.current().map(|e| e.handle)
    }

    /// Iterates over allocated blocks in walk order, leaving the walk alone.
    pub fn allocated_blocks(&self) -> impl Iterator<Item = BlockHandle> + '_ {
        self.allocated_blocks.iter().map(|e| e.handle)
    }

    /// Iterates over free-cached blocks in walk order, leaving the walk alone.
    pub fn free_blocks(&self) -> impl Iterator<Item = BlockHandle> + '_ {
        self.free_blocks.iter().map(|e| e.handle)
    }

    // ── Reset ──────────────────────────────────────────────────────

    /// Forgets every user and trust edge and releases every block,
    /// allocated and free-cached alike.
    pub fn reset(&mut self) -> Result<(), MemCacheError> {
        self.trust.clear();
        self.quotas.clear();
        self.allocated_blocks.clear();
        self.free_blocks.clear();
        let released = self.arena.clear();
        self.stats = CacheStats::default();
        tracing::info!("memcache reset: released {released} blocks");
        Ok(())
    }

    // ── Inspection ─────────────────────────────────────────────────

    /// Decodes the header of an allocated or free-cached block.
    pub fn header(&self, block: BlockHandle) -> Option<BlockHeader> {
        self.arena.header(block)
    }

    /// Returns the whole region of a block: header followed by payload.
    pub fn raw(&self, block: BlockHandle) -> Option<&[u8]> {
        self.arena.region(block)
    }

    /// Returns a block's payload.
    pub fn payload(&self, block: BlockHandle) -> Option<&[u8]> {
        self.arena
            .region(block)
            .map(|region| &region[crate::block::HEADER_LEN..])
    }

    /// Returns a block's payload for writing. The header is not reachable
    /// through this slice.
    pub fn payload_mut(&mut self, block: BlockHandle) -> Option<&mut [u8]> {
        self.arena
            .region_mut(block)
            .map(|region| &mut region[crate::block::HEADER_LEN..])
    }

    /// Returns `true` if `name` is registered.
    pub fn user_exists(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Returns the user's unallocated quota.
    pub fn remaining_quota(&self, name: &str) -> Option<usize> {
        let user = self.lookup(name).ok()?;
        self.quotas.get(&user).map(|q| q.remaining)
    }

    /// Returns the quota the user was registered with.
    pub fn quota_limit(&self, name: &str) -> Option<usize> {
        let user = self.lookup(name).ok()?;
        self.quotas.get(&user).map(|q| q.limit)
    }

    /// Returns `true` if `truster` directly trusts `trustee`.
    pub fn trusts(&self, truster: &str, trustee: &str) -> bool {
        match (self.lookup(truster), self.lookup(trustee)) {
            (Ok(from), Ok(to)) => self.trust.edge_exists(&from, &to),
            _ => false,
        }
    }

    pub fn user_count(&self) -> usize {
        self.quotas.len()
    }

    pub fn allocated_count(&self) -> usize {
        self.allocated_blocks.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_blocks.len()
    }

    /// Returns `true` if `block` is currently allocated.
    pub fn is_allocated(&self, block: BlockHandle) -> bool {
        self.allocated_header(block).is_ok()
    }

    /// Returns `true` if `block` is parked in the free cache.
    pub fn is_free_cached(&self, block: BlockHandle) -> bool {
        self.arena.header(block).is_some_and(|h| {
            self.free_blocks.contains(&BlockEntry {
                handle: block,
                size: h.size,
            })
        })
    }

    pub fn cacheable_threshold(&self) -> usize {
        self.cacheable_threshold
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    // ── Helpers ────────────────────────────────────────────────────

    /// Resolves a registered user. Illegal names are reported as not found.
    fn lookup(&self, name: &str) -> Result<Username, MemCacheError> {
        let not_found = || MemCacheError::UserNotFound(name.to_string());
        let user = Username::parse(name).map_err(|_| not_found())?;
        let registered = self.quotas.contains_key(&user);
        debug_assert_eq!(registered, self.trust.vertex_exists(&user));
        if !registered {
            return Err(not_found());
        }
        Ok(user)
    }

    fn quota(&self, user: &Username) -> Result<&UserQuota, MemCacheError> {
        self.quotas
            .get(user)
            .ok_or_else(|| MemCacheError::UserNotFound(user.to_string()))
    }

    fn quota_mut(&mut self, user: &Username) -> Result<&mut UserQuota, MemCacheError> {
        self.quotas
            .get_mut(user)
            .ok_or_else(|| MemCacheError::UserNotFound(user.to_string()))
    }

    /// Reads the header of `block` if it is in the allocated index.
    fn allocated_header(&self, block: BlockHandle) -> Result<BlockHeader, MemCacheError> {
        self.arena
            .header(block)
            .filter(|h| {
                self.allocated_blocks.contains(&BlockEntry {
                    handle: block,
                    size: h.size,
                })
            })
            .ok_or(MemCacheError::BlockNotAllocated(block))
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemCache")
            .field("cacheable_threshold", &self.cacheable_threshold)
            .field("users", &self.quotas.len())
            .field("trust_edges", &self.trust.edge_count())
            .field("allocated_blocks", &self.allocated_blocks.len())
            .field("free_blocks", &self.free_blocks.len())
            .field("resident_bytes", &self.arena.resident_bytes())
            .finish()
    }
}
