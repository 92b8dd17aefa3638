// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocator statistics for diagnostics.
//!
//! [`CacheStats`] tracks how often the free-block cache satisfies a
//! request, how often quota or permission checks refuse one, and how many
//! bytes are held live or parked in the free cache.

/// Cumulative statistics about allocator usage since creation or the last
/// reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Allocations served from the free-block cache.
    pub cache_hits: u64,
    /// Allocations that required a fresh region.
    pub cache_misses: u64,
    /// Allocations refused because the user's quota was too small.
    pub quota_rejections: u64,
    /// Successful frees.
    pub frees: u64,
    /// Frees that physically released the block instead of caching it.
    pub releases: u64,
    /// Frees refused by the access check.
    pub permission_denials: u64,
    /// Payload bytes currently allocated.
    pub allocated_bytes: usize,
    /// High-water mark of `allocated_bytes`.
    pub peak_allocated_bytes: usize,
    /// Payload bytes parked in the free-block cache.
    pub free_cached_bytes: usize,
}

impl CacheStats {
    /// Returns the fraction of allocations served from the free cache.
    ///
    /// Returns `0.0` if nothing has been allocated.
    pub fn cache_hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }

    pub(crate) fn record_allocation(&mut self, size: usize, reused: bool) {
        self.allocations += 1;
        if reused {
            self.cache_hits += 1;
            self.free_cached_bytes -= size;
        } else {
            self.cache_misses += 1;
        }
        self.allocated_bytes += size;
        self.peak_allocated_bytes = self.peak_allocated_bytes.max(self.allocated_bytes);
    }

    pub(crate) fn record_quota_rejection(&mut self) {
        self.quota_rejections += 1;
    }

    pub(crate) fn record_permission_denial(&mut self) {
        self.permission_denials += 1;
    }

    /// Records a successful free; `cached` tells whether the block went to
    /// the free cache or was released.
    pub(crate) fn record_free(&mut self, size: usize, cached: bool) {
        self.frees += 1;
        self.allocated_bytes -= size;
        if cached {
            self.free_cached_bytes += size;
        } else {
            self.releases += 1;
        }
    }

    /// A free-cached block dropped without being reused.
    pub(crate) fn record_evicted(&mut self, size: usize) {
        self.free_cached_bytes -= size;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} allocations ({} hits, {} misses, {:.0}% hit rate), {} quota rejections, \
             {} frees ({} released), {} denied, {} B live (peak {} B), {} B cached",
            self.allocations,
            self.cache_hits,
            self.cache_misses,
            self.cache_hit_ratio() * 100.0,
            self.quota_rejections,
            self.frees,
            self.releases,
            self.permission_denials,
            self.allocated_bytes,
            self.peak_allocated_bytes,
            self.free_cached_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let s = CacheStats::default();
        assert_eq!(s.allocations, 0);
        assert_eq!(s.cache_hit_ratio(), 0.0);
    }

    #[test]
    fn test_hit_ratio() {
        let mut s = CacheStats::default();
        s.record_allocation(10, false);
        s.record_free(10, true);
        s.record_allocation(10, true);
        s.record_allocation(20, false);
        assert!((s.cache_hit_ratio() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_byte_accounting() {
        let mut s = CacheStats::default();
        s.record_allocation(100, false);
        s.record_allocation(300, false);
        s.record_free(100, true);
        s.record_free(300, false);
        assert_eq!(s.allocated_bytes, 0);
        assert_eq!(s.peak_allocated_bytes, 400);
        assert_eq!(s.free_cached_bytes, 100);
        assert_eq!(s.releases, 1);

        s.record_allocation(100, true);
        assert_eq!(s.free_cached_bytes, 0);
        assert_eq!(s.allocated_bytes, 100);
    }

    #[test]
    fn test_summary() {
        let mut s = CacheStats::default();
        s.record_allocation(8, false);
        s.record_quota_rejection();
        s.record_permission_denial();
        let summary = s.summary();
        assert!(summary.contains("1 allocations"));
        assert!(summary.contains("1 quota rejections"));
        assert!(summary.contains("1 denied"));
    }

    #[test]
    fn test_serialize() {
        let mut s = CacheStats::default();
        s.record_allocation(8, false);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["allocations"], 1);
        assert_eq!(json["allocated_bytes"], 8);
    }
}
