// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Bucketed cache: a fixed range of ordered sets addressed by a key function.
//!
//! A [`BucketedCache`] is created with a bucket count `n` and a key function
//! `f: &T -> usize`. Every element lives in bucket `f(elem)`, which must be
//! in `0..n`. Within a bucket elements are kept in `Ord` order, so
//! [`extract_by_key`](BucketedCache::extract_by_key) always hands back the
//! smallest element of that bucket.
//!
//! Only non-empty buckets are materialised, so a cache with a large key
//! range (e.g. one bucket per address hash) costs nothing until used.
//!
//! # Cursor
//! The cache carries one internal cursor walking every element bucket by
//! bucket in ascending key order, and in `Ord` order inside a bucket:
//!
//! ```text
//! first()  → resets the walk, returns the first element
//! next()   → advances, returns None once exhausted
//! current()→ re-reads the element under the cursor
//! ```
//!
//! Mutating the cache while walking leaves the position unspecified (the
//! walk continues from the nearest following element, if any).

use crate::CacheError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound::{Excluded, Unbounded};

type KeyFn<T> = Box<dyn Fn(&T) -> usize + Send + Sync>;

/// An array of ordered sets, indexed by a caller-supplied key function.
pub struct BucketedCache<T: Ord + Clone> {
    /// Non-empty buckets only: key → ordered elements.
    buckets: BTreeMap<usize, BTreeSet<T>>,
    num_buckets: usize,
    key_fn: KeyFn<T>,
    len: usize,
    /// Position of the walk: bucket key and the element last returned.
    cursor: Option<(usize, T)>,
}

impl<T: Ord + Clone> BucketedCache<T> {
    /// Creates an empty cache with keys in `0..num_buckets`.
    pub fn new<F>(num_buckets: usize, key_fn: F) -> Self
    where
        F: Fn(&T) -> usize + Send + Sync + 'static,
    {
        Self {
            buckets: BTreeMap::new(),
            num_buckets,
            key_fn: Box::new(key_fn),
            len: 0,
            cursor: None,
        }
    }

    /// Returns the total number of stored elements.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bucket holds an element.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `elem` into its bucket.
    ///
    /// Fails with [`CacheError::KeyOutOfRange`] if the key function maps it
    /// outside the cache, or [`CacheError::AlreadyExists`] if an equal
    /// element is already stored.
    pub fn push(&mut self, elem: T) -> Result<(), CacheError> {
        let key = self.checked_key(&elem)?;
        let bucket = self.buckets.entry(key).or_default();
        if !bucket.insert(elem) {
            return Err(CacheError::AlreadyExists { key });
        }
        self.len += 1;
        Ok(())
    }

    /// Removes and returns the smallest element of bucket `key`, or `None`
    /// if the bucket is empty or `key` is out of range.
    pub fn extract_by_key(&mut self, key: usize) -> Option<T> {
        let bucket = self.buckets.get_mut(&key)?;
        let elem = bucket.pop_first()?;
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.len -= 1;
        Some(elem)
    }

    /// Removes `elem` from its bucket, returning the stored value.
    pub fn remove(&mut self, elem: &T) -> Option<T> {
        let key = self.checked_key(elem).ok()?;
        let bucket = self.buckets.get_mut(&key)?;
        let taken = bucket.take(elem)?;
        if bucket.is_empty() {
            self.buckets.remove(&key);
        }
        self.len -= 1;
        Some(taken)
    }

    /// Returns `true` if an element equal to `elem` is stored.
    pub fn contains(&self, elem: &T) -> bool {
        match self.checked_key(elem) {
            Ok(key) => self.buckets.get(&key).is_some_and(|b| b.contains(elem)),
            Err(_) => false,
        }
    }

    /// Removes every element and invalidates the cursor.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
        self.cursor = None;
    }

    /// Iterates over all elements in bucket order without touching the cursor.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.buckets.values().flat_map(BTreeSet::iter)
    }

    // ── Cursor ─────────────────────────────────────────────────────

    /// Resets the walk to the first element and returns it.
    pub fn first(&mut self) -> Option<&T> {
        self.cursor = self
            .buckets
            .iter()
            .next()
            .and_then(|(&key, set)| set.first().map(|e| (key, e.clone())));
        self.current()
    }

    /// Advances the walk and returns the new element.
    ///
    /// Returns `None` once every element has been visited, or if the walk
    /// was never started; both leave the cursor invalid.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&T> {
        let (key, last) = self.cursor.take()?;

        let in_bucket = self
            .buckets
            .get(&key)
            .and_then(|set| set.range((Excluded(&last), Unbounded)).next())
            .map(|e| (key, e.clone()));

        self.cursor = in_bucket.or_else(|| {
            self.buckets
                .range((Excluded(key), Unbounded))
                .next()
                .and_then(|(&k, set)| set.first().map(|e| (k, e.clone())))
        });
        self.current()
    }

    /// Returns the element under the cursor without advancing.
    pub fn current(&self) -> Option<&T> {
        let (key, elem) = self.cursor.as_ref()?;
        self.buckets.get(key)?.get(elem)
    }

    fn checked_key(&self, elem: &T) -> Result<usize, CacheError> {
        let key = (self.key_fn)(elem);
        if key >= self.num_buckets {
            return Err(CacheError::KeyOutOfRange {
                key,
                num_buckets: self.num_buckets,
            });
        }
        Ok(key)
    }
}

impl<T: Ord + Clone + fmt::Debug> fmt::Debug for BucketedCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketedCache")
            .field("num_buckets", &self.num_buckets)
            .field("len", &self.len)
            .field("occupied_buckets", &self.buckets.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_last_digit() -> BucketedCache<u32> {
        BucketedCache::new(10, |n: &u32| (*n % 10) as usize)
    }

    #[test]
    fn test_push_and_contains() {
        let mut c = by_last_digit();
        c.push(13).unwrap();
        c.push(3).unwrap();
        assert!(c.contains(&13));
        assert!(c.contains(&3));
        assert!(!c.contains(&23));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_push_duplicate() {
        let mut c = by_last_digit();
        c.push(5).unwrap();
        assert_eq!(c.push(5), Err(CacheError::AlreadyExists { key: 5 }));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_push_out_of_range() {
        let mut c = BucketedCache::new(4, |n: &u32| *n as usize);
        assert_eq!(
            c.push(9),
            Err(CacheError::KeyOutOfRange {
                key: 9,
                num_buckets: 4
            })
        );
        assert!(c.is_empty());
        assert!(!c.contains(&9));
    }

    #[test]
    fn test_extract_returns_minimum() {
        let mut c = by_last_digit();
        for n in [41, 11, 31, 21] {
            c.push(n).unwrap();
        }
        assert_eq!(c.extract_by_key(1), Some(11));
        assert_eq!(c.extract_by_key(1), Some(21));
        assert_eq!(c.len(), 2);
        assert_eq!(c.extract_by_key(7), None);
        assert_eq!(c.extract_by_key(100), None);
    }

    #[test]
    fn test_remove() {
        let mut c = by_last_digit();
        c.push(12).unwrap();
        c.push(22).unwrap();
        assert_eq!(c.remove(&12), Some(12));
        assert_eq!(c.remove(&12), None);
        assert_eq!(c.len(), 1);
        assert_eq!(c.remove(&22), Some(22));
        assert!(c.is_empty());
        assert_eq!(c.iter().count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut c = by_last_digit();
        c.push(1).unwrap();
        c.push(2).unwrap();
        c.first();
        c.clear();
        assert!(c.is_empty());
        assert!(c.current().is_none());
        assert!(c.next().is_none());
    }

    #[test]
    fn test_cursor_walks_bucket_order() {
        let mut c = by_last_digit();
        for n in [19, 3, 13, 40, 9] {
            c.push(n).unwrap();
        }

        let mut seen = Vec::new();
        let mut cur = c.first().copied();
        while let Some(n) = cur {
            seen.push(n);
            cur = c.next().copied();
        }
        // Bucket 0, then 3 (3 < 13), then 9 (9 < 19).
        assert_eq!(seen, vec![40, 3, 13, 9, 19]);

        // Exhausted cursor stays invalid.
        assert!(c.current().is_none());
        assert!(c.next().is_none());
    }

    #[test]
    fn test_cursor_current_does_not_advance() {
        let mut c = by_last_digit();
        c.push(1).unwrap();
        c.push(2).unwrap();
        assert_eq!(c.first(), Some(&1));
        assert_eq!(c.current(), Some(&1));
        assert_eq!(c.current(), Some(&1));
        assert_eq!(c.next(), Some(&2));
        assert_eq!(c.current(), Some(&2));
    }

    #[test]
    fn test_cursor_on_empty() {
        let mut c = by_last_digit();
        assert!(c.first().is_none());
        assert!(c.next().is_none());
        assert!(c.current().is_none());
    }

    #[test]
    fn test_next_without_first() {
        let mut c = by_last_digit();
        c.push(4).unwrap();
        assert!(c.next().is_none());
    }

    #[test]
    fn test_iter_matches_cursor() {
        let mut c = by_last_digit();
        for n in [7, 17, 2, 50] {
            c.push(n).unwrap();
        }
        let from_iter: Vec<u32> = c.iter().copied().collect();
        assert_eq!(from_iter, vec![50, 2, 7, 17]);
    }
}
