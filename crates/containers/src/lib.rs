// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # containers
//!
//! The two generic containers the `memcache` allocator is assembled from.
//!
//! - [`BucketedCache`]: a fixed array of ordered sets. Every element is
//!   routed to a bucket by a caller-supplied key function, and each bucket
//!   keeps its elements in `Ord` order. Supports push, extract-by-key,
//!   membership, clear, and a bucket-ordered first/next/current cursor.
//! - [`DirectedGraph`]: a vertex set plus a set of directed edges. Removing
//!   a vertex cascades to every edge incident to it.
//!
//! Ordered sets and key/value maps are the standard library's
//! `BTreeSet` and `HashMap`.
//!
//! # Example
//! ```
//! use containers::BucketedCache;
//!
//! // Bucket numbers by their last decimal digit.
//! let mut cache = BucketedCache::new(10, |n: &u32| (*n % 10) as usize);
//! cache.push(42).unwrap();
//! cache.push(12).unwrap();
//! cache.push(7).unwrap();
//!
//! // The comparator-minimum of bucket 2 comes out first.
//! assert_eq!(cache.extract_by_key(2), Some(12));
//! assert_eq!(cache.extract_by_key(2), Some(42));
//! assert_eq!(cache.extract_by_key(2), None);
//! ```

mod bucketed;
mod error;
mod graph;

pub use bucketed::BucketedCache;
pub use error::{CacheError, GraphError};
pub use graph::DirectedGraph;
