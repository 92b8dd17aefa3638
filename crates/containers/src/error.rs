// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the containers.

/// Errors returned by [`BucketedCache`](crate::BucketedCache).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// The key function mapped an element outside `0..num_buckets`.
    #[error("bucket key {key} out of range (cache has {num_buckets} buckets)")]
    KeyOutOfRange { key: usize, num_buckets: usize },

    /// An equal element is already stored in its bucket.
    #[error("element already present in bucket {key}")]
    AlreadyExists { key: usize },
}

/// Errors returned by [`DirectedGraph`](crate::DirectedGraph).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The vertex is already part of the graph.
    #[error("vertex already exists")]
    VertexAlreadyExists,

    /// An operation referenced a vertex that is not in the graph.
    #[error("vertex does not exist")]
    VertexNotFound,
}
