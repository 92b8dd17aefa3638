// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the block allocator.

use crate::BlockHandle;

/// Errors that can occur while managing users, trust and blocks.
///
/// Every error is returned to the caller; none leaves the allocator in a
/// partially updated state.
#[derive(Debug, thiserror::Error)]
pub enum MemCacheError {
    /// The name is not exactly eight ASCII letters or digits.
    #[error("illegal username '{0}': expected exactly 8 ASCII letters or digits")]
    IllegalUsername(String),

    /// A size or limit was zero or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A block mode other than `'U'`, `'G'` or `'A'` was requested.
    #[error("invalid block mode {0:?}: expected 'U', 'G' or 'A'")]
    InvalidMode(char),

    /// The user is not registered.
    #[error("user '{0}' not found")]
    UserNotFound(String),

    /// The handle does not name a currently allocated block.
    #[error("{0} is not an allocated block")]
    BlockNotAllocated(BlockHandle),

    /// The requester may not modify or release the block.
    #[error("user '{user}' has no access to {block}")]
    PermissionDenied { user: String, block: BlockHandle },

    /// A user with this name is already registered.
    #[error("username '{0}' is already used")]
    UsernameAlreadyUsed(String),

    /// The allocation would exceed the user's remaining quota.
    #[error("quota exceeded for '{user}': requested {requested_bytes} bytes, but only {available_bytes} available")]
    QuotaExceeded {
        user: String,
        requested_bytes: usize,
        available_bytes: usize,
    },

    /// Backing memory or bookkeeping storage could not be obtained.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// A block index rejected an insertion.
    #[error("block index error: {0}")]
    Index(#[from] containers::CacheError),

    /// The trust graph rejected an update.
    #[error("trust graph error: {0}")]
    Graph(#[from] containers::GraphError),

    /// Configuration could not be read or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`MemCacheError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    PermissionDenied,
    AlreadyExists,
    QuotaExhausted,
    OutOfMemory,
}

impl MemCacheError {
    /// Returns the error's kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalUsername(_)
            | Self::InvalidArgument(_)
            | Self::InvalidMode(_)
            | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::UserNotFound(_) | Self::BlockNotAllocated(_) => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::UsernameAlreadyUsed(_) => ErrorKind::AlreadyExists,
            Self::QuotaExceeded { .. } => ErrorKind::QuotaExhausted,
            Self::OutOfMemory(_) | Self::Index(_) | Self::Graph(_) => ErrorKind::OutOfMemory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            MemCacheError::IllegalUsername("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            MemCacheError::BlockNotAllocated(BlockHandle::from_index(3)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            MemCacheError::Index(containers::CacheError::AlreadyExists { key: 1 }).kind(),
            ErrorKind::OutOfMemory
        );
    }

    #[test]
    fn test_display() {
        let err = MemCacheError::QuotaExceeded {
            user: "jbond007".into(),
            requested_bytes: 20,
            available_bytes: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("jbond007"));
        assert!(msg.contains("20"));
        assert!(msg.contains("5 available"));
    }
}
