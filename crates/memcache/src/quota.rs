// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-user quota values and human-readable parsing.
//!
//! A [`Quota`] is the most a user may hold allocated at once. Configuration
//! files spell quotas the way people do (`"4K"`, `"1M"`); this module turns
//! them into byte counts.

use crate::MemCacheError;
use std::fmt;

/// A per-user memory quota in bytes.
///
/// # Parsing
/// Accepts an optional binary suffix:
/// - `"512"` or `"512B"` → 512 bytes
/// - `"4K"` or `"4KB"` → 4 × 1024 bytes
/// - `"1M"` or `"1MB"` → 1 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
///
/// # Examples
/// ```
/// use memcache::Quota;
///
/// assert_eq!(Quota::parse("1000").unwrap().as_bytes(), 1000);
/// assert_eq!(Quota::parse("4K").unwrap().as_bytes(), 4096);
/// assert!(Quota::parse("0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Quota {
    bytes: usize,
}

impl Quota {
    /// Creates a quota from a byte count.
    pub fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a quota from kilobytes, saturating at `usize::MAX` bytes.
    pub fn from_kb(kb: usize) -> Self {
        Self {
            bytes: kb.saturating_mul(1024),
        }
    }

    /// Returns the quota in bytes.
    pub fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Parses a human-readable quota string. Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, MemCacheError> {
        let s = s.trim();
        let upper = s.to_ascii_uppercase();

        let (digits, multiplier) = [
            ("GB", 1 << 30),
            ("G", 1 << 30),
            ("MB", 1 << 20),
            ("M", 1 << 20),
            ("KB", 1 << 10),
            ("K", 1 << 10),
            ("B", 1),
        ]
        .iter()
        .find(|(suffix, _)| upper.ends_with(*suffix))
        .map_or((s, 1usize), |(suffix, mult)| {
            (&s[..s.len() - suffix.len()], *mult)
        });

        let value: usize = digits.trim().parse().map_err(|_| {
            MemCacheError::InvalidArgument(format!(
                "invalid quota '{s}': expected a number with an optional K, M or G suffix"
            ))
        })?;

        let bytes = value
            .checked_mul(multiplier)
            .ok_or_else(|| MemCacheError::InvalidArgument(format!("quota overflow: '{s}'")))?;

        if bytes == 0 {
            return Err(MemCacheError::InvalidArgument(format!(
                "quota must be positive: '{s}'"
            )));
        }

        Ok(Self { bytes })
    }
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.bytes >= 1 << 20 && self.bytes % (1 << 20) == 0 {
            write!(f, "{} MB", self.bytes >> 20)
        } else if self.bytes >= 1 << 10 && self.bytes % (1 << 10) == 0 {
            write!(f, "{} KB", self.bytes >> 10)
        } else {
            write!(f, "{} B", self.bytes)
        }
    }
}
