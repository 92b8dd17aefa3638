// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Allocator configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! cacheable_threshold = 256
//! allocated_buckets = 65536
//!
//! [[users]]
//! name = "jbond007"
//! limit = "1000"
//!
//! [[users]]
//! name = "j0walker"
//! limit = "4K"
//!
//! [[trust]]
//! truster = "jbond007"
//! trustee = "j0walker"
//! ```

use crate::block::MAX_BLOCK_SIZE;
use crate::{MemCacheError, Quota};
use std::path::Path;

/// Largest block size kept in the free cache by default.
pub const DEFAULT_CACHEABLE_THRESHOLD: usize = 256;

/// Default number of buckets in the allocated-block index.
pub const DEFAULT_ALLOCATED_BUCKETS: usize = 1 << 16;

/// Configuration for a [`MemCache`](crate::MemCache).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MemCacheConfig {
    /// Blocks of at most this many bytes are kept for reuse when freed.
    #[serde(default = "default_threshold")]
    pub cacheable_threshold: usize,
    /// Bucket count of the allocated-block index.
    #[serde(default = "default_buckets")]
    pub allocated_buckets: usize,
    /// Users registered when the cache is built with
    /// [`MemCache::from_config`](crate::MemCache::from_config).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<UserEntry>,
    /// Trust edges applied after `users`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trust: Vec<TrustEntry>,
}

/// A user to register at startup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UserEntry {
    pub name: String,
    /// Human-readable quota, e.g. `"1000"` or `"4K"`.
    pub limit: String,
}

/// A trust edge to establish at startup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TrustEntry {
    pub truster: String,
    pub trustee: String,
}

fn default_threshold() -> usize {
    DEFAULT_CACHEABLE_THRESHOLD
}

fn default_buckets() -> usize {
    DEFAULT_ALLOCATED_BUCKETS
}

impl MemCacheConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, MemCacheError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MemCacheError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, MemCacheError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| MemCacheError::Config(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, MemCacheError> {
        toml::to_string_pretty(self)
            .map_err(|e| MemCacheError::Config(format!("TOML serialise error: {e}")))
    }

    /// Checks the sizing parameters.
    pub fn validate(&self) -> Result<(), MemCacheError> {
        if self.cacheable_threshold == 0 || self.cacheable_threshold > MAX_BLOCK_SIZE {
            return Err(MemCacheError::Config(format!(
                "cacheable_threshold must be in 1..={MAX_BLOCK_SIZE}, got {}",
                self.cacheable_threshold
            )));
        }
        if self.allocated_buckets == 0 {
            return Err(MemCacheError::Config(
                "allocated_buckets must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Parses every user's quota string.
    pub fn user_quotas(&self) -> Result<Vec<(&str, Quota)>, MemCacheError> {
        self.users
            .iter()
            .map(|u| {
                let quota = Quota::parse(&u.limit).map_err(|e| {
                    MemCacheError::Config(format!("user '{}': {e}", u.name))
                })?;
                Ok((u.name.as_str(), quota))
            })
            .collect()
    }
}

impl Default for MemCacheConfig {
    fn default() -> Self {
        Self {
            cacheable_threshold: DEFAULT_CACHEABLE_THRESHOLD,
            allocated_buckets: DEFAULT_ALLOCATED_BUCKETS,
            users: Vec::new(),
            trust: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = MemCacheConfig::default();
        assert_eq!(c.cacheable_threshold, 256);
        assert_eq!(c.allocated_buckets, 65536);
        assert!(c.users.is_empty());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
cacheable_threshold = 64

[[users]]
name = "jbond007"
limit = "1000"

[[users]]
name = "j0walker"
limit = "4K"

[[trust]]
truster = "jbond007"
trustee = "j0walker"
"#;
        let c = MemCacheConfig::from_toml(toml).unwrap();
        assert_eq!(c.cacheable_threshold, 64);
        assert_eq!(c.allocated_buckets, DEFAULT_ALLOCATED_BUCKETS);
        assert_eq!(c.users.len(), 2);
        assert_eq!(c.trust[0].trustee, "j0walker");

        let quotas = c.user_quotas().unwrap();
        assert_eq!(quotas[0], ("jbond007", Quota::from_bytes(1000)));
        assert_eq!(quotas[1], ("j0walker", Quota::from_kb(4)));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let c = MemCacheConfig::from_toml("").unwrap();
        assert_eq!(c, MemCacheConfig::default());
    }

    #[test]
    fn test_invalid_sizes() {
        assert!(MemCacheConfig::from_toml("cacheable_threshold = 0").is_err());
        assert!(MemCacheConfig::from_toml("allocated_buckets = 0").is_err());

        let too_large = MemCacheConfig {
            cacheable_threshold: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(too_large.validate(), Err(MemCacheError::Config(_))));

        let largest = MemCacheConfig {
            cacheable_threshold: MAX_BLOCK_SIZE,
            ..Default::default()
        };
        assert!(largest.validate().is_ok());
    }

    #[test]
    fn test_bad_quota() {
        let toml = r#"
[[users]]
name = "jbond007"
limit = "plenty"
"#;
        let c = MemCacheConfig::from_toml(toml).unwrap();
        assert!(matches!(c.user_quotas(), Err(MemCacheError::Config(_))));
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = MemCacheConfig {
            cacheable_threshold: 128,
            users: vec![UserEntry {
                name: "gammaray".into(),
                limit: "100".into(),
            }],
            ..Default::default()
        };
        let toml = c.to_toml().unwrap();
        let back = MemCacheConfig::from_toml(&toml).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_from_missing_file() {
        let err = MemCacheConfig::from_file(Path::new("/nonexistent/memcache.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
