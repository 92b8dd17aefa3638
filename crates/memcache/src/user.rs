// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Usernames: exactly [`USERNAME_LEN`] ASCII alphanumerics.

use crate::MemCacheError;
use std::fmt;

/// Fixed length of every username, in bytes.
pub const USERNAME_LEN: usize = 8;

/// A validated username. Stored inline, so it is `Copy`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username([u8; USERNAME_LEN]);

impl Username {
    /// Validates `name` and wraps it.
    ///
    /// # Examples
    /// ```
    /// use memcache::Username;
    ///
    /// assert!(Username::parse("jbond007").is_ok());
    /// assert!(Username::parse("jbond07").is_err());
    /// assert!(Username::parse("j_bond07").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, MemCacheError> {
        Self::from_bytes(name.as_bytes())
            .ok_or_else(|| MemCacheError::IllegalUsername(name.to_string()))
    }

    /// Wraps raw bytes if they form a legal username.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let name: [u8; USERNAME_LEN] = bytes.try_into().ok()?;
        name.iter()
            .all(u8::is_ascii_alphanumeric)
            .then_some(Self(name))
    }

    /// Returns the raw name bytes.
    pub fn as_bytes(&self) -> &[u8; USERNAME_LEN] {
        &self.0
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        // Alphanumeric ASCII is always valid UTF-8.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username({:?})", self.as_str())
    }
}

impl std::str::FromStr for Username {
    type Err = MemCacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_names() {
        for name in ["jbond007", "AxelRudi", "12345678", "aaaaaaa1"] {
            let user = Username::parse(name).unwrap();
            assert_eq!(user.as_str(), name);
            assert_eq!(user.to_string(), name);
        }
    }

    #[test]
    fn test_wrong_length() {
        assert!(Username::parse("").is_err());
        assert!(Username::parse("AxelRud").is_err());
        assert!(Username::parse("AxelRudiP").is_err());
    }

    #[test]
    fn test_every_non_alnum_byte_rejected() {
        for pos in 0..USERNAME_LEN {
            for byte in 0u8..=255 {
                if byte.is_ascii_alphanumeric() {
                    continue;
                }
                let mut name = *b"legal123";
                name[pos] = byte;
                assert!(Username::from_bytes(&name).is_none(), "byte {byte} at {pos}");
            }
        }
    }

    #[test]
    fn test_non_ascii_rejected() {
        // Eight chars, but more than eight bytes.
        assert!(Username::parse("jbönd007").is_err());
    }

    #[test]
    fn test_error_carries_name() {
        match Username::parse("bad name") {
            Err(MemCacheError::IllegalUsername(n)) => assert_eq!(n, "bad name"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_from_str() {
        let user: Username = "gammaray".parse().unwrap();
        assert_eq!(user.as_bytes(), b"gammaray");
    }
}
