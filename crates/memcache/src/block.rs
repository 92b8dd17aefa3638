// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Block handles, access modes and the in-memory header layout.
//!
//! Every block is one contiguous byte region: a fixed [`HEADER_LEN`]-byte
//! header immediately followed by the payload handed to the caller.
//!
//! ```text
//! offset  0      4     5      6                14    15    16
//!         ┌──────┬─────┬──────┬─────────────────┬─────┬─────┬────────────
//!         │ size │  0  │ mode │ owner (8 bytes) │  0  │  0  │ payload …
//!         └──────┴─────┴──────┴─────────────────┴─────┴─────┴────────────
//!           i32          U/G/A   alphanumerics    NUL   pad   `size` bytes
//! ```
//!
//! `size` is a native-endian 4-byte integer. Header fields sit at fixed
//! negative offsets from the payload start, e.g. the mode byte is at
//! `payload - 11`.

use crate::user::{Username, USERNAME_LEN};
use crate::MemCacheError;
use std::fmt;

const SIZE_OFFSET: usize = 0;
const SIZE_LEN: usize = 4;
const MODE_OFFSET: usize = SIZE_OFFSET + SIZE_LEN + 1;
const OWNER_OFFSET: usize = MODE_OFFSET + 1;
const OWNER_NUL_OFFSET: usize = OWNER_OFFSET + USERNAME_LEN;

/// Length of the header preceding every payload.
pub const HEADER_LEN: usize = OWNER_NUL_OFFSET + 2;

/// Largest payload the 4-byte size field can describe.
pub const MAX_BLOCK_SIZE: usize = i32::MAX as usize;

/// Opaque reference to a block.
///
/// A handle names an arena slot. Slots are recycled: once a block is
/// freed, its handle may later name a different block. Do not hold a
/// handle across `free` or `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHandle(usize);

impl BlockHandle {
    /// Builds a handle for arena slot `index`.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena slot this handle names.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block #{}", self.0)
    }
}

/// Who may release a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockMode {
    /// Only the owner (`'U'`).
    Owner,
    /// The owner and every user the owner trusts (`'G'`).
    Group,
    /// Every registered user (`'A'`).
    Everyone,
}

impl BlockMode {
    /// Returns the mode's header byte.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Owner => b'U',
            Self::Group => b'G',
            Self::Everyone => b'A',
        }
    }

    /// Returns the mode's character.
    pub fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Decodes a header byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'U' => Some(Self::Owner),
            b'G' => Some(Self::Group),
            b'A' => Some(Self::Everyone),
            _ => None,
        }
    }
}

impl TryFrom<char> for BlockMode {
    type Error = MemCacheError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        u8::try_from(c)
            .ok()
            .and_then(Self::from_byte)
            .ok_or(MemCacheError::InvalidMode(c))
    }
}

impl fmt::Display for BlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Decoded block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Payload size in bytes.
    pub size: usize,
    pub mode: BlockMode,
    pub owner: Username,
}

impl BlockHeader {
    /// Writes the header into the first [`HEADER_LEN`] bytes of `region`.
    ///
    /// # Panics
    /// Panics if `region` is shorter than the header.
    pub(crate) fn write_to(&self, region: &mut [u8]) {
        let header = &mut region[..HEADER_LEN];
        header.fill(0);
        // Callers validate `size` against MAX_BLOCK_SIZE.
        let size = self.size as i32;
        header[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN].copy_from_slice(&size.to_ne_bytes());
        header[MODE_OFFSET] = self.mode.as_byte();
        header[OWNER_OFFSET..OWNER_NUL_OFFSET].copy_from_slice(self.owner.as_bytes());
    }

    /// Overwrites only the mode byte of an encoded header.
    pub(crate) fn write_mode(region: &mut [u8], mode: BlockMode) {
        region[MODE_OFFSET] = mode.as_byte();
    }

    /// Parses the header at the start of `region`.
    ///
    /// Returns `None` if the region is too short or any field is malformed,
    /// including the zero padding bytes.
    pub fn decode(region: &[u8]) -> Option<Self> {
        let header = region.get(..HEADER_LEN)?;

        let size_bytes: [u8; SIZE_LEN] = header[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN]
            .try_into()
            .ok()?;
        let size = i32::from_ne_bytes(size_bytes);
        if size <= 0 {
            return None;
        }

        let zero_padded = header[SIZE_OFFSET + SIZE_LEN] == 0
            && header[OWNER_NUL_OFFSET] == 0
            && header[OWNER_NUL_OFFSET + 1] == 0;
        if !zero_padded {
            return None;
        }

        Some(Self {
            size: size as usize,
            mode: BlockMode::from_byte(header[MODE_OFFSET])?,
            owner: Username::from_bytes(&header[OWNER_OFFSET..OWNER_NUL_OFFSET])?,
        })
    }
}
