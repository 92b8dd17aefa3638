// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Backing storage for blocks.
//!
//! The arena owns one heap region per live block (allocated or
//! free-cached), indexed by [`BlockHandle`]. Releasing a block drops its
//! region and marks the slot vacant; the lowest vacant slot is handed out
//! first on the next fresh allocation.

use crate::block::{BlockHeader, BlockMode, HEADER_LEN};
use crate::{BlockHandle, MemCacheError};
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub(crate) struct BlockArena {
    slots: Vec<Option<Box<[u8]>>>,
    vacant: BTreeSet<usize>,
    /// Header + payload bytes currently held.
    resident_bytes: usize,
}

impl BlockArena {
    /// Obtains a zeroed region for a `size`-byte payload plus its header.
    pub(crate) fn allocate(&mut self, size: usize) -> Result<BlockHandle, MemCacheError> {
        let total = HEADER_LEN + size;

        let mut region = Vec::new();
        region.try_reserve_exact(total).map_err(|e| {
            MemCacheError::OutOfMemory(format!("cannot reserve {total} bytes for a block: {e}"))
        })?;
        region.resize(total, 0);
        let region = region.into_boxed_slice();

        let index = match self.vacant.pop_first() {
            Some(index) => {
                self.slots[index] = Some(region);
                index
            }
            None => {
                self.slots.try_reserve(1).map_err(|e| {
                    MemCacheError::OutOfMemory(format!("cannot grow block arena: {e}"))
                })?;
                self.slots.push(Some(region));
                self.slots.len() - 1
            }
        };

        self.resident_bytes += total;
        Ok(BlockHandle::from_index(index))
    }

    /// Drops the block's region. Returns `false` if the slot was empty.
    pub(crate) fn release(&mut self, handle: BlockHandle) -> bool {
        let Some(region) = self.slots.get_mut(handle.index()).and_then(Option::take) else {
            return false;
        };
        self.resident_bytes -= region.len();
        self.vacant.insert(handle.index());
        true
    }

    /// Releases every region.
    pub(crate) fn clear(&mut self) -> usize {
        let live = self.live_blocks();
        self.slots.clear();
        self.vacant.clear();
        self.resident_bytes = 0;
        live
    }

    pub(crate) fn region(&self, handle: BlockHandle) -> Option<&[u8]> {
        self.slots.get(handle.index())?.as_deref()
    }

    pub(crate) fn region_mut(&mut self, handle: BlockHandle) -> Option<&mut [u8]> {
        self.slots.get_mut(handle.index())?.as_deref_mut()
    }

    pub(crate) fn header(&self, handle: BlockHandle) -> Option<BlockHeader> {
        BlockHeader::decode(self.region(handle)?)
    }

    /// Rewrites the full header of a block.
    pub(crate) fn write_header(&mut self, handle: BlockHandle, header: &BlockHeader) -> bool {
        match self.region_mut(handle) {
            Some(region) => {
                header.write_to(region);
                true
            }
            None => false,
        }
    }

    pub(crate) fn write_mode(&mut self, handle: BlockHandle, mode: BlockMode) -> bool {
        match self.region_mut(handle) {
            Some(region) => {
                BlockHeader::write_mode(region, mode);
                true
            }
            None => false,
        }
    }

    pub(crate) fn live_blocks(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub(crate) fn resident_bytes(&self) -> usize {
        self.resident_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Username;

    #[test]
    fn test_fresh_region_is_zeroed() {
        let mut arena = BlockArena::default();
        let h = arena.allocate(32).unwrap();
        let region = arena.region(h).unwrap();
        assert_eq!(region.len(), HEADER_LEN + 32);
        assert!(region.iter().all(|&b| b == 0));
        assert_eq!(arena.resident_bytes(), HEADER_LEN + 32);
    }

    #[test]
    fn test_release_recycles_lowest_slot() {
        let mut arena = BlockArena::default();
        let a = arena.allocate(1).unwrap();
        let b = arena.allocate(1).unwrap();
        let c = arena.allocate(1).unwrap();
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));

        assert!(arena.release(c));
        assert!(arena.release(a));
        assert!(!arena.release(a));
        assert!(arena.region(a).is_none());
        assert_eq!(arena.live_blocks(), 1);

        assert_eq!(arena.allocate(4).unwrap(), a);
        assert_eq!(arena.allocate(4).unwrap(), c);
        assert_eq!(arena.allocate(4).unwrap().index(), 3);
    }

    #[test]
    fn test_header_roundtrip() {
        let mut arena = BlockArena::default();
        let h = arena.allocate(10).unwrap();
        let header = BlockHeader {
            size: 10,
            mode: BlockMode::Owner,
            owner: Username::parse("jbond007").unwrap(),
        };
        assert!(arena.write_header(h, &header));
        assert!(arena.write_mode(h, BlockMode::Group));
        assert_eq!(arena.header(h).unwrap().mode, BlockMode::Group);
        assert_eq!(arena.header(h).unwrap().owner, header.owner);
    }

    #[test]
    fn test_unknown_handle() {
        let mut arena = BlockArena::default();
        let h = BlockHandle::from_index(9);
        assert!(arena.region(h).is_none());
        assert!(arena.header(h).is_none());
        assert!(!arena.write_mode(h, BlockMode::Everyone));
    }

    #[test]
    fn test_clear() {
        let mut arena = BlockArena::default();
        arena.allocate(5).unwrap();
        let b = arena.allocate(5).unwrap();
        arena.release(b);
        assert_eq!(arena.clear(), 1);
        assert_eq!(arena.resident_bytes(), 0);
        assert_eq!(arena.allocate(1).unwrap().index(), 0);
    }
}
