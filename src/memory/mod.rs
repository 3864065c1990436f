pub mod block;

pub use block::{BlockAddr, MemoryBlock};

use log::debug;

use crate::process::Pid;

/// A fixed-size byte arena handed out to processes in contiguous blocks.
///
/// Blocks are kept sorted by address and always partition the whole arena.
/// Allocation is first-fit; freeing coalesces with free neighbours but never compacts.
#[derive(Debug, Clone)]
pub struct Memory {
    size: u64,
    blocks: Vec<MemoryBlock>,
}

impl Memory {
    /// Constructs an arena of `size` bytes made of a single free block.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn new(size: u64) -> Self {
        assert!(size != 0, "memory arena must not be empty");
        Self {
            size,
            blocks: vec![MemoryBlock::free(0, size)],
        }
    }

    /// Allocates `size` bytes for `owner`, returning the start of the block.
    pub fn allocate(&mut self, size: u64, owner: Pid) -> Result<BlockAddr> {
        if size == 0 {
            return Err(Error::InvalidSize);
        }

        let idx = self
            .blocks
            .iter()
            .position(|block| block.is_free() && block.size >= size)
            .ok_or(Error::NoSpace)?;

        let block = &mut self.blocks[idx];
        let start = block.start;
        let remainder = block.size - size;
        block.size = size;
        block.owner = Some(owner);

        if remainder > 0 {
            debug!("splitting block at {start}: {size} allocated, {remainder} remaining");
            self.blocks
                .insert(idx + 1, MemoryBlock::free(start + size, remainder));
        }

        Ok(start)
    }

    /// Frees the block starting at `addr`, returning its former owner.
    pub fn free(&mut self, addr: BlockAddr) -> Result<Pid> {
        let mut idx = self
            .blocks
            .binary_search_by_key(&addr, |block| block.start)
            .map_err(|_| Error::AddrOutOfBounds)?;

        let owner = self.blocks[idx].owner.take().ok_or(Error::NotAllocated)?;

        // Merge with the following block
        if idx + 1 < self.blocks.len() && self.blocks[idx + 1].is_free() {
            let next = self.blocks.remove(idx + 1);
            self.blocks[idx].size += next.size;
            debug!("merged free block at {} into {}", next.start, addr);
        }

        // Merge into the preceding block
        if idx > 0 && self.blocks[idx - 1].is_free() {
            let this = self.blocks.remove(idx);
            idx -= 1;
            self.blocks[idx].size += this.size;
            debug!("merged free block at {} into {}", this.start, self.blocks[idx].start);
        }

        Ok(owner)
    }

    /// Returns the owner of the block starting at `addr`.
    pub fn owner_of(&self, addr: BlockAddr) -> Option<Pid> {
        self.blocks
            .binary_search_by_key(&addr, |block| block.start)
            .ok()
            .and_then(|idx| self.blocks[idx].owner)
    }

    /// Returns the blocks in ascending address order.
    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Returns the arena size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the number of free bytes, regardless of fragmentation.
    pub fn available(&self) -> u64 {
        self.blocks
            .iter()
            .filter(|block| block.is_free())
            .map(|block| block.size)
            .sum()
    }

    /// Checks that the blocks partition the arena.
    ///
    /// # Panics
    /// Panics if there is a gap, an overlap, an empty block or a pair of adjacent free blocks.
    pub fn check_invariants(&self) {
        let mut expected = 0;
        for pair in self.blocks.windows(2) {
            assert!(
                !(pair[0].is_free() && pair[1].is_free()),
                "adjacent free blocks at {} and {}",
                pair[0].start,
                pair[1].start
            );
        }
        for block in &self.blocks {
            let (start, end) = block.span();
            assert!(block.size > 0, "empty block at {start}");
            assert_eq!(start, expected, "block at {start} does not follow {expected}");
            expected = end;
        }
        assert_eq!(expected, self.size, "blocks do not cover the arena");
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    InvalidSize,
    NoSpace,
    AddrOutOfBounds,
    NotAllocated,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSize => write!(f, "allocation size must be positive"),
            Self::NoSpace => write!(f, "no free block is large enough"),
            Self::AddrOutOfBounds => write!(f, "address is not the start of a block"),
            Self::NotAllocated => write!(f, "block is not allocated"),
        }
    }
}

impl std::error::Error for Error {}
