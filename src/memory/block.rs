use crate::process::Pid;

/// An address within the memory arena, in bytes.
pub type BlockAddr = u64;

/// A contiguous region of the memory arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    pub start: BlockAddr,
    pub size: u64,
    pub owner: Option<Pid>,
}

impl MemoryBlock {
    /// Constructs an unowned block.
    pub fn free(start: BlockAddr, size: u64) -> Self {
        Self {
            start,
            size,
            owner: None,
        }
    }

    /// Returns the address one past the last byte of the block.
    pub fn end(&self) -> BlockAddr {
        self.start + self.size
    }

    /// Returns the address of the last byte of the block.
    pub fn last(&self) -> BlockAddr {
        self.end() - 1
    }

    pub fn is_free(&self) -> bool {
        self.owner.is_none()
    }

    /// Returns the block as a (start, end) span.
    pub fn span(&self) -> (BlockAddr, BlockAddr) {
        (self.start, self.end())
    }
}
