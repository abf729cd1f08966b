//! DMA buffer allocation.
//!
//! The chain only needs one buffer per instance, sized from the FIFO
//! request. [`BufferAllocator`] is the seam to the platform heap;
//! [`DmaBufferPool`] is a static, lock-free implementation for targets
//! without one.
//!
//! ```ignore
//! static BUFFERS: DmaBufferPool<4, 8192> = DmaBufferPool::new();
//!
//! let mut chain = ChainDma::create(&cfg, host, link, &BUFFERS, services)?;
//! ```

mod pool;

pub use pool::{DmaBlock, DmaBufferPool};

/// Memory capability requested from the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemCaps {
    /// Reachable by the DMA engines.
    Dma,
    /// Ordinary data memory.
    Ram,
}

/// Source of DMA-capable buffers.
pub trait BufferAllocator {
    /// Owned buffer handle. Released when dropped.
    type Block: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocate `size` zero-initialised bytes aligned to `align`.
    fn alloc(&self, size: usize, align: usize, caps: MemCaps) -> Option<Self::Block>;

    /// Bus address of a block.
    fn address(block: &Self::Block) -> usize {
        block.as_ref().as_ptr() as usize
    }
}
