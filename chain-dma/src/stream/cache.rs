//! Data cache maintenance for buffers shared with DMA engines.
//!
//! DMA engines bypass the DSP data cache. Before reading data a DMA engine
//! produced, the covered lines must be invalidated; after the CPU wrote data
//! a DMA engine will consume, the lines must be written back. The stream
//! issues these calls with the same head/tail split it uses for copies.

/// Platform cache maintenance capability.
pub trait CacheOps {
    /// Drop cached lines covering `region` so the next read hits memory.
    fn invalidate_region(&self, region: &[u8]);

    /// Flush dirty cached lines covering `region` to memory.
    fn writeback_region(&self, region: &[u8]);
}

/// Cache operations for coherent platforms. Compiles to nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheOps for NoCache {
    #[inline(always)]
    fn invalidate_region(&self, _region: &[u8]) {}

    #[inline(always)]
    fn writeback_region(&self, _region: &[u8]) {}
}
