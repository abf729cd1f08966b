use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

use crate::constants::DMA_POOL_SLOT_ALIGN;

use super::{BufferAllocator, MemCaps};

/// One DMA-capable buffer slot, cache-line aligned.
#[repr(C, align(64))]
struct Slot<const BYTES: usize>([u8; BYTES]);

impl<const BYTES: usize> Slot<BYTES> {
    const ZERO: Self = Slot([0; BYTES]);
}

/// Lock-free pool of fixed-size DMA buffers.
///
/// An atomic bitmap tracks which slots are allocated, so allocation and
/// release are safe from any context. Each slot is `SLOT_BYTES` long and
/// [`DMA_POOL_SLOT_ALIGN`]-aligned. At most 32 slots.
pub struct DmaBufferPool<const SLOTS: usize, const SLOT_BYTES: usize> {
    /// Bit N = 1 means slot N is allocated.
    bitmap: AtomicU32,
    storage: UnsafeCell<[Slot<SLOT_BYTES>; SLOTS]>,
}

// SAFETY: shared state is the atomic bitmap. A slot's storage is only
// reachable through the single `DmaBlock` that claimed its bit.
unsafe impl<const SLOTS: usize, const SLOT_BYTES: usize> Sync for DmaBufferPool<SLOTS, SLOT_BYTES> {}

impl<const SLOTS: usize, const SLOT_BYTES: usize> DmaBufferPool<SLOTS, SLOT_BYTES> {
    const SLOTS_FIT_BITMAP: () = assert!(SLOTS <= 32, "DmaBufferPool supports at most 32 slots");

    /// Create a pool with every slot free.
    #[allow(clippy::let_unit_value)]
    pub const fn new() -> Self {
        let () = Self::SLOTS_FIT_BITMAP;
        DmaBufferPool {
            bitmap: AtomicU32::new(0),
            storage: UnsafeCell::new([Slot::<SLOT_BYTES>::ZERO; SLOTS]),
        }
    }

    /// Bytes available in each slot.
    pub const fn slot_bytes(&self) -> usize {
        SLOT_BYTES
    }

    /// Claim a free slot and zero its first `len` bytes.
    fn claim(&self, len: usize) -> Option<u8> {
        loop {
            let bitmap = self.bitmap.load(Ordering::Acquire);
            let slot = (!bitmap).trailing_zeros();
            if slot as usize >= SLOTS {
                return None;
            }
            let bit = 1u32 << slot;
            match self.bitmap.compare_exchange_weak(
                bitmap,
                bitmap | bit,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    // SAFETY: the CAS above made this slot exclusively ours.
                    unsafe { (&mut *self.slot_ptr(slot as u8))[..len].fill(0) };
                    return Some(slot as u8);
                }
                Err(_) => continue,
            }
        }
    }

    fn release(&self, slot: u8) {
        let bit = 1u32 << slot;
        let old = self.bitmap.fetch_and(!bit, Ordering::Release);
        debug_assert!(old & bit != 0, "release of a free dma slot");
    }

    /// # Safety
    ///
    /// The slot must be allocated and owned by the caller.
    unsafe fn slot_ptr(&self, slot: u8) -> *mut [u8; SLOT_BYTES] {
        debug_assert!((slot as usize) < SLOTS);
        let storage = self.storage.get();
        unsafe { core::ptr::addr_of_mut!((*storage)[slot as usize].0) }
    }

    /// Number of slots currently handed out.
    pub fn allocated_count(&self) -> u32 {
        self.bitmap.load(Ordering::Acquire).count_ones()
    }
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> Default for DmaBufferPool<SLOTS, SLOT_BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const SLOTS: usize, const SLOT_BYTES: usize> BufferAllocator for &'a DmaBufferPool<SLOTS, SLOT_BYTES> {
    type Block = DmaBlock<'a, SLOTS, SLOT_BYTES>;

    fn alloc(&self, size: usize, align: usize, caps: MemCaps) -> Option<Self::Block> {
        // Every slot is DMA reachable, so plain RAM requests are served too.
        let _ = caps;
        if size == 0 || size > SLOT_BYTES || align > DMA_POOL_SLOT_ALIGN {
            return None;
        }
        let pool: &'a DmaBufferPool<SLOTS, SLOT_BYTES> = *self;
        pool.claim(size).map(|slot| DmaBlock { pool, slot, len: size })
    }
}

/// Exclusive handle to a pool slot, `len` bytes long.
///
/// Dropping the handle returns the slot to the pool.
pub struct DmaBlock<'a, const SLOTS: usize, const SLOT_BYTES: usize> {
    pool: &'a DmaBufferPool<SLOTS, SLOT_BYTES>,
    slot: u8,
    len: usize,
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> DmaBlock<'_, SLOTS, SLOT_BYTES> {
    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// Bus address of the first byte, as programmed into a DMA engine.
    pub fn address(&self) -> usize {
        self.as_ptr() as usize
    }
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> Deref for DmaBlock<'_, SLOTS, SLOT_BYTES> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: we hold the slot exclusively until drop.
        unsafe { &(&*self.pool.slot_ptr(self.slot))[..self.len] }
    }
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> DerefMut for DmaBlock<'_, SLOTS, SLOT_BYTES> {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: we hold the slot exclusively until drop.
        unsafe { &mut (&mut *self.pool.slot_ptr(self.slot))[..self.len] }
    }
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> AsRef<[u8]> for DmaBlock<'_, SLOTS, SLOT_BYTES> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> AsMut<[u8]> for DmaBlock<'_, SLOTS, SLOT_BYTES> {
    fn as_mut(&mut self) -> &mut [u8] {
        self
    }
}

impl<const SLOTS: usize, const SLOT_BYTES: usize> Drop for DmaBlock<'_, SLOTS, SLOT_BYTES> {
    fn drop(&mut self) {
        self.pool.release(self.slot);
    }
}
