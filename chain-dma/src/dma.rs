//! Narrow contract to a hardware DMA engine.
//!
//! The chain never touches engine registers. It configures a channel once,
//! then drives it with start/stop, a status snapshot per tick and `reload`
//! calls that advance the engine's working window.

use crate::error::DmaError;

/// Snapshot of a channel's transfer state.
///
/// Hardware moves on while the snapshot is being read; callers treat every
/// field as possibly stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DmaStatus {
    /// Bytes the engine can still read (filled, not yet transferred).
    pub pending_length: u32,
    /// Bytes the engine can still write.
    pub free: u32,
    /// Engine read offset in the buffer.
    pub read_position: u32,
    /// Engine write offset in the buffer.
    pub write_position: u32,
}

/// Transfer direction of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelDirection {
    /// Host memory into the DSP buffer (host output gateway).
    HostToMemory,
    /// DSP buffer out to host memory (host input gateway).
    MemoryToHost,
    /// DSP buffer out to the link (link output gateway).
    MemoryToPeripheral,
    /// Link into the DSP buffer (link input gateway).
    PeripheralToMemory,
}

/// One-time channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaConfig {
    pub direction: ChannelDirection,
    /// Container size in bytes.
    pub data_size: u32,
    /// Whole buffer length in bytes. Chains use a single block.
    pub block_size: u32,
    /// Bus address of the buffer.
    pub buffer_address: usize,
}

/// A hardware DMA channel.
pub trait DmaChannel {
    /// Channel index, used in log messages.
    fn index(&self) -> u32;

    /// Required buffer address alignment in bytes.
    fn address_alignment(&self) -> Result<u32, DmaError>;

    fn configure(&mut self, config: &DmaConfig) -> Result<(), DmaError>;

    fn start(&mut self) -> Result<(), DmaError>;

    fn stop(&mut self) -> Result<(), DmaError>;

    /// Read the current status.
    ///
    /// [`DmaError::Xrun`] carries the status read alongside the xrun and is
    /// not fatal. Every other error is.
    fn get_status(&mut self) -> Result<DmaStatus, DmaError>;

    /// Advance the engine's window by `len` bytes.
    fn reload(&mut self, offset: u32, len: u32) -> Result<(), DmaError>;

    /// Return the channel to the driver.
    fn release(&mut self);
}
