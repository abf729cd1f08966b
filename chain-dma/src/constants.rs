/// Number of HD/A output gateways (host output and link output share numbering).
pub const HDA_OUTPUT_GATEWAYS: u32 = 9;

/// Number of HD/A input gateways.
pub const HDA_INPUT_GATEWAYS: u32 = 7;

/// Highest host DMA id accepted when creating a chain.
pub const MAX_CHAIN_NUMBER: u32 = HDA_OUTPUT_GATEWAYS + HDA_INPUT_GATEWAYS;

/// Capture FIFO multiplier. L1 exit can stall the link for several milliseconds.
pub const CAPTURE_FIFO_SCALE: u32 = 5;

/// Playback FIFO multiplier numerator (2 ms default becomes 5 ms).
pub const PLAYBACK_FIFO_SCALE_NUM: u32 = 5;

/// Playback FIFO multiplier denominator.
///
/// The playback FIFO must stay below half of the host ping-pong buffer,
/// otherwise position reporting breaks.
pub const PLAYBACK_FIFO_SCALE_DEN: u32 = 2;

/// Default processing byte alignment (no constraint).
pub const DEFAULT_BYTE_ALIGN: u32 = 1;

/// Default processing frame alignment (no constraint).
pub const DEFAULT_FRAME_ALIGN: u32 = 1;

/// Alignment guaranteed for every slot of a [`DmaBufferPool`](crate::memory::DmaBufferPool).
pub const DMA_POOL_SLOT_ALIGN: usize = 64;
