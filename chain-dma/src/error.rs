//! Error types shared by the stream, DMA and chain layers.

use thiserror::Error;

use crate::dma::DmaStatus;

/// Errors returned by [`AudioStream`](crate::stream::AudioStream) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    /// No format descriptor was supplied.
    #[error("invalid argument: missing stream parameters")]
    InvalidArgument,

    /// Not enough free space for the requested write.
    #[error("buffer overrun: not enough free space")]
    Overrun,
}

/// Errors reported by a [`DmaChannel`](crate::dma::DmaChannel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DmaError {
    /// Hardware xrun. The engine still reports its current status.
    #[error("dma xrun (pending {} bytes, free {} bytes)", .0.pending_length, .0.free)]
    Xrun(DmaStatus),

    /// The channel is busy or in the wrong state for the request.
    #[error("dma channel busy")]
    Busy,

    /// The request was rejected by the driver.
    #[error("invalid dma request")]
    InvalidArgument,

    /// Driver specific failure code.
    #[error("dma i/o error {0}")]
    Io(i32),
}

impl DmaError {
    /// Whether this is the non-fatal xrun value.
    pub fn is_xrun(&self) -> bool {
        matches!(self, DmaError::Xrun(_))
    }
}

/// Error returned when the periodic task scheduler refuses a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("low-latency scheduler rejected the task")]
pub struct ScheduleError;

/// Errors returned by [`ChainDma`](crate::chain::ChainDma) lifecycle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainError {
    /// DMA id does not map to an HD/A gateway.
    #[error("dma id {0} does not name an hd/a gateway")]
    InvalidGateway(u32),

    /// Host and link gateways do not form a playback or capture pair.
    #[error("host and link gateways cannot be chained")]
    MismatchedGateways,

    /// The requested FIFO size scales to an empty buffer.
    #[error("invalid fifo size {0}")]
    InvalidFifoSize(u32),

    /// The intermediate buffer could not be allocated.
    #[error("failed to allocate dma buffer")]
    NoMemory,

    /// Trigger command not handled by a chain.
    #[error("unsupported trigger command")]
    InvalidTrigger,

    /// A DMA channel operation failed.
    #[error("dma error: {0}")]
    Dma(#[from] DmaError),

    /// Task scheduler registration failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl ChainError {
    /// Whether retrying (or simply continuing) is expected to succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChainError::Dma(DmaError::Xrun(_)))
    }
}
