//! Host/link DMA chain.
//!
//! A chain bridges one host gateway and one link gateway through a single
//! intermediate buffer without any processing in between. Both DMA engines
//! run on their own; a periodic task reads their status once per tick and
//! reloads each engine's window so data keeps flowing.
//!
//! ## Pacing
//!
//! | Direction | Host channel | Link channel | Per tick |
//! |-----------|--------------|--------------|----------|
//! | Capture | memory → host | link → memory | both reloaded by `min(host free, link avail)` |
//! | Playback | host → memory | memory → link | host refilled by what the link consumed; link advanced in half buffers |
//!
//! Playback holds the link back until the buffer has been more than half
//! filled once, then moves it strictly in half-buffer steps:
//!
//! ```text
//!  ┌──────── half A ────────┬──────── half B ────────┐
//!  │  link reads            │  host fills            │
//!  └────────────────────────┴────────────────────────┘
//! ```
//!
//! ## Errors
//!
//! A link xrun is logged, optionally reported once upstream, and otherwise
//! ignored. Any other status error, and every reload error, completes the
//! task; the chain then stays idle until started again.
//!
//! ## Locking
//!
//! [`CHAIN_LOCK`] serializes start/pause across every chain. It covers the
//! state change and the paired DMA start/stop calls only; the tick body runs
//! without it.

mod services;
mod task;

#[cfg(test)]
mod mock;


pub use services::{ChainServices, PowerManager, TaskScheduler, XrunKind, XrunNotification, XrunNotifier};
pub use task::{PeriodicTask, TaskOutcome, TaskState};

use crate::constants::{CAPTURE_FIFO_SCALE, MAX_CHAIN_NUMBER, PLAYBACK_FIFO_SCALE_DEN, PLAYBACK_FIFO_SCALE_NUM};
use crate::dma::{ChannelDirection, DmaChannel, DmaConfig, DmaStatus};
use crate::error::{ChainError, DmaError};
use crate::gateway::{self, ConnectorNodeId, GatewayClass, StreamDirection};
use crate::math;
use crate::memory::{BufferAllocator, MemCaps};
use crate::stream::{AudioStream, FrameFormat};

/// Subsystem lock shared by every chain.
pub static CHAIN_LOCK: spin::Mutex<()> = spin::Mutex::new(());

/// Chain creation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainDmaConfig {
    pub host_dma_id: u32,
    pub link_dma_id: u32,
    /// Requested FIFO in bytes, before direction scaling.
    pub fifo_size: u32,
    /// Small container size: 2-byte containers instead of 4.
    pub scs: bool,
}

/// Commands accepted by [`ChainDma::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCmd {
    Start,
    Pause,
    Stop,
    Reset,
    Prepare,
}

/// A running host/link bridge.
///
/// `H` and `L` are the host and link channels, `B` is the buffer handle
/// from the allocator, `S` provides notifications, power management and
/// scheduling.
pub struct ChainDma<H, L, B, S>
where
    H: DmaChannel,
    L: DmaChannel,
    B: AsRef<[u8]> + AsMut<[u8]>,
    S: ChainServices,
{
    host: H,
    link: L,
    host_node: ConnectorNodeId,
    link_node: ConnectorNodeId,
    direction: StreamDirection,
    stream: AudioStream<B>,
    services: S,
    state: TaskState,
    first_data_received: bool,
    xrun_notification_sent: bool,
}

impl<H, L, B, S> ChainDma<H, L, B, S>
where
    H: DmaChannel,
    L: DmaChannel,
    B: AsRef<[u8]> + AsMut<[u8]>,
    S: ChainServices,
{
    /// Validate the gateways, allocate the buffer and configure both channels.
    ///
    /// On failure both channels are released and nothing stays allocated.
    pub fn create<A>(
        config: &ChainDmaConfig,
        mut host: H,
        mut link: L,
        allocator: &A,
        services: S,
    ) -> Result<Self, ChainError>
    where
        A: BufferAllocator<Block = B>,
    {
        match Self::prepare(config, &mut host, &mut link, allocator) {
            Ok((host_node, link_node, direction, stream)) => {
                log::info!(
                    "Chain DMA: created {:?} chain host {} link {} ({} bytes)",
                    direction,
                    host.index(),
                    link.index(),
                    stream.size()
                );
                Ok(ChainDma {
                    host,
                    link,
                    host_node,
                    link_node,
                    direction,
                    stream,
                    services,
                    state: TaskState::Init,
                    first_data_received: false,
                    xrun_notification_sent: false,
                })
            }
            Err(e) => {
                log::error!("Chain DMA: create failed: {}", e);
                host.release();
                link.release();
                Err(e)
            }
        }
    }

    #[allow(clippy::type_complexity)]
    fn prepare<A>(
        config: &ChainDmaConfig,
        host: &mut H,
        link: &mut L,
        allocator: &A,
    ) -> Result<(ConnectorNodeId, ConnectorNodeId, StreamDirection, AudioStream<B>), ChainError>
    where
        A: BufferAllocator<Block = B>,
    {
        if config.host_dma_id >= MAX_CHAIN_NUMBER {
            return Err(ChainError::InvalidGateway(config.host_dma_id));
        }

        let host_node = ConnectorNodeId::resolve(config.host_dma_id, true)?;
        let link_node = ConnectorNodeId::resolve(config.link_dma_id, false)?;
        let direction = gateway::chain_direction(host_node, link_node)?;

        // Larger FIFO rides out L1 exit latency.
        let scaled = match direction {
            StreamDirection::Capture => config.fifo_size.checked_mul(CAPTURE_FIFO_SCALE),
            StreamDirection::Playback => config
                .fifo_size
                .checked_mul(PLAYBACK_FIFO_SCALE_NUM)
                .map(|v| v / PLAYBACK_FIFO_SCALE_DEN),
        };
        let addr_align = host.address_alignment()?;
        let fifo_size = match scaled.and_then(|v| math::align_up(v, addr_align)) {
            Some(size) if size > 0 => size,
            _ => return Err(ChainError::InvalidFifoSize(config.fifo_size)),
        };
        log::debug!(
            "Chain DMA: {:?} fifo {} -> {} bytes (alignment {})",
            direction,
            config.fifo_size,
            fifo_size,
            addr_align
        );

        let block = allocator
            .alloc(fifo_size as usize, addr_align as usize, MemCaps::Dma)
            .filter(|block| block.as_ref().len() >= fifo_size as usize)
            .ok_or(ChainError::NoMemory)?;
        let buffer_address = A::address(&block);

        let mut stream = AudioStream::init(block, fifo_size as usize);
        stream.set_frame_format(if config.scs { FrameFormat::S16Le } else { FrameFormat::S32Le });
        stream.data_mut().fill(0);

        let (host_direction, link_direction) = match direction {
            StreamDirection::Playback => (ChannelDirection::HostToMemory, ChannelDirection::MemoryToPeripheral),
            StreamDirection::Capture => (ChannelDirection::MemoryToHost, ChannelDirection::PeripheralToMemory),
        };
        let data_size = stream.sample_bytes() as u32;

        host.configure(&DmaConfig {
            direction: host_direction,
            data_size,
            block_size: fifo_size,
            buffer_address,
        })?;
        link.configure(&DmaConfig {
            direction: link_direction,
            data_size,
            block_size: fifo_size,
            buffer_address,
        })?;

        Ok((host_node, link_node, direction, stream))
    }

    /// Dispatch a pipeline trigger. Only start and pause apply to a chain.
    pub fn trigger(&mut self, cmd: TriggerCmd) -> Result<(), ChainError> {
        match cmd {
            TriggerCmd::Start => self.start(),
            TriggerCmd::Pause => self.pause(),
            _ => {
                log::error!("Chain DMA: unsupported trigger {:?}", cmd);
                Err(ChainError::InvalidTrigger)
            }
        }
    }

    /// Start both channels and register the periodic task.
    ///
    /// Playback starts host before link, capture link before host. If the
    /// second channel fails the first is stopped again. Starting a chain
    /// that is already queued does nothing.
    pub fn start(&mut self) -> Result<(), ChainError> {
        let _guard = CHAIN_LOCK.lock();

        if self.state == TaskState::Queued {
            return Ok(());
        }

        match self.direction {
            StreamDirection::Playback => {
                start_channel("host", &mut self.host)?;
                if let Err(e) = start_channel("link", &mut self.link) {
                    let _ = stop_channel("host", &mut self.host);
                    return Err(e);
                }
            }
            StreamDirection::Capture => {
                start_channel("link", &mut self.link)?;
                if let Err(e) = start_channel("host", &mut self.host) {
                    let _ = stop_channel("link", &mut self.link);
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.services.schedule() {
            log::error!("Chain DMA: {}", e);
            let _ = self.stop_channels();
            return Err(e.into());
        }

        self.state = TaskState::Queued;
        self.services.idle_lock_get();
        Ok(())
    }

    /// Stop both channels and unregister the periodic task.
    ///
    /// Both channels are always stopped; the first stop error is returned.
    /// A chain that never started or is already paused is left alone.
    pub fn pause(&mut self) -> Result<(), ChainError> {
        if matches!(self.state, TaskState::Init | TaskState::Paused) {
            return Ok(());
        }

        let result = {
            let _guard = CHAIN_LOCK.lock();
            self.first_data_received = false;
            let stopped = self.stop_channels();
            self.state = TaskState::Paused;
            stopped
        };

        self.services.cancel();
        self.services.idle_lock_put();
        result
    }

    /// Stop the chain if needed and hand both channels back to the driver.
    ///
    /// Same as dropping the chain. The buffer returns to its allocator only
    /// after both engines are stopped.
    pub fn free(self) {
        drop(self);
    }

    fn stop_channels(&mut self) -> Result<(), ChainError> {
        match self.direction {
            StreamDirection::Playback => {
                let host = stop_channel("host", &mut self.host);
                let link = stop_channel("link", &mut self.link);
                host.and(link)
            }
            StreamDirection::Capture => {
                let link = stop_channel("link", &mut self.link);
                let host = stop_channel("host", &mut self.host);
                link.and(host)
            }
        }
    }

    /// One tick of the chain.
    fn tick(&mut self) -> TaskOutcome {
        let link = match self.link.get_status() {
            Ok(status) => {
                self.xrun_notification_sent = false;
                status
            }
            Err(DmaError::Xrun(status)) => {
                self.handle_xrun();
                status
            }
            Err(e) => {
                log::error!("Chain DMA: link channel {} status failed: {}", self.link.index(), e);
                return TaskOutcome::Completed;
            }
        };

        let host = match self.host.get_status() {
            Ok(status) => status,
            Err(e) => {
                log::error!("Chain DMA: host channel {} status failed: {}", self.host.index(), e);
                return TaskOutcome::Completed;
            }
        };

        let reloaded = match self.direction {
            StreamDirection::Capture => self.pace_capture(&host, &link),
            StreamDirection::Playback => self.pace_playback(&host, &link),
        };

        match reloaded {
            Ok(()) => TaskOutcome::Reschedule,
            Err(e) => {
                log::error!("Chain DMA: reload failed: {}", e);
                TaskOutcome::Completed
            }
        }
    }

    fn pace_capture(&mut self, host: &DmaStatus, link: &DmaStatus) -> Result<(), DmaError> {
        let increment = host.free.min(link.pending_length);
        self.host.reload(0, increment)?;
        self.link.reload(0, increment)
    }

    fn pace_playback(&mut self, host: &DmaStatus, link: &DmaStatus) -> Result<(), DmaError> {
        let capacity = self.capacity();
        let half = capacity / 2;

        if !self.first_data_received {
            if host.pending_length > half {
                self.link.reload(0, half)?;
                self.first_data_received = true;
            }
            return Ok(());
        }

        let transferred = if link.read_position >= host.read_position {
            link.read_position - host.read_position
        } else {
            capacity - host.read_position + link.read_position
        };
        self.host.reload(0, transferred)?;

        if host.pending_length >= half && link.free >= half {
            self.link.reload(0, half)?;
        }
        Ok(())
    }

    fn handle_xrun(&mut self) {
        log::warn!(
            "Chain DMA: {:?} on link channel {}",
            self.xrun_kind(),
            self.link.index()
        );
        self.send_xrun_notification();
    }

    #[cfg(feature = "xrun-notifications")]
    fn send_xrun_notification(&mut self) {
        if self.xrun_notification_sent {
            return;
        }
        self.services.notify(XrunNotification {
            node_id: self.link_node.to_raw(),
            kind: self.xrun_kind(),
        });
        self.xrun_notification_sent = true;
    }

    #[cfg(not(feature = "xrun-notifications"))]
    fn send_xrun_notification(&mut self) {}

    /// Xrun kind implied by the link gateway class.
    pub fn xrun_kind(&self) -> XrunKind {
        match self.link_node.class {
            GatewayClass::LinkInput | GatewayClass::HostInput => XrunKind::Overrun,
            GatewayClass::LinkOutput | GatewayClass::HostOutput => XrunKind::Underrun,
        }
    }

    /// Intermediate buffer size in bytes.
    pub fn capacity(&self) -> u32 {
        self.stream.size() as u32
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    pub fn host_node(&self) -> ConnectorNodeId {
        self.host_node
    }

    pub fn link_node(&self) -> ConnectorNodeId {
        self.link_node
    }

    /// Whether playback warm-up has finished.
    pub fn first_data_received(&self) -> bool {
        self.first_data_received
    }

    /// Whether an xrun was reported and the link has not been clean since.
    pub fn xrun_notification_sent(&self) -> bool {
        self.xrun_notification_sent
    }

    /// The intermediate buffer.
    pub fn stream(&self) -> &AudioStream<B> {
        &self.stream
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn services(&self) -> &S {
        &self.services
    }
}

impl<H, L, B, S> PeriodicTask for ChainDma<H, L, B, S>
where
    H: DmaChannel,
    L: DmaChannel,
    B: AsRef<[u8]> + AsMut<[u8]>,
    S: ChainServices,
{
    fn run(&mut self) -> TaskOutcome {
        let outcome = self.tick();
        if outcome == TaskOutcome::Completed {
            self.state = TaskState::Completed;
        }
        outcome
    }
}

impl<H, L, B, S> Drop for ChainDma<H, L, B, S>
where
    H: DmaChannel,
    L: DmaChannel,
    B: AsRef<[u8]> + AsMut<[u8]>,
    S: ChainServices,
{
    fn drop(&mut self) {
        // Engines must be idle before the buffer field is dropped.
        if let Err(e) = self.pause() {
            log::warn!("Chain DMA: stop on free failed: {}", e);
        }
        self.host.release();
        self.link.release();
        log::debug!("Chain DMA: freed host {} link {}", self.host.index(), self.link.index());
    }
}

fn start_channel<C: DmaChannel>(side: &str, channel: &mut C) -> Result<(), ChainError> {
    match channel.start() {
        Ok(()) => {
            log::info!("Chain DMA: {} channel {} started", side, channel.index());
            Ok(())
        }
        Err(e) => {
            log::error!("Chain DMA: {} channel {} start failed: {}", side, channel.index(), e);
            Err(e.into())
        }
    }
}

fn stop_channel<C: DmaChannel>(side: &str, channel: &mut C) -> Result<(), ChainError> {
    match channel.stop() {
        Ok(()) => {
            log::info!("Chain DMA: {} channel {} stopped", side, channel.index());
            Ok(())
        }
        Err(e) => {
            log::error!("Chain DMA: {} channel {} stop failed: {}", side, channel.index(), e);
            Err(e.into())
        }
    }
}
