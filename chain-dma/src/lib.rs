//! # chain-dma
//!
//! A `no_std`, allocation-free audio transport core for DSP firmware:
//! a format-aware circular stream buffer and a host/link DMA chain that
//! bridges two hardware DMA engines through one shared buffer with no
//! processing in between.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Buffer | [`stream`] | `AudioStream` ring buffer, formats, wrap-aware copies |
//! | Memory | [`memory`] | Lock-free pool of DMA-capable buffers |
//! | Hardware | [`dma`] | `DmaChannel` contract to a DMA engine |
//! | Addressing | [`gateway`] | HD/A connector node ids and chain direction |
//! | Transport | [`chain`] | `ChainDma` start/pause and per-tick pacing |
//!
//! ## Quick start
//!
//! ```ignore
//! use chain_dma::chain::{ChainDma, ChainDmaConfig, PeriodicTask, TriggerCmd};
//! use chain_dma::memory::DmaBufferPool;
//!
//! static BUFFERS: DmaBufferPool<4, 8192> = DmaBufferPool::new();
//!
//! let config = ChainDmaConfig { host_dma_id: 0, link_dma_id: 0, fifo_size: 384, scs: false };
//! let mut chain = ChainDma::create(&config, host_channel, link_channel, &&BUFFERS, services)?;
//! chain.trigger(TriggerCmd::Start)?;
//!
//! // From the low-latency timer tick:
//! chain.run();
//! ```
//!
//! ## Features
//!
//! | Feature | Default | Enables |
//! |---------|---------|---------|
//! | `xrun-notifications` | yes | One-shot xrun messages through `XrunNotifier` |
//! | `serde` | no | `Serialize`/`Deserialize` on configuration records |

#![no_std]

pub mod constants;
pub mod math;
pub mod error;
pub mod stream;
pub mod memory;
pub mod dma;
pub mod gateway;
pub mod chain;

pub use chain::{ChainDma, ChainDmaConfig};
pub use error::{ChainError, DmaError, StreamError};
pub use stream::AudioStream;
