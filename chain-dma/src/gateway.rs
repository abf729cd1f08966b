//! HD/A gateway addressing.
//!
//! A chain is described by two DMA ids, one for the host side and one for
//! the link side. Each id maps to a connector node: an 8-bit gateway index
//! plus a gateway class.
//!
//! | Raw bits | Field |
//! |----------|-------|
//! | `0..8` | gateway index |
//! | `8..13` | gateway class |
//!
//! DMA ids count output gateways first, then input gateways:
//!
//! ```text
//!  0 ............ HDA_OUTPUT_GATEWAYS-1 | HDA_OUTPUT_GATEWAYS ... MAX_CHAIN_NUMBER-1
//!        output, index = id             |      input, index = id - HDA_OUTPUT_GATEWAYS
//! ```

use crate::constants::{HDA_INPUT_GATEWAYS, HDA_OUTPUT_GATEWAYS};
use crate::error::ChainError;

/// Gateway class of a connector node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum GatewayClass {
    HostOutput = 0,
    HostInput = 1,
    LinkOutput = 8,
    LinkInput = 9,
}

/// Which way audio moves through a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Host to link.
    Playback,
    /// Link to host.
    Capture,
}

/// Gateway address of one chain endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorNodeId {
    pub class: GatewayClass,
    pub index: u8,
}

impl ConnectorNodeId {
    /// Resolve a host (`host == true`) or link DMA id to its connector node.
    pub fn resolve(dma_id: u32, host: bool) -> Result<Self, ChainError> {
        let (output, input) = if host {
            (GatewayClass::HostOutput, GatewayClass::HostInput)
        } else {
            (GatewayClass::LinkOutput, GatewayClass::LinkInput)
        };

        let (class, index) = if dma_id >= HDA_OUTPUT_GATEWAYS {
            let index = dma_id - HDA_OUTPUT_GATEWAYS;
            if index >= HDA_INPUT_GATEWAYS {
                return Err(ChainError::InvalidGateway(dma_id));
            }
            (input, index)
        } else {
            (output, dma_id)
        };

        Ok(ConnectorNodeId {
            class,
            index: index as u8,
        })
    }

    /// Raw node id as carried in notifications.
    pub const fn to_raw(self) -> u32 {
        self.index as u32 | (self.class as u32) << 8
    }

    /// Whether this node sits on the link side.
    pub fn is_link(self) -> bool {
        matches!(self.class, GatewayClass::LinkOutput | GatewayClass::LinkInput)
    }
}

/// Work out the chain direction from its two endpoints.
///
/// Host output must pair with link output, host input with link input.
pub fn chain_direction(host: ConnectorNodeId, link: ConnectorNodeId) -> Result<StreamDirection, ChainError> {
    match (host.class, link.class) {
        (GatewayClass::HostOutput, GatewayClass::LinkOutput) => Ok(StreamDirection::Playback),
        (GatewayClass::HostInput, GatewayClass::LinkInput) => Ok(StreamDirection::Capture),
        _ => Err(ChainError::MismatchedGateways),
    }
}
