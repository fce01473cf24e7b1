//! Channel declarations: identity, direction, capacity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Channel identifier, unique within a package.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ChannelId(pub u32);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a channel relative to the network boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelDirection {
    /// Values leave the network; procs may only send.
    SendOnly,
    /// Values enter the network from outside; procs may only receive. The
    /// caller must supply the backing queue.
    ReceiveOnly,
    /// Proc-to-proc communication inside the network.
    Internal,
}

/// A declared channel: one named, directional communication path.
///
/// Declared once in the package and referenced by [`ChannelId`] everywhere
/// else; the declaration itself is never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Identity within the package.
    pub id: ChannelId,
    /// Human-readable name, unique within the package.
    pub name: String,
    /// Direction relative to the network boundary.
    pub direction: ChannelDirection,
    /// FIFO bound. `None` means unbounded.
    pub capacity: Option<usize>,
}

impl Channel {
    /// Whether the caller must supply this channel's backing queue.
    #[must_use]
    pub fn is_boundary_receive(&self) -> bool {
        self.direction == ChannelDirection::ReceiveOnly
    }

    /// Whether the channel declares a FIFO bound.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.capacity.is_some()
    }
}
