//! Queue manager: one queue per declared channel.
//!
//! Constructed once per interpreter from the package plus the caller's
//! queues for receive-only boundary channels. The manager owns every queue
//! for the interpreter's lifetime; procs reach queues only through it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weft_ir::{ChannelId, Package, PackageError};

use crate::queue::{ChannelQueue, QueueOrigin};

/// Configuration errors, fatal at interpreter construction and never
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A receive-only boundary channel has no caller-supplied queue.
    #[error("receive-only channel `{channel}` (id {id}) has no user-supplied queue")]
    MissingBoundaryQueue {
        /// Channel name.
        channel: String,
        /// Channel id.
        id: ChannelId,
    },
    /// A queue was supplied for a channel that is not receive-only at the
    /// boundary (or not declared at all).
    #[error("user queue supplied for channel {id}, which is not a receive-only boundary channel")]
    UnexpectedUserQueue {
        /// The offending channel id.
        id: ChannelId,
    },
    /// The package failed validation.
    #[error("invalid package")]
    InvalidPackage(#[from] PackageError),
    /// The number of supplied engines does not match the package's procs.
    #[error("expected {expected} activation engines (one per proc), got {actual}")]
    EngineCountMismatch {
        /// Procs declared in the package.
        expected: usize,
        /// Engines supplied.
        actual: usize,
    },
    /// Engines were supplied out of package declaration order.
    #[error("engine at position {position} is for proc {actual}, expected proc {expected}")]
    EngineOrderMismatch {
        /// Index into the engine list.
        position: usize,
        /// Proc id the engine reports.
        actual: weft_ir::ProcId,
        /// Proc id declared at that position.
        expected: weft_ir::ProcId,
    },
}

/// Lookup failure for a channel id the package never declared. This is an
/// internal-consistency bug (ids are fixed by the package), not a user
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no queue for channel {channel}; id not declared in the package")]
pub struct QueueError {
    /// The unknown channel id.
    pub channel: ChannelId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QueueEntry {
    queue: ChannelQueue,
    origin: QueueOrigin,
}

/// Owns all channel queues for one network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueManager {
    entries: BTreeMap<ChannelId, QueueEntry>,
}

impl QueueManager {
    /// Build the queue map for `package`.
    ///
    /// `user_queues` must contain exactly one queue per receive-only
    /// boundary channel: those channels' values originate outside the
    /// network, so the caller supplies (and pre-loads, or later refills)
    /// their backing storage. Queues for all other channels are created
    /// here — bounded when the channel declares a capacity, unbounded
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a boundary queue is missing or a queue
    /// is supplied for a non-boundary channel.
    pub fn new(
        package: &Package,
        mut user_queues: BTreeMap<ChannelId, ChannelQueue>,
    ) -> Result<Self, ConfigError> {
        let mut entries = BTreeMap::new();
        for channel in package.channels() {
            let entry = if channel.is_boundary_receive() {
                let queue = user_queues.remove(&channel.id).ok_or_else(|| {
                    ConfigError::MissingBoundaryQueue {
                        channel: channel.name.clone(),
                        id: channel.id,
                    }
                })?;
                QueueEntry {
                    queue,
                    origin: QueueOrigin::UserSupplied,
                }
            } else {
                let queue = match channel.capacity {
                    Some(cap) => ChannelQueue::bounded(cap),
                    None => ChannelQueue::unbounded(),
                };
                QueueEntry {
                    queue,
                    origin: QueueOrigin::Internal,
                }
            };
            entries.insert(channel.id, entry);
        }
        if let Some((&id, _)) = user_queues.iter().next() {
            return Err(ConfigError::UnexpectedUserQueue { id });
        }
        tracing::debug!(
            package = package.name(),
            channels = entries.len(),
            "queue manager constructed"
        );
        Ok(Self { entries })
    }

    /// The queue backing `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] for an undeclared id.
    pub fn queue(&self, channel: ChannelId) -> Result<&ChannelQueue, QueueError> {
        self.entries
            .get(&channel)
            .map(|e| &e.queue)
            .ok_or(QueueError { channel })
    }

    /// The queue backing `channel`, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] for an undeclared id.
    pub fn queue_mut(&mut self, channel: ChannelId) -> Result<&mut ChannelQueue, QueueError> {
        self.entries
            .get_mut(&channel)
            .map(|e| &mut e.queue)
            .ok_or(QueueError { channel })
    }

    /// Whether the queue was manager-created or user-supplied.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] for an undeclared id.
    pub fn origin(&self, channel: ChannelId) -> Result<QueueOrigin, QueueError> {
        self.entries
            .get(&channel)
            .map(|e| e.origin)
            .ok_or(QueueError { channel })
    }

    /// Monotonic count of values ever accepted on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] for an undeclared id.
    pub fn produced_count(&self, channel: ChannelId) -> Result<u64, QueueError> {
        self.queue(channel).map(ChannelQueue::produced_count)
    }

    /// Whether every channel in `targets` has produced at least its
    /// requested count. Bulk form used by the run loop.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] when a target id is undeclared.
    pub fn produced_at_least(
        &self,
        targets: &BTreeMap<ChannelId, u64>,
    ) -> Result<bool, QueueError> {
        for (&channel, &count) in targets {
            if self.produced_count(channel)? < count {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Ids of all managed channels, in id order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.entries.keys().copied()
    }

    /// Drop all buffered values and restart every produced counter. Proc
    /// state is a separate concern; see the interpreter's `reset_state`.
    pub fn reset_queues(&mut self) {
        for entry in self.entries.values_mut() {
            entry.queue.reset();
        }
    }
}
