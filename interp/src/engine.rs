//! The activation-engine boundary.
//!
//! Per-proc execution is an external collaborator: the network interpreter
//! only needs "attempt one activation against the queues and tell me how it
//! went". An engine retains its own partial progress across blocked
//! attempts, so a later call resumes rather than restarts — suspension state
//! never leaks into the scheduler.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weft_ir::{ChannelId, ProcId, Value};

use crate::manager::QueueManager;

/// Result of one activation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The activation ran to its commit point: state and outputs are
    /// committed, and the proc awaits its next activation.
    Completed,
    /// The activation stalled on a channel operation.
    Blocked {
        /// The channels whose missing input or full output queue stalled
        /// the proc.
        channels: Vec<ChannelId>,
        /// Whether the attempt advanced at all before stalling (consumed an
        /// input, produced an output). Partial advancement counts as
        /// forward progress for tick classification.
        progress: bool,
    },
}

impl Activation {
    /// Whether the activation completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A proc's own activation failure, propagated verbatim through the
/// scheduler as the cause of the failed attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActivationFault {
    /// Description of the failure, produced by the engine.
    pub message: String,
}

impl ActivationFault {
    /// Wrap an engine failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure to read a proc's recurrent state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The engine is suspended partway through an activation; recurrent
    /// state is only well-defined between activations.
    #[error("proc `{proc}` is mid-activation; state is only defined between activations")]
    MidActivation {
        /// Proc name.
        proc: String,
    },
}

/// One informational record in a proc's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Index of the activation that produced the record (0-based).
    pub activation: u64,
    /// Free-form message.
    pub message: String,
}

/// Accumulated side-channel event log of one proc instance.
///
/// Informational only; nothing in the scheduler reads it back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcEvents {
    records: Vec<TraceRecord>,
}

impl ProcEvents {
    /// Append a record.
    pub fn record(&mut self, activation: u64, message: impl Into<String>) {
        self.records.push(TraceRecord {
            activation,
            message: message.into(),
        });
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop all records.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// The activation primitive the network interpreter schedules.
///
/// Implementations must be resumable: when `attempt_activation` returns
/// [`Activation::Blocked`], the partial progress already made is retained
/// internally and the next call continues from the suspension point. The
/// only suspension points are conditional channel operations — a receive on
/// an empty queue or a send on a full one.
pub trait ProcEngine {
    /// The proc this engine executes, matching its package declaration.
    fn proc_id(&self) -> ProcId;

    /// Execute as much of one activation as the queues currently allow.
    ///
    /// # Errors
    ///
    /// Returns the proc's own [`ActivationFault`], unmodified.
    fn attempt_activation(
        &mut self,
        queues: &mut QueueManager,
    ) -> Result<Activation, ActivationFault>;

    /// Current recurrent state values.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::MidActivation`] while suspended partway
    /// through an activation.
    fn resolve_state(&self) -> Result<Vec<Value>, StateError>;

    /// Restore the declared initial state, discard any suspended cursor,
    /// and clear the event log. Channel queues are untouched.
    fn reset(&mut self);

    /// The accumulated event log.
    fn events(&self) -> &ProcEvents;
}
