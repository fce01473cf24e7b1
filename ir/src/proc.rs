//! Proc definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;
use crate::value::Value;

/// Proc identifier, unique within a package. Ordering follows declaration
/// order, which is also the scheduling order of the network interpreter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ProcId(pub u32);

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Definition of one persistent, stateful dataflow process.
///
/// The definition is immutable; mutable execution context (current state,
/// suspended activation cursor, trace log) lives with the interpreter's
/// per-proc engine. The declared channel sets are the static partition that
/// makes single-threaded simulation race-free: a proc only ever pops
/// channels in `receives` and pushes channels in `sends`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcDef {
    /// Identity within the package.
    pub id: ProcId,
    /// Human-readable name, unique within the package.
    pub name: String,
    /// Initial recurrent state, restored by an explicit reset.
    pub init: Vec<Value>,
    /// Channels this proc consumes from.
    pub receives: Vec<ChannelId>,
    /// Channels this proc produces on.
    pub sends: Vec<ChannelId>,
}

impl ProcDef {
    /// Whether this proc declares `channel` as an input.
    #[must_use]
    pub fn receives_from(&self, channel: ChannelId) -> bool {
        self.receives.contains(&channel)
    }

    /// Whether this proc declares `channel` as an output.
    #[must_use]
    pub fn sends_to(&self, channel: ChannelId) -> bool {
        self.sends.contains(&channel)
    }
}
