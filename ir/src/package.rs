//! Packages: the immutable definition set for one proc network.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::{Channel, ChannelDirection, ChannelId};
use crate::proc::{ProcDef, ProcId};
use crate::value::Value;

/// Errors raised while assembling or validating a package.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    /// A referenced channel id is not declared in the package.
    #[error("channel {channel} is not declared in package `{package}`")]
    UnknownChannel {
        /// The offending id.
        channel: ChannelId,
        /// Package name.
        package: String,
    },
    /// A referenced proc id is not declared in the package.
    #[error("proc {proc} is not declared in package `{package}`")]
    UnknownProc {
        /// The offending id.
        proc: ProcId,
        /// Package name.
        package: String,
    },
    /// Two channels share a name.
    #[error("duplicate channel name `{name}`")]
    DuplicateChannelName {
        /// The duplicated name.
        name: String,
    },
    /// Two procs share a name.
    #[error("duplicate proc name `{name}`")]
    DuplicateProcName {
        /// The duplicated name.
        name: String,
    },
    /// A proc declares a channel use its direction does not allow.
    #[error("proc `{proc}` cannot {verb} channel `{channel}` ({direction:?})")]
    DirectionViolation {
        /// Proc name.
        proc: String,
        /// Channel name.
        channel: String,
        /// The channel's declared direction.
        direction: ChannelDirection,
        /// `"receive from"` or `"send to"`.
        verb: &'static str,
    },
}

/// The immutable definition set for one network: channels and procs in
/// declaration order.
///
/// Declaration order is semantic: the interpreter schedules procs in exactly
/// this order every tick, so a package fixes the deterministic interleaving
/// of the whole simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    name: String,
    channels: Vec<Channel>,
    procs: Vec<ProcDef>,
}

impl Package {
    /// Create an empty package.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: Vec::new(),
            procs: Vec::new(),
        }
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a channel and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::DuplicateChannelName`] when the name is taken.
    pub fn add_channel(
        &mut self,
        name: impl Into<String>,
        direction: ChannelDirection,
        capacity: Option<usize>,
    ) -> Result<ChannelId, PackageError> {
        let name = name.into();
        if self.channels.iter().any(|c| c.name == name) {
            return Err(PackageError::DuplicateChannelName { name });
        }
        let id = ChannelId(u32::try_from(self.channels.len()).unwrap_or(u32::MAX));
        self.channels.push(Channel {
            id,
            name,
            direction,
            capacity,
        });
        Ok(id)
    }

    /// Declare a proc and return its id.
    ///
    /// The declared channel sets are checked against channel directions: a
    /// proc may receive only from receive-only or internal channels, and
    /// send only to send-only or internal channels.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError`] on a duplicate name, an undeclared channel
    /// reference, or a direction violation.
    pub fn add_proc(
        &mut self,
        name: impl Into<String>,
        init: Vec<Value>,
        receives: Vec<ChannelId>,
        sends: Vec<ChannelId>,
    ) -> Result<ProcId, PackageError> {
        let name = name.into();
        if self.procs.iter().any(|p| p.name == name) {
            return Err(PackageError::DuplicateProcName { name });
        }
        for &cid in &receives {
            let channel = self.channel(cid)?;
            if channel.direction == ChannelDirection::SendOnly {
                return Err(PackageError::DirectionViolation {
                    proc: name,
                    channel: channel.name.clone(),
                    direction: channel.direction,
                    verb: "receive from",
                });
            }
        }
        for &cid in &sends {
            let channel = self.channel(cid)?;
            if channel.direction == ChannelDirection::ReceiveOnly {
                return Err(PackageError::DirectionViolation {
                    proc: name,
                    channel: channel.name.clone(),
                    direction: channel.direction,
                    verb: "send to",
                });
            }
        }
        let id = ProcId(u32::try_from(self.procs.len()).unwrap_or(u32::MAX));
        self.procs.push(ProcDef {
            id,
            name,
            init,
            receives,
            sends,
        });
        Ok(id)
    }

    /// All declared channels, in declaration order.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// All declared procs, in declaration (= scheduling) order.
    #[must_use]
    pub fn procs(&self) -> &[ProcDef] {
        &self.procs
    }

    /// Look up a channel by id.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::UnknownChannel`] for an undeclared id.
    pub fn channel(&self, id: ChannelId) -> Result<&Channel, PackageError> {
        self.channels
            .get(id.0 as usize)
            .filter(|c| c.id == id)
            .ok_or_else(|| PackageError::UnknownChannel {
                channel: id,
                package: self.name.clone(),
            })
    }

    /// Look up a proc by id.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::UnknownProc`] for an undeclared id.
    pub fn proc(&self, id: ProcId) -> Result<&ProcDef, PackageError> {
        self.procs
            .get(id.0 as usize)
            .filter(|p| p.id == id)
            .ok_or_else(|| PackageError::UnknownProc {
                proc: id,
                package: self.name.clone(),
            })
    }

    /// Look up a channel by name.
    #[must_use]
    pub fn channel_by_name(&self, name: &str) -> Option<&Channel> {
        self.channels.iter().find(|c| c.name == name)
    }

    /// Look up a proc by name.
    #[must_use]
    pub fn proc_by_name(&self, name: &str) -> Option<&ProcDef> {
        self.procs.iter().find(|p| p.name == name)
    }

    /// The receive-only boundary channels, for which the caller must supply
    /// backing queues.
    pub fn boundary_receive_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| c.is_boundary_receive())
    }

    /// Re-check the whole definition set.
    ///
    /// `add_proc` validates incrementally; this is the belt-and-braces pass
    /// run at interpreter construction for packages assembled elsewhere
    /// (e.g. deserialized).
    ///
    /// # Errors
    ///
    /// Returns the first [`PackageError`] found.
    pub fn validate(&self) -> Result<(), PackageError> {
        for (i, channel) in self.channels.iter().enumerate() {
            if self.channels[..i].iter().any(|c| c.name == channel.name) {
                return Err(PackageError::DuplicateChannelName {
                    name: channel.name.clone(),
                });
            }
        }
        for (i, proc) in self.procs.iter().enumerate() {
            if self.procs[..i].iter().any(|p| p.name == proc.name) {
                return Err(PackageError::DuplicateProcName {
                    name: proc.name.clone(),
                });
            }
            for &cid in &proc.receives {
                let channel = self.channel(cid)?;
                if channel.direction == ChannelDirection::SendOnly {
                    return Err(PackageError::DirectionViolation {
                        proc: proc.name.clone(),
                        channel: channel.name.clone(),
                        direction: channel.direction,
                        verb: "receive from",
                    });
                }
            }
            for &cid in &proc.sends {
                let channel = self.channel(cid)?;
                if channel.direction == ChannelDirection::ReceiveOnly {
                    return Err(PackageError::DirectionViolation {
                        proc: proc.name.clone(),
                        channel: channel.name.clone(),
                        direction: channel.direction,
                        verb: "send to",
                    });
                }
            }
        }
        Ok(())
    }
}
