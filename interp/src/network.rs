//! The proc network interpreter.
//!
//! Advances every proc in a package in lock-step ticks, resolves inter-proc
//! communication through the queue manager, distinguishes forward progress
//! from genuine deadlock, and exposes run-to-condition primitives on top of
//! the bare tick.
//!
//! Scheduling policy, fixed: one attempt per proc per tick, in package
//! declaration order, with no intra-tick retry. A proc unblocked by a later
//! sibling's completion succeeds on the following tick. Tick-count results
//! rely on this policy.
//!
//! The interpreter is thread-compatible, not thread-safe: it holds no
//! internal synchronization, and concurrent use from multiple contexts must
//! be prevented by the caller.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use thiserror::Error;
use weft_ir::{ChannelId, Package, ProcId, Value};

use crate::engine::{Activation, ActivationFault, ProcEngine, ProcEvents, StateError};
use crate::manager::{ConfigError, QueueManager};
use crate::queue::ChannelQueue;

/// Outcome of one round-robin pass.
///
/// Transient: computed, used to decide whether to continue, and discarded.
/// A no-progress result is not itself an error — the run loops, not the
/// bare tick, escalate repeated no-progress into a deadlock failure, so
/// callers can still inspect a blocked network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    /// Whether any proc completed an activation or advanced partway.
    pub progress: bool,
    /// Channels that stalled a proc this tick, deduplicated and sorted.
    /// Empty when every proc completed.
    pub blocked: Vec<ChannelId>,
}

/// Failures surfaced by the run primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Two consecutive ticks made no progress with the run condition still
    /// unmet: no further evolution of the network is possible.
    #[error("deadlock after {ticks} ticks; procs blocked on channels {blocked:?}")]
    Deadlock {
        /// Ticks executed by the failing run loop.
        ticks: u64,
        /// The stalled channels at the point of deadlock.
        blocked: Vec<ChannelId>,
    },
    /// The tick budget ran out before the run condition was met. Distinct
    /// from deadlock: progress may still have been occurring.
    #[error("tick budget of {max_ticks} exhausted before the run condition was met")]
    BudgetExceeded {
        /// The exhausted budget.
        max_ticks: u64,
    },
    /// A run condition references a channel the package does not declare.
    #[error("run condition references undeclared channel {channel}")]
    UnknownChannel {
        /// The offending id.
        channel: ChannelId,
    },
    /// A proc's own activation failed; the engine's fault is the cause.
    #[error("proc `{proc}` failed during activation")]
    Fault {
        /// Proc name.
        proc: String,
        /// The proc's fault, verbatim.
        #[source]
        source: ActivationFault,
    },
}

/// Interpreter for a whole proc network.
///
/// Owns the queue manager and one activation engine per proc. Engines are
/// supplied in package declaration order — the same order the tick loop
/// schedules them.
pub struct NetworkInterpreter {
    package: Arc<Package>,
    queues: QueueManager,
    engines: Vec<Box<dyn ProcEngine>>,
    ticks: u64,
}

impl std::fmt::Debug for NetworkInterpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkInterpreter")
            .field("package", &self.package)
            .field("queues", &self.queues)
            .field("engines", &self.engines.len())
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl NetworkInterpreter {
    /// Construct an interpreter over `package`.
    ///
    /// `user_queues` must cover exactly the receive-only boundary channels;
    /// `engines` must hold one engine per proc, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on package validation failure, a missing or
    /// extraneous user queue, or an engine list that does not match the
    /// package's procs.
    pub fn new(
        package: Arc<Package>,
        user_queues: BTreeMap<ChannelId, ChannelQueue>,
        engines: Vec<Box<dyn ProcEngine>>,
    ) -> Result<Self, ConfigError> {
        package.validate()?;
        let queues = QueueManager::new(&package, user_queues)?;
        if engines.len() != package.procs().len() {
            return Err(ConfigError::EngineCountMismatch {
                expected: package.procs().len(),
                actual: engines.len(),
            });
        }
        for (position, (proc, engine)) in package.procs().iter().zip(&engines).enumerate() {
            if engine.proc_id() != proc.id {
                return Err(ConfigError::EngineOrderMismatch {
                    position,
                    actual: engine.proc_id(),
                    expected: proc.id,
                });
            }
        }
        Ok(Self {
            package,
            queues,
            engines,
            ticks: 0,
        })
    }

    /// One round-robin pass: attempt one activation per proc, in
    /// declaration order.
    ///
    /// The tick is classified as progress when at least one proc completed
    /// its activation or a blocked proc advanced partway before stalling
    /// (a sibling's completion that frees a channel is itself progress, so
    /// a transient stall is never mistaken for deadlock by a single tick).
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Fault`] when a proc's engine fails; the engine's
    /// own error is attached as the cause.
    pub fn tick(&mut self) -> Result<TickResult, RunError> {
        self.ticks += 1;
        let mut progress = false;
        let mut blocked = BTreeSet::new();

        for (proc, engine) in self.package.procs().iter().zip(&mut self.engines) {
            match engine.attempt_activation(&mut self.queues) {
                Ok(Activation::Completed) => {
                    tracing::trace!(tick = self.ticks, proc = %proc.name, "activation complete");
                    progress = true;
                }
                Ok(Activation::Blocked {
                    channels,
                    progress: partial,
                }) => {
                    tracing::trace!(
                        tick = self.ticks,
                        proc = %proc.name,
                        ?channels,
                        partial,
                        "activation blocked"
                    );
                    progress |= partial;
                    blocked.extend(channels);
                }
                Err(fault) => {
                    return Err(RunError::Fault {
                        proc: proc.name.clone(),
                        source: fault,
                    });
                }
            }
        }

        Ok(TickResult {
            progress,
            blocked: blocked.into_iter().collect(),
        })
    }

    /// Tick until every channel in `targets` has produced at least the
    /// requested number of values. Returns the number of ticks executed.
    ///
    /// # Errors
    ///
    /// [`RunError::Deadlock`] when two consecutive ticks make no progress
    /// with the targets unmet; [`RunError::BudgetExceeded`] when
    /// `max_ticks` runs out first; [`RunError::UnknownChannel`] when a
    /// target id is undeclared; [`RunError::Fault`] on an engine failure.
    pub fn tick_until_output(
        &mut self,
        targets: &BTreeMap<ChannelId, u64>,
        max_ticks: Option<u64>,
    ) -> Result<u64, RunError> {
        for &channel in targets.keys() {
            if self.queues.produced_count(channel).is_err() {
                return Err(RunError::UnknownChannel { channel });
            }
        }

        let mut executed = 0u64;
        let mut no_progress_streak = 0u32;
        loop {
            let reached = self
                .queues
                .produced_at_least(targets)
                .map_err(|e| RunError::UnknownChannel { channel: e.channel })?;
            if reached {
                return Ok(executed);
            }
            if let Some(max) = max_ticks {
                if executed >= max {
                    return Err(RunError::BudgetExceeded { max_ticks: max });
                }
            }
            let result = self.tick()?;
            executed += 1;
            if result.progress {
                no_progress_streak = 0;
            } else {
                no_progress_streak += 1;
                if no_progress_streak >= 2 {
                    tracing::debug!(ticks = executed, blocked = ?result.blocked, "deadlock");
                    return Err(RunError::Deadlock {
                        ticks: executed,
                        blocked: result.blocked,
                    });
                }
            }
        }
    }

    /// Tick until the whole network is simultaneously blocked. Returns the
    /// number of ticks executed, including the two no-progress ticks that
    /// establish the blocked state (the first is confirmed by a second
    /// identical one before reporting).
    ///
    /// A network with no genuine dependency on absent input may never
    /// block; callers needing a hard guarantee must supply `max_ticks`.
    ///
    /// # Errors
    ///
    /// [`RunError::BudgetExceeded`] when `max_ticks` runs out first;
    /// [`RunError::Fault`] on an engine failure.
    pub fn tick_until_blocked(&mut self, max_ticks: Option<u64>) -> Result<u64, RunError> {
        let mut executed = 0u64;
        let mut no_progress_streak = 0u32;
        loop {
            if let Some(max) = max_ticks {
                if executed >= max {
                    return Err(RunError::BudgetExceeded { max_ticks: max });
                }
            }
            let result = self.tick()?;
            executed += 1;
            if result.progress {
                no_progress_streak = 0;
            } else {
                no_progress_streak += 1;
                if no_progress_streak >= 2 {
                    tracing::debug!(ticks = executed, blocked = ?result.blocked, "network blocked");
                    return Ok(executed);
                }
            }
        }
    }

    /// Per-proc recurrent state snapshot.
    ///
    /// Each entry is either the proc's current state values or a
    /// [`StateError`] when that proc's engine is suspended mid-activation.
    /// Repeated calls with no intervening tick return identical values.
    #[must_use]
    pub fn resolve_state(&self) -> BTreeMap<ProcId, Result<Vec<Value>, StateError>> {
        self.package
            .procs()
            .iter()
            .zip(&self.engines)
            .map(|(proc, engine)| (proc.id, engine.resolve_state()))
            .collect()
    }

    /// Restore every proc to its declared initial state, discarding
    /// suspended cursors and event logs. Channel queue contents are a
    /// separate concern; reset them via [`Self::queue_manager_mut`].
    pub fn reset_state(&mut self) {
        for engine in &mut self.engines {
            engine.reset();
        }
        tracing::debug!(package = self.package.name(), "proc state reset");
    }

    /// Per-proc accumulated event logs.
    #[must_use]
    pub fn events(&self) -> BTreeMap<ProcId, &ProcEvents> {
        self.package
            .procs()
            .iter()
            .zip(&self.engines)
            .map(|(proc, engine)| (proc.id, engine.events()))
            .collect()
    }

    /// The queue manager.
    #[must_use]
    pub fn queue_manager(&self) -> &QueueManager {
        &self.queues
    }

    /// The queue manager, mutably — for injecting boundary stimulus or
    /// resetting queues between runs.
    pub fn queue_manager_mut(&mut self) -> &mut QueueManager {
        &mut self.queues
    }

    /// The package this interpreter executes.
    #[must_use]
    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Lifetime tick counter, monotonic across run-loop calls.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
