//! Reference activation engine: a linear plan with a continuation record.
//!
//! A [`StepEngine`] describes one activation as a fixed sequence of channel
//! ops followed by a state commit. Suspension is an explicit record — the
//! index of the op that stalled plus the values staged so far — advanced by
//! repeated `attempt_activation` calls. No coroutine or suspended call
//! stack is involved, so the resumption point stays fully inspectable.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weft_ir::{ChannelId, ProcDef, ProcId, Value};

use crate::engine::{Activation, ActivationFault, ProcEngine, ProcEvents, StateError};
use crate::manager::QueueManager;

/// Where a sent value comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// A recurrent state element.
    State(usize),
    /// A value staged by an earlier `Receive` in the same activation.
    Slot(usize),
    /// A constant.
    Literal(Value),
}

/// One channel operation in an activation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// Pop a value from `channel` into staging slot `slot`; suspends while
    /// the queue is empty.
    Receive {
        /// Input channel.
        channel: ChannelId,
        /// Staging slot index.
        slot: usize,
    },
    /// Push a value to `channel`; suspends while a bounded queue is full.
    Send {
        /// Output channel.
        channel: ChannelId,
        /// Where the value comes from.
        source: Source,
    },
}

/// State-commit function: runs once per completed activation with the
/// recurrent state and the staged values, in that order.
pub type CommitFn = Box<dyn FnMut(&mut Vec<Value>, &[Value]) + Send>;

/// Plan-validation errors, reported at engine construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// A `Receive` targets a channel the proc does not declare as an input.
    #[error("proc `{proc}` does not declare channel {channel} as an input")]
    UndeclaredReceive {
        /// Proc name.
        proc: String,
        /// The channel.
        channel: ChannelId,
    },
    /// A `Send` targets a channel the proc does not declare as an output.
    #[error("proc `{proc}` does not declare channel {channel} as an output")]
    UndeclaredSend {
        /// Proc name.
        proc: String,
        /// The channel.
        channel: ChannelId,
    },
    /// A `Send` reads a staging slot no `Receive` fills.
    #[error("proc `{proc}` sends from slot {slot}, but only {slots} slots are staged")]
    SlotOutOfRange {
        /// Proc name.
        proc: String,
        /// The offending slot index.
        slot: usize,
        /// Number of staged slots.
        slots: usize,
    },
    /// A `Send` reads a state element past the initial state's length.
    #[error("proc `{proc}` sends from state element {index}, but initial state has {len}")]
    StateIndexOutOfRange {
        /// Proc name.
        proc: String,
        /// The offending state index.
        index: usize,
        /// Initial state length.
        len: usize,
    },
}

/// Resumable engine for procs describable as receive/send plans.
pub struct StepEngine {
    id: ProcId,
    name: String,
    init: Vec<Value>,
    ops: Vec<Op>,
    commit: CommitFn,
    state: Vec<Value>,
    slots: Vec<Value>,
    /// Index of the next op while suspended; `None` between activations.
    cursor: Option<usize>,
    activations: u64,
    events: ProcEvents,
}

impl fmt::Debug for StepEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepEngine")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("ops", &self.ops)
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("activations", &self.activations)
            .finish_non_exhaustive()
    }
}

impl StepEngine {
    /// Build an engine for `proc` from an op plan and a commit function.
    ///
    /// The plan is checked against the proc's declared channel sets, so a
    /// constructed engine can only ever pop its declared inputs and push
    /// its declared outputs.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the plan references an undeclared channel
    /// or an out-of-range slot or state element.
    pub fn new(proc: &ProcDef, ops: Vec<Op>, commit: CommitFn) -> Result<Self, StepError> {
        let slot_count = ops
            .iter()
            .filter_map(|op| match op {
                Op::Receive { slot, .. } => Some(*slot + 1),
                Op::Send { .. } => None,
            })
            .max()
            .unwrap_or(0);

        for op in &ops {
            match op {
                Op::Receive { channel, .. } => {
                    if !proc.receives_from(*channel) {
                        return Err(StepError::UndeclaredReceive {
                            proc: proc.name.clone(),
                            channel: *channel,
                        });
                    }
                }
                Op::Send { channel, source } => {
                    if !proc.sends_to(*channel) {
                        return Err(StepError::UndeclaredSend {
                            proc: proc.name.clone(),
                            channel: *channel,
                        });
                    }
                    match source {
                        Source::Slot(slot) if *slot >= slot_count => {
                            return Err(StepError::SlotOutOfRange {
                                proc: proc.name.clone(),
                                slot: *slot,
                                slots: slot_count,
                            });
                        }
                        Source::State(index) if *index >= proc.init.len() => {
                            return Err(StepError::StateIndexOutOfRange {
                                proc: proc.name.clone(),
                                index: *index,
                                len: proc.init.len(),
                            });
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(Self {
            id: proc.id,
            name: proc.name.clone(),
            init: proc.init.clone(),
            ops,
            commit,
            state: proc.init.clone(),
            slots: vec![Value::Token; slot_count],
            cursor: None,
            activations: 0,
            events: ProcEvents::default(),
        })
    }

    /// Box the engine for the interpreter's engine list.
    #[must_use]
    pub fn boxed(self) -> Box<dyn ProcEngine> {
        Box::new(self)
    }

    /// Completed activations since construction or the last reset.
    #[must_use]
    pub fn activations(&self) -> u64 {
        self.activations
    }

    fn resolve_source(&self, source: &Source) -> Result<Value, ActivationFault> {
        match source {
            Source::Literal(v) => Ok(v.clone()),
            Source::Slot(i) => self.slots.get(*i).cloned().ok_or_else(|| {
                ActivationFault::new(format!("proc `{}`: staged slot {i} out of range", self.name))
            }),
            Source::State(i) => self.state.get(*i).cloned().ok_or_else(|| {
                ActivationFault::new(format!(
                    "proc `{}`: state element {i} out of range",
                    self.name
                ))
            }),
        }
    }
}

impl ProcEngine for StepEngine {
    fn proc_id(&self) -> ProcId {
        self.id
    }

    fn attempt_activation(
        &mut self,
        queues: &mut QueueManager,
    ) -> Result<Activation, ActivationFault> {
        let mut index = match self.cursor.take() {
            Some(index) => index,
            None => {
                // Fresh activation: staged values start clean.
                self.slots.fill(Value::Token);
                0
            }
        };
        let mut progress = false;

        while let Some(op) = self.ops.get(index).cloned() {
            match op {
                Op::Receive { channel, slot } => {
                    let queue = queues.queue_mut(channel).map_err(|e| {
                        ActivationFault::new(format!("proc `{}`: {e}", self.name))
                    })?;
                    match queue.pop() {
                        Some(value) => {
                            self.events
                                .record(self.activations, format!("recv channel {channel}: {value}"));
                            self.slots[slot] = value;
                            progress = true;
                        }
                        None => {
                            self.cursor = Some(index);
                            return Ok(Activation::Blocked {
                                channels: vec![channel],
                                progress,
                            });
                        }
                    }
                }
                Op::Send { channel, ref source } => {
                    let value = self.resolve_source(source)?;
                    let queue = queues.queue_mut(channel).map_err(|e| {
                        ActivationFault::new(format!("proc `{}`: {e}", self.name))
                    })?;
                    if queue.push(value.clone()).is_accepted() {
                        self.events
                            .record(self.activations, format!("send channel {channel}: {value}"));
                        progress = true;
                    } else {
                        self.cursor = Some(index);
                        return Ok(Activation::Blocked {
                            channels: vec![channel],
                            progress,
                        });
                    }
                }
            }
            index += 1;
        }

        (self.commit)(&mut self.state, &self.slots);
        self.activations += 1;
        Ok(Activation::Completed)
    }

    fn resolve_state(&self) -> Result<Vec<Value>, StateError> {
        if self.cursor.is_some() {
            return Err(StateError::MidActivation {
                proc: self.name.clone(),
            });
        }
        Ok(self.state.clone())
    }

    fn reset(&mut self) {
        self.state = self.init.clone();
        self.slots.fill(Value::Token);
        self.cursor = None;
        self.activations = 0;
        self.events.clear();
    }

    fn events(&self) -> &ProcEvents {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use weft_ir::{ChannelDirection, Package};

    fn package_one_internal() -> (Package, ChannelId) {
        let mut pkg = Package::new("p");
        let x = pkg
            .add_channel("x", ChannelDirection::Internal, None)
            .unwrap();
        (pkg, x)
    }

    #[test]
    fn test_undeclared_channels_rejected() {
        let (mut pkg, x) = package_one_internal();
        let a = pkg.add_proc("a", vec![], vec![], vec![]).unwrap();
        let proc = pkg.proc(a).unwrap();

        assert!(matches!(
            StepEngine::new(
                proc,
                vec![Op::Receive { channel: x, slot: 0 }],
                Box::new(|_, _| {}),
            ),
            Err(StepError::UndeclaredReceive { .. })
        ));
        assert!(matches!(
            StepEngine::new(
                proc,
                vec![Op::Send {
                    channel: x,
                    source: Source::Literal(Value::Token),
                }],
                Box::new(|_, _| {}),
            ),
            Err(StepError::UndeclaredSend { .. })
        ));
    }

    #[test]
    fn test_blocked_receive_resumes_where_it_stopped() {
        let (mut pkg, x) = package_one_internal();
        let y = pkg
            .add_channel("y", ChannelDirection::Internal, None)
            .unwrap();
        let a = pkg.add_proc("a", vec![], vec![x, y], vec![]).unwrap();

        let mut queues = QueueManager::new(&pkg, BTreeMap::new()).unwrap();
        let mut engine = StepEngine::new(
            pkg.proc(a).unwrap(),
            vec![
                Op::Receive { channel: x, slot: 0 },
                Op::Receive { channel: y, slot: 1 },
            ],
            Box::new(|_, _| {}),
        )
        .unwrap();

        // x has data, y does not: consume x, stall on y with partial progress.
        queues.queue_mut(x).unwrap().push(Value::u32(7));
        let outcome = engine.attempt_activation(&mut queues).unwrap();
        assert_eq!(
            outcome,
            Activation::Blocked {
                channels: vec![y],
                progress: true,
            }
        );
        assert!(engine.resolve_state().is_err());
        assert!(queues.queue(x).unwrap().is_empty());

        // Retrying without new data stalls again, this time with no progress.
        let outcome = engine.attempt_activation(&mut queues).unwrap();
        assert_eq!(
            outcome,
            Activation::Blocked {
                channels: vec![y],
                progress: false,
            }
        );

        // Data on y lets the resumed attempt finish; x is not re-read.
        queues.queue_mut(y).unwrap().push(Value::u32(8));
        let outcome = engine.attempt_activation(&mut queues).unwrap();
        assert_eq!(outcome, Activation::Completed);
        assert_eq!(engine.activations(), 1);
    }

    #[test]
    fn test_send_blocks_on_full_queue() {
        let mut pkg = Package::new("p");
        let x = pkg
            .add_channel("x", ChannelDirection::Internal, Some(1))
            .unwrap();
        let a = pkg.add_proc("a", vec![], vec![], vec![x]).unwrap();

        let mut queues = QueueManager::new(&pkg, BTreeMap::new()).unwrap();
        let mut engine = StepEngine::new(
            pkg.proc(a).unwrap(),
            vec![Op::Send {
                channel: x,
                source: Source::Literal(Value::Token),
            }],
            Box::new(|_, _| {}),
        )
        .unwrap();

        assert_eq!(
            engine.attempt_activation(&mut queues).unwrap(),
            Activation::Completed
        );
        assert_eq!(
            engine.attempt_activation(&mut queues).unwrap(),
            Activation::Blocked {
                channels: vec![x],
                progress: false,
            }
        );
        queues.queue_mut(x).unwrap().pop();
        assert_eq!(
            engine.attempt_activation(&mut queues).unwrap(),
            Activation::Completed
        );
    }

    #[test]
    fn test_commit_sees_staged_values() {
        let (mut pkg, x) = package_one_internal();
        let a = pkg
            .add_proc("a", vec![Value::u32(0)], vec![x], vec![])
            .unwrap();

        let mut queues = QueueManager::new(&pkg, BTreeMap::new()).unwrap();
        let mut engine = StepEngine::new(
            pkg.proc(a).unwrap(),
            vec![Op::Receive { channel: x, slot: 0 }],
            Box::new(|state, slots| state[0] = slots[0].clone()),
        )
        .unwrap();

        queues.queue_mut(x).unwrap().push(Value::u32(41));
        engine.attempt_activation(&mut queues).unwrap();
        assert_eq!(engine.resolve_state().unwrap(), vec![Value::u32(41)]);
    }

    #[test]
    fn test_reset_restores_initial_state_and_clears_events() {
        let mut pkg = Package::new("p");
        let a = pkg
            .add_proc("counter", vec![Value::u32(0)], vec![], vec![])
            .unwrap();

        let mut queues = QueueManager::new(&pkg, BTreeMap::new()).unwrap();
        let mut engine = StepEngine::new(
            pkg.proc(a).unwrap(),
            vec![],
            Box::new(|state, _| {
                if let Some(Value::Bits(b)) = state.first().cloned() {
                    state[0] = Value::u32(u32::try_from(b.as_u64()).unwrap_or(0) + 1);
                }
            }),
        )
        .unwrap();

        for _ in 0..3 {
            engine.attempt_activation(&mut queues).unwrap();
        }
        assert_eq!(engine.resolve_state().unwrap(), vec![Value::u32(3)]);

        engine.reset();
        assert_eq!(engine.resolve_state().unwrap(), vec![Value::u32(0)]);
        assert_eq!(engine.activations(), 0);
        assert!(engine.events().is_empty());
    }
}
