//! Execution engine for proc networks.
//!
//! This crate interprets a whole network of communicating, stateful procs in
//! deterministic lock-step "ticks". Concurrency is simulated: a single
//! thread advances every proc once per tick in package declaration order,
//! and all cross-proc influence flows through channel queues, so identical
//! initial state always replays to identical results.
//!
//! # Architecture
//!
//! - **Queues** ([`queue::ChannelQueue`]): per-channel FIFOs with explicit
//!   back-pressure — a push on a full bounded queue reports
//!   [`queue::PushOutcome::Full`] instead of suspending the caller.
//! - **Queue manager** ([`manager::QueueManager`]): owns one queue per
//!   declared channel and validates the caller-supplied queues backing
//!   receive-only boundary channels.
//! - **Engine boundary** ([`engine::ProcEngine`]): the per-proc activation
//!   primitive. An engine executes as much of one activation as currently
//!   possible, reports completion or the blocking channel set, and resumes
//!   from retained partial progress on the next attempt.
//! - **Reference engine** ([`step::StepEngine`]): a resumable engine built
//!   on an explicit continuation record — an op cursor plus staged values —
//!   for procs describable as a linear receive/send plan with a state
//!   commit.
//! - **Network interpreter** ([`network::NetworkInterpreter`]): the
//!   round-robin tick loop, run-to-condition primitives, progress/deadlock
//!   classification, and state inspection.
//!
//! The interpreter is thread-compatible but not thread-safe: one calling
//! context at a time, no internal synchronization.

pub mod engine;
pub mod manager;
pub mod network;
pub mod queue;
pub mod step;

pub use engine::{Activation, ActivationFault, ProcEngine, ProcEvents, StateError, TraceRecord};
pub use manager::{ConfigError, QueueError, QueueManager};
pub use network::{NetworkInterpreter, RunError, TickResult};
pub use queue::{ChannelQueue, PushOutcome, QueueOrigin};
pub use step::{Op, Source, StepEngine, StepError};
