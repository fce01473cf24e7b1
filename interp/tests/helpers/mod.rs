//! Shared builders for interpreter tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use weft_interp::step::CommitFn;
use weft_interp::{ChannelQueue, NetworkInterpreter, Op, Source, StepEngine};
use weft_ir::{ChannelDirection, ChannelId, Package, Value};

/// Fixed RNG seed so property tests replay identically.
pub const SEED: [u8; 32] = [42; 32];

/// Read a `Value::Bits` counter out of a state vector.
pub fn counter_of(state: &[Value]) -> u64 {
    match state.first() {
        Some(Value::Bits(b)) => b.as_u64(),
        _ => 0,
    }
}

/// Commit that increments a single `u32` counter in state element 0.
pub fn incr_commit() -> CommitFn {
    Box::new(|state, _| {
        let next = u32::try_from(counter_of(state)).unwrap_or(0) + 1;
        state[0] = Value::u32(next);
    })
}

/// Commit that stores staged slot 0 into state element 0.
pub fn store_commit() -> CommitFn {
    Box::new(|state, slots| state[0] = slots[0].clone())
}

/// Commit that changes nothing.
pub fn noop_commit() -> CommitFn {
    Box::new(|_, _| {})
}

/// Two-proc pipeline: `a` produces its counter on `x` each activation and
/// increments; `b` consumes one value from `x` and keeps the latest.
pub fn pipeline_interp() -> (NetworkInterpreter, ChannelId) {
    let mut pkg = Package::new("pipeline");
    let x = pkg
        .add_channel("x", ChannelDirection::Internal, None)
        .unwrap();
    let a = pkg
        .add_proc("a", vec![Value::u32(0)], vec![], vec![x])
        .unwrap();
    let b = pkg
        .add_proc("b", vec![Value::u32(0)], vec![x], vec![])
        .unwrap();
    let pkg = Arc::new(pkg);

    let engines = vec![
        StepEngine::new(
            pkg.proc(a).unwrap(),
            vec![Op::Send {
                channel: x,
                source: Source::State(0),
            }],
            incr_commit(),
        )
        .unwrap()
        .boxed(),
        StepEngine::new(
            pkg.proc(b).unwrap(),
            vec![Op::Receive { channel: x, slot: 0 }],
            store_commit(),
        )
        .unwrap()
        .boxed(),
    ];
    let interp = NetworkInterpreter::new(pkg, BTreeMap::new(), engines).unwrap();
    (interp, x)
}

/// A single channel-free proc with recurrent state `s' = s + 1`.
pub fn counter_interp() -> NetworkInterpreter {
    let mut pkg = Package::new("counter");
    let c = pkg
        .add_proc("counter", vec![Value::u32(0)], vec![], vec![])
        .unwrap();
    let pkg = Arc::new(pkg);
    let engines = vec![StepEngine::new(pkg.proc(c).unwrap(), vec![], incr_commit())
        .unwrap()
        .boxed()];
    NetworkInterpreter::new(pkg, BTreeMap::new(), engines).unwrap()
}

/// Two procs mutually waiting on each other's unproduced value: `a` waits on
/// `b2a` before sending `a2b`, `b` waits on `a2b` before sending `b2a`.
/// Neither channel has initial data, so the network can never move.
pub fn mutual_wait_interp() -> (NetworkInterpreter, ChannelId, ChannelId) {
    let mut pkg = Package::new("mutual_wait");
    let a2b = pkg
        .add_channel("a2b", ChannelDirection::Internal, None)
        .unwrap();
    let b2a = pkg
        .add_channel("b2a", ChannelDirection::Internal, None)
        .unwrap();
    let a = pkg
        .add_proc("a", vec![], vec![b2a], vec![a2b])
        .unwrap();
    let b = pkg
        .add_proc("b", vec![], vec![a2b], vec![b2a])
        .unwrap();
    let pkg = Arc::new(pkg);

    let engines = vec![
        StepEngine::new(
            pkg.proc(a).unwrap(),
            vec![
                Op::Receive {
                    channel: b2a,
                    slot: 0,
                },
                Op::Send {
                    channel: a2b,
                    source: Source::Slot(0),
                },
            ],
            noop_commit(),
        )
        .unwrap()
        .boxed(),
        StepEngine::new(
            pkg.proc(b).unwrap(),
            vec![
                Op::Receive {
                    channel: a2b,
                    slot: 0,
                },
                Op::Send {
                    channel: b2a,
                    source: Source::Slot(0),
                },
            ],
            noop_commit(),
        )
        .unwrap()
        .boxed(),
    ];
    let interp = NetworkInterpreter::new(pkg, BTreeMap::new(), engines).unwrap();
    (interp, a2b, b2a)
}

/// A lone producer pushing its counter onto a bounded channel nobody reads.
pub fn bounded_producer_interp(capacity: usize) -> (NetworkInterpreter, ChannelId) {
    let mut pkg = Package::new("bounded_producer");
    let x = pkg
        .add_channel("x", ChannelDirection::Internal, Some(capacity))
        .unwrap();
    let a = pkg
        .add_proc("a", vec![Value::u32(0)], vec![], vec![x])
        .unwrap();
    let pkg = Arc::new(pkg);
    let engines = vec![StepEngine::new(
        pkg.proc(a).unwrap(),
        vec![Op::Send {
            channel: x,
            source: Source::State(0),
        }],
        incr_commit(),
    )
    .unwrap()
    .boxed()];
    let interp = NetworkInterpreter::new(pkg, BTreeMap::new(), engines).unwrap();
    (interp, x)
}

/// A consumer fed only from a receive-only boundary channel, reading two
/// values per activation. The caller supplies and pre-loads the queue.
pub fn boundary_consumer_interp(
    staged: Vec<Value>,
) -> (NetworkInterpreter, ChannelId) {
    let mut pkg = Package::new("boundary_consumer");
    let input = pkg
        .add_channel("input", ChannelDirection::ReceiveOnly, None)
        .unwrap();
    let c = pkg
        .add_proc("c", vec![Value::u32(0)], vec![input], vec![])
        .unwrap();
    let pkg = Arc::new(pkg);

    let mut queue = ChannelQueue::unbounded();
    for value in staged {
        queue.push(value);
    }
    let mut user_queues = BTreeMap::new();
    user_queues.insert(input, queue);

    let engines = vec![StepEngine::new(
        pkg.proc(c).unwrap(),
        vec![
            Op::Receive {
                channel: input,
                slot: 0,
            },
            Op::Receive {
                channel: input,
                slot: 1,
            },
        ],
        store_commit(),
    )
    .unwrap()
    .boxed()];
    let interp = NetworkInterpreter::new(pkg, user_queues, engines).unwrap();
    (interp, input)
}
