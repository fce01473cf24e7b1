//! Definition layer for proc networks.
//!
//! A proc network is a set of persistent, stateful dataflow processes
//! ("procs") communicating through named, directional channels. This crate
//! owns the immutable definition side of that picture:
//!
//! - **Values** ([`value::Value`]): the payloads carried on channels and held
//!   as recurrent proc state — tokens, bit vectors, tuples, arrays.
//! - **Channels** ([`channel::Channel`]): identity, direction, and optional
//!   capacity bound for one communication path.
//! - **Procs** ([`proc::ProcDef`]): one persistent process definition with
//!   its initial recurrent state and declared channel sets.
//! - **Packages** ([`package::Package`]): the declaration-ordered collection
//!   of channels and procs making up one network, with the static
//!   channel-partition checks that let a single-threaded interpreter stand
//!   in for true concurrency.
//! - **Bindings** ([`bindings::Bindings`]): parent-chained scoped name
//!   resolution used when assembling packages from a front end.
//! - **Graph** ([`graph`]): cycle-safe post-order traversal of the channel
//!   dependency graph between procs.
//!
//! Execution lives in the `weft-interp` crate; nothing here is mutable at
//! run time.

pub mod bindings;
pub mod channel;
pub mod graph;
pub mod package;
pub mod proc;
pub mod value;

pub use bindings::{Binding, BindingError, BindingKind, Bindings};
pub use channel::{Channel, ChannelDirection, ChannelId};
pub use graph::{dependency_post_order, feeding_procs, post_order};
pub use package::{Package, PackageError};
pub use proc::{ProcDef, ProcId};
pub use value::{Bits, BitsError, Value};
