//! Channel-dependency ordering of procs.
//!
//! Proc `a` depends on proc `b` when `a` receives from a channel `b` sends
//! on. The traversal uses an explicit visited set and an explicit work stack
//! so depth scales with heap, not the call stack, and feedback cycles
//! terminate instead of recursing forever.

use std::collections::BTreeSet;

use crate::package::{Package, PackageError};
use crate::proc::ProcId;

/// The procs whose sends feed `proc`'s receives, deduplicated, in the order
/// they are first encountered (receive declaration order, then scheduling
/// order of the senders).
///
/// # Errors
///
/// Returns [`PackageError`] when `proc` or one of its channels is not
/// declared in `package`.
pub fn feeding_procs(package: &Package, proc: ProcId) -> Result<Vec<ProcId>, PackageError> {
    let def = package.proc(proc)?;
    let mut seen = BTreeSet::new();
    let mut feeders = Vec::new();
    for &cid in &def.receives {
        package.channel(cid)?;
        for sender in package.procs().iter().filter(|p| p.sends_to(cid)) {
            if seen.insert(sender.id) {
                feeders.push(sender.id);
            }
        }
    }
    Ok(feeders)
}

/// Post-order of the dependency graph reachable from `root`: producers
/// first, `root` last.
///
/// # Errors
///
/// Returns [`PackageError`] when the graph references undeclared entities.
pub fn dependency_post_order(
    package: &Package,
    root: ProcId,
) -> Result<Vec<ProcId>, PackageError> {
    let mut visited = BTreeSet::new();
    let mut order = Vec::new();
    visit(package, root, &mut visited, &mut order)?;
    Ok(order)
}

/// Post-order over every proc in the package, producers before consumers.
///
/// Seeded from the sink procs (those whose outputs feed no other proc), then
/// from any procs left unvisited — a network that is one big feedback loop
/// has no sink, and must still be covered.
///
/// # Errors
///
/// Returns [`PackageError`] when the graph references undeclared entities.
pub fn post_order(package: &Package) -> Result<Vec<ProcId>, PackageError> {
    let mut consumed = BTreeSet::new();
    for proc in package.procs() {
        for feeder in feeding_procs(package, proc.id)? {
            consumed.insert(feeder);
        }
    }

    let mut visited = BTreeSet::new();
    let mut order = Vec::new();
    for proc in package.procs() {
        if !consumed.contains(&proc.id) {
            visit(package, proc.id, &mut visited, &mut order)?;
        }
    }
    for proc in package.procs() {
        if !visited.contains(&proc.id) {
            visit(package, proc.id, &mut visited, &mut order)?;
        }
    }
    Ok(order)
}

/// Iterative DFS emitting post-order. Each stack frame holds a proc and the
/// index of the next dependency to descend into.
fn visit(
    package: &Package,
    root: ProcId,
    visited: &mut BTreeSet<ProcId>,
    order: &mut Vec<ProcId>,
) -> Result<(), PackageError> {
    if !visited.insert(root) {
        return Ok(());
    }
    let mut stack: Vec<(ProcId, Vec<ProcId>, usize)> =
        vec![(root, feeding_procs(package, root)?, 0)];
    while let Some((proc, deps, next)) = stack.last_mut() {
        if let Some(&dep) = deps.get(*next) {
            *next += 1;
            if visited.insert(dep) {
                let dep_deps = feeding_procs(package, dep)?;
                stack.push((dep, dep_deps, 0));
            }
        } else {
            order.push(*proc);
            stack.pop();
        }
    }
    Ok(())
}
