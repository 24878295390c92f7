//! Undo log for type-variable constraints.
//!
//! Constraints live in an `ena` `SnapshotVec`: every write records the old
//! value, so rolling back to a snapshot restores each touched constraint
//! exactly. Variables created after the snapshot are dropped by the
//! rollback as well.
//!
//! The lock is a reentrant counter. Probes that may register bounds run with
//! the lock held; it exists to check nesting discipline, not to arbitrate
//! between threads (a log belongs to one checker).

use crate::constraint::{TypeConstraint, TypeVarInfo};
use crate::types::{TypeId, TypeVarId};
use ena::snapshot_vec::{Snapshot, SnapshotVec, SnapshotVecDelegate};
use tracing::trace;

#[derive(Debug)]
struct TypeVarDelegate;

impl SnapshotVecDelegate for TypeVarDelegate {
    type Value = TypeVarInfo;
    type Undo = ();

    fn reverse(_values: &mut Vec<TypeVarInfo>, _action: ()) {}
}

/// Cursor returned by [`UndoLog::snapshot`]; consumed by `undo_to` or
/// `commit`.
#[must_use = "a snapshot must be undone or committed"]
pub struct UndoSnapshot {
    inner: Snapshot,
}

pub struct UndoLog {
    vars: SnapshotVec<TypeVarDelegate>,
    lock_count: u32,
    open_snapshots: u32,
}

impl UndoLog {
    pub fn new() -> Self {
        UndoLog {
            vars: SnapshotVec::new(),
            lock_count: 0,
            open_snapshots: 0,
        }
    }

    /// Register a new variable.
    pub fn fresh(&mut self, origin: TypeId, level: u32, constraint: TypeConstraint) -> TypeVarId {
        let index = self.vars.push(TypeVarInfo::new(origin, level, constraint));
        let id = TypeVarId(index as u32);
        trace!(var = id.0, origin = origin.0, level, "UndoLog::fresh");
        id
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.len() == 0
    }

    pub fn contains(&self, var: TypeVarId) -> bool {
        var.index() < self.vars.len()
    }

    /// State of `var`. Panics on an unknown variable in debug builds.
    pub fn info(&self, var: TypeVarId) -> Option<&TypeVarInfo> {
        debug_assert!(self.contains(var), "unknown type variable {var:?}");
        if self.contains(var) { Some(self.vars.get(var.index())) } else { None }
    }

    /// Mutate `var`'s state; the old value is logged when a snapshot is open.
    pub fn update(&mut self, var: TypeVarId, f: impl FnOnce(&mut TypeVarInfo)) {
        debug_assert!(self.contains(var), "unknown type variable {var:?}");
        if self.contains(var) {
            self.vars.update(var.index(), f);
        }
    }

    // -------------------------------------------------------------------------
    // Lock
    // -------------------------------------------------------------------------

    pub fn lock(&mut self) {
        self.lock_count += 1;
    }

    pub fn unlock(&mut self) {
        debug_assert!(self.lock_count > 0, "UndoLog::unlock() without lock()");
        self.lock_count = self.lock_count.saturating_sub(1);
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock_count > 0
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    pub fn snapshot(&mut self) -> UndoSnapshot {
        self.open_snapshots += 1;
        UndoSnapshot {
            inner: self.vars.start_snapshot(),
        }
    }

    /// Restore every constraint changed since `snapshot`.
    pub fn undo_to(&mut self, snapshot: UndoSnapshot) {
        self.open_snapshots = self.open_snapshots.saturating_sub(1);
        self.vars.rollback_to(snapshot.inner);
    }

    /// Keep the changes made since `snapshot`. They stay undoable by
    /// enclosing snapshots.
    pub fn commit(&mut self, snapshot: UndoSnapshot) {
        self.open_snapshots = self.open_snapshots.saturating_sub(1);
        self.vars.commit(snapshot.inner);
    }

    pub fn in_snapshot(&self) -> bool {
        self.open_snapshots > 0
    }

    // -------------------------------------------------------------------------
    // Suspension
    // -------------------------------------------------------------------------

    pub fn suspend(&mut self, var: TypeVarId) {
        self.update(var, |info| info.suspended = true);
    }

    pub fn resume(&mut self, var: TypeVarId) {
        self.update(var, |info| info.suspended = false);
    }
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/undo_tests.rs"]
mod tests;
