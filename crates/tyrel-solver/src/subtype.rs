//! The subtype decision procedure.
//!
//! `SubtypeChecker` answers `lhs <: rhs` for interned types. The decision is
//! an ordered cascade of case analyses:
//!
//! 1. degenerate shortcuts (identity, error/wildcard, `NoType`, `NoPrefix`)
//! 2. singleton/singleton and constant/constant pairs: type equivalence
//! 3. type constructors: the higher-kinded comparison
//! 4. first pass on the right-hand side (references, annotations, bounded
//!    wildcards, type variables)
//! 5. second pass on the left-hand side (annotations, bounded wildcards,
//!    type variables, existentials)
//! 6. third pass on the right-hand side (references, refinements,
//!    existentials, not-null, method types, bounds)
//! 7. fourth pass on the left-hand side (bottom types, raw and module
//!    classes, abstract types, refinements, singletons)
//!
//! The first matching case wins. Passes 4 and 6 on references, and pass 7,
//! live in `subtype_rules/refs.rs`; the structural cases in
//! `subtype_rules/structural.rs`.
//!
//! ## Speculation
//!
//! Every nested query is a probe: it takes the undo-log lock, snapshots the
//! type-variable constraints, and rolls them back when the answer is
//! `false`. A successful probe commits, which keeps its changes undoable by
//! the enclosing probe. Rollback and the recursion-guard bookkeeping run in
//! `Drop`, so an unwinding probe leaves the checker consistent.
//!
//! ## Recursion
//!
//! Queries nest through the [`RecursionGuard`]. Once the nesting passes the
//! policy's `pending_threshold`, a pair that is already being decided further
//! up is answered `false`. So is any query nested deeper than the policy's
//! `max_depth`, which stops expansive types whose questions grow instead of
//! repeating. Both answers are conservative approximations: they can reject
//! a valid relation on cyclic types, but they never loop.

use crate::annotations::{AnnotationChecker, TypeConstraintAnnotations};
use crate::constraint::{TypeConstraint, TypeVarInfo};
use crate::env::TypeEnv;
use crate::format::TypeFormatter;
use crate::query_trace;
use crate::recursion::{DepthCounter, Entry, RecursionGuard, RecursionProfile, RecursionResult};
use crate::relation_queries::SubtypePolicy;
use crate::types::{Depth, TypeData, TypeId, TypeVarId};
use crate::undo::{UndoLog, UndoSnapshot};
use std::ops::{Deref, DerefMut};
use tracing::{debug, trace};
use tyrel_common::limits::{SUBTYPE_STACK_RED_ZONE, SUBTYPE_STACK_SEGMENT};

type PairKey = (TypeId, TypeId);

/// Subtype and type-equivalence checker.
///
/// A checker owns the mutable state of one query tree: the recursion guard,
/// the type-variable constraints and the skolemization level. Independent
/// trees (one per thread, say) use independent checkers over the same
/// `TypeEnv`.
pub struct SubtypeChecker<'a, A: AnnotationChecker = TypeConstraintAnnotations> {
    pub(crate) env: TypeEnv<'a>,
    pub(crate) annotations: A,
    pub(crate) policy: SubtypePolicy,
    pub(crate) undo_log: UndoLog,
    pub(crate) guard: RecursionGuard<PairKey>,
    pub(crate) skolemization: DepthCounter,
}

impl<'a> SubtypeChecker<'a, TypeConstraintAnnotations> {
    pub fn new(env: TypeEnv<'a>) -> Self {
        Self::with_policy(env, SubtypePolicy::default())
    }

    pub fn with_policy(env: TypeEnv<'a>, policy: SubtypePolicy) -> Self {
        Self::with_annotation_checker(env, policy, TypeConstraintAnnotations)
    }
}

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    pub fn with_annotation_checker(env: TypeEnv<'a>, policy: SubtypePolicy, annotations: A) -> Self {
        SubtypeChecker {
            env,
            annotations,
            policy,
            undo_log: UndoLog::new(),
            guard: RecursionGuard::with_profile(RecursionProfile::PendingSubtypes)
                .with_track_from(policy.pending_threshold)
                .with_max_depth(policy.max_depth),
            skolemization: DepthCounter::with_profile(RecursionProfile::SkolemizationLevel),
        }
    }

    #[inline]
    pub fn env(&self) -> TypeEnv<'a> {
        self.env
    }

    #[inline]
    pub fn policy(&self) -> SubtypePolicy {
        self.policy
    }

    pub(crate) fn format(&self, ty: TypeId) -> String {
        TypeFormatter::new(self.env).format(ty)
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// `lhs <: rhs` with unbounded depth.
    pub fn is_subtype(&mut self, lhs: TypeId, rhs: TypeId) -> bool {
        self.is_subtype_depth(lhs, rhs, Depth::ANY)
    }

    /// `lhs <: rhs` where widening retries may go `depth` levels deep.
    pub fn is_subtype_depth(&mut self, lhs: TypeId, rhs: TypeId, depth: Depth) -> bool {
        if self.guard.is_active() || !query_trace::enabled() {
            return stacker::maybe_grow(SUBTYPE_STACK_RED_ZONE, SUBTYPE_STACK_SEGMENT, || {
                self.is_subtype_guarded(lhs, rhs, depth)
            });
        }
        let query_id = query_trace::next_query_id();
        query_trace::relation_start(query_id, "is_subtype", lhs, rhs, depth.remaining());
        let result = stacker::maybe_grow(SUBTYPE_STACK_RED_ZONE, SUBTYPE_STACK_SEGMENT, || {
            self.is_subtype_guarded(lhs, rhs, depth)
        });
        query_trace::relation_end(
            query_id,
            "is_subtype",
            result,
            self.guard.iterations(),
            self.guard.cycles(),
        );
        result
    }

    /// `lhs =:= rhs`.
    pub fn is_same_type(&mut self, lhs: TypeId, rhs: TypeId) -> bool {
        if self.guard.is_active() || !query_trace::enabled() {
            return stacker::maybe_grow(SUBTYPE_STACK_RED_ZONE, SUBTYPE_STACK_SEGMENT, || {
                self.is_same_type_guarded(lhs, rhs)
            });
        }
        let query_id = query_trace::next_query_id();
        query_trace::relation_start(query_id, "is_same_type", lhs, rhs, None);
        let result = stacker::maybe_grow(SUBTYPE_STACK_RED_ZONE, SUBTYPE_STACK_SEGMENT, || {
            self.is_same_type_guarded(lhs, rhs)
        });
        query_trace::relation_end(
            query_id,
            "is_same_type",
            result,
            self.guard.iterations(),
            self.guard.cycles(),
        );
        result
    }

    /// Element-wise `=:=` of two lists of equal length.
    pub fn is_same_types(&mut self, lhs: &[TypeId], rhs: &[TypeId]) -> bool {
        lhs.len() == rhs.len() && lhs.iter().zip(rhs).all(|(&l, &r)| self.is_same_type(l, r))
    }

    /// Answer `!(lhs =:= rhs)` without keeping any constraint it registers.
    pub fn is_different_type(&mut self, lhs: TypeId, rhs: TypeId) -> bool {
        let mut probe = Probe::speculate(self);
        !probe.is_same_type(lhs, rhs)
    }

    fn is_subtype_guarded(&mut self, lhs: TypeId, rhs: TypeId, depth: Depth) -> bool {
        let entry = match self.guard.enter((lhs, rhs)) {
            RecursionResult::Entered(entry) => entry,
            RecursionResult::Cycle => {
                debug!(
                    lhs = lhs.0,
                    rhs = rhs.0,
                    depth = self.guard.depth(),
                    "is_subtype: pair already pending, answering false"
                );
                return false;
            }
            RecursionResult::DepthExceeded => {
                debug!(lhs = lhs.0, rhs = rhs.0, "is_subtype: nesting limit exceeded");
                return false;
            }
        };
        trace!(lhs = %self.format(lhs), rhs = %self.format(rhs), depth = self.guard.depth(), "is_subtype");
        let mut probe = Probe::open(self, entry);
        let result = probe.is_subtype_core(lhs, rhs, depth);
        probe.succeed_if(result);
        result
    }

    fn is_same_type_guarded(&mut self, lhs: TypeId, rhs: TypeId) -> bool {
        let entry = match self.guard.enter_untracked() {
            RecursionResult::Entered(entry) => entry,
            RecursionResult::Cycle | RecursionResult::DepthExceeded => {
                debug!(lhs = lhs.0, rhs = rhs.0, "is_same_type: nesting limit exceeded");
                return false;
            }
        };
        trace!(lhs = %self.format(lhs), rhs = %self.format(rhs), depth = self.guard.depth(), "is_same_type");
        let mut probe = Probe::open(self, entry);
        let result = probe.is_same_type_core(lhs, rhs);
        probe.succeed_if(result);
        result
    }

    // =========================================================================
    // Core cascade
    // =========================================================================

    fn is_subtype_core(&mut self, tp1: TypeId, tp2: TypeId, depth: Depth) -> bool {
        if tp1 == tp2 || tp1.is_permissive() || tp2.is_permissive() {
            return true;
        }
        if tp1 == TypeId::NO_TYPE || tp2 == TypeId::NO_TYPE {
            return false;
        }
        let env = self.env;
        if tp1 == TypeId::NO_PREFIX {
            return tp2 == TypeId::NO_PREFIX || env.sym(env.type_symbol(tp2)).is_package_class();
        }
        if tp2 == TypeId::NO_PREFIX {
            return env.sym(env.type_symbol(tp1)).is_package_class();
        }

        let data1 = env.data(tp1);
        let data2 = env.data(tp2);
        if (data1.is_singleton_ref() && data2.is_singleton_ref()) || (data1.is_constant() && data2.is_constant()) {
            return self.is_same_type(tp1, tp2);
        }
        if env.is_higher_kinded(tp1) || env.is_higher_kinded(tp2) {
            return self.is_hk_subtype(tp1, tp2, depth);
        }
        self.first_try(tp1, &data1, tp2, &data2, depth)
    }

    /// First pass, on the right.
    fn first_try(&mut self, tp1: TypeId, data1: &TypeData, tp2: TypeId, data2: &TypeData, depth: Depth) -> bool {
        match *data2 {
            TypeData::Ref { .. } => match *data1 {
                TypeData::Ref { .. } => self.ref_ref_conforms(tp1, tp2, depth),
                _ => self.second_try(tp1, data1, tp2, data2, depth),
            },
            TypeData::Annotated { .. } => self.annotated_conforms(tp1, tp2, depth),
            TypeData::BoundedWildcard(bounds) => {
                let hi = self.env.upper_bound(bounds);
                self.is_subtype_depth(tp1, hi, depth)
            }
            TypeData::TypeVar(var2) => match *data1 {
                TypeData::Annotated { .. } | TypeData::BoundedWildcard(_) => {
                    self.second_try(tp1, data1, tp2, data2, depth)
                }
                _ => self.register_bound(var2, tp1, true),
            },
            _ => self.second_try(tp1, data1, tp2, data2, depth),
        }
    }

    /// Second pass, on the left.
    fn second_try(&mut self, tp1: TypeId, data1: &TypeData, tp2: TypeId, data2: &TypeData, depth: Depth) -> bool {
        match *data1 {
            TypeData::Annotated { .. } => self.annotated_conforms(tp1, tp2, depth),
            TypeData::BoundedWildcard(bounds) => {
                let lo = self.env.lower_bound(bounds);
                self.is_subtype_depth(lo, tp2, depth)
            }
            TypeData::TypeVar(var1) => self.register_bound(var1, tp2, false),
            TypeData::Existential { .. } => {
                let mut scope = SkolemScope::enter(self);
                let level = scope.skolemization.depth();
                let skolemized = scope.env.skolemize_existential(tp1, level);
                scope.is_subtype_depth(skolemized, tp2, depth)
            }
            _ => self.third_try(tp1, data1, tp2, data2, depth),
        }
    }

    /// Third pass, on the right.
    pub(crate) fn third_try(
        &mut self,
        tp1: TypeId,
        data1: &TypeData,
        tp2: TypeId,
        data2: &TypeData,
        depth: Depth,
    ) -> bool {
        match *data2 {
            TypeData::Ref { .. } => self.third_try_ref(tp1, data1, tp2, depth),
            TypeData::Refined { parents, decls, .. } => self.conforms_to_refinement(tp1, parents, decls, depth),
            TypeData::Existential {
                quantified,
                underlying,
            } => {
                self.with_type_vars(tp1, quantified, underlying, depth)
                    || self.fourth_try(tp1, data1, tp2, depth)
            }
            TypeData::NotNull(underlying) => {
                self.env.is_not_null(tp1) && self.is_subtype_depth(tp1, underlying, depth)
            }
            TypeData::Method { .. } => self.method_conforms(data1, data2, depth),
            TypeData::NullaryMethod(result2) => match *data1 {
                TypeData::NullaryMethod(result1) => self.is_subtype_depth(result1, result2, depth),
                _ => false,
            },
            TypeData::Bounds { lo: lo2, hi: hi2 } => match *data1 {
                TypeData::Bounds { lo: lo1, hi: hi1 } => {
                    self.is_subtype_depth(lo2, lo1, depth) && self.is_subtype_depth(hi1, hi2, depth)
                }
                _ => false,
            },
            _ => self.fourth_try(tp1, data1, tp2, depth),
        }
    }

    /// Fourth pass, on the left.
    pub(crate) fn fourth_try(&mut self, tp1: TypeId, data1: &TypeData, tp2: TypeId, depth: Depth) -> bool {
        match *data1 {
            TypeData::Ref { .. } => self.fourth_try_ref(tp1, tp2, depth),
            TypeData::Refined { parents, .. } => {
                let parents = self.env.type_list(parents);
                parents.iter().any(|&p| self.is_subtype_depth(p, tp2, depth))
            }
            TypeData::This(_) | TypeData::Single { .. } | TypeData::Constant(_) | TypeData::NotNull(_) => {
                if depth.is_exhausted() {
                    return false;
                }
                let underlying = self.env.underlying(tp1);
                underlying != tp1 && self.is_subtype_depth(underlying, tp2, depth.decr())
            }
            _ => false,
        }
    }

    fn annotated_conforms(&mut self, tp1: TypeId, tp2: TypeId, depth: Depth) -> bool {
        let bare1 = self.env.without_annotations(tp1);
        let bare2 = self.env.without_annotations(tp2);
        self.is_subtype_depth(bare1, bare2, depth) && self.annotations_conform(tp1, tp2)
    }

    pub(crate) fn annotations_conform(&self, tp1: TypeId, tp2: TypeId) -> bool {
        !self.policy.check_annotations || self.annotations.annotations_conform(self.env, tp1, tp2)
    }

    // =========================================================================
    // Type variables
    // =========================================================================

    /// Create a type variable standing for `origin`, constrained by
    /// `constraint`, at the current skolemization level.
    pub fn fresh_type_var(&mut self, origin: TypeId, constraint: TypeConstraint) -> TypeId {
        let level = self.skolemization.depth();
        let var = self.undo_log.fresh(origin, level, constraint);
        self.env.db.type_var(var)
    }

    /// Current state of a type variable.
    pub fn type_var_info(&self, var: TypeVarId) -> Option<&TypeVarInfo> {
        self.undo_log.info(var)
    }

    /// Current constraint of the type variable `ty` (a `TypeVar` type).
    pub fn constraint(&self, ty: TypeId) -> Option<TypeConstraint> {
        match self.env.data(ty) {
            TypeData::TypeVar(var) => self.undo_log.info(var).map(|info| info.constraint.clone()),
            _ => None,
        }
    }

    /// Stop `var` from recording constraints; it compares as its origin.
    pub fn suspend(&mut self, var: TypeVarId) {
        self.undo_log.suspend(var);
    }

    pub fn resume(&mut self, var: TypeVarId) {
        self.undo_log.resume(var);
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Total number of nested relation queries entered so far.
    pub fn iterations(&self) -> u64 {
        self.guard.iterations()
    }

    /// Number of queries answered `false` because their pair was pending.
    pub fn cycles(&self) -> u64 {
        self.guard.cycles()
    }

    /// Number of queries answered `false` because nesting hit the policy's
    /// `max_depth`.
    pub fn depth_cutoffs(&self) -> u64 {
        self.guard.cutoffs()
    }

    pub fn reset_stats(&mut self) {
        self.guard.reset_stats();
    }
}

// =============================================================================
// RAII scopes
// =============================================================================

/// One speculative query: undo-log lock + snapshot + recursion entry.
///
/// Dropping the probe commits the snapshot if [`succeed_if`](Self::succeed_if)
/// was given `true`, rolls it back otherwise, releases the lock and leaves
/// the recursion guard.
struct Probe<'c, 'a, A: AnnotationChecker> {
    checker: &'c mut SubtypeChecker<'a, A>,
    entry: Option<Entry<PairKey>>,
    snapshot: Option<UndoSnapshot>,
    success: bool,
}

impl<'c, 'a, A: AnnotationChecker> Probe<'c, 'a, A> {
    fn open(checker: &'c mut SubtypeChecker<'a, A>, entry: Entry<PairKey>) -> Self {
        checker.undo_log.lock();
        let snapshot = checker.undo_log.snapshot();
        Probe {
            checker,
            entry: Some(entry),
            snapshot: Some(snapshot),
            success: false,
        }
    }

    /// A probe outside the recursion guard that always rolls back.
    fn speculate(checker: &'c mut SubtypeChecker<'a, A>) -> Self {
        checker.undo_log.lock();
        let snapshot = checker.undo_log.snapshot();
        Probe {
            checker,
            entry: None,
            snapshot: Some(snapshot),
            success: false,
        }
    }

    fn succeed_if(&mut self, success: bool) {
        self.success = success;
    }
}

impl<'a, A: AnnotationChecker> Deref for Probe<'_, 'a, A> {
    type Target = SubtypeChecker<'a, A>;

    fn deref(&self) -> &Self::Target {
        self.checker
    }
}

impl<A: AnnotationChecker> DerefMut for Probe<'_, '_, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.checker
    }
}

impl<A: AnnotationChecker> Drop for Probe<'_, '_, A> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            if self.success {
                self.checker.undo_log.commit(snapshot);
            } else {
                self.checker.undo_log.undo_to(snapshot);
            }
        }
        self.checker.undo_log.unlock();
        if let Some(entry) = self.entry.take() {
            self.checker.guard.leave(entry);
        }
    }
}

/// One level of existential skolemization.
struct SkolemScope<'c, 'a, A: AnnotationChecker> {
    checker: &'c mut SubtypeChecker<'a, A>,
    entered: bool,
}

impl<'c, 'a, A: AnnotationChecker> SkolemScope<'c, 'a, A> {
    fn enter(checker: &'c mut SubtypeChecker<'a, A>) -> Self {
        let entered = checker.skolemization.enter();
        SkolemScope { checker, entered }
    }
}

impl<'a, A: AnnotationChecker> Deref for SkolemScope<'_, 'a, A> {
    type Target = SubtypeChecker<'a, A>;

    fn deref(&self) -> &Self::Target {
        self.checker
    }
}

impl<A: AnnotationChecker> DerefMut for SkolemScope<'_, '_, A> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.checker
    }
}

impl<A: AnnotationChecker> Drop for SkolemScope<'_, '_, A> {
    fn drop(&mut self) {
        if self.entered {
            self.checker.skolemization.leave();
        }
    }
}

#[cfg(test)]
#[path = "tests/subtype_tests.rs"]
mod tests;
