//! Recursion guards for the relation procedures.
//!
//! # Design
//!
//! Subtype checking over recursive types (F-bounded parents, expansive
//! inheritance, abstract types bounded by themselves) may re-enter the same
//! question forever. Two mechanisms keep it finite:
//!
//! 1. [`RecursionGuard`] counts nesting of a recursive predicate and, once the
//!    nesting passes a threshold, tracks the keys currently being decided in a
//!    pending set. Re-entering a pending key is reported as a
//!    [`RecursionResult::Cycle`]. Below the threshold the pending set is never
//!    consulted, so shallow queries never pay for it.
//! 2. [`DepthCounter`] bounds plain nesting where revisiting is legitimate
//!    (skolemization levels, base-type expansion).
//!
//! # Profiles
//!
//! [`RecursionProfile`] names the presets used at each call site:
//!
//! ```ignore
//! let guard = RecursionGuard::<(TypeId, TypeId)>::with_profile(RecursionProfile::PendingSubtypes);
//! ```
//!
//! # Safety
//!
//! - Entering hands back an [`Entry`] token that must be passed to `leave`.
//! - In debug builds, dropping a guard with live entries panics (unless the
//!   thread is already unwinding).

use rustc_hash::FxHashSet;
use std::hash::Hash;
use tyrel_common::limits;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// The subtype predicate.
    ///
    /// Pairs are tracked from nesting level
    /// [`LOG_PENDING_SUBTYPES_THRESHOLD`](limits::LOG_PENDING_SUBTYPES_THRESHOLD)
    /// on; depth = [`MAX_SUBTYPE_DEPTH`](limits::MAX_SUBTYPE_DEPTH).
    PendingSubtypes,

    /// Class linearization. Every class being linearized is tracked so that a
    /// cyclic parent declaration is cut instead of looping.
    ///
    /// track_from = 0, depth = 256
    Linearization,

    /// Base-type expansion through parents and bounds.
    ///
    /// depth = [`MAX_BASE_TYPE_DEPTH`](limits::MAX_BASE_TYPE_DEPTH)
    BaseTypeExpansion,

    /// Nesting of existential skolemization. Unbounded; the level is recorded
    /// on the skolems it creates.
    SkolemizationLevel,

    /// Custom limits for one-off or test scenarios.
    Custom { track_from: u32, max_depth: u32 },
}

impl RecursionProfile {
    /// Nesting level from which keys are tracked.
    pub const fn track_from(self) -> u32 {
        match self {
            Self::PendingSubtypes => limits::LOG_PENDING_SUBTYPES_THRESHOLD,
            Self::Linearization => 0,
            Self::BaseTypeExpansion => u32::MAX,
            Self::SkolemizationLevel => u32::MAX,
            Self::Custom { track_from, .. } => track_from,
        }
    }

    /// Maximum nesting depth.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::PendingSubtypes => limits::MAX_SUBTYPE_DEPTH,
            Self::Linearization => 256,
            Self::BaseTypeExpansion => limits::MAX_BASE_TYPE_DEPTH,
            Self::SkolemizationLevel => u32::MAX,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Proof of a successful [`RecursionGuard::enter`]; hand it back to `leave`.
#[must_use = "an Entry must be passed back to RecursionGuard::leave"]
#[derive(Debug, PartialEq, Eq)]
pub struct Entry<K> {
    tracked: Option<K>,
}

impl<K> Entry<K> {
    /// Whether the key was inserted into the pending set.
    #[inline]
    pub fn is_tracked(&self) -> bool {
        self.tracked.is_some()
    }
}

/// Result of attempting to enter a recursive computation.
#[derive(Debug, PartialEq, Eq)]
pub enum RecursionResult<K> {
    /// Proceed with the computation.
    Entered(Entry<K>),
    /// The key is already pending at a tracked level.
    Cycle,
    /// Maximum nesting depth exceeded.
    DepthExceeded,
}

impl<K> RecursionResult<K> {
    #[inline]
    pub fn is_entered(&self) -> bool {
        matches!(self, Self::Entered(_))
    }

    #[inline]
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::Cycle)
    }

    #[inline]
    pub fn is_denied(&self) -> bool {
        !self.is_entered()
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Nesting counter with a pending-key set above a threshold.
///
/// ```ignore
/// match guard.enter((lhs, rhs)) {
///     RecursionResult::Entered(entry) => {
///         let result = decide(lhs, rhs);
///         guard.leave(entry);
///         result
///     }
///     RecursionResult::Cycle | RecursionResult::DepthExceeded => false,
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    pending: FxHashSet<K>,
    depth: u32,
    iterations: u64,
    cycles: u64,
    cutoffs: u64,
    track_from: u32,
    max_depth: u32,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    /// Create a guard with explicit limits.
    pub fn new(track_from: u32, max_depth: u32) -> Self {
        Self {
            pending: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            cycles: 0,
            cutoffs: 0,
            track_from,
            max_depth,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.track_from(), profile.max_depth())
    }

    /// Builder: change the tracking threshold.
    pub fn with_track_from(mut self, track_from: u32) -> Self {
        self.track_from = track_from;
        self
    }

    /// Builder: change the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Try to enter the computation for `key`.
    ///
    /// The nesting level is raised first; if the raised level is at or above
    /// the threshold the key is looked up in (and then added to) the pending
    /// set. A denied entry leaves the guard exactly as it was, apart from the
    /// statistics.
    pub fn enter(&mut self, key: K) -> RecursionResult<K> {
        self.iterations = self.iterations.saturating_add(1);
        if self.depth >= self.max_depth {
            self.cutoffs = self.cutoffs.saturating_add(1);
            return RecursionResult::DepthExceeded;
        }
        self.depth += 1;

        if self.depth < self.track_from {
            return RecursionResult::Entered(Entry { tracked: None });
        }
        if !self.pending.insert(key) {
            self.depth -= 1;
            self.cycles = self.cycles.saturating_add(1);
            return RecursionResult::Cycle;
        }
        RecursionResult::Entered(Entry { tracked: Some(key) })
    }

    /// Raise the nesting level without a key (never tracked).
    pub fn enter_untracked(&mut self) -> RecursionResult<K> {
        self.iterations = self.iterations.saturating_add(1);
        if self.depth >= self.max_depth {
            self.cutoffs = self.cutoffs.saturating_add(1);
            return RecursionResult::DepthExceeded;
        }
        self.depth += 1;
        RecursionResult::Entered(Entry { tracked: None })
    }

    /// Leave a computation entered with [`enter`](Self::enter) or
    /// [`enter_untracked`](Self::enter_untracked).
    pub fn leave(&mut self, entry: Entry<K>) {
        if let Some(key) = entry.tracked {
            let was_present = self.pending.remove(&key);
            debug_assert!(
                was_present,
                "RecursionGuard::leave() with a tracked key missing from the pending set"
            );
        }
        debug_assert!(self.depth > 0, "RecursionGuard::leave() at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Check whether `key` is pending (without entering).
    #[inline]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains(key)
    }

    /// Current nesting level.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Total enter attempts so far.
    #[inline]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Number of entries refused because the key was pending.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Number of entries refused because the depth limit was reached.
    #[inline]
    pub fn cutoffs(&self) -> u64 {
        self.cutoffs
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    #[inline]
    pub fn track_from(&self) -> u32 {
        self.track_from
    }

    /// Clear the statistics. Only valid while no entry is live.
    pub fn reset_stats(&mut self) {
        debug_assert!(!self.is_active());
        self.iterations = 0;
        self.cycles = 0;
        self.cutoffs = 0;
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && (self.depth > 0 || !self.pending.is_empty()) {
            panic!(
                "RecursionGuard dropped at depth {} with {} pending keys; \
                 an enter() was not matched by leave()",
                self.depth,
                self.pending.len(),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only counter, no key tracking.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Try to go one level deeper. On `false` the depth is unchanged and
    /// `leave` must not be called.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Sticky until the counter is dropped.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl Drop for DepthCounter {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.depth > 0 {
            panic!(
                "DepthCounter dropped at depth {}; an enter() was not matched by leave()",
                self.depth
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn entered<K: std::fmt::Debug>(result: RecursionResult<K>) -> Entry<K> {
        match result {
            RecursionResult::Entered(entry) => entry,
            other => panic!("expected Entered, got {other:?}"),
        }
    }

    // ===================================================================
    // RecursionProfile
    // ===================================================================

    #[test]
    fn profile_pending_subtypes_limits() {
        let p = RecursionProfile::PendingSubtypes;
        assert_eq!(p.track_from(), limits::LOG_PENDING_SUBTYPES_THRESHOLD);
        assert_eq!(p.max_depth(), limits::MAX_SUBTYPE_DEPTH);
    }

    #[test]
    fn profile_custom_limits() {
        let p = RecursionProfile::Custom {
            track_from: 3,
            max_depth: 7,
        };
        assert_eq!(p.track_from(), 3);
        assert_eq!(p.max_depth(), 7);
    }

    // ===================================================================
    // Threshold behaviour
    // ===================================================================

    #[test]
    fn below_threshold_keys_are_not_tracked() {
        let mut guard = RecursionGuard::new(3, 100);
        let a = entered(guard.enter(1u32));
        let b = entered(guard.enter(1u32));
        assert!(!a.is_tracked());
        assert!(!b.is_tracked());
        assert_eq!(guard.pending_count(), 0);
        assert_eq!(guard.depth(), 2);
        guard.leave(b);
        guard.leave(a);
        assert!(!guard.is_active());
    }

    #[test]
    fn at_threshold_repeated_key_is_a_cycle() {
        let mut guard = RecursionGuard::new(2, 100);
        let outer = entered(guard.enter(7u32));
        let tracked = entered(guard.enter(7u32));
        assert!(tracked.is_tracked());
        assert!(guard.is_pending(&7));

        assert!(guard.enter(7u32).is_cycle());
        assert_eq!(guard.depth(), 2, "a refused entry must not change the depth");
        assert_eq!(guard.cycles(), 1);

        guard.leave(tracked);
        assert!(!guard.is_pending(&7));
        guard.leave(outer);
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn zero_threshold_tracks_everything() {
        let mut guard = RecursionGuard::with_profile(RecursionProfile::Linearization);
        let a = entered(guard.enter(1u32));
        let b = entered(guard.enter(2u32));
        assert!(guard.enter(1u32).is_cycle());
        guard.leave(b);
        guard.leave(a);
    }

    #[test]
    fn untracked_entries_count_towards_threshold() {
        let mut guard = RecursionGuard::new(2, 100);
        let outer = entered(guard.enter_untracked());
        let inner = entered(guard.enter(5u32));
        assert!(inner.is_tracked());
        guard.leave(inner);
        guard.leave(outer);
    }

    #[test]
    fn depth_limit_denies_entry() {
        let mut guard = RecursionGuard::new(u32::MAX, 1);
        let a = entered(guard.enter(1u32));
        assert_eq!(guard.enter(2u32), RecursionResult::DepthExceeded);
        assert_eq!(guard.enter_untracked(), RecursionResult::DepthExceeded);
        assert_eq!(guard.cutoffs(), 2);
        assert_eq!(guard.cycles(), 0);
        assert_eq!(guard.depth(), 1);
        guard.leave(a);
        guard.reset_stats();
        assert_eq!(guard.cutoffs(), 0);
    }

    #[test]
    fn iterations_count_every_attempt() {
        let mut guard = RecursionGuard::new(1, 100);
        let a = entered(guard.enter(1u32));
        assert!(guard.enter(1u32).is_denied());
        guard.leave(a);
        assert_eq!(guard.iterations(), 2);
        guard.reset_stats();
        assert_eq!(guard.iterations(), 0);
    }

    // ===================================================================
    // DepthCounter
    // ===================================================================

    #[test]
    fn depth_counter_enter_leave() {
        let mut counter = DepthCounter::new(2);
        assert!(counter.enter());
        assert!(counter.enter());
        assert!(!counter.enter());
        assert!(counter.is_exceeded());
        assert_eq!(counter.depth(), 2);
        counter.leave();
        counter.leave();
        assert_eq!(counter.depth(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "DepthCounter dropped")]
    fn depth_counter_leak_panics_in_debug() {
        let mut counter = DepthCounter::new(4);
        assert!(counter.enter());
        drop(counter);
    }
}
