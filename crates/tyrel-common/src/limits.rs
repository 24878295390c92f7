//! Centralized limits and thresholds for the type-relation engine.
//!
//! Every numeric cut-off the solver relies on lives here so that the values
//! used by the recursion guard, the base-type walk and the bound solver stay
//! in one place and can be tuned together.

// =============================================================================
// Recursion limits
// =============================================================================

/// Nesting level of the subtype predicate above which `(lhs, rhs)` pairs are
/// tracked in the pending set.
///
/// Below this level the pending set is never consulted, so ordinary queries
/// pay nothing for cycle detection. Above it, re-entering a pair that is
/// already being decided returns `false` immediately.
///
/// # Example
///
/// ```scala
/// class N[-Z]
/// class C extends N[N[C]]
/// // C <: N[C] needs N[N[C]] <: N[C], which needs C <: N[C] again ...
/// ```
pub const LOG_PENDING_SUBTYPES_THRESHOLD: u32 = 50;

/// Maximum nesting of subtype and equivalence queries.
///
/// The pending-pair set only stops a question that repeats exactly. Expansive
/// inheritance can instead produce a new, larger question at every level:
///
/// ```scala
/// trait N[-Z]
/// class C[X] extends N[N[C[C[X]]]]
/// // C[Int] <: N[C[Int]] needs C[C[Int]] <: N[C[C[Int]]], and so on
/// ```
///
/// A query nested deeper than this is answered `false`.
pub const MAX_SUBTYPE_DEPTH: u32 = 256;

/// Maximum number of parent hops followed while computing a base type.
///
/// Abstract types whose upper bounds refer back to themselves would otherwise
/// make `base_type` walk forever. Exceeding the limit yields "no base type".
pub const MAX_BASE_TYPE_DEPTH: u32 = 64;

/// Maximum number of base classes inspected when looking for a shared base
/// class during least-upper-bound approximation.
pub const MAX_LUB_CANDIDATES: usize = 32;

/// Nesting depth of least upper bounds computed for type arguments. Beyond
/// it, covariant arguments become `Any` and contravariant ones `Nothing`.
pub const MAX_LUB_DEPTH: u32 = 4;

/// Maximum depth of alias expansion in `normalize`/`dealias`.
pub const MAX_ALIAS_EXPANSION_DEPTH: u32 = 128;

// =============================================================================
// Stack growth
// =============================================================================

/// Remaining stack below which the subtype predicate grows a new segment.
pub const SUBTYPE_STACK_RED_ZONE: usize = 64 * 1024;

/// Size of each stack segment allocated by the subtype predicate.
pub const SUBTYPE_STACK_SEGMENT: usize = 1024 * 1024;

// =============================================================================
// Capacity limits
// =============================================================================

/// Inline capacity of small type lists built during traversal.
pub const TYPE_LIST_INLINE: usize = 8;
