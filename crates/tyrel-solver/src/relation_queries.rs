//! Relation query entry points.
//!
//! Callers that only need a yes/no answer use these free functions; each
//! call runs on a fresh [`SubtypeChecker`], so queries from different
//! threads never share recursion or constraint state.

use crate::annotations::{AnnotationChecker, TypeConstraintAnnotations};
use crate::common_owner::common_owner_in;
use crate::db::TypeDatabase;
use crate::env::TypeEnv;
use crate::subtype::SubtypeChecker;
use crate::symbols::{SymbolId, SymbolTable};
use crate::types::TypeId;
use tyrel_common::limits::{LOG_PENDING_SUBTYPES_THRESHOLD, MAX_SUBTYPE_DEPTH};

/// Policy knobs for relation checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtypePolicy {
    /// Nesting level from which `(lhs, rhs)` pairs are tracked; a pair that
    /// is already pending is answered `false`.
    pub pending_threshold: u32,
    /// Nesting level beyond which a query is answered `false`.
    pub max_depth: u32,
    /// Compare references to the same symbol without looking at prefixes.
    pub erased_types: bool,
    /// Require annotation conformance when stripping annotations.
    pub check_annotations: bool,
    /// Require compatible variances when comparing type constructors.
    pub check_hk_variance: bool,
}

impl Default for SubtypePolicy {
    fn default() -> Self {
        Self {
            pending_threshold: LOG_PENDING_SUBTYPES_THRESHOLD,
            max_depth: MAX_SUBTYPE_DEPTH,
            erased_types: false,
            check_annotations: true,
            check_hk_variance: true,
        }
    }
}

impl SubtypePolicy {
    pub fn with_pending_threshold(mut self, threshold: u32) -> Self {
        self.pending_threshold = threshold;
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_erased_types(mut self, erased: bool) -> Self {
        self.erased_types = erased;
        self
    }

    pub fn with_check_annotations(mut self, check: bool) -> Self {
        self.check_annotations = check;
        self
    }

    pub fn with_check_hk_variance(mut self, check: bool) -> Self {
        self.check_hk_variance = check;
        self
    }
}

/// `lhs <: rhs` under the default policy.
pub fn is_subtype_of(db: &dyn TypeDatabase, symbols: &SymbolTable, lhs: TypeId, rhs: TypeId) -> bool {
    is_subtype_of_with_policy(db, symbols, lhs, rhs, SubtypePolicy::default())
}

pub fn is_subtype_of_with_policy(
    db: &dyn TypeDatabase,
    symbols: &SymbolTable,
    lhs: TypeId,
    rhs: TypeId,
    policy: SubtypePolicy,
) -> bool {
    is_subtype_of_with_annotations(db, symbols, lhs, rhs, policy, TypeConstraintAnnotations)
}

pub fn is_subtype_of_with_annotations<A: AnnotationChecker>(
    db: &dyn TypeDatabase,
    symbols: &SymbolTable,
    lhs: TypeId,
    rhs: TypeId,
    policy: SubtypePolicy,
    annotations: A,
) -> bool {
    let env = TypeEnv::new(db, symbols);
    let mut checker = SubtypeChecker::with_annotation_checker(env, policy, annotations);
    checker.is_subtype(lhs, rhs)
}

/// `lhs =:= rhs` under the default policy.
pub fn is_same_type_of(db: &dyn TypeDatabase, symbols: &SymbolTable, lhs: TypeId, rhs: TypeId) -> bool {
    let mut checker = SubtypeChecker::new(TypeEnv::new(db, symbols));
    checker.is_same_type(lhs, rhs)
}

/// Innermost symbol enclosing every local reference in `types`.
pub fn common_owner(db: &dyn TypeDatabase, symbols: &SymbolTable, types: &[TypeId]) -> SymbolId {
    common_owner_in(TypeEnv::new(db, symbols), types)
}
