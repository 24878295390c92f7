//! Type-variable constraints.

use crate::types::{TypeId, TypeVarId};
use std::fmt;

/// Bounds accumulated for a type variable, plus its instantiation once
/// known.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeConstraint {
    lo_bounds: Vec<TypeId>,
    hi_bounds: Vec<TypeId>,
    inst: Option<TypeId>,
}

impl TypeConstraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(lo: Vec<TypeId>, hi: Vec<TypeId>) -> Self {
        TypeConstraint {
            lo_bounds: lo,
            hi_bounds: hi,
            inst: None,
        }
    }

    pub fn lo_bounds(&self) -> &[TypeId] {
        &self.lo_bounds
    }

    pub fn hi_bounds(&self) -> &[TypeId] {
        &self.hi_bounds
    }

    pub fn inst(&self) -> Option<TypeId> {
        self.inst
    }

    #[inline]
    pub fn is_instantiated(&self) -> bool {
        self.inst.is_some()
    }

    /// Returns `false` when the bound was already present.
    pub fn add_lo_bound(&mut self, ty: TypeId) -> bool {
        if self.lo_bounds.contains(&ty) {
            return false;
        }
        self.lo_bounds.push(ty);
        true
    }

    /// Returns `false` when the bound was already present.
    pub fn add_hi_bound(&mut self, ty: TypeId) -> bool {
        if self.hi_bounds.contains(&ty) {
            return false;
        }
        self.hi_bounds.push(ty);
        true
    }

    pub fn set_inst(&mut self, ty: TypeId) {
        self.inst = Some(ty);
    }
}

/// Per-variable state held in the undo log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeVarInfo {
    /// The type the variable stands for (usually a type-parameter ref).
    pub origin: TypeId,
    /// Skolemization level at creation. Skolems created deeper than this
    /// must not leak into the constraint.
    pub level: u32,
    /// A suspended variable compares as its origin and records nothing.
    pub suspended: bool,
    pub constraint: TypeConstraint,
}

impl TypeVarInfo {
    pub fn new(origin: TypeId, level: u32, constraint: TypeConstraint) -> Self {
        TypeVarInfo {
            origin,
            level,
            suspended: false,
            constraint,
        }
    }
}

/// Failures surfaced by type-variable solving.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferenceError {
    /// The handle does not name a variable of this checker.
    UnknownVar(TypeVarId),
    /// A type passed where a type variable was expected.
    NotATypeVar(TypeId),
    /// The solved instantiation does not satisfy the variable's bounds.
    BoundsViolation { var: TypeVarId, inst: TypeId },
    /// The instantiation mentions the variable itself.
    OccursCheck { var: TypeVarId, ty: TypeId },
    /// Variables, type parameters and variances differ in length.
    ArityMismatch { expected: usize, found: usize },
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::UnknownVar(var) => write!(f, "unknown type variable ?{}", var.0),
            InferenceError::NotATypeVar(ty) => write!(f, "type #{} is not a type variable", ty.0),
            InferenceError::BoundsViolation { var, inst } => {
                write!(f, "instantiation #{} of ?{} is not within its bounds", inst.0, var.0)
            }
            InferenceError::OccursCheck { var, ty } => {
                write!(f, "type variable ?{} occurs in its instantiation #{}", var.0, ty.0)
            }
            InferenceError::ArityMismatch { expected, found } => {
                write!(f, "expected {expected} type parameters, found {found}")
            }
        }
    }
}

impl std::error::Error for InferenceError {}
