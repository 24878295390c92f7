//! Type representation.
//!
//! Types are interned: a [`TypeData`] is stored once and addressed by a
//! [`TypeId`]. Structural equality of `TypeData` therefore coincides with
//! handle equality, which is what the "identical node" shortcut of the
//! relation procedures relies on.
//!
//! Every payload is a handle (type ids, list ids, symbol ids), so `TypeData`
//! is `Copy` and cheap to match on.

use crate::symbols::SymbolId;
use bitflags::bitflags;
use tyrel_common::Name;

/// Handle to an interned type. The default is [`TypeId::NO_TYPE`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Absence of a type.
    pub const NO_TYPE: TypeId = TypeId(0);
    /// Prefix of a reference to a symbol that needs no qualification.
    pub const NO_PREFIX: TypeId = TypeId(1);
    /// Erroneous type; relates to everything.
    pub const ERROR: TypeId = TypeId(2);
    /// Unknown type; relates to everything.
    pub const WILDCARD: TypeId = TypeId(3);

    /// First id handed out for interned (non-sentinel) types.
    pub const FIRST_USER: u32 = 4;

    #[inline]
    pub fn is_sentinel(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    /// `Error` or `Wildcard`.
    #[inline]
    pub fn is_permissive(self) -> bool {
        self == Self::ERROR || self == Self::WILDCARD
    }

    #[inline]
    pub fn exists(self) -> bool {
        self != Self::NO_TYPE
    }
}

/// Handle to an interned list of types. `TypeListId(0)` is the empty list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct TypeListId(pub u32);

/// Handle to an interned list of symbols. `SymbolListId(0)` is the empty list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SymbolListId(pub u32);

impl TypeListId {
    pub const EMPTY: TypeListId = TypeListId(0);
}

impl SymbolListId {
    pub const EMPTY: SymbolListId = SymbolListId(0);
}

/// Index of a type variable in a checker's type-variable table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub u32);

impl TypeVarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Literal value carried by a constant type.
///
/// Doubles are stored by bit pattern, so `NaN` equals itself and `0.0`
/// differs from `-0.0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Unit,
    Null,
    Boolean(bool),
    Char(char),
    Int(i32),
    Long(i64),
    Double(u64),
    Str(Name),
}

impl ConstantValue {
    pub fn double(value: f64) -> Self {
        ConstantValue::Double(value.to_bits())
    }
}

bitflags! {
    /// Flags of a method type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u8 {
        /// The parameter list is implicit.
        const IMPLICIT = 1 << 0;
        /// The method was defined in Java, where `Object` parameters accept `Any`.
        const JAVA = 1 << 1;
    }
}

/// Variance of a type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

impl Variance {
    #[inline]
    pub fn is_covariant(self) -> bool {
        self == Variance::Covariant
    }

    #[inline]
    pub fn is_contravariant(self) -> bool {
        self == Variance::Contravariant
    }

    #[inline]
    pub fn is_invariant(self) -> bool {
        self == Variance::Invariant
    }

    pub fn flip(self) -> Self {
        match self {
            Variance::Covariant => Variance::Contravariant,
            Variance::Contravariant => Variance::Covariant,
            Variance::Invariant => Variance::Invariant,
        }
    }
}

/// Recursion budget of a subtype query.
///
/// [`Depth::ANY`] never runs out. A finite depth is decremented each time the
/// procedure retries with a widened left-hand side (base types, upper bounds,
/// singleton widening); those retries fail once the depth is exhausted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Depth(i32);

impl Depth {
    pub const ANY: Depth = Depth(-3);
    pub const ZERO: Depth = Depth(0);

    pub fn new(depth: u32) -> Self {
        Depth(depth.min(i32::MAX as u32) as i32)
    }

    #[inline]
    pub fn is_any(self) -> bool {
        self == Self::ANY
    }

    #[inline]
    pub fn is_exhausted(self) -> bool {
        !self.is_any() && self.0 <= 0
    }

    pub fn decr(self) -> Self {
        if self.is_any() {
            self
        } else {
            Depth((self.0 - 1).max(0))
        }
    }

    /// Remaining budget, `None` for [`Depth::ANY`].
    pub fn remaining(self) -> Option<u32> {
        if self.is_any() {
            None
        } else {
            Some(self.0 as u32)
        }
    }
}

/// Structure of an interned type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    NoType,
    NoPrefix,
    Error,
    Wildcard,

    /// `C.this.type`.
    This(SymbolId),
    /// `pre.x.type` for a stable value `x`.
    Single { prefix: TypeId, sym: SymbolId },
    /// Literal type.
    Constant(ConstantValue),
    /// `pre#C[args]`.
    Ref {
        prefix: TypeId,
        sym: SymbolId,
        args: TypeListId,
    },
    /// `P1 with ... with Pn { decls }`. `class` is the synthetic refinement
    /// class that owns `decls`.
    Refined {
        parents: TypeListId,
        decls: SymbolListId,
        class: SymbolId,
    },
    /// `underlying forSome { quantified }`.
    Existential {
        quantified: SymbolListId,
        underlying: TypeId,
    },
    /// `underlying @a1 ... @an`; annotations are given by their classes.
    Annotated {
        annotations: SymbolListId,
        underlying: TypeId,
    },
    /// Wildcard restricted to a `Bounds` type.
    BoundedWildcard(TypeId),
    /// `>: lo <: hi`.
    Bounds { lo: TypeId, hi: TypeId },
    /// `(params)result`; parameter types are the infos of `params`.
    Method {
        params: SymbolListId,
        result: TypeId,
        flags: MethodFlags,
    },
    /// `=> result`.
    NullaryMethod(TypeId),
    /// `[type_params]result`.
    Poly {
        type_params: SymbolListId,
        result: TypeId,
    },
    /// Unification variable; its constraint lives in the checker.
    TypeVar(TypeVarId),
    /// `underlying with NotNull`.
    NotNull(TypeId),
}

impl TypeData {
    /// `This` or `Single`.
    #[inline]
    pub fn is_singleton_ref(&self) -> bool {
        matches!(self, TypeData::This(_) | TypeData::Single { .. })
    }

    /// Singleton types in the wide sense: this, single and constant types.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        matches!(
            self,
            TypeData::This(_) | TypeData::Single { .. } | TypeData::Constant(_)
        )
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self, TypeData::Constant(_))
    }

    #[inline]
    pub fn is_permissive(&self) -> bool {
        matches!(self, TypeData::Error | TypeData::Wildcard)
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
