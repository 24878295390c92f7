//! Subtype and type-equivalence engine for a Scala-style type system.
//!
//! Types are interned ([`TypeInterner`]) and refer to symbols held in a
//! concurrent [`SymbolTable`]. A [`SubtypeChecker`] decides `<:` and `=:=`
//! over a [`TypeEnv`] (the pair of stores), recording constraints on type
//! variables in an undo log so that speculative queries leave no trace when
//! they fail.
//!
//! Key properties:
//! - O(1) identity test via interning (`TypeId` comparison)
//! - Termination on cyclic inheritance through the pending-pair guard
//! - Constraint rollback on every failed nested query
//! - Pluggable annotation conformance ([`AnnotationChecker`])

pub mod annotations;
pub mod common_owner;
pub mod constraint;
mod db;
pub mod env;
mod format;
mod intern;
mod query_trace;
pub mod recursion;
pub mod relation_queries;
mod same_type;
mod solve;
mod subtype;
mod subtype_rules;
pub mod symbols;
mod type_ops;
pub mod types;
pub mod undo;
pub mod visitor;

pub use annotations::{AnnotationChecker, NoopAnnotationChecker, TypeConstraintAnnotations};
pub use common_owner::{CommonOwnerFinder, common_owner_in, common_owner_of};
pub use constraint::{InferenceError, TypeConstraint, TypeVarInfo};
pub use db::TypeDatabase;
pub use env::TypeEnv;
pub use format::TypeFormatter;
pub use intern::TypeInterner;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use relation_queries::*;
pub use subtype::SubtypeChecker;
pub use symbols::{Definitions, SymbolData, SymbolFlags, SymbolId, SymbolKind, SymbolTable};
pub use types::{
    ConstantValue, Depth, MethodFlags, SymbolListId, TypeData, TypeId, TypeListId, TypeVarId, Variance,
};
pub use undo::{UndoLog, UndoSnapshot};
pub use visitor::{TypeMapper, exists_type, for_each_child, map_over};

#[cfg(test)]
mod test_fixtures;
