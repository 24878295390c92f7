//! Annotation conformance.
//!
//! Subtyping strips annotations and then asks an [`AnnotationChecker`]
//! whether the annotations themselves are compatible. Hosts with their own
//! annotation semantics plug in a checker; the default only protects
//! annotations whose class is flagged `TYPE_CONSTRAINT`.

use crate::env::TypeEnv;
use crate::symbols::SymbolFlags;
use crate::types::TypeId;

pub trait AnnotationChecker {
    /// Do the annotations of `lhs` conform to those of `rhs`?
    fn annotations_conform(&self, env: TypeEnv<'_>, lhs: TypeId, rhs: TypeId) -> bool;
}

/// Every `TYPE_CONSTRAINT` annotation on the right must also be on the left.
#[derive(Clone, Copy, Debug, Default)]
pub struct TypeConstraintAnnotations;

impl AnnotationChecker for TypeConstraintAnnotations {
    fn annotations_conform(&self, env: TypeEnv<'_>, lhs: TypeId, rhs: TypeId) -> bool {
        let required = env.annotations(rhs);
        if required.is_empty() {
            return true;
        }
        let present = env.annotations(lhs);
        required
            .iter()
            .filter(|&&a| env.symbols.flags(a).contains(SymbolFlags::TYPE_CONSTRAINT))
            .all(|a| present.contains(a))
    }
}

/// Accepts all annotations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAnnotationChecker;

impl AnnotationChecker for NoopAnnotationChecker {
    fn annotations_conform(&self, _env: TypeEnv<'_>, _lhs: TypeId, _rhs: TypeId) -> bool {
        true
    }
}

impl<T: AnnotationChecker + ?Sized> AnnotationChecker for &T {
    fn annotations_conform(&self, env: TypeEnv<'_>, lhs: TypeId, rhs: TypeId) -> bool {
        (**self).annotations_conform(env, lhs, rhs)
    }
}
