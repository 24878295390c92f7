//! Subtyping between type constructors.
//!
//! Both sides are eta-expanded to `Poly` types. Parameters are matched
//! pairwise: arity and variance first, then bounds (contravariantly), then
//! the results under a common renaming of the parameters.

use crate::annotations::AnnotationChecker;
use crate::subtype::SubtypeChecker;
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::{Depth, TypeData, TypeId};
use tracing::trace;

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    pub(crate) fn is_hk_subtype(&mut self, tp1: TypeId, tp2: TypeId, depth: Depth) -> bool {
        let env = self.env;
        let defs = env.defs();
        if env.type_symbol(tp1) == defs.nothing || env.type_symbol(tp2) == defs.any {
            return true;
        }
        let norm1 = env.normalize(tp1);
        let norm2 = env.normalize(tp2);
        let (
            TypeData::Poly { type_params: tparams1, result: res1 },
            TypeData::Poly { type_params: tparams2, result: res2 },
        ) = (env.data(env.without_annotations(norm1)), env.data(env.without_annotations(norm2)))
        else {
            trace!(lhs = tp1.0, rhs = tp2.0, "is_hk_subtype: kinds differ");
            return false;
        };
        let tparams1 = env.symbol_list(tparams1);
        let tparams2 = env.symbol_list(tparams2);
        if tparams1.len() != tparams2.len() {
            return false;
        }
        if self.policy.check_hk_variance && !self.variances_conform(&tparams1, &tparams2) {
            trace!(lhs = tp1.0, rhs = tp2.0, "is_hk_subtype: variances differ");
            return false;
        }

        let owner_is_method = tparams1
            .first()
            .is_some_and(|&p| env.symbols.kind(env.symbols.owner(p)) == SymbolKind::Method);
        let conforms = if owner_is_method {
            tparams1.iter().zip(tparams2.iter()).all(|(&p1, &p2)| {
                let bounds2 = env.subst_sym(self.param_bounds(p2), &tparams2, &tparams1);
                let bounds1 = self.param_bounds(p1);
                self.is_subtype_depth(bounds2, bounds1, depth)
            }) && {
                let res2 = env.subst_sym(res2, &tparams2, &tparams1);
                self.is_subtype_depth(res1, res2, depth)
            }
        } else {
            let fresh = env.clone_symbols(&tparams1);
            tparams1.iter().zip(tparams2.iter()).all(|(&p1, &p2)| {
                let bounds2 = env.subst_sym(self.param_bounds(p2), &tparams2, &fresh);
                let bounds1 = env.subst_sym(self.param_bounds(p1), &tparams1, &fresh);
                self.is_subtype_depth(bounds2, bounds1, depth)
            }) && {
                let res1 = env.subst_sym(res1, &tparams1, &fresh);
                let res2 = env.subst_sym(res2, &tparams2, &fresh);
                self.is_subtype_depth(res1, res2, depth)
            }
        };
        conforms && self.annotations_conform(norm1, norm2)
    }

    /// `p2` invariant, or both parameters with the same variance.
    fn variances_conform(&self, tparams1: &[SymbolId], tparams2: &[SymbolId]) -> bool {
        tparams1.iter().zip(tparams2).all(|(&p1, &p2)| {
            let v1 = self.env.sym(p1).variance();
            let v2 = self.env.sym(p2).variance();
            v2.is_invariant() || v1 == v2
        })
    }

    /// Declared bounds of a type parameter as a `Bounds` type.
    pub(crate) fn param_bounds(&self, param: SymbolId) -> TypeId {
        let (lo, hi) = self.env.bounds_of(param);
        self.env.db.bounds(lo, hi)
    }
}
