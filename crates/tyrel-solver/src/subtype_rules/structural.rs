//! Refinements, existentials, and method signatures.
//!
//! - A refined type on the right is a conjunction: every parent must be a
//!   supertype and every member must be specialized by a member of the left.
//! - A refined type on the left is a disjunction over its parents (handled in
//!   the fourth pass).
//! - An existential on the right holds if some instantiation of its
//!   quantifiers works; fresh type variables collect the constraints and are
//!   then solved within the quantifiers' bounds.

use crate::annotations::AnnotationChecker;
use crate::constraint::TypeConstraint;
use crate::subtype::SubtypeChecker;
use crate::symbols::{SymbolFlags, SymbolId};
use crate::types::{Depth, MethodFlags, SymbolListId, TypeData, TypeId, TypeListId, Variance};
use tracing::debug;

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    pub(crate) fn conforms_to_refinement(
        &mut self,
        tp1: TypeId,
        parents: TypeListId,
        decls: SymbolListId,
        depth: Depth,
    ) -> bool {
        let parents = self.env.type_list(parents);
        if !parents.iter().all(|&p| self.is_subtype_depth(tp1, p, depth)) {
            return false;
        }
        let decls = self.env.symbol_list(decls);
        decls.iter().all(|&d| self.specializes_sym(tp1, d, depth))
    }

    /// Does `tp` have a member that matches `sym2` (a member of some
    /// refinement) at least as precisely?
    pub fn specializes_sym(&mut self, tp: TypeId, sym2: SymbolId, depth: Depth) -> bool {
        let env = self.env;
        let defs = env.defs();
        let tsym = env.type_symbol(tp);
        if tsym == defs.nothing {
            return true;
        }
        let owner2 = env.symbols.owner(sym2);
        if tsym == defs.null && env.symbols.contains_null(env.db, owner2) {
            return true;
        }
        let alternatives = env.find_member(tp, env.symbols.name(sym2));
        alternatives
            .into_iter()
            .any(|sym1| sym1 == sym2 || self.specializes_member(tp, sym1, sym2, depth))
    }

    fn specializes_member(&mut self, tp1: TypeId, sym1: SymbolId, sym2: SymbolId, depth: Depth) -> bool {
        let env = self.env;
        let data1 = env.sym(sym1);
        let data2 = env.sym(sym2);
        let info2 = env.subst_this(data2.info, data2.owner, tp1);
        if data2.is_term() {
            let info1 = env.member_info(tp1, sym1);
            let stable_ok =
                !data2.flags.contains(SymbolFlags::STABLE) || data1.flags.contains(SymbolFlags::STABLE);
            return data1.is_term() && self.is_subtype_depth(info1, info2, depth) && stable_ok;
        }
        if data2.is_abstract_type() {
            if !data1.is_type() {
                return false;
            }
            let member1 = env.member_type(tp1, sym1);
            let (lo, hi) = match env.data(info2) {
                TypeData::Bounds { lo, hi } => (lo, hi),
                _ => env.bounds_of(sym2),
            };
            return self.is_subtype_depth(lo, member1, depth) && self.is_subtype_depth(member1, hi, depth);
        }
        if data2.is_alias_type() {
            if !data1.is_type() {
                return false;
            }
            let member1 = env.member_type(tp1, sym1);
            return self.is_same_type(member1, info2);
        }
        false
    }

    /// Existential on the right: instantiate the quantifiers with fresh type
    /// variables, check `tp1` against the body, then solve the variables
    /// within the quantifiers' bounds.
    pub(crate) fn with_type_vars(
        &mut self,
        tp1: TypeId,
        quantified: SymbolListId,
        underlying: TypeId,
        depth: Depth,
    ) -> bool {
        let env = self.env;
        let quantified = env.symbol_list(quantified);
        let fresh = env.clone_symbols(&quantified);
        let tvars: Vec<TypeId> = fresh
            .iter()
            .map(|&q| {
                let origin = env.type_constructor(q);
                self.fresh_type_var(origin, TypeConstraint::new())
            })
            .collect();
        let body = env.subst_sym(underlying, &quantified, &fresh);
        let body = env.subst_types(body, &fresh, &tvars);
        if !self.is_subtype_depth(tp1, body, depth) {
            return false;
        }
        let variances = vec![Variance::Invariant; fresh.len()];
        match self.solve(&tvars, &fresh, &variances, false, depth) {
            Ok(insts) => self.is_within_bounds(TypeId::NO_PREFIX, SymbolId::NO_SYMBOL, &fresh, &insts),
            Err(err) => {
                debug!(error = %err, "with_type_vars: solving failed");
                false
            }
        }
    }

    /// Method types: same arity and implicitness, matching parameter types,
    /// covariant result (after renaming parameters).
    pub(crate) fn method_conforms(&mut self, data1: &TypeData, data2: &TypeData, depth: Depth) -> bool {
        let (
            TypeData::Method { params: params1, result: result1, flags: flags1 },
            TypeData::Method { params: params2, result: result2, flags: flags2 },
        ) = (*data1, *data2)
        else {
            return false;
        };
        let env = self.env;
        let params1 = env.symbol_list(params1);
        let params2 = env.symbol_list(params2);
        params1.len() == params2.len()
            && flags1.contains(MethodFlags::IMPLICIT) == flags2.contains(MethodFlags::IMPLICIT)
            && self.matching_params(
                &params1,
                &params2,
                flags1.contains(MethodFlags::JAVA),
                flags2.contains(MethodFlags::JAVA),
            )
            && {
                let renamed = env.subst_sym(result1, &params1, &params2);
                self.is_subtype_depth(renamed, result2, depth)
            }
    }

    /// Parameter types match exactly, except that a Java `Object` parameter
    /// matches a Scala `Any` parameter.
    pub(crate) fn matching_params(
        &mut self,
        params1: &[SymbolId],
        params2: &[SymbolId],
        java1: bool,
        java2: bool,
    ) -> bool {
        let env = self.env;
        let defs = env.defs();
        params1.len() == params2.len()
            && params1.iter().zip(params2).all(|(&p1, &p2)| {
                let tp1 = env.symbols.info(p1);
                let tp2 = env.symbols.info(p2);
                let sym1 = env.type_symbol(tp1);
                let sym2 = env.type_symbol(tp2);
                self.is_same_type(tp1, tp2)
                    || (java1 && sym2 == defs.object && sym1 == defs.any)
                    || (java2 && sym1 == defs.object && sym2 == defs.any)
            })
    }
}
