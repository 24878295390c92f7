//! Type equivalence (`=:=`).
//!
//! Equivalence is decided structurally where both sides have the same shape.
//! Otherwise bounded wildcards, type variables and annotations are handled,
//! and as a last resort singleton paths are followed to their origins and
//! aliases expanded before retrying. Equivalence queries share the checker's
//! undo log and nesting counter with subtype queries, but their pairs are
//! never tracked as pending.

use crate::annotations::AnnotationChecker;
use crate::subtype::SubtypeChecker;
use crate::symbols::SymbolId;
use crate::types::{MethodFlags, SymbolListId, TypeData, TypeId, TypeListId};
use tyrel_common::limits::MAX_ALIAS_EXPANSION_DEPTH;

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    pub(crate) fn is_same_type_core(&mut self, tp1: TypeId, tp2: TypeId) -> bool {
        if tp1 == tp2 || tp1.is_permissive() || tp2.is_permissive() {
            return true;
        }
        if tp1 == TypeId::NO_TYPE || tp2 == TypeId::NO_TYPE {
            return false;
        }
        let env = self.env;
        if tp1 == TypeId::NO_PREFIX {
            return env.sym(env.type_symbol(tp2)).is_package_class();
        }
        if tp2 == TypeId::NO_PREFIX {
            return env.sym(env.type_symbol(tp1)).is_package_class();
        }

        let data1 = env.data(tp1);
        let data2 = env.data(tp2);
        if let Some(result) = self.same_shape(&data1, &data2) {
            return result;
        }
        self.same_type_fallback(tp1, &data1, tp2, &data2)
    }

    /// Both sides have the same constructor. `None` means the shapes did not
    /// settle the question and the fallback rules apply.
    fn same_shape(&mut self, data1: &TypeData, data2: &TypeData) -> Option<bool> {
        let env = self.env;
        match (*data1, *data2) {
            (
                TypeData::Ref { prefix: pre1, sym: sym1, args: args1 },
                TypeData::Ref { prefix: pre2, sym: sym2, args: args2 },
            ) => {
                if !self.equal_syms_and_prefixes(sym1, pre1, sym2, pre2) {
                    return None;
                }
                let both_hk = args1 == TypeListId::EMPTY
                    && args2 == TypeListId::EMPTY
                    && !env.sym(sym1).type_params.is_empty();
                if both_hk {
                    return Some(true);
                }
                let args1 = env.type_list(args1);
                let args2 = env.type_list(args2);
                self.is_same_types(&args1, &args2).then_some(true)
            }
            (TypeData::Single { prefix: pre1, sym: sym1 }, TypeData::Single { prefix: pre2, sym: sym2 }) => {
                self.equal_syms_and_prefixes(sym1, pre1, sym2, pre2).then_some(true)
            }
            (TypeData::Single { prefix: pre1, sym: sym1 }, TypeData::Ref { prefix: pre2, sym: sym2, args }) => {
                self.single_matches_module(sym1, pre1, sym2, pre2, args).then_some(true)
            }
            (TypeData::Ref { prefix: pre1, sym: sym1, args }, TypeData::Single { prefix: pre2, sym: sym2 }) => {
                self.single_matches_module(sym2, pre2, sym1, pre1, args).then_some(true)
            }
            (TypeData::This(sym1), TypeData::This(sym2)) => (sym1 == sym2).then_some(true),
            (TypeData::Constant(value1), TypeData::Constant(value2)) => Some(value1 == value2),
            (
                TypeData::Refined { parents: parents1, decls: decls1, .. },
                TypeData::Refined { parents: parents2, decls: decls2, .. },
            ) => {
                let parents1 = env.type_list(parents1);
                let parents2 = env.type_list(parents2);
                Some(
                    self.is_same_types(&parents1, &parents2)
                        && self.is_sub_scope(decls1, decls2)
                        && self.is_sub_scope(decls2, decls1),
                )
            }
            (
                TypeData::Method { params: params1, result: result1, flags: flags1 },
                TypeData::Method { params: params2, result: result2, flags: flags2 },
            ) => {
                let params1 = env.symbol_list(params1);
                let params2 = env.symbol_list(params2);
                let types1: Vec<TypeId> = params1.iter().map(|&p| env.symbols.info(p)).collect();
                let types2: Vec<TypeId> = params2.iter().map(|&p| env.symbols.info(p)).collect();
                Some(
                    flags1.contains(MethodFlags::IMPLICIT) == flags2.contains(MethodFlags::IMPLICIT)
                        && self.is_same_types(&types1, &types2)
                        && {
                            let renamed = env.subst_sym(result2, &params2, &params1);
                            self.is_same_type(result1, renamed)
                        },
                )
            }
            (TypeData::NullaryMethod(result1), TypeData::NullaryMethod(result2)) => {
                Some(self.is_same_type(result1, result2))
            }
            (
                TypeData::Poly { type_params: tparams1, result: result1 },
                TypeData::Poly { type_params: tparams2, result: result2 },
            ) => Some(self.same_binders(tparams1, result1, tparams2, result2)),
            (
                TypeData::Existential { quantified: quantified1, underlying: underlying1 },
                TypeData::Existential { quantified: quantified2, underlying: underlying2 },
            ) => Some(self.same_binders(quantified1, underlying1, quantified2, underlying2)),
            (TypeData::Bounds { lo: lo1, hi: hi1 }, TypeData::Bounds { lo: lo2, hi: hi2 }) => {
                Some(self.is_same_type(lo1, lo2) && self.is_same_type(hi1, hi2))
            }
            (TypeData::NotNull(underlying1), TypeData::NotNull(underlying2)) => {
                self.is_same_type(underlying1, underlying2).then_some(true)
            }
            _ => None,
        }
    }

    /// A module's singleton type against a reference to its module class.
    fn single_matches_module(
        &mut self,
        single_sym: SymbolId,
        single_pre: TypeId,
        class_sym: SymbolId,
        class_pre: TypeId,
        args: TypeListId,
    ) -> bool {
        let class = self.env.sym(class_sym);
        class.is_module_class()
            && args == TypeListId::EMPTY
            && self.equal_syms_and_prefixes(single_sym, single_pre, class.companion, class_pre)
    }

    /// Every member of `decls2` has a same-named member in `decls1` with an
    /// equivalent info, where the refinements' self references are
    /// identified.
    fn is_sub_scope(&mut self, decls1: SymbolListId, decls2: SymbolListId) -> bool {
        let env = self.env;
        let decls1 = env.symbol_list(decls1);
        let decls2 = env.symbol_list(decls2);
        decls2.iter().all(|&d2| {
            let data2 = env.sym(d2);
            decls1.iter().any(|&d1| {
                let data1 = env.sym(d1);
                data1.name == data2.name && {
                    let info2 = env.subst_this(data2.info, data2.owner, env.this_type(data1.owner));
                    self.is_same_type(data1.info, info2)
                }
            })
        })
    }

    /// Binders of equal length with equivalent parameter bounds and
    /// equivalent bodies, after renaming the right side's parameters.
    fn same_binders(
        &mut self,
        params1: SymbolListId,
        body1: TypeId,
        params2: SymbolListId,
        body2: TypeId,
    ) -> bool {
        let env = self.env;
        let params1 = env.symbol_list(params1);
        let params2 = env.symbol_list(params2);
        if params1.len() != params2.len() {
            return false;
        }
        let bounds_match = params1.iter().zip(params2.iter()).all(|(&p1, &p2)| {
            let bounds1 = self.param_bounds(p1);
            let bounds2 = env.subst_sym(self.param_bounds(p2), &params2, &params1);
            self.is_same_type(bounds1, bounds2)
        });
        bounds_match && {
            let renamed = env.subst_sym(body2, &params2, &params1);
            self.is_same_type(body1, renamed)
        }
    }

    fn same_type_fallback(&mut self, tp1: TypeId, data1: &TypeData, tp2: TypeId, data2: &TypeData) -> bool {
        let env = self.env;
        if let TypeData::BoundedWildcard(bounds) = *data1 {
            return self.bounds_contain(bounds, tp2);
        }
        if let TypeData::BoundedWildcard(bounds) = *data2 {
            return self.bounds_contain(bounds, tp1);
        }
        if let TypeData::TypeVar(var) = *data1 {
            return self.register_type_equality(var, tp2, true);
        }
        if let TypeData::TypeVar(var) = *data2 {
            return self.register_type_equality(var, tp1, false);
        }
        if matches!(data1, TypeData::Annotated { .. }) || matches!(data2, TypeData::Annotated { .. }) {
            return self.annotations_conform(tp1, tp2)
                && self.annotations_conform(tp2, tp1)
                && self.is_same_type(env.without_annotations(tp1), env.without_annotations(tp2));
        }

        if data1.is_singleton() && data2.is_singleton() {
            let origin1 = self.chase_singleton(tp1);
            let origin2 = self.chase_singleton(tp2);
            if (origin1 != tp1 || origin2 != tp2) && self.is_same_type(origin1, origin2) {
                return true;
            }
        }

        let norm1 = self.normalize_plus(tp1);
        let norm2 = self.normalize_plus(tp2);
        (norm1 != tp1 || norm2 != tp2) && self.is_same_type(norm1, norm2)
    }

    /// `lo <: tp <: hi` for a `Bounds` type.
    fn bounds_contain(&mut self, bounds: TypeId, tp: TypeId) -> bool {
        let (lo, hi) = self.env.ref_bounds(bounds);
        self.is_subtype(lo, tp) && self.is_subtype(tp, hi)
    }

    /// Follow a singleton's underlying types for as long as they are
    /// singletons themselves (`x.type` where `val x: y.type`).
    fn chase_singleton(&self, tp: TypeId) -> TypeId {
        let env = self.env;
        let mut current = tp;
        for _ in 0..MAX_ALIAS_EXPANSION_DEPTH {
            let next = env.dealias(env.underlying(current));
            if next == current || !env.data(next).is_singleton() {
                return current;
            }
            current = next;
        }
        current
    }

    /// Raw types become existentials; everything else is normalized.
    fn normalize_plus(&self, tp: TypeId) -> TypeId {
        if self.env.is_raw(tp) {
            self.env.raw_to_existential(tp)
        } else {
            self.env.normalize(tp)
        }
    }
}
