//! Subtyping between type references.
//!
//! The symbol-identity path is tried before the name heuristic, and both
//! before the base-type path. The order decides which constraints a probe
//! leaves on type variables when several paths would succeed.

use crate::annotations::AnnotationChecker;
use crate::subtype::SubtypeChecker;
use crate::symbols::{SymbolFlags, SymbolId};
use crate::types::{Depth, TypeData, TypeId};

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    /// `tr1 <: tr2` for two references that are not type constructors.
    pub(crate) fn ref_ref_conforms(&mut self, tp1: TypeId, tp2: TypeId, depth: Depth) -> bool {
        let env = self.env;
        let (TypeData::Ref { prefix: pre1, sym: sym1, args: args1 }, TypeData::Ref { prefix: pre2, sym: sym2, args: args2 }) =
            (env.data(tp1), env.data(tp2))
        else {
            return false;
        };
        let data1 = env.sym(sym1);
        let data2 = env.sym(sym2);

        let same_constructor = if sym1 == sym2 {
            self.policy.erased_types
                || env.sym(data1.owner).flags.contains(SymbolFlags::PACKAGE)
                || self.is_subtype_depth(pre1, pre2, depth)
        } else {
            data1.name == data2.name
                && !data1.is_module_class()
                && !data2.is_module_class()
                && (self.is_unifiable(pre1, pre2) || (data2.is_abstract_type() && self.is_sub_pre(pre1, pre2)))
        };
        if same_constructor {
            let args1 = env.type_list(args1);
            let args2 = env.type_list(args2);
            if self.is_sub_args(&args1, &args2, &data1.type_params, depth) {
                return true;
            }
        }

        if data2.is_class() && !depth.is_exhausted() {
            let base = env.base_type(tp1, sym2);
            if base != tp1 && base.exists() && self.is_subtype_depth(base, tp2, depth.decr()) {
                return true;
            }
        }

        self.third_try_ref(tp1, &env.data(tp1), tp2, depth)
    }

    /// Variance-aware comparison of argument lists.
    pub(crate) fn is_sub_args(&mut self, args1: &[TypeId], args2: &[TypeId], tparams: &[SymbolId], depth: Depth) -> bool {
        if args1.len() != args2.len() || args1.len() != tparams.len() {
            return false;
        }
        for ((&arg1, &arg2), &tparam) in args1.iter().zip(args2).zip(tparams) {
            let variance = self.env.sym(tparam).variance();
            let ok = (variance.is_covariant() || self.is_subtype_depth(arg2, arg1, depth))
                && (variance.is_contravariant() || self.is_subtype_depth(arg1, arg2, depth));
            if !ok {
                return false;
            }
        }
        true
    }

    fn is_sub_pre(&mut self, pre1: TypeId, pre2: TypeId) -> bool {
        pre1 != pre2
            && pre1 != TypeId::NO_PREFIX
            && pre2 != TypeId::NO_PREFIX
            && self.is_subtype(pre1, pre2)
    }

    /// Prefixes that may be identified although their symbols differ.
    pub(crate) fn is_unifiable(&mut self, pre1: TypeId, pre2: TypeId) -> bool {
        (self.is_eligible_for_prefix_unification(pre1) || self.is_eligible_for_prefix_unification(pre2))
            && self.is_same_type(pre1, pre2)
    }

    fn is_eligible_for_prefix_unification(&self, ty: TypeId) -> bool {
        let env = self.env;
        match env.data(ty) {
            TypeData::Single { prefix, sym } => {
                !env.symbols.flags(sym).contains(SymbolFlags::PACKAGE) && self.is_eligible_for_prefix_unification(prefix)
            }
            TypeData::TypeVar(var) => match self.undo_log.info(var) {
                Some(info) => match info.constraint.inst() {
                    Some(inst) => self.is_eligible_for_prefix_unification(inst),
                    None => true,
                },
                None => false,
            },
            TypeData::Refined { .. } => true,
            _ => false,
        }
    }

    /// `sym1` under `pre1` and `sym2` under `pre2` denote the same entity.
    pub(crate) fn equal_syms_and_prefixes(&mut self, sym1: SymbolId, pre1: TypeId, sym2: SymbolId, pre2: TypeId) -> bool {
        let env = self.env;
        if sym1 == sym2 {
            let data = env.sym(sym1);
            data.flags.contains(SymbolFlags::PACKAGE)
                || env.sym(data.owner).flags.contains(SymbolFlags::PACKAGE)
                || self.policy.erased_types
                || self.is_same_type(pre1, pre2)
        } else {
            env.symbols.name(sym1) == env.symbols.name(sym2) && self.is_unifiable(pre1, pre2)
        }
    }

    /// Both references name different constructors (symbols or prefixes
    /// differ). Used to stop bound chasing that would not make progress.
    pub(crate) fn is_different_type_constructor(&mut self, tp1: TypeId, tp2: TypeId) -> bool {
        match (self.env.data(tp1), self.env.data(tp2)) {
            (TypeData::Ref { prefix: pre1, sym: sym1, .. }, TypeData::Ref { prefix: pre2, sym: sym2, .. }) => {
                sym1 != sym2 || self.is_different_type(pre1, pre2)
            }
            _ => true,
        }
    }

    /// Third pass for a reference on the right.
    pub(crate) fn third_try_ref(&mut self, tp1: TypeId, data1: &TypeData, tp2: TypeId, depth: Depth) -> bool {
        let env = self.env;
        let defs = env.defs();
        let TypeData::Ref { sym: sym2, .. } = env.data(tp2) else {
            return false;
        };
        let data2 = env.sym(sym2);
        if sym2 == defs.not_null {
            return env.is_not_null(tp1);
        }
        if sym2 == defs.singleton {
            return env.is_stable(tp1) || self.fourth_try(tp1, data1, tp2, depth);
        }
        if data2.is_class() {
            if env.is_raw(tp2) {
                let existential = env.raw_to_existential(tp2);
                return self.is_subtype_depth(tp1, existential, depth);
            }
            if data2.is_refinement_class() && data2.info.exists() {
                return self.is_subtype_depth(tp1, data2.info, depth);
            }
            return self.fourth_try(tp1, data1, tp2, depth);
        }
        if data2.is_abstract_type() {
            let lo2 = env.lower_bound(tp2);
            if self.is_different_type_constructor(tp2, lo2) && self.is_subtype_depth(tp1, lo2, depth) {
                return true;
            }
            return self.fourth_try(tp1, data1, tp2, depth);
        }
        if data2.is_alias_type() {
            let n1 = env.normalize(tp1);
            let n2 = env.normalize(tp2);
            if n1 == tp1 && n2 == tp2 {
                return self.fourth_try(tp1, data1, tp2, depth);
            }
            return self.is_subtype_depth(n1, n2, depth);
        }
        self.fourth_try(tp1, data1, tp2, depth)
    }

    /// Fourth pass for a reference on the left.
    pub(crate) fn fourth_try_ref(&mut self, tp1: TypeId, tp2: TypeId, depth: Depth) -> bool {
        let env = self.env;
        let defs = env.defs();
        let TypeData::Ref { prefix: pre1, sym: sym1, .. } = env.data(tp1) else {
            return false;
        };
        if sym1 == defs.nothing {
            return true;
        }
        let data2 = env.data(tp2);
        if sym1 == defs.null {
            return match data2 {
                TypeData::Ref { sym: sym2, .. } => env.symbols.contains_null(env.db, sym2),
                _ => {
                    data2.is_singleton_ref() && {
                        let widened = env.widen(tp2);
                        widened != tp2 && self.is_subtype_depth(tp1, widened, depth)
                    }
                }
            };
        }
        let data1 = env.sym(sym1);
        if data1.is_class() {
            if env.is_raw(tp1) {
                let existential = env.raw_to_existential(tp1);
                return self.is_subtype_depth(existential, tp2, depth);
            }
            if data1.is_module_class() {
                return match data2 {
                    TypeData::Single { prefix: pre2, sym: sym2 } => {
                        self.equal_syms_and_prefixes(data1.companion, pre1, sym2, pre2)
                    }
                    _ => false,
                };
            }
            if data1.is_refinement_class() && data1.info.exists() {
                return self.is_subtype_depth(data1.info, tp2, depth);
            }
            return false;
        }
        if data1.is_abstract_type() {
            if depth.is_exhausted() {
                return false;
            }
            let hi1 = env.upper_bound(tp1);
            return self.is_different_type_constructor(tp1, hi1) && self.is_subtype_depth(hi1, tp2, depth.decr());
        }
        if data1.is_alias_type() {
            let n1 = env.normalize(tp1);
            let n2 = env.normalize(tp2);
            return (n1 != tp1 || n2 != tp2) && self.is_subtype_depth(n1, n2, depth);
        }
        false
    }
}
