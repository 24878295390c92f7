//! Constraint registration on type variables.
//!
//! A type variable met during subtyping records the other side as a bound
//! (or, under `=:=`, as its instantiation). Every write goes through the
//! undo log, so the enclosing probe can retract it.

use crate::annotations::AnnotationChecker;
use crate::env::TypeEnv;
use crate::subtype::SubtypeChecker;
use crate::symbols::SymbolFlags;
use crate::types::{TypeData, TypeId, TypeVarId};
use crate::undo::UndoLog;
use crate::visitor::{TypeMapper, exists_type, map_over};
use tracing::trace;

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    /// `tp <: var` (lower bound) or `var <: tp` (upper bound).
    pub(crate) fn register_bound(&mut self, var: TypeVarId, tp: TypeId, is_lower: bool) -> bool {
        debug_assert!(self.undo_log.is_locked(), "bound registered outside a probe");
        let Some(info) = self.undo_log.info(var).cloned() else {
            return false;
        };
        if info.suspended {
            return self.check_against(tp, info.origin, is_lower);
        }
        if let Some(inst) = info.constraint.inst() {
            return self.check_against(tp, inst, is_lower);
        }
        if !self.is_relatable(info.level, tp) {
            trace!(var = var.0, tp = tp.0, "register_bound: skolem escapes its scope");
            return false;
        }
        let defs = self.env.defs();
        let sym = self.env.type_symbol(tp);
        let bound = if sym == defs.any {
            defs.any_type
        } else if sym == defs.nothing {
            defs.nothing_type
        } else {
            tp
        };
        trace!(var = var.0, bound = %self.format(bound), is_lower, "register_bound");
        self.undo_log.update(var, |info| {
            if is_lower {
                info.constraint.add_lo_bound(bound);
            } else {
                info.constraint.add_hi_bound(bound);
            }
        });
        true
    }

    fn check_against(&mut self, tp: TypeId, target: TypeId, is_lower: bool) -> bool {
        if is_lower {
            self.is_subtype(tp, target)
        } else {
            self.is_subtype(target, tp)
        }
    }

    /// `var =:= tp`; `var_on_left` tells which side the variable was on.
    pub(crate) fn register_type_equality(&mut self, var: TypeVarId, tp: TypeId, var_on_left: bool) -> bool {
        let Some(info) = self.undo_log.info(var).cloned() else {
            return false;
        };
        if info.suspended {
            return self.is_same_type(tp, info.origin);
        }
        if let Some(inst) = info.constraint.inst() {
            return if var_on_left {
                self.is_same_type(inst, tp)
            } else {
                self.is_same_type(tp, inst)
            };
        }
        if !self.is_relatable(info.level, tp) {
            return false;
        }
        let within = info.constraint.lo_bounds().iter().all(|&lo| self.is_subtype(lo, tp))
            && info.constraint.hi_bounds().iter().all(|&hi| self.is_subtype(tp, hi));
        if !within {
            return false;
        }
        trace!(var = var.0, inst = %self.format(tp), "register_type_equality");
        self.undo_log.update(var, |info| info.constraint.set_inst(tp));
        true
    }

    /// `tp` mentions no skolem created deeper than `level`.
    pub(crate) fn is_relatable(&self, level: u32, tp: TypeId) -> bool {
        let env = self.env;
        !exists_type(&env, tp, |_, data| match *data {
            TypeData::Ref { sym, .. } => {
                let sym = env.sym(sym);
                sym.flags.contains(SymbolFlags::SKOLEM) && sym.level > level
            }
            _ => false,
        })
    }

    /// `ty` with every instantiated type variable replaced by its
    /// instantiation.
    pub fn instantiate(&self, ty: TypeId) -> TypeId {
        let mut map = InstantiateMap {
            env: self.env,
            undo_log: &self.undo_log,
            expanding: Vec::new(),
        };
        map.apply(ty)
    }
}

struct InstantiateMap<'a, 'u> {
    env: TypeEnv<'a>,
    undo_log: &'u UndoLog,
    /// Variables whose instantiation is being expanded.
    expanding: Vec<TypeVarId>,
}

impl<'a> TypeMapper<'a> for InstantiateMap<'a, '_> {
    fn env(&self) -> TypeEnv<'a> {
        self.env
    }

    fn apply(&mut self, ty: TypeId) -> TypeId {
        match self.env.data(ty) {
            TypeData::TypeVar(var) => {
                if self.expanding.contains(&var) {
                    return ty;
                }
                match self.undo_log.info(var).and_then(|info| info.constraint.inst()) {
                    Some(inst) => {
                        self.expanding.push(var);
                        let result = self.apply(inst);
                        self.expanding.pop();
                        result
                    }
                    None => ty,
                }
            }
            _ => map_over(self, ty),
        }
    }
}
