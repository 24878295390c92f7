//! Solving type variables, and the bound approximations it needs.
//!
//! `solve` instantiates a group of type variables that stand for the type
//! parameters `tparams`. Each variable takes the greatest lower bound of its
//! upper bounds or the least upper bound of its lower bounds, depending on
//! the requested direction and the parameter's variance. Declared bounds of
//! the parameters are added first, and parameters whose bounds mention one
//! another are solved in dependency order.
//!
//! `lub` and `glb` are approximations: they find maximal (minimal) elements
//! and fall back to a shared base class or a refined type, but never build
//! existentials.

use crate::annotations::AnnotationChecker;
use crate::common_owner::common_owner_in;
use crate::constraint::InferenceError;
use crate::subtype::SubtypeChecker;
use crate::symbols::SymbolId;
use crate::types::{Depth, TypeData, TypeId, TypeVarId, Variance};
use crate::visitor::exists_type;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};
use tyrel_common::limits::{MAX_LUB_CANDIDATES, MAX_LUB_DEPTH};

type TypeSet = IndexSet<TypeId, FxBuildHasher>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SolveState {
    Unsolved,
    InProgress,
    Done,
}

/// One `solve` call: the variables, their parameters and progress.
struct SolveGroup<'s> {
    vars: Vec<TypeVarId>,
    tvars: &'s [TypeId],
    tparams: &'s [SymbolId],
    variances: &'s [Variance],
    upper: bool,
    states: Vec<SolveState>,
}

impl<'a, A: AnnotationChecker> SubtypeChecker<'a, A> {
    // =========================================================================
    // Solving
    // =========================================================================

    /// Instantiate `tvars`, which stand for `tparams` with the given
    /// variances. With `upper`, covariant and invariant variables are
    /// maximized (glb of upper bounds) and contravariant ones minimized;
    /// without, the reverse.
    ///
    /// Returns the instantiations in order, or the first failure.
    pub fn solve(
        &mut self,
        tvars: &[TypeId],
        tparams: &[SymbolId],
        variances: &[Variance],
        upper: bool,
        depth: Depth,
    ) -> Result<Vec<TypeId>, InferenceError> {
        if tparams.len() != tvars.len() {
            return Err(InferenceError::ArityMismatch {
                expected: tvars.len(),
                found: tparams.len(),
            });
        }
        if variances.len() != tvars.len() {
            return Err(InferenceError::ArityMismatch {
                expected: tvars.len(),
                found: variances.len(),
            });
        }
        let vars = tvars
            .iter()
            .map(|&tv| match self.env.data(tv) {
                TypeData::TypeVar(var) if self.undo_log.contains(var) => Ok(var),
                TypeData::TypeVar(var) => Err(InferenceError::UnknownVar(var)),
                _ => Err(InferenceError::NotATypeVar(tv)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut group = SolveGroup {
            states: vec![SolveState::Unsolved; vars.len()],
            vars,
            tvars,
            tparams,
            variances,
            upper,
        };
        for index in 0..group.vars.len() {
            self.solve_one(&mut group, index, depth)?;
        }

        let mut insts = Vec::with_capacity(group.vars.len());
        for &var in &group.vars {
            let inst = self.check_within_constraint(var)?;
            insts.push(inst);
        }
        debug!(count = insts.len(), "solve: done");
        Ok(insts)
    }

    fn solve_one(&mut self, group: &mut SolveGroup<'_>, index: usize, depth: Depth) -> Result<(), InferenceError> {
        if group.states[index] != SolveState::Unsolved {
            return Ok(());
        }
        let var = group.vars[index];
        let already = self
            .undo_log
            .info(var)
            .and_then(|info| info.constraint.inst());
        if already.is_some() {
            group.states[index] = SolveState::Done;
            return Ok(());
        }

        let env = self.env;
        let defs = env.defs();
        let tparam = group.tparams[index];
        let up = group.upper != group.variances[index].is_contravariant();
        group.states[index] = SolveState::InProgress;

        let (lo, hi) = env.bounds_of(tparam);
        let bound = if up { hi } else { lo };
        let tparam_ref = env.type_constructor(tparam);
        let mut cyclic = env.mentions_symbol(bound, tparam);

        for other in 0..group.vars.len() {
            let tparam2 = group.tparams[other];
            if tparam2 == tparam {
                continue;
            }
            let (lo2, hi2) = env.bounds_of(tparam2);
            let related = env.mentions_symbol(bound, tparam2)
                || (up && self.is_same_type(lo2, tparam_ref))
                || (!up && self.is_same_type(hi2, tparam_ref));
            if related {
                if group.states[other] == SolveState::InProgress {
                    cyclic = true;
                }
                self.solve_one(group, other, depth)?;
            }
        }

        if !cyclic {
            let instantiated = env.subst_types(bound, group.tparams, group.tvars);
            let bound_sym = env.type_symbol(bound);
            self.undo_log.update(var, |info| {
                if up {
                    if bound_sym != defs.any {
                        info.constraint.add_hi_bound(instantiated);
                    }
                } else if bound_sym != defs.nothing && bound_sym != tparam {
                    info.constraint.add_lo_bound(instantiated);
                }
            });
            for other in 0..group.vars.len() {
                let tparam2 = group.tparams[other];
                if tparam2 == tparam {
                    continue;
                }
                let (lo2, hi2) = env.bounds_of(tparam2);
                let facing = if up { lo2 } else { hi2 };
                if env.type_symbol(env.dealias(facing)) == tparam {
                    let tvar2 = group.tvars[other];
                    self.undo_log.update(var, |info| {
                        if up {
                            info.constraint.add_hi_bound(tvar2);
                        } else {
                            info.constraint.add_lo_bound(tvar2);
                        }
                    });
                }
            }
        }

        let constraint = match self.undo_log.info(var) {
            Some(info) => info.constraint.clone(),
            None => return Err(InferenceError::UnknownVar(var)),
        };
        let inst = if up {
            self.glb(constraint.hi_bounds())
        } else {
            let lub_depth = Depth::new(depth.remaining().map_or(MAX_LUB_DEPTH, |d| d.min(MAX_LUB_DEPTH)));
            self.lub_depth(constraint.lo_bounds(), lub_depth)
        };
        let inst = self.instantiate(inst);
        if self.mentions_type_var(inst, var) {
            return Err(InferenceError::OccursCheck { var, ty: inst });
        }
        trace!(var = var.0, inst = %self.format(inst), up, cyclic, "solve_one");
        self.undo_log.update(var, |info| info.constraint.set_inst(inst));
        group.states[index] = SolveState::Done;
        Ok(())
    }

    /// The instantiation of `var`, checked against its bounds.
    fn check_within_constraint(&mut self, var: TypeVarId) -> Result<TypeId, InferenceError> {
        let Some(info) = self.undo_log.info(var).cloned() else {
            return Err(InferenceError::UnknownVar(var));
        };
        let Some(inst) = info.constraint.inst() else {
            return Err(InferenceError::UnknownVar(var));
        };
        let inst = self.instantiate(inst);
        let los: Vec<TypeId> = info.constraint.lo_bounds().iter().map(|&lo| self.instantiate(lo)).collect();
        let his: Vec<TypeId> = info.constraint.hi_bounds().iter().map(|&hi| self.instantiate(hi)).collect();
        let within = los.iter().all(|&lo| self.is_subtype(lo, inst)) && his.iter().all(|&hi| self.is_subtype(inst, hi));
        if within {
            Ok(inst)
        } else {
            debug!(var = var.0, inst = %self.format(inst), "solve: instantiation violates bounds");
            Err(InferenceError::BoundsViolation { var, inst })
        }
    }

    fn mentions_type_var(&self, ty: TypeId, var: TypeVarId) -> bool {
        exists_type(&self.env, ty, |_, data| *data == TypeData::TypeVar(var))
    }

    /// `targs` conform to the bounds of `tparams`, seen from `pre` for
    /// parameters declared in class `owner`.
    pub fn is_within_bounds(&mut self, pre: TypeId, owner: SymbolId, tparams: &[SymbolId], targs: &[TypeId]) -> bool {
        if tparams.len() != targs.len() {
            return false;
        }
        let env = self.env;
        tparams.iter().zip(targs).all(|(&tparam, &targ)| {
            let (lo, hi) = env.bounds_of(tparam);
            let adapt = |t: TypeId| {
                let seen = if owner.exists() { env.as_seen_from(t, pre, owner) } else { t };
                env.subst_types(seen, tparams, targs)
            };
            let lo = adapt(lo);
            let hi = adapt(hi);
            self.is_subtype(lo, targ) && self.is_subtype(targ, hi)
        })
    }

    // =========================================================================
    // Bounds
    // =========================================================================

    /// Least upper bound of `types` (`Nothing` for none).
    pub fn lub(&mut self, types: &[TypeId]) -> TypeId {
        self.lub_depth(types, Depth::new(MAX_LUB_DEPTH))
    }

    fn lub_depth(&mut self, types: &[TypeId], depth: Depth) -> TypeId {
        let defs = self.env.defs();
        let unique: TypeSet = types
            .iter()
            .copied()
            .filter(|&t| self.env.type_symbol(t) != defs.nothing)
            .collect();
        let maximal = self.maximal_elements(&unique);
        match maximal.as_slice() {
            [] => return defs.nothing_type,
            [single] => return *single,
            _ => {}
        }
        if let Some(shared) = self.shared_base_type(&maximal, depth) {
            return shared;
        }
        trace!(count = maximal.len(), "lub: no shared base type, using Any");
        defs.any_type
    }

    /// Greatest lower bound of `types` (`Any` for none).
    pub fn glb(&mut self, types: &[TypeId]) -> TypeId {
        let env = self.env;
        let defs = env.defs();
        let unique: TypeSet = types
            .iter()
            .copied()
            .filter(|&t| env.type_symbol(t) != defs.any)
            .collect();
        let minimal = self.minimal_elements(&unique);
        match minimal.as_slice() {
            [] => defs.any_type,
            [single] => *single,
            _ => {
                let owner = common_owner_in(env, &minimal);
                let class = env.symbols.new_refinement_class(owner);
                env.refined_type(class, minimal, vec![])
            }
        }
    }

    /// Elements not below any other element; the first of equivalent
    /// elements is kept.
    fn maximal_elements(&mut self, types: &TypeSet) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = Vec::new();
        for &t in types {
            if out.iter().any(|&m| self.is_subtype(t, m)) {
                continue;
            }
            out.retain(|&m| !self.is_subtype(m, t));
            out.push(t);
        }
        out
    }

    fn minimal_elements(&mut self, types: &TypeSet) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = Vec::new();
        for &t in types {
            if out.iter().any(|&m| self.is_subtype(m, t)) {
                continue;
            }
            out.retain(|&m| !self.is_subtype(t, m));
            out.push(t);
        }
        out
    }

    /// The most derived base type shared by all of `types`, with arguments
    /// merged by variance. Invariant arguments must agree.
    fn shared_base_type(&mut self, types: &[TypeId], depth: Depth) -> Option<TypeId> {
        let env = self.env;
        let first = *types.first()?;
        let candidates: Vec<SymbolId> = env
            .base_classes_of(env.widen(first))
            .into_iter()
            .filter(|&bc| !env.sym(bc).is_refinement_class())
            .take(MAX_LUB_CANDIDATES)
            .collect();
        'candidates: for class in candidates {
            let mut bases = Vec::with_capacity(types.len());
            for &t in types {
                let base = env.base_type(t, class);
                if !base.exists() {
                    continue 'candidates;
                }
                bases.push(base);
            }
            let tparams = env.symbols.type_params(class);
            if tparams.is_empty() {
                return Some(bases[0]);
            }
            let mut args_by_param: Vec<Vec<TypeId>> = vec![Vec::with_capacity(bases.len()); tparams.len()];
            for &base in &bases {
                let TypeData::Ref { args, .. } = env.data(base) else {
                    continue 'candidates;
                };
                let args = env.type_list(args);
                if args.len() != tparams.len() {
                    continue 'candidates;
                }
                for (slot, &arg) in args_by_param.iter_mut().zip(args.iter()) {
                    slot.push(arg);
                }
            }
            let mut merged = Vec::with_capacity(tparams.len());
            for (&tparam, args) in tparams.iter().zip(&args_by_param) {
                let arg = match env.sym(tparam).variance() {
                    Variance::Covariant if depth.is_exhausted() => env.defs().any_type,
                    Variance::Covariant => self.lub_depth(args, depth.decr()),
                    Variance::Contravariant if depth.is_exhausted() => env.defs().nothing_type,
                    Variance::Contravariant => self.glb(args),
                    Variance::Invariant => {
                        let head = args[0];
                        if !args[1..].iter().all(|&other| self.is_same_type(head, other)) {
                            continue 'candidates;
                        }
                        head
                    }
                };
                merged.push(arg);
            }
            let TypeData::Ref { prefix, sym, .. } = env.data(bases[0]) else {
                continue;
            };
            return Some(env.db.type_ref(prefix, sym, merged));
        }
        None
    }
}

#[cfg(test)]
#[path = "tests/solve_tests.rs"]
mod tests;
