//! Type traversal and structural mapping.
//!
//! - [`for_each_child`] enumerates the immediate component types of a type,
//!   including the infos of symbols the type binds (method parameters, type
//!   parameters, quantifiers, refinement members).
//! - [`TypeMapper`] + [`map_over`] rebuild a type bottom-up. Symbols bound by
//!   the type whose infos change are cloned and the body is renamed to the
//!   clones, so the original binders are never mutated.
//! - The substitution maps (`subst_sym`, `subst_types`, `subst_this`) are the
//!   mappers the relation procedures use.

use crate::env::TypeEnv;
use crate::symbols::SymbolId;
use crate::types::{TypeData, TypeId};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tyrel_common::limits::TYPE_LIST_INLINE;

type ChildBuffer = SmallVec<[TypeId; TYPE_LIST_INLINE]>;

// =============================================================================
// Traversal
// =============================================================================

/// Call `f` on every immediate component of `ty`.
pub fn for_each_child(env: &TypeEnv<'_>, ty: TypeId, mut f: impl FnMut(TypeId)) {
    for child in children(env, ty) {
        f(child);
    }
}

fn children(env: &TypeEnv<'_>, ty: TypeId) -> ChildBuffer {
    let mut out = ChildBuffer::new();
    let infos = |out: &mut ChildBuffer, syms: &[SymbolId]| {
        out.extend(syms.iter().map(|&s| env.symbols.info(s)).filter(|t| t.exists()));
    };
    match env.data(ty) {
        TypeData::NoType
        | TypeData::NoPrefix
        | TypeData::Error
        | TypeData::Wildcard
        | TypeData::This(_)
        | TypeData::Constant(_)
        | TypeData::TypeVar(_) => {}
        TypeData::Single { prefix, .. } => out.push(prefix),
        TypeData::Ref { prefix, args, .. } => {
            out.push(prefix);
            out.extend(env.type_list(args).iter().copied());
        }
        TypeData::Refined { parents, decls, .. } => {
            out.extend(env.type_list(parents).iter().copied());
            infos(&mut out, &env.symbol_list(decls));
        }
        TypeData::Existential {
            quantified,
            underlying,
        } => {
            infos(&mut out, &env.symbol_list(quantified));
            out.push(underlying);
        }
        TypeData::Annotated { underlying, .. } => out.push(underlying),
        TypeData::BoundedWildcard(bounds) => out.push(bounds),
        TypeData::Bounds { lo, hi } => {
            out.push(lo);
            out.push(hi);
        }
        TypeData::Method { params, result, .. } => {
            infos(&mut out, &env.symbol_list(params));
            out.push(result);
        }
        TypeData::NullaryMethod(result) => out.push(result),
        TypeData::Poly {
            type_params,
            result,
        } => {
            infos(&mut out, &env.symbol_list(type_params));
            out.push(result);
        }
        TypeData::NotNull(underlying) => out.push(underlying),
    }
    out
}

/// Does `pred` hold for `ty` or any type reachable through its components?
pub fn exists_type(env: &TypeEnv<'_>, ty: TypeId, mut pred: impl FnMut(TypeId, &TypeData) -> bool) -> bool {
    let mut visited = FxHashSet::default();
    let mut stack = vec![ty];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        if pred(current, &env.data(current)) {
            return true;
        }
        stack.extend(children(env, current));
    }
    false
}

// =============================================================================
// Mapping
// =============================================================================

/// A structural type transformation.
///
/// Implementors handle the cases they care about in `apply` and defer to
/// [`map_over`] for everything else.
pub trait TypeMapper<'a> {
    fn env(&self) -> TypeEnv<'a>;
    fn apply(&mut self, ty: TypeId) -> TypeId;
}

/// Rebuild `ty` with every component passed through `mapper.apply`.
pub fn map_over<'a, M: TypeMapper<'a>>(mapper: &mut M, ty: TypeId) -> TypeId {
    let env = mapper.env();
    let db = env.db;
    match env.data(ty) {
        TypeData::NoType
        | TypeData::NoPrefix
        | TypeData::Error
        | TypeData::Wildcard
        | TypeData::This(_)
        | TypeData::Constant(_)
        | TypeData::TypeVar(_) => ty,
        TypeData::Single { prefix, sym } => {
            let prefix1 = mapper.apply(prefix);
            if prefix1 == prefix { ty } else { db.single_type(prefix1, sym) }
        }
        TypeData::Ref { prefix, sym, args } => {
            let prefix1 = mapper.apply(prefix);
            let args0 = env.type_list(args);
            let args1 = map_list(mapper, &args0);
            if prefix1 == prefix && args1.is_none() {
                ty
            } else {
                db.type_ref(prefix1, sym, args1.unwrap_or_else(|| args0.to_vec()))
            }
        }
        TypeData::Refined {
            parents,
            decls,
            class,
        } => {
            let parents0 = env.type_list(parents);
            let parents1 = map_list(mapper, &parents0);
            let decls0 = env.symbol_list(decls);
            let infos1: Vec<TypeId> = decls0.iter().map(|&d| mapper.apply(env.symbols.info(d))).collect();
            let decls_changed = decls0
                .iter()
                .zip(&infos1)
                .any(|(&d, &info)| env.symbols.info(d) != info);
            if parents1.is_none() && !decls_changed {
                return ty;
            }
            let parents1 = parents1.unwrap_or_else(|| parents0.to_vec());
            if !decls_changed {
                return db.refined(parents1, decls0.to_vec(), class);
            }
            let class1 = env.symbols.new_refinement_class(env.symbols.owner(class));
            let this1 = db.this_type(class1);
            let decls1: Vec<SymbolId> = decls0
                .iter()
                .zip(infos1)
                .map(|(&d, info)| {
                    let clone = env.symbols.clone_symbol(d);
                    env.symbols.update(clone, |data| data.owner = class1);
                    env.symbols.set_info(clone, env.subst_this(info, class, this1));
                    clone
                })
                .collect();
            env.refined_type(class1, parents1, decls1)
        }
        TypeData::Existential {
            quantified,
            underlying,
        } => {
            let quantified0 = env.symbol_list(quantified);
            let (quantified1, underlying1) = map_binder(mapper, &quantified0, underlying);
            match quantified1 {
                None if underlying1 == underlying => ty,
                None => db.existential(quantified0.to_vec(), underlying1),
                Some(q) => db.existential(q, underlying1),
            }
        }
        TypeData::Annotated {
            annotations,
            underlying,
        } => {
            let underlying1 = mapper.apply(underlying);
            if underlying1 == underlying {
                ty
            } else {
                db.annotated(env.symbol_list(annotations).to_vec(), underlying1)
            }
        }
        TypeData::BoundedWildcard(bounds) => {
            let bounds1 = mapper.apply(bounds);
            if bounds1 == bounds { ty } else { db.intern(TypeData::BoundedWildcard(bounds1)) }
        }
        TypeData::Bounds { lo, hi } => {
            let lo1 = mapper.apply(lo);
            let hi1 = mapper.apply(hi);
            if lo1 == lo && hi1 == hi { ty } else { db.bounds(lo1, hi1) }
        }
        TypeData::Method {
            params,
            result,
            flags,
        } => {
            let params0 = env.symbol_list(params);
            let (params1, result1) = map_binder(mapper, &params0, result);
            match params1 {
                None if result1 == result => ty,
                None => db.method(params0.to_vec(), result1, flags),
                Some(p) => db.method(p, result1, flags),
            }
        }
        TypeData::NullaryMethod(result) => {
            let result1 = mapper.apply(result);
            if result1 == result { ty } else { db.nullary_method(result1) }
        }
        TypeData::Poly {
            type_params,
            result,
        } => {
            let tparams0 = env.symbol_list(type_params);
            let (tparams1, result1) = map_binder(mapper, &tparams0, result);
            match tparams1 {
                None if result1 == result => ty,
                None => db.poly(tparams0.to_vec(), result1),
                Some(tp) => db.poly(tp, result1),
            }
        }
        TypeData::NotNull(underlying) => {
            let underlying1 = mapper.apply(underlying);
            if underlying1 == underlying { ty } else { db.not_null(underlying1) }
        }
    }
}

fn map_list<'a, M: TypeMapper<'a>>(mapper: &mut M, items: &[TypeId]) -> Option<Vec<TypeId>> {
    let mapped: Vec<TypeId> = items.iter().map(|&t| mapper.apply(t)).collect();
    if mapped.as_slice() == items { None } else { Some(mapped) }
}

/// Map the infos of the symbols bound by a type and its body. When an info
/// changes the binders are cloned and the body renamed to the clones.
fn map_binder<'a, M: TypeMapper<'a>>(
    mapper: &mut M,
    binders: &[SymbolId],
    body: TypeId,
) -> (Option<Vec<SymbolId>>, TypeId) {
    let env = mapper.env();
    let infos0: Vec<TypeId> = binders.iter().map(|&s| env.symbols.info(s)).collect();
    let infos1: Vec<TypeId> = infos0.iter().map(|&i| mapper.apply(i)).collect();
    let body1 = mapper.apply(body);
    if infos0 == infos1 {
        return (None, body1);
    }
    let clones: Vec<SymbolId> = binders.iter().map(|&s| env.symbols.clone_symbol(s)).collect();
    for (&clone, &info) in clones.iter().zip(&infos1) {
        env.symbols.set_info(clone, env.subst_sym(info, binders, &clones));
    }
    let body1 = env.subst_sym(body1, binders, &clones);
    (Some(clones), body1)
}

// =============================================================================
// Substitutions
// =============================================================================

/// Renames symbols: every reference to `from[i]` becomes a reference to `to[i]`.
struct SubstSymMap<'a, 's> {
    env: TypeEnv<'a>,
    from: &'s [SymbolId],
    to: &'s [SymbolId],
}

impl<'a, 's> SubstSymMap<'a, 's> {
    fn lookup(&self, sym: SymbolId) -> Option<SymbolId> {
        self.from.iter().position(|&s| s == sym).map(|i| self.to[i])
    }
}

impl<'a> TypeMapper<'a> for SubstSymMap<'a, '_> {
    fn env(&self) -> TypeEnv<'a> {
        self.env
    }

    fn apply(&mut self, ty: TypeId) -> TypeId {
        let db = self.env.db;
        match self.env.data(ty) {
            TypeData::Ref { prefix, sym, args } => {
                if let Some(to) = self.lookup(sym) {
                    let prefix1 = self.apply(prefix);
                    let args0 = self.env.type_list(args);
                    let args1 = map_list(self, &args0).unwrap_or_else(|| args0.to_vec());
                    return db.type_ref(prefix1, to, args1);
                }
                map_over(self, ty)
            }
            TypeData::Single { prefix, sym } => {
                if let Some(to) = self.lookup(sym) {
                    let prefix1 = self.apply(prefix);
                    return db.single_type(prefix1, to);
                }
                map_over(self, ty)
            }
            TypeData::This(sym) => match self.lookup(sym) {
                Some(to) => db.this_type(to),
                None => ty,
            },
            _ => map_over(self, ty),
        }
    }
}

/// Instantiates type parameters: `NoPrefix` references to `from[i]` become
/// `to[i]`, applied to the reference's arguments when it has any.
struct SubstTypeMap<'a, 's> {
    env: TypeEnv<'a>,
    from: &'s [SymbolId],
    to: &'s [TypeId],
}

impl<'a> TypeMapper<'a> for SubstTypeMap<'a, '_> {
    fn env(&self) -> TypeEnv<'a> {
        self.env
    }

    fn apply(&mut self, ty: TypeId) -> TypeId {
        let TypeData::Ref { prefix, sym, args } = self.env.data(ty) else {
            return map_over(self, ty);
        };
        if prefix != TypeId::NO_PREFIX {
            return map_over(self, ty);
        }
        let Some(i) = self.from.iter().position(|&s| s == sym) else {
            return map_over(self, ty);
        };
        let replacement = self.to[i];
        let args0 = self.env.type_list(args);
        if args0.is_empty() {
            return replacement;
        }
        let args1 = map_list(self, &args0).unwrap_or_else(|| args0.to_vec());
        self.env.apply_type_args(replacement, args1)
    }
}

/// Replaces `from.this` by `to`.
struct SubstThisMap<'a> {
    env: TypeEnv<'a>,
    from: SymbolId,
    to: TypeId,
}

impl<'a> TypeMapper<'a> for SubstThisMap<'a> {
    fn env(&self) -> TypeEnv<'a> {
        self.env
    }

    fn apply(&mut self, ty: TypeId) -> TypeId {
        match self.env.data(ty) {
            TypeData::This(sym) if sym == self.from => self.to,
            _ => map_over(self, ty),
        }
    }
}

impl<'a> TypeEnv<'a> {
    /// Rename `from[i]` to `to[i]` throughout `ty`.
    pub fn subst_sym(&self, ty: TypeId, from: &[SymbolId], to: &[SymbolId]) -> TypeId {
        if from.is_empty() || ty.is_sentinel() {
            return ty;
        }
        debug_assert_eq!(from.len(), to.len());
        let mut map = SubstSymMap {
            env: *self,
            from,
            to: &to[..from.len().min(to.len())],
        };
        map.apply(ty)
    }

    /// Replace type parameters `from[i]` by `to[i]` throughout `ty`.
    pub fn subst_types(&self, ty: TypeId, from: &[SymbolId], to: &[TypeId]) -> TypeId {
        if from.is_empty() || ty.is_sentinel() {
            return ty;
        }
        let n = from.len().min(to.len());
        let mut map = SubstTypeMap {
            env: *self,
            from: &from[..n],
            to: &to[..n],
        };
        map.apply(ty)
    }

    /// Replace `from.this` by `to` throughout `ty`.
    pub fn subst_this(&self, ty: TypeId, from: SymbolId, to: TypeId) -> TypeId {
        if ty.is_sentinel() || to == self.db.this_type(from) {
            return ty;
        }
        let mut map = SubstThisMap { env: *self, from, to };
        map.apply(ty)
    }

    /// Apply a type constructor (or type lambda) to `args`.
    pub fn apply_type_args(&self, tycon: TypeId, args: Vec<TypeId>) -> TypeId {
        match self.data(tycon) {
            TypeData::Ref {
                prefix,
                sym,
                args: existing,
            } if self.type_list(existing).is_empty() => self.db.type_ref(prefix, sym, args),
            TypeData::Poly {
                type_params,
                result,
            } => {
                let tparams = self.symbol_list(type_params);
                if tparams.len() == args.len() {
                    self.subst_types(result, &tparams, &args)
                } else {
                    TypeId::ERROR
                }
            }
            _ => tycon,
        }
    }
}

#[cfg(test)]
#[path = "tests/visitor_tests.rs"]
mod tests;
