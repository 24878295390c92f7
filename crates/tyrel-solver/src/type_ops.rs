//! Derived type operations: normalization, widening, base types, members.
//!
//! Everything here is read-only with respect to type-variable constraints;
//! operations that need constraint state (`TypeVar` instantiation) live on
//! the checker.

use crate::common_owner::common_owner_of;
use crate::env::TypeEnv;
use crate::recursion::RecursionProfile;
use crate::symbols::{SymbolFlags, SymbolId};
use crate::types::{ConstantValue, TypeData, TypeId, TypeListId};
use crate::visitor::exists_type;
use tracing::trace;
use tyrel_common::Name;
use tyrel_common::limits::MAX_ALIAS_EXPANSION_DEPTH;

impl<'a> TypeEnv<'a> {
    // =========================================================================
    // Normalization
    // =========================================================================

    /// Expand type aliases and eta-expand unapplied type constructors.
    ///
    /// - `Ref` to an alias with matching arguments: the alias right-hand side,
    ///   seen from the prefix, with parameters instantiated.
    /// - `Ref` to a generic alias without arguments: `[ps]rhs`.
    /// - `Ref` to any other generic type without arguments (not raw):
    ///   `[ps]C[ps]`.
    pub fn normalize(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_ALIAS_EXPANSION_DEPTH {
            let TypeData::Ref { prefix, sym, args } = self.data(current) else {
                return current;
            };
            let data = self.sym(sym);
            let args = self.type_list(args);
            if data.is_alias_type() {
                if data.type_params.is_empty() || data.type_params.len() == args.len() {
                    current = self.expand_alias(prefix, sym, &args);
                    continue;
                }
                if args.is_empty() {
                    let rhs = self.as_seen_from(data.info, prefix, data.owner);
                    return self.db.poly(data.type_params.clone(), rhs);
                }
                return current;
            }
            if !data.type_params.is_empty() && args.is_empty() && !self.is_raw(current) {
                let applied = self.db.type_ref(prefix, sym, self.param_refs(&data.type_params));
                return self.db.poly(data.type_params.clone(), applied);
            }
            return current;
        }
        trace!(ty = ty.0, "normalize: alias expansion limit reached");
        current
    }

    /// Expand aliases only (no eta-expansion).
    pub fn dealias(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_ALIAS_EXPANSION_DEPTH {
            match self.data(current) {
                TypeData::Ref { prefix, sym, args } => {
                    let data = self.sym(sym);
                    let args = self.type_list(args);
                    if !data.is_alias_type() || data.type_params.len() != args.len() {
                        return current;
                    }
                    current = self.expand_alias(prefix, sym, &args);
                }
                _ => return current,
            }
        }
        current
    }

    fn expand_alias(&self, prefix: TypeId, alias: SymbolId, args: &[TypeId]) -> TypeId {
        let data = self.sym(alias);
        let rhs = self.as_seen_from(data.info, prefix, data.owner);
        self.subst_types(rhs, &data.type_params, args)
    }

    /// `ty` as seen from `prefix`, for a type written inside class `owner`:
    /// `owner.this` becomes `prefix` and `owner`'s type parameters become the
    /// arguments of `prefix`'s base type at `owner`.
    pub fn as_seen_from(&self, ty: TypeId, prefix: TypeId, owner: SymbolId) -> TypeId {
        if ty.is_sentinel() || prefix == TypeId::NO_PREFIX || !prefix.exists() {
            return ty;
        }
        let owner_data = self.sym(owner);
        if !owner_data.is_class() || owner_data.is_package_class() {
            return ty;
        }
        if prefix == self.this_type(owner) {
            return ty;
        }
        let seen = self.subst_this(ty, owner, prefix);
        if owner_data.type_params.is_empty() {
            return seen;
        }
        match self.data(self.base_type(prefix, owner)) {
            TypeData::Ref { args, .. } => {
                let args = self.type_list(args);
                self.subst_types(seen, &owner_data.type_params, &args)
            }
            _ => seen,
        }
    }

    // =========================================================================
    // Widening
    // =========================================================================

    /// Replace singleton and constant types by their underlying types,
    /// repeatedly.
    pub fn widen(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_ALIAS_EXPANSION_DEPTH {
            if !self.data(current).is_singleton() {
                return current;
            }
            current = self.underlying(current);
        }
        current
    }

    /// One step of unwrapping: the type a proxy type stands for.
    pub fn underlying(&self, ty: TypeId) -> TypeId {
        match self.data(ty) {
            TypeData::This(sym) => self.this_underlying(sym),
            TypeData::Single { prefix, sym } => {
                let data = self.sym(sym);
                let info = self.as_seen_from(data.info, prefix, data.owner);
                match self.data(info) {
                    TypeData::NullaryMethod(result) => result,
                    _ => info,
                }
            }
            TypeData::Constant(value) => self.defs().constant_type(&value),
            TypeData::NotNull(underlying)
            | TypeData::Annotated { underlying, .. }
            | TypeData::Existential { underlying, .. } => underlying,
            _ => ty,
        }
    }

    /// Type of `sym.this` as an ordinary type.
    fn this_underlying(&self, sym: SymbolId) -> TypeId {
        let data = self.sym(sym);
        if data.is_refinement_class() && data.info.exists() {
            data.info
        } else {
            self.type_ref_of(sym)
        }
    }

    // =========================================================================
    // Classification
    // =========================================================================

    /// The symbol a type is "about": the class or type member of a reference,
    /// the refinement class of a refined type, the class of a this type.
    pub fn type_symbol(&self, ty: TypeId) -> SymbolId {
        let mut current = ty;
        for _ in 0..MAX_ALIAS_EXPANSION_DEPTH {
            match self.data(current) {
                TypeData::Ref { sym, .. } => {
                    if self.sym(sym).is_alias_type() {
                        let expanded = self.normalize(current);
                        if expanded != current {
                            current = expanded;
                            continue;
                        }
                    }
                    return sym;
                }
                TypeData::Refined { class, .. } => return class,
                TypeData::This(sym) => return sym,
                TypeData::Single { .. } | TypeData::Constant(_) => current = self.underlying(current),
                TypeData::Existential { underlying, .. }
                | TypeData::Annotated { underlying, .. }
                | TypeData::NotNull(underlying)
                | TypeData::NullaryMethod(underlying) => current = underlying,
                TypeData::Poly { result, .. } => current = result,
                _ => return SymbolId::NO_SYMBOL,
            }
        }
        SymbolId::NO_SYMBOL
    }

    /// A type constructor awaiting arguments: a `Poly` type, or a reference
    /// to a generic type without arguments (raw Java types excluded).
    pub fn is_higher_kinded(&self, ty: TypeId) -> bool {
        match self.data(ty) {
            TypeData::Poly { .. } => true,
            TypeData::Ref { sym, args, .. } => {
                args == TypeListId::EMPTY
                    && !self.sym(sym).type_params.is_empty()
                    && !self.is_raw(ty)
            }
            _ => false,
        }
    }

    /// A Java-defined generic class used without arguments.
    pub fn is_raw(&self, ty: TypeId) -> bool {
        match self.data(ty) {
            TypeData::Ref { sym, args, .. } => {
                let data = self.sym(sym);
                data.is_class()
                    && data.is_java_defined()
                    && !data.type_params.is_empty()
                    && self.type_list(args).is_empty()
            }
            _ => false,
        }
    }

    /// A type that denotes a single value.
    pub fn is_stable(&self, ty: TypeId) -> bool {
        let defs = self.defs();
        match self.data(ty) {
            TypeData::This(_) | TypeData::Single { .. } | TypeData::Constant(_) => true,
            TypeData::Ref { sym, .. } => {
                let data = self.sym(sym);
                if sym == defs.nothing || sym == defs.singleton {
                    return true;
                }
                if data.is_alias_type() {
                    let expanded = self.normalize(ty);
                    return expanded != ty && self.is_stable(expanded);
                }
                if data.is_abstract_type() {
                    let hi_sym = self.type_symbol(self.upper_bound(ty));
                    return hi_sym.exists()
                        && self.symbols.is_non_bottom_sub_class(self.db, hi_sym, defs.singleton);
                }
                false
            }
            TypeData::NotNull(underlying) | TypeData::Annotated { underlying, .. } => self.is_stable(underlying),
            _ => false,
        }
    }

    /// Statically known to exclude `null`.
    pub fn is_not_null(&self, ty: TypeId) -> bool {
        let defs = self.defs();
        match self.data(ty) {
            TypeData::This(_) | TypeData::NotNull(_) => true,
            TypeData::Constant(value) => value != ConstantValue::Null,
            TypeData::Single { sym, .. } => {
                self.sym(sym).flags.contains(SymbolFlags::MODULE) || self.is_not_null(self.underlying(ty))
            }
            TypeData::Ref { sym, .. } => {
                let data = self.sym(sym);
                if data.is_module_class() || sym == defs.nothing {
                    return true;
                }
                if data.is_class() {
                    return self.symbols.is_non_bottom_sub_class(self.db, sym, defs.any_val)
                        || self.symbols.is_non_bottom_sub_class(self.db, sym, defs.not_null);
                }
                if data.is_alias_type() {
                    let expanded = self.normalize(ty);
                    return expanded != ty && self.is_not_null(expanded);
                }
                if data.is_abstract_type() {
                    let hi = self.upper_bound(ty);
                    return hi != ty && self.is_not_null(hi);
                }
                false
            }
            TypeData::Refined { parents, .. } => self.type_list(parents).iter().any(|&p| self.is_not_null(p)),
            TypeData::Annotated { underlying, .. } | TypeData::Existential { underlying, .. } => {
                self.is_not_null(underlying)
            }
            _ => false,
        }
    }

    // =========================================================================
    // Bounds
    // =========================================================================

    /// `(lo, hi)` of an abstract type symbol's declared bounds.
    pub fn bounds_of(&self, sym: SymbolId) -> (TypeId, TypeId) {
        let defs = self.defs();
        let info = self.symbols.info(sym);
        match self.data(info) {
            TypeData::Bounds { lo, hi } => (lo, hi),
            TypeData::NoType => (defs.nothing_type, defs.any_type),
            _ => (info, info),
        }
    }

    /// Bounds of a reference to an abstract type, seen from its prefix and
    /// instantiated with its arguments.
    pub fn ref_bounds(&self, ty: TypeId) -> (TypeId, TypeId) {
        let defs = self.defs();
        match self.data(ty) {
            TypeData::Ref { prefix, sym, args } => {
                let data = self.sym(sym);
                let (lo, hi) = self.bounds_of(sym);
                let args = self.type_list(args);
                let adapt = |t: TypeId| {
                    let seen = self.as_seen_from(t, prefix, data.owner);
                    self.subst_types(seen, &data.type_params, &args)
                };
                (adapt(lo), adapt(hi))
            }
            TypeData::Bounds { lo, hi } => (lo, hi),
            _ => (defs.nothing_type, defs.any_type),
        }
    }

    pub fn lower_bound(&self, ty: TypeId) -> TypeId {
        self.ref_bounds(ty).0
    }

    pub fn upper_bound(&self, ty: TypeId) -> TypeId {
        self.ref_bounds(ty).1
    }

    // =========================================================================
    // Base types
    // =========================================================================

    /// The supertype of `ty` whose type symbol is `class`, or `NO_TYPE`.
    pub fn base_type(&self, ty: TypeId, class: SymbolId) -> TypeId {
        self.base_type_at(ty, class, 0)
    }

    fn base_type_at(&self, ty: TypeId, class: SymbolId, depth: u32) -> TypeId {
        if depth > RecursionProfile::BaseTypeExpansion.max_depth() {
            trace!(ty = ty.0, class = class.0, "base_type: depth limit reached");
            return TypeId::NO_TYPE;
        }
        let next = depth + 1;
        match self.data(ty) {
            TypeData::Ref { prefix, sym, args } => {
                if sym == class {
                    return ty;
                }
                let data = self.sym(sym);
                if data.is_class() {
                    if !self.symbols.is_non_bottom_sub_class(self.db, sym, class) {
                        return TypeId::NO_TYPE;
                    }
                    let args = self.type_list(args);
                    for &parent in &data.parents {
                        let parent_class = self.symbols.parent_class(self.db, parent);
                        if !parent_class.exists()
                            || !self.symbols.is_non_bottom_sub_class(self.db, parent_class, class)
                        {
                            continue;
                        }
                        let seen = self.as_seen_from(parent, prefix, data.owner);
                        let seen = if args.len() == data.type_params.len() {
                            self.subst_types(seen, &data.type_params, &args)
                        } else {
                            seen
                        };
                        let found = self.base_type_at(seen, class, next);
                        if found.exists() {
                            return found;
                        }
                    }
                    return TypeId::NO_TYPE;
                }
                if data.is_alias_type() {
                    let expanded = self.dealias(ty);
                    return if expanded == ty {
                        TypeId::NO_TYPE
                    } else {
                        self.base_type_at(expanded, class, next)
                    };
                }
                if data.is_abstract_type() {
                    let hi = self.upper_bound(ty);
                    return if hi == ty { TypeId::NO_TYPE } else { self.base_type_at(hi, class, next) };
                }
                TypeId::NO_TYPE
            }
            TypeData::Refined {
                parents,
                class: refinement,
                ..
            } => {
                if refinement == class {
                    return ty;
                }
                for &parent in self.type_list(parents).iter() {
                    let found = self.base_type_at(parent, class, next);
                    if found.exists() {
                        return found;
                    }
                }
                TypeId::NO_TYPE
            }
            TypeData::Existential {
                quantified,
                underlying,
            } => {
                let found = self.base_type_at(underlying, class, next);
                if !found.exists() {
                    return found;
                }
                let used: Vec<SymbolId> = self
                    .symbol_list(quantified)
                    .iter()
                    .copied()
                    .filter(|&q| self.mentions_symbol(found, q))
                    .collect();
                self.db.existential(used, found)
            }
            TypeData::This(_)
            | TypeData::Single { .. }
            | TypeData::Constant(_)
            | TypeData::NotNull(_)
            | TypeData::Annotated { .. } => self.base_type_at(self.underlying(ty), class, next),
            TypeData::Bounds { hi, .. } => self.base_type_at(hi, class, next),
            _ => TypeId::NO_TYPE,
        }
    }

    /// Linearization of the type's class (refined types: their parents').
    pub fn base_classes_of(&self, ty: TypeId) -> Vec<SymbolId> {
        match self.data(ty) {
            TypeData::Refined { parents, class, .. } => {
                let mut out = vec![class];
                for &parent in self.type_list(parents).iter() {
                    for bc in self.base_classes_of(parent) {
                        if !out.contains(&bc) {
                            out.push(bc);
                        }
                    }
                }
                out
            }
            _ => {
                let sym = self.type_symbol(ty);
                let data = self.sym(sym);
                if data.is_class() {
                    self.symbols.base_classes(self.db, sym).to_vec()
                } else if data.is_abstract_type() {
                    let hi = self.upper_bound(self.widen(ty));
                    if hi == ty { Vec::new() } else { self.base_classes_of(hi) }
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// `ty` refers to `sym` (as a reference, singleton or this type).
    pub(crate) fn mentions_symbol(&self, ty: TypeId, sym: SymbolId) -> bool {
        exists_type(self, ty, |_, data| match *data {
            TypeData::Ref { sym: s, .. } | TypeData::Single { sym: s, .. } | TypeData::This(s) => s == sym,
            _ => false,
        })
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Members named `name` visible in `ty`, most derived first. Term
    /// overloads are all returned; other members shadow same-named ones from
    /// base classes.
    pub fn find_member(&self, ty: TypeId, name: Name) -> Vec<SymbolId> {
        let mut found: Vec<SymbolId> = Vec::new();
        let owners = self.member_owners(ty);
        for owner in owners {
            for member in self.symbols.decls_named(owner, name) {
                let data = self.sym(member);
                let shadowed = found.iter().any(|&prev| {
                    let prev = self.sym(prev);
                    prev.is_type() == data.is_type() && !(prev.is_method() && data.is_method())
                });
                if !shadowed {
                    found.push(member);
                }
            }
        }
        found
    }

    fn member_owners(&self, ty: TypeId) -> Vec<SymbolId> {
        match self.data(ty) {
            TypeData::Refined { .. } => self.base_classes_of(ty),
            TypeData::Existential { underlying, .. }
            | TypeData::Annotated { underlying, .. }
            | TypeData::NotNull(underlying) => self.member_owners(underlying),
            _ => self.base_classes_of(self.widen(ty)),
        }
    }

    /// Info of member `sym` as seen from `ty`.
    pub fn member_info(&self, ty: TypeId, sym: SymbolId) -> TypeId {
        let data = self.sym(sym);
        self.as_seen_from(data.info, ty, data.owner)
    }

    /// Type of member `sym` as seen from `ty`: for type members, the
    /// reference `ty#sym`; for terms, its info.
    pub fn member_type(&self, ty: TypeId, sym: SymbolId) -> TypeId {
        let data = self.sym(sym);
        if data.is_type() {
            self.db.type_ref(ty, sym, self.param_refs(&data.type_params))
        } else {
            self.member_info(ty, sym)
        }
    }

    // =========================================================================
    // Annotations
    // =========================================================================

    pub fn without_annotations(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        while let TypeData::Annotated { underlying, .. } = self.data(current) {
            current = underlying;
        }
        current
    }

    /// Annotation classes on `ty`, outermost first.
    pub fn annotations(&self, ty: TypeId) -> Vec<SymbolId> {
        let mut out = Vec::new();
        let mut current = ty;
        while let TypeData::Annotated {
            annotations,
            underlying,
        } = self.data(current)
        {
            out.extend(self.symbol_list(annotations).iter().copied());
            current = underlying;
        }
        out
    }

    // =========================================================================
    // Existentials
    // =========================================================================

    /// `C` for a raw `C` with type parameters `ps`: `C[ps'] forSome { ps' }`.
    pub fn raw_to_existential(&self, ty: TypeId) -> TypeId {
        let TypeData::Ref { prefix, sym, .. } = self.data(ty) else {
            return ty;
        };
        let tparams = self.symbols.type_params(sym);
        if tparams.is_empty() {
            return ty;
        }
        let quantified: Vec<SymbolId> = tparams
            .iter()
            .map(|&tp| self.symbols.new_existential(sym, &self.symbols.name_str(tp)))
            .collect();
        for (&tp, &q) in tparams.iter().zip(&quantified) {
            let info = self.symbols.info(tp);
            self.symbols.set_info(q, self.subst_sym(info, &tparams, &quantified));
        }
        let underlying = self.db.type_ref(prefix, sym, self.param_refs(&quantified));
        self.db.existential(quantified, underlying)
    }

    /// Replace the quantifiers of an existential by fresh skolems created at
    /// skolemization `level`, returning the skolemized underlying type.
    /// Other types are returned unchanged.
    pub fn skolemize_existential(&self, ty: TypeId, level: u32) -> TypeId {
        let TypeData::Existential {
            quantified,
            underlying,
        } = self.data(ty)
        else {
            return ty;
        };
        let quantified = self.symbol_list(quantified);
        let owner = common_owner_of(*self, ty);
        let skolems: Vec<SymbolId> = quantified
            .iter()
            .map(|&q| {
                self.symbols.new_type_like(
                    q,
                    owner,
                    SymbolFlags::SKOLEM | SymbolFlags::EXISTENTIAL | SymbolFlags::DEFERRED,
                    level,
                )
            })
            .collect();
        for (&q, &skolem) in quantified.iter().zip(&skolems) {
            let info = self.symbols.info(q);
            self.symbols.set_info(skolem, self.subst_sym(info, &quantified, &skolems));
        }
        self.subst_sym(underlying, &quantified, &skolems)
    }

    /// Fresh copies of `syms` whose infos refer to the copies.
    pub fn clone_symbols(&self, syms: &[SymbolId]) -> Vec<SymbolId> {
        let clones: Vec<SymbolId> = syms.iter().map(|&s| self.symbols.clone_symbol(s)).collect();
        for &clone in &clones {
            let info = self.symbols.info(clone);
            self.symbols.set_info(clone, self.subst_sym(info, syms, &clones));
        }
        clones
    }
}

#[cfg(test)]
#[path = "tests/type_ops_tests.rs"]
mod tests;
