//! Class-hierarchy builder shared by the integration tests.

#![allow(dead_code)]

use tyrel_solver::{
    SubtypeChecker, SubtypePolicy, SymbolFlags, SymbolId, SymbolTable, TypeDatabase, TypeEnv, TypeId,
    TypeInterner, Variance,
};

pub struct World {
    pub types: TypeInterner,
    pub symbols: SymbolTable,
    pub pkg: SymbolId,
}

impl World {
    pub fn new() -> Self {
        tyrel_common::tracing_config::init_tracing();
        let types = TypeInterner::new();
        let symbols = SymbolTable::new(&types);
        let root = symbols.definitions().root_class;
        let pkg = symbols.new_package(root, "demo");
        World { types, symbols, pkg }
    }

    pub fn env(&self) -> TypeEnv<'_> {
        TypeEnv::new(&self.types, &self.symbols)
    }

    pub fn checker(&self) -> SubtypeChecker<'_> {
        SubtypeChecker::new(self.env())
    }

    pub fn checker_with(&self, policy: SubtypePolicy) -> SubtypeChecker<'_> {
        SubtypeChecker::with_policy(self.env(), policy)
    }

    /// `class name extends parents`; `AnyRef` when no parent is given.
    pub fn class(&self, name: &str, parents: &[TypeId]) -> TypeId {
        let sym = self.symbols.new_class(self.pkg, name, SymbolFlags::empty());
        self.extend(sym, parents);
        self.env().class_type(sym, vec![])
    }

    pub fn trait_(&self, name: &str, parents: &[TypeId]) -> TypeId {
        let sym = self.symbols.new_class(self.pkg, name, SymbolFlags::TRAIT);
        self.extend(sym, parents);
        self.env().class_type(sym, vec![])
    }

    /// `class name[params]`; returns the class symbol.
    pub fn generic(&self, name: &str, params: &[(&str, Variance)]) -> SymbolId {
        let sym = self.symbols.new_class(self.pkg, name, SymbolFlags::empty());
        let tparams = params
            .iter()
            .map(|&(p, variance)| self.symbols.new_type_param(sym, p, variance))
            .collect();
        self.symbols.set_type_params(sym, tparams);
        self.extend(sym, &[]);
        sym
    }

    pub fn extend(&self, sym: SymbolId, parents: &[TypeId]) {
        let parents = if parents.is_empty() {
            vec![self.symbols.definitions().any_ref_type]
        } else {
            parents.to_vec()
        };
        self.symbols.set_parents(sym, parents);
    }

    pub fn apply(&self, sym: SymbolId, args: &[TypeId]) -> TypeId {
        self.env().class_type(sym, args.to_vec())
    }

    pub fn param(&self, class: SymbolId, i: usize) -> TypeId {
        self.env().type_constructor(self.symbols.type_params(class)[i])
    }

    pub fn sym_of(&self, ty: TypeId) -> SymbolId {
        self.env().type_symbol(ty)
    }

    /// `T forSome { type T <: hi }` around `body(T)`.
    pub fn exists(&self, hi: TypeId, body: impl FnOnce(TypeId) -> TypeId) -> TypeId {
        let q = self.symbols.new_existential(self.pkg, "T");
        let nothing = self.nothing();
        self.symbols.set_info(q, self.types.bounds(nothing, hi));
        let underlying = body(self.env().type_constructor(q));
        self.types.existential(vec![q], underlying)
    }

    pub fn any(&self) -> TypeId {
        self.symbols.definitions().any_type
    }

    pub fn any_ref(&self) -> TypeId {
        self.symbols.definitions().any_ref_type
    }

    pub fn nothing(&self) -> TypeId {
        self.symbols.definitions().nothing_type
    }

    pub fn null(&self) -> TypeId {
        self.symbols.definitions().null_type
    }

    pub fn int(&self) -> TypeId {
        self.symbols.definitions().int_type
    }

    pub fn string(&self) -> TypeId {
        self.symbols.definitions().string_type
    }
}
