//! Shared scaffolding for unit tests: a type interner plus a symbol table
//! with a `test` package to declare classes in.

use crate::env::TypeEnv;
use crate::intern::TypeInterner;
use crate::subtype::SubtypeChecker;
use crate::symbols::{SymbolFlags, SymbolId, SymbolTable};
use crate::types::{TypeId, Variance};

pub(crate) struct Fixture {
    pub interner: TypeInterner,
    pub symbols: SymbolTable,
    pub pkg: SymbolId,
}

impl Fixture {
    pub fn new() -> Self {
        let interner = TypeInterner::new();
        let symbols = SymbolTable::new(&interner);
        let root = symbols.definitions().root_class;
        let pkg = symbols.new_package(root, "test");
        Fixture { interner, symbols, pkg }
    }

    pub fn env(&self) -> TypeEnv<'_> {
        TypeEnv::new(&self.interner, &self.symbols)
    }

    pub fn checker(&self) -> SubtypeChecker<'_> {
        SubtypeChecker::new(self.env())
    }

    /// `class name extends parents` (`AnyRef` when `parents` is empty).
    pub fn class(&self, name: &str, parents: &[TypeId]) -> SymbolId {
        let sym = self.symbols.new_class(self.pkg, name, SymbolFlags::empty());
        self.set_parents(sym, parents);
        sym
    }

    /// `class name[params]`; parents are given later with [`set_parents`].
    ///
    /// [`set_parents`]: Self::set_parents
    pub fn generic(&self, name: &str, params: &[(&str, Variance)]) -> SymbolId {
        let sym = self.symbols.new_class(self.pkg, name, SymbolFlags::empty());
        let tparams = params
            .iter()
            .map(|&(p, variance)| self.symbols.new_type_param(sym, p, variance))
            .collect();
        self.symbols.set_type_params(sym, tparams);
        self.set_parents(sym, &[]);
        sym
    }

    pub fn set_parents(&self, sym: SymbolId, parents: &[TypeId]) {
        let parents = if parents.is_empty() {
            vec![self.symbols.definitions().any_ref_type]
        } else {
            parents.to_vec()
        };
        self.symbols.set_parents(sym, parents);
    }

    /// Reference to a class without arguments.
    pub fn ty(&self, sym: SymbolId) -> TypeId {
        self.env().class_type(sym, vec![])
    }

    pub fn apply(&self, sym: SymbolId, args: &[TypeId]) -> TypeId {
        self.env().class_type(sym, args.to_vec())
    }

    /// The `i`-th type parameter of `class`, as a type.
    pub fn param(&self, class: SymbolId, i: usize) -> TypeId {
        let tparam = self.symbols.type_params(class)[i];
        self.env().type_constructor(tparam)
    }

    /// `object name`; returns the module symbol.
    pub fn module(&self, name: &str) -> SymbolId {
        self.symbols.new_module(self.pkg, name, &self.interner)
    }

    pub fn any(&self) -> TypeId {
        self.symbols.definitions().any_type
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

    pub fn any_ref(&self) -> TypeId {
        self.symbols.definitions().any_ref_type
    }

    /// `A <: B <: C`, all extending `AnyRef` at the top.
    pub fn abc(&self) -> (TypeId, TypeId, TypeId) {
        let c = self.class("C", &[]);
        let c_ty = self.ty(c);
        let b = self.class("B", &[c_ty]);
        let b_ty = self.ty(b);
        let a = self.class("A", &[b_ty]);
        (self.ty(a), b_ty, c_ty)
    }
}
