//! The pair of stores every type operation reads: interned types and symbols.

use crate::db::TypeDatabase;
use crate::symbols::{Definitions, SymbolData, SymbolFlags, SymbolId, SymbolTable};
use crate::types::{SymbolListId, TypeData, TypeId, TypeListId};
use std::sync::Arc;

/// Read access to the type database and the symbol table.
///
/// `TypeEnv` is `Copy`; type operations (`normalize`, `base_type`,
/// substitution, ...) are methods on it, spread over `type_ops.rs` and
/// `visitor.rs`.
#[derive(Clone, Copy)]
pub struct TypeEnv<'a> {
    pub db: &'a dyn TypeDatabase,
    pub symbols: &'a SymbolTable,
}

impl<'a> TypeEnv<'a> {
    pub fn new(db: &'a dyn TypeDatabase, symbols: &'a SymbolTable) -> Self {
        TypeEnv { db, symbols }
    }

    #[inline]
    pub fn data(&self, ty: TypeId) -> TypeData {
        self.db.data(ty)
    }

    #[inline]
    pub fn defs(&self) -> &'a Definitions {
        self.symbols.definitions()
    }

    #[inline]
    pub fn sym(&self, sym: SymbolId) -> Arc<SymbolData> {
        self.symbols.get(sym)
    }

    #[inline]
    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        self.db.type_list(id)
    }

    #[inline]
    pub fn symbol_list(&self, id: SymbolListId) -> Arc<[SymbolId]> {
        self.db.symbol_list(id)
    }

    pub fn this_type(&self, sym: SymbolId) -> TypeId {
        self.db.this_type(sym)
    }

    /// Prefix for a reference to `sym` from outside its owner.
    pub fn prefix_of(&self, sym: SymbolId) -> TypeId {
        let data = self.sym(sym);
        if data.flags.contains(SymbolFlags::PARAM) || data.flags.contains(SymbolFlags::EXISTENTIAL) {
            TypeId::NO_PREFIX
        } else {
            self.symbols.prefix_for(data.owner, self.db)
        }
    }

    /// The type constructor `sym` (no arguments).
    pub fn type_constructor(&self, sym: SymbolId) -> TypeId {
        self.db.type_ref(self.prefix_of(sym), sym, vec![])
    }

    /// `sym` applied to its own type parameters.
    pub fn type_ref_of(&self, sym: SymbolId) -> TypeId {
        let args = self
            .sym(sym)
            .type_params
            .iter()
            .map(|&tp| self.type_constructor(tp))
            .collect();
        self.db.type_ref(self.prefix_of(sym), sym, args)
    }

    /// `sym[args]` with `sym`'s natural prefix.
    pub fn class_type(&self, sym: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.db.type_ref(self.prefix_of(sym), sym, args)
    }

    /// Singleton type of a stable value or module.
    pub fn single_type_of(&self, sym: SymbolId) -> TypeId {
        self.db.single_type(self.prefix_of(sym), sym)
    }

    /// Refined type over `parents` whose members `decls` are owned by
    /// `class` (a refinement class). Records the type as the class's info.
    pub fn refined_type(&self, class: SymbolId, parents: Vec<TypeId>, decls: Vec<SymbolId>) -> TypeId {
        let ty = self.db.refined(parents, decls, class);
        self.symbols.set_info(class, ty);
        ty
    }

    /// Type-parameter refs (`NoPrefix` refs) for `params`.
    pub fn param_refs(&self, params: &[SymbolId]) -> Vec<TypeId> {
        params.iter().map(|&p| self.type_constructor(p)).collect()
    }
}
