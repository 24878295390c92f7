//! Type database abstraction for the solver.
//!
//! The relation procedures only talk to storage through this trait, so the
//! concrete interner can be replaced without touching them.

use crate::intern::TypeInterner;
use crate::symbols::SymbolId;
use crate::types::*;
use std::sync::Arc;

/// Query and construction interface for interned types.
pub trait TypeDatabase {
    fn intern(&self, data: TypeData) -> TypeId;
    fn lookup(&self, id: TypeId) -> Option<TypeData>;
    fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId;
    fn type_list(&self, id: TypeListId) -> Arc<[TypeId]>;
    fn intern_symbol_list(&self, items: Vec<SymbolId>) -> SymbolListId;
    fn symbol_list(&self, id: SymbolListId) -> Arc<[SymbolId]>;

    /// Structure of `id`, with unknown handles read as `NoType`.
    fn data(&self, id: TypeId) -> TypeData {
        self.lookup(id).unwrap_or(TypeData::NoType)
    }

    fn this_type(&self, sym: SymbolId) -> TypeId {
        self.intern(TypeData::This(sym))
    }

    fn single_type(&self, prefix: TypeId, sym: SymbolId) -> TypeId {
        self.intern(TypeData::Single { prefix, sym })
    }

    fn constant(&self, value: ConstantValue) -> TypeId {
        self.intern(TypeData::Constant(value))
    }

    fn type_ref(&self, prefix: TypeId, sym: SymbolId, args: Vec<TypeId>) -> TypeId {
        let args = self.intern_type_list(args);
        self.intern(TypeData::Ref { prefix, sym, args })
    }

    fn refined(&self, parents: Vec<TypeId>, decls: Vec<SymbolId>, class: SymbolId) -> TypeId {
        let parents = self.intern_type_list(parents);
        let decls = self.intern_symbol_list(decls);
        self.intern(TypeData::Refined {
            parents,
            decls,
            class,
        })
    }

    /// `underlying forSome { quantified }`; no quantifiers means no wrapper.
    fn existential(&self, quantified: Vec<SymbolId>, underlying: TypeId) -> TypeId {
        if quantified.is_empty() {
            return underlying;
        }
        let quantified = self.intern_symbol_list(quantified);
        self.intern(TypeData::Existential {
            quantified,
            underlying,
        })
    }

    /// Annotate `underlying`; no annotations means no wrapper.
    fn annotated(&self, annotations: Vec<SymbolId>, underlying: TypeId) -> TypeId {
        if annotations.is_empty() {
            return underlying;
        }
        let annotations = self.intern_symbol_list(annotations);
        self.intern(TypeData::Annotated {
            annotations,
            underlying,
        })
    }

    fn bounds(&self, lo: TypeId, hi: TypeId) -> TypeId {
        self.intern(TypeData::Bounds { lo, hi })
    }

    fn bounded_wildcard(&self, lo: TypeId, hi: TypeId) -> TypeId {
        let bounds = self.bounds(lo, hi);
        self.intern(TypeData::BoundedWildcard(bounds))
    }

    fn method(&self, params: Vec<SymbolId>, result: TypeId, flags: MethodFlags) -> TypeId {
        let params = self.intern_symbol_list(params);
        self.intern(TypeData::Method {
            params,
            result,
            flags,
        })
    }

    fn nullary_method(&self, result: TypeId) -> TypeId {
        self.intern(TypeData::NullaryMethod(result))
    }

    /// `[type_params]result`; no type parameters means no wrapper.
    fn poly(&self, type_params: Vec<SymbolId>, result: TypeId) -> TypeId {
        if type_params.is_empty() {
            return result;
        }
        let type_params = self.intern_symbol_list(type_params);
        self.intern(TypeData::Poly {
            type_params,
            result,
        })
    }

    fn type_var(&self, id: TypeVarId) -> TypeId {
        self.intern(TypeData::TypeVar(id))
    }

    fn not_null(&self, underlying: TypeId) -> TypeId {
        self.intern(TypeData::NotNull(underlying))
    }
}

impl TypeDatabase for TypeInterner {
    fn intern(&self, data: TypeData) -> TypeId {
        TypeInterner::intern(self, data)
    }

    fn lookup(&self, id: TypeId) -> Option<TypeData> {
        TypeInterner::lookup(self, id)
    }

    fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId {
        TypeInterner::intern_type_list(self, items)
    }

    fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        TypeInterner::type_list(self, id)
    }

    fn intern_symbol_list(&self, items: Vec<SymbolId>) -> SymbolListId {
        TypeInterner::intern_symbol_list(self, items)
    }

    fn symbol_list(&self, id: SymbolListId) -> Arc<[SymbolId]> {
        TypeInterner::symbol_list(self, id)
    }
}
