//! Innermost symbol enclosing every local reference in a set of types.
//!
//! A type mentions local scopes through `C.this` and through references
//! without a prefix (type parameters, local classes, parameters). The common
//! owner is the innermost symbol that encloses all of them; fresh symbols
//! synthesized for the types (skolems, for example) are owned by it.

use crate::env::TypeEnv;
use crate::symbols::SymbolId;
use crate::types::{TypeData, TypeId};
use crate::visitor::for_each_child;
use rustc_hash::FxHashSet;

/// Accumulates the common owner over one or more traversals.
pub struct CommonOwnerFinder<'a> {
    env: TypeEnv<'a>,
    result: Option<SymbolId>,
    visited: FxHashSet<TypeId>,
}

impl<'a> CommonOwnerFinder<'a> {
    pub fn new(env: TypeEnv<'a>) -> Self {
        CommonOwnerFinder {
            env,
            result: None,
            visited: FxHashSet::default(),
        }
    }

    /// Current result; `NO_SYMBOL` when nothing was registered.
    pub fn result(&self) -> SymbolId {
        self.result.unwrap_or(SymbolId::NO_SYMBOL)
    }

    pub fn traverse(&mut self, ty: TypeId) {
        let ty = self.env.normalize(ty);
        if !self.visited.insert(ty) {
            return;
        }
        match self.env.data(ty) {
            TypeData::This(sym) => self.register(sym),
            TypeData::Ref {
                prefix: TypeId::NO_PREFIX,
                sym,
                args,
            } => {
                self.register(self.env.symbols.owner(sym));
                for &arg in self.env.type_list(args).iter() {
                    self.traverse(arg);
                }
            }
            TypeData::Single {
                prefix: TypeId::NO_PREFIX,
                sym,
            } => self.register(self.env.symbols.owner(sym)),
            _ => {
                let mut children = Vec::new();
                for_each_child(&self.env, ty, |child| children.push(child));
                for child in children {
                    self.traverse(child);
                }
            }
        }
    }

    /// Narrow the result so that it encloses `sym`.
    pub fn register(&mut self, sym: SymbolId) {
        let current = match self.result {
            Some(current) if sym.exists() => current,
            _ => {
                self.result = Some(sym);
                return;
            }
        };
        let mut result = current;
        while result.exists() && result != sym && !self.env.symbols.is_nested_in(sym, result) {
            result = self.env.symbols.owner(result);
        }
        self.result = Some(result);
    }
}

/// Common owner of the local references in `types`; `NO_SYMBOL` for an
/// empty list or types without local references.
pub fn common_owner_in(env: TypeEnv<'_>, types: &[TypeId]) -> SymbolId {
    let mut finder = CommonOwnerFinder::new(env);
    for &ty in types {
        finder.traverse(ty);
    }
    finder.result()
}

/// Common owner of the local references in `ty`.
pub fn common_owner_of(env: TypeEnv<'_>, ty: TypeId) -> SymbolId {
    common_owner_in(env, std::slice::from_ref(&ty))
}

#[cfg(test)]
#[path = "tests/common_owner_tests.rs"]
mod tests;
