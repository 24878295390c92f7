use super::*;
use crate::db::TypeDatabase;
use crate::test_fixtures::Fixture;
use crate::types::{MethodFlags, Variance};

#[test]
fn test_for_each_child_lists_prefix_and_args() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let applied = fx.apply(cell, &[fx.int()]);
    let env = fx.env();
    let mut children = Vec::new();
    for_each_child(&env, applied, |child| children.push(child));
    assert_eq!(children, vec![env.this_type(fx.pkg), fx.int()]);
}

#[test]
fn test_exists_type_finds_nested_component() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let inner = fx.apply(cell, &[fx.string()]);
    let outer = fx.apply(cell, &[inner]);
    let env = fx.env();
    let string = fx.string();
    assert!(exists_type(&env, outer, |ty, _| ty == string));
    assert!(!exists_type(&env, outer, |_, data| matches!(data, TypeData::TypeVar(_))));
}

#[test]
fn test_subst_types_instantiates_params() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let t = fx.param(cell, 0);
    let generic = fx.apply(cell, &[t]);
    let env = fx.env();
    let tparams = fx.symbols.type_params(cell);
    let result = env.subst_types(generic, &tparams, &[fx.int()]);
    assert_eq!(result, fx.apply(cell, &[fx.int()]));
}

#[test]
fn test_subst_types_applies_higher_kinded_params() {
    let fx = Fixture::new();
    let holder = fx.generic("Holder", &[("F", Variance::Invariant)]);
    let f = fx.symbols.type_params(holder)[0];
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let f_of_int = fx.interner.type_ref(TypeId::NO_PREFIX, f, vec![fx.int()]);
    let cell_ctor = fx.ty(cell);
    let env = fx.env();
    assert_eq!(env.subst_types(f_of_int, &[f], &[cell_ctor]), fx.apply(cell, &[fx.int()]));
}

#[test]
fn test_subst_sym_renames_references() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let tparams = fx.symbols.type_params(cell);
    let other = fx.symbols.new_type_param(cell, "U", Variance::Invariant);
    let env = fx.env();
    let renamed = env.subst_sym(fx.param(cell, 0), &tparams, &[other]);
    assert_eq!(renamed, env.type_constructor(other));
}

#[test]
fn test_subst_this_replaces_self_reference() {
    let fx = Fixture::new();
    let outer = fx.class("Outer", &[]);
    let inner = fx.symbols.new_abstract_type(outer, "Inner");
    let env = fx.env();
    let selected = fx.interner.type_ref(env.this_type(outer), inner, vec![]);
    let module = fx.module("o");
    let path = env.single_type_of(module);
    let seen = env.subst_this(selected, outer, path);
    assert_eq!(seen, fx.interner.type_ref(path, inner, vec![]));
}

#[test]
fn test_mapping_method_clones_params_when_infos_change() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let tparams = fx.symbols.type_params(cell);
    let method = fx.symbols.new_method(cell, "put", crate::symbols::SymbolFlags::empty());
    let x = fx.symbols.new_param(method, "x", fx.param(cell, 0));
    let mt = fx.interner.method(vec![x], fx.param(cell, 0), MethodFlags::empty());
    let env = fx.env();
    let mapped = env.subst_types(mt, &tparams, &[fx.int()]);
    match env.data(mapped) {
        TypeData::Method { params, result, .. } => {
            let params = env.symbol_list(params);
            assert_ne!(params[0], x);
            assert_eq!(fx.symbols.info(params[0]), fx.int());
            assert_eq!(fx.symbols.info(x), fx.param(cell, 0));
            assert_eq!(result, fx.int());
        }
        other => panic!("expected a method type, got {other:?}"),
    }
}

#[test]
fn test_apply_type_args_beta_reduces_poly() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let lambda_owner = fx.class("Lambdas", &[]);
    let x = fx.symbols.new_type_param(lambda_owner, "X", Variance::Invariant);
    let env = fx.env();
    let body = fx.apply(cell, &[env.type_constructor(x)]);
    let lambda = fx.interner.poly(vec![x], body);
    assert_eq!(env.apply_type_args(lambda, vec![fx.string()]), fx.apply(cell, &[fx.string()]));
    assert_eq!(env.apply_type_args(lambda, vec![fx.string(), fx.int()]), TypeId::ERROR);
}

#[test]
fn test_unchanged_types_keep_their_ids() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let tparams = fx.symbols.type_params(cell);
    let closed = fx.apply(cell, &[fx.int()]);
    let env = fx.env();
    assert_eq!(env.subst_types(closed, &tparams, &[fx.string()]), closed);
}
