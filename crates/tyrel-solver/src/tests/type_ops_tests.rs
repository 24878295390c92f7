use super::*;
use crate::db::TypeDatabase;
use crate::test_fixtures::Fixture;
use crate::types::Variance;

#[test]
fn test_normalize_expands_alias() {
    let fx = Fixture::new();
    let alias = fx.symbols.new_alias_type(fx.pkg, "Id");
    fx.symbols.set_info(alias, fx.int());
    let env = fx.env();
    let alias_ref = fx.ty(alias);
    assert_eq!(env.normalize(alias_ref), fx.int());
    assert_eq!(env.dealias(alias_ref), fx.int());
}

#[test]
fn test_normalize_instantiates_generic_alias() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let alias = fx.symbols.new_alias_type(fx.pkg, "CellOf");
    let x = fx.symbols.new_type_param(alias, "X", Variance::Invariant);
    fx.symbols.set_type_params(alias, vec![x]);
    let env = fx.env();
    fx.symbols.set_info(alias, fx.apply(cell, &[env.type_constructor(x)]));
    let applied = fx.apply(alias, &[fx.string()]);
    assert_eq!(env.normalize(applied), fx.apply(cell, &[fx.string()]));
}

#[test]
fn test_normalize_eta_expands_type_constructor() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let env = fx.env();
    let ctor = fx.ty(cell);
    assert!(env.is_higher_kinded(ctor));
    match env.data(env.normalize(ctor)) {
        TypeData::Poly { type_params, result } => {
            let tparams = env.symbol_list(type_params);
            assert_eq!(tparams.len(), 1);
            assert_eq!(result, fx.apply(cell, &[env.type_constructor(tparams[0])]));
        }
        other => panic!("expected eta-expansion, got {other:?}"),
    }
}

#[test]
fn test_raw_java_types_are_not_higher_kinded() {
    let fx = Fixture::new();
    let list = fx.symbols.new_class(fx.pkg, "JList", SymbolFlags::JAVA);
    let e = fx.symbols.new_type_param(list, "E", Variance::Invariant);
    fx.symbols.set_type_params(list, vec![e]);
    fx.set_parents(list, &[]);
    let env = fx.env();
    let raw = fx.ty(list);
    assert!(env.is_raw(raw));
    assert!(!env.is_higher_kinded(raw));
    match env.data(env.raw_to_existential(raw)) {
        TypeData::Existential { quantified, underlying } => {
            let quantified = env.symbol_list(quantified);
            assert_eq!(quantified.len(), 1);
            assert!(fx.symbols.flags(quantified[0]).contains(SymbolFlags::EXISTENTIAL));
            assert_eq!(underlying, fx.apply(list, &[env.type_constructor(quantified[0])]));
        }
        other => panic!("expected an existential, got {other:?}"),
    }
}

#[test]
fn test_base_type_substitutes_parent_arguments() {
    let fx = Fixture::new();
    let seq = fx.generic("Seq", &[("A", Variance::Covariant)]);
    let list = fx.generic("List", &[("B", Variance::Covariant)]);
    fx.set_parents(list, &[fx.apply(seq, &[fx.param(list, 0)])]);
    let env = fx.env();
    let list_int = fx.apply(list, &[fx.int()]);
    assert_eq!(env.base_type(list_int, seq), fx.apply(seq, &[fx.int()]));
    assert_eq!(env.base_type(list_int, fx.symbols.definitions().string), TypeId::NO_TYPE);
}

#[test]
fn test_base_type_goes_through_abstract_upper_bound() {
    let fx = Fixture::new();
    let (a, b, _c) = fx.abc();
    let holder = fx.class("Holder", &[]);
    let t = fx.symbols.new_abstract_type(holder, "T");
    fx.symbols.set_info(t, fx.interner.bounds(fx.nothing(), a));
    let env = fx.env();
    let t_ref = fx.interner.type_ref(env.this_type(holder), t, vec![]);
    assert_eq!(env.upper_bound(t_ref), a);
    assert_eq!(env.base_type(t_ref, env.type_symbol(b)), b);
}

#[test]
fn test_widen_strips_singletons() {
    let fx = Fixture::new();
    let env = fx.env();
    let forty_two = fx.interner.constant(ConstantValue::Int(42));
    assert_eq!(env.widen(forty_two), fx.int());
    let module = fx.module("Config");
    let single = env.single_type_of(module);
    assert_eq!(env.widen(single), fx.symbols.info(module));
}

#[test]
fn test_type_symbol_sees_through_wrappers() {
    let fx = Fixture::new();
    let env = fx.env();
    let annot = fx.class("unchecked", &[]);
    let annotated = fx.interner.annotated(vec![annot], fx.string());
    let defs = fx.symbols.definitions();
    assert_eq!(env.type_symbol(annotated), defs.string);
    assert_eq!(env.type_symbol(fx.interner.not_null(fx.string())), defs.string);
    assert_eq!(env.type_symbol(fx.any_ref()), defs.object);
    assert_eq!(env.without_annotations(annotated), fx.string());
    assert_eq!(env.annotations(annotated), vec![annot]);
}

#[test]
fn test_stability_and_not_null() {
    let fx = Fixture::new();
    let env = fx.env();
    let module = fx.module("Registry");
    let single = env.single_type_of(module);
    assert!(env.is_stable(single));
    assert!(env.is_not_null(single));
    assert!(env.is_not_null(fx.int()));
    assert!(!env.is_not_null(fx.string()));
    assert!(env.is_not_null(fx.interner.not_null(fx.string())));
    assert!(!env.is_stable(fx.string()));
}

#[test]
fn test_find_member_prefers_most_derived() {
    let fx = Fixture::new();
    let base = fx.class("Base", &[]);
    let base_x = fx.symbols.new_value(base, "x", SymbolFlags::STABLE);
    fx.symbols.set_info(base_x, fx.any());
    let derived = fx.class("Derived", &[fx.ty(base)]);
    let derived_x = fx.symbols.new_value(derived, "x", SymbolFlags::STABLE);
    fx.symbols.set_info(derived_x, fx.string());
    let env = fx.env();
    let name = fx.symbols.intern_name("x");
    assert_eq!(env.find_member(fx.ty(derived), name), vec![derived_x]);
    assert_eq!(env.find_member(fx.ty(base), name), vec![base_x]);
}

#[test]
fn test_skolemize_existential_creates_leveled_skolems() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let q = fx.symbols.new_existential(fx.pkg, "X");
    let env = fx.env();
    let ex = fx.interner.existential(vec![q], fx.apply(cell, &[env.type_constructor(q)]));
    let skolemized = env.skolemize_existential(ex, 2);
    let TypeData::Ref { args, .. } = env.data(skolemized) else {
        panic!("expected a reference");
    };
    let arg = env.type_list(args)[0];
    let skolem = env.type_symbol(arg);
    let data = fx.symbols.get(skolem);
    assert!(data.flags.contains(SymbolFlags::SKOLEM));
    assert_eq!(data.level, 2);
    assert_ne!(skolem, q);
}
