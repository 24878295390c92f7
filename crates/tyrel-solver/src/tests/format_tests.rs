use super::*;
use crate::db::TypeDatabase;
use crate::test_fixtures::Fixture;
use crate::types::{TypeVarId, Variance};

fn show(fx: &Fixture, ty: TypeId) -> String {
    TypeFormatter::new(fx.env()).format(ty)
}

#[test]
fn test_format_class_references() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let pair = fx.generic("Pair", &[("A", Variance::Covariant), ("B", Variance::Covariant)]);
    assert_eq!(show(&fx, fx.int()), "Int");
    assert_eq!(show(&fx, fx.apply(cell, &[fx.string()])), "Cell[String]");
    assert_eq!(show(&fx, fx.apply(pair, &[fx.int(), fx.apply(cell, &[fx.int()])])), "Pair[Int, Cell[Int]]");
    assert_eq!(show(&fx, fx.param(cell, 0)), "T");
}

#[test]
fn test_format_prefixes() {
    let fx = Fixture::new();
    let outer = fx.class("Outer", &[]);
    let inner = fx.symbols.new_abstract_type(outer, "Inner");
    let module = fx.module("Config");
    let env = fx.env();
    let path = env.single_type_of(module);
    assert_eq!(show(&fx, env.this_type(outer)), "Outer.this.type");
    assert_eq!(show(&fx, env.this_type(fx.pkg)), "test.this.type");
    assert_eq!(show(&fx, path), "Config.type");
    assert_eq!(show(&fx, fx.interner.type_ref(path, inner, vec![])), "Config.Inner");
    assert_eq!(show(&fx, fx.interner.type_ref(fx.ty(outer), inner, vec![])), "Outer#Inner");
}

#[test]
fn test_format_constants() {
    let fx = Fixture::new();
    let constant = |value| show(&fx, fx.interner.constant(value));
    assert_eq!(constant(ConstantValue::Int(42)), "42");
    assert_eq!(constant(ConstantValue::Long(1)), "1L");
    assert_eq!(constant(ConstantValue::Char('c')), "'c'");
    assert_eq!(constant(ConstantValue::Boolean(true)), "true");
    assert_eq!(constant(ConstantValue::Unit), "()");
    assert_eq!(constant(ConstantValue::Null), "null");
    let hello = fx.symbols.intern_name("hello");
    assert_eq!(constant(ConstantValue::Str(hello)), "\"hello\"");
}

#[test]
fn test_format_compound_types() {
    let fx = Fixture::new();
    let (a, b, c) = fx.abc();
    let refinement = fx.symbols.new_refinement_class(fx.pkg);
    let x = fx.symbols.new_value(refinement, "x", SymbolFlags::STABLE);
    fx.symbols.set_info(x, fx.string());
    let env = fx.env();
    let refined = env.refined_type(refinement, vec![c], vec![x]);
    assert_eq!(show(&fx, refined), "C { val x: String }");

    let both = fx.symbols.new_refinement_class(fx.pkg);
    assert_eq!(show(&fx, env.refined_type(both, vec![a, b], vec![])), "A with B");
    assert_eq!(show(&fx, fx.interner.bounds(a, c)), " >: A <: C");
    assert_eq!(show(&fx, fx.interner.bounded_wildcard(fx.nothing(), b)), "? <: B");
    assert_eq!(show(&fx, fx.interner.not_null(fx.string())), "String with NotNull");
}

#[test]
fn test_format_binders() {
    let fx = Fixture::new();
    let (_, b, _) = fx.abc();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let env = fx.env();

    let q = fx.symbols.new_existential(fx.pkg, "X");
    fx.symbols.set_info(q, fx.interner.bounds(fx.nothing(), b));
    let ex = fx.interner.existential(vec![q], fx.apply(cell, &[env.type_constructor(q)]));
    assert_eq!(show(&fx, ex), "Cell[X] forSome { type X <: B }");

    let lambdas = fx.class("Lambdas", &[]);
    let p = fx.symbols.new_type_param(lambdas, "P", Variance::Invariant);
    fx.symbols.set_info(p, fx.interner.bounds(fx.nothing(), b));
    let poly = fx.interner.poly(vec![p], fx.apply(cell, &[env.type_constructor(p)]));
    assert_eq!(show(&fx, poly), "[P <: B]Cell[P]");
}

#[test]
fn test_format_method_types() {
    let fx = Fixture::new();
    let owner = fx.class("Api", &[]);
    let m = fx.symbols.new_method(owner, "m", SymbolFlags::empty());
    let x = fx.symbols.new_param(m, "x", fx.int());
    let plain = fx.interner.method(vec![x], fx.string(), MethodFlags::empty());
    let implicit = fx.interner.method(vec![x], fx.string(), MethodFlags::IMPLICIT);
    assert_eq!(show(&fx, plain), "(x: Int)String");
    assert_eq!(show(&fx, implicit), "(implicit x: Int)String");
    assert_eq!(show(&fx, fx.interner.nullary_method(fx.int())), "=> Int");
}

#[test]
fn test_format_annotations_and_type_vars() {
    let fx = Fixture::new();
    let checked = fx.class("checked", &[]);
    let annotated = fx.interner.annotated(vec![checked], fx.string());
    assert_eq!(show(&fx, annotated), "String @checked");
    assert_eq!(show(&fx, fx.interner.type_var(TypeVarId(3))), "?3");
}

#[test]
fn test_format_cuts_off_deep_types() {
    let fx = Fixture::new();
    let cell = fx.generic("Cell", &[("T", Variance::Invariant)]);
    let deep = fx.apply(cell, &[fx.apply(cell, &[fx.apply(cell, &[fx.int()])])]);
    let formatted = TypeFormatter::new(fx.env()).with_max_depth(1).format(deep);
    assert_eq!(formatted, "Cell[Cell[...]]");
}
