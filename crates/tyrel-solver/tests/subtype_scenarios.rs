//! End-to-end subtype scenarios built through the public API.

mod support;

use support::World;
use tyrel_solver::{
    MethodFlags, NoopAnnotationChecker, SubtypeChecker, SubtypePolicy, SymbolFlags, SymbolId, TypeDatabase,
    TypeFormatter, TypeId, Variance, common_owner, common_owner_in, is_same_type_of, is_subtype_of,
    is_subtype_of_with_annotations,
};

#[test]
fn test_linear_hierarchy() {
    let world = World::new();
    let c = world.class("C", &[]);
    let b = world.class("B", &[c]);
    let a = world.class("A", &[b]);
    assert!(is_subtype_of(&world.types, &world.symbols, a, c));
    assert!(!is_subtype_of(&world.types, &world.symbols, c, a));
}

#[test]
fn test_method_result_is_covariant() {
    let world = World::new();
    let api = world.class("Api", &[]);
    let m = world.symbols.new_method(world.sym_of(api), "f", SymbolFlags::empty());
    let x = world.symbols.new_param(m, "x", world.int());
    let y = world.symbols.new_param(m, "y", world.int());
    let to_string = world.types.method(vec![x], world.string(), MethodFlags::empty());
    let to_any_ref = world.types.method(vec![y], world.any_ref(), MethodFlags::empty());

    let mut checker = world.checker();
    assert!(checker.is_subtype(to_string, to_any_ref));
    assert!(!checker.is_subtype(to_any_ref, to_string));
}

#[test]
fn test_refinement_conjunction_and_disjunction() {
    let world = World::new();
    let p1 = world.trait_("P1", &[]);
    let p2 = world.trait_("P2", &[]);
    let only_p1 = world.class("OnlyP1", &[p1]);
    let both = world.class("Both", &[p1, p2]);
    let env = world.env();
    let class = world.symbols.new_refinement_class(world.pkg);
    let refined = env.refined_type(class, vec![p1, p2], vec![]);

    let mut checker = world.checker();
    // On the right every parent must conform.
    assert!(checker.is_subtype(both, refined));
    assert!(!checker.is_subtype(only_p1, refined));
    // On the left one conforming parent suffices.
    assert!(checker.is_subtype(refined, p1));
    assert!(checker.is_subtype(refined, p2));
    assert!(!checker.is_subtype(refined, only_p1));
}

#[test]
fn test_common_owner_of_nested_scope() {
    let world = World::new();
    let m = world.class("M", &[]);
    let inner = world.symbols.new_class(world.sym_of(m), "inner", SymbolFlags::empty());
    world.extend(inner, &[]);
    let field = world.symbols.new_abstract_type(inner, "field");
    let env = world.env();
    let types = [
        env.this_type(inner),
        world.types.type_ref(TypeId::NO_PREFIX, field, vec![]),
    ];
    assert_eq!(common_owner(&world.types, &world.symbols, &types), inner);
    assert_eq!(common_owner_in(env, &[env.this_type(world.sym_of(m)), types[1]]), world.sym_of(m));
    assert_eq!(common_owner_in(env, &[]), SymbolId::NO_SYMBOL);
}

#[test]
fn test_expansive_inheritance_terminates() {
    // class N[-Z]; class C extends N[N[C]]: `C <: N[C]` unfolds forever.
    let world = World::new();
    let n = world.generic("N", &[("Z", Variance::Contravariant)]);
    let c = world.class("C", &[]);
    let c_sym = world.sym_of(c);
    world.extend(c_sym, &[world.apply(n, &[world.apply(n, &[c])])]);

    let mut checker = world.checker();
    assert!(!checker.is_subtype(c, world.apply(n, &[c])));
    assert!(checker.cycles() > 0);
    assert!(checker.iterations() < 10_000, "took {} queries", checker.iterations());

    // The checker stays usable after a cyclic rejection.
    checker.reset_stats();
    assert!(checker.is_subtype(c, world.apply(n, &[world.apply(n, &[c])])));
    assert_eq!(checker.cycles(), 0);
}

#[test]
fn test_lower_threshold_cuts_recursion_earlier() {
    let world = World::new();
    let n = world.generic("N", &[("Z", Variance::Contravariant)]);
    let c = world.class("C", &[]);
    world.extend(world.sym_of(c), &[world.apply(n, &[world.apply(n, &[c])])]);
    let target = world.apply(n, &[c]);

    let mut eager = world.checker_with(SubtypePolicy::default().with_pending_threshold(2));
    assert!(!eager.is_subtype(c, target));
    let mut lazy = world.checker();
    assert!(!lazy.is_subtype(c, target));
    assert!(eager.iterations() < lazy.iterations());
}

fn growing_hierarchy(world: &World) -> (TypeId, TypeId) {
    // trait N[-Z]; class C[X] extends N[N[C[C[X]]]]
    let n = world.generic("N", &[("Z", Variance::Contravariant)]);
    let c = world.generic("C", &[("X", Variance::Invariant)]);
    let x = world.param(c, 0);
    let grown = world.apply(c, &[world.apply(c, &[x])]);
    world.extend(c, &[world.apply(n, &[world.apply(n, &[grown])])]);
    let c_int = world.apply(c, &[world.int()]);
    (c_int, world.apply(n, &[c_int]))
}

#[test]
fn test_growing_expansive_inheritance_terminates() {
    let world = World::new();
    let (lhs, rhs) = growing_hierarchy(&world);

    let mut checker = world.checker();
    assert!(!checker.is_subtype(lhs, rhs));
    assert!(checker.depth_cutoffs() > 0);
    assert!(checker.iterations() < 10_000, "took {} queries", checker.iterations());

    checker.reset_stats();
    assert_eq!(checker.depth_cutoffs(), 0);
    assert!(checker.is_subtype(lhs, world.any_ref()));
}

#[test]
fn test_lower_depth_limit_cuts_growth_earlier() {
    let world = World::new();
    let (lhs, rhs) = growing_hierarchy(&world);

    let mut shallow = world.checker_with(SubtypePolicy::default().with_max_depth(16));
    assert!(!shallow.is_subtype(lhs, rhs));
    let mut deep = world.checker();
    assert!(!deep.is_subtype(lhs, rhs));
    assert!(shallow.depth_cutoffs() > 0);
    assert!(shallow.iterations() < deep.iterations());
}

#[test]
fn test_modules_and_singletons() {
    let world = World::new();
    let service = world.trait_("Service", &[]);
    let module = world.symbols.new_module(world.pkg, "Registry", &world.types);
    let module_class = world.symbols.companion(module);
    world.extend(module_class, &[service]);
    let env = world.env();
    let single = env.single_type_of(module);
    let class_type = world.symbols.info(module);

    let mut checker = world.checker();
    assert!(checker.is_subtype(single, service));
    assert!(checker.is_subtype(class_type, single));
    assert!(checker.is_same_type(single, class_type));
    assert!(!checker.is_subtype(service, single));
    // A module reference may still be null.
    assert!(checker.is_subtype(world.null(), single));
}

#[test]
fn test_path_dependent_members() {
    let world = World::new();
    let outer = world.class("Outer", &[]);
    let member = world.symbols.new_abstract_type(world.sym_of(outer), "Member");
    let first = world.symbols.new_value(world.pkg, "first", SymbolFlags::STABLE);
    world.symbols.set_info(first, outer);
    let second = world.symbols.new_value(world.pkg, "second", SymbolFlags::STABLE);
    world.symbols.set_info(second, outer);
    let env = world.env();
    let first_member = world.types.type_ref(env.single_type_of(first), member, vec![]);
    let second_member = world.types.type_ref(env.single_type_of(second), member, vec![]);
    let projection = world.types.type_ref(outer, member, vec![]);

    let mut checker = world.checker();
    assert!(checker.is_subtype(first_member, first_member));
    assert!(!checker.is_subtype(first_member, second_member));
    assert!(checker.is_subtype(first_member, projection));
    assert!(!checker.is_subtype(projection, first_member));
}

#[test]
fn test_annotation_checker_is_pluggable() {
    let world = World::new();
    let units = world.symbols.new_class(world.pkg, "units", SymbolFlags::TYPE_CONSTRAINT);
    let meters = world.types.annotated(vec![units], world.int());
    let policy = SubtypePolicy::default();

    assert!(!is_subtype_of(&world.types, &world.symbols, world.int(), meters));
    assert!(is_subtype_of(&world.types, &world.symbols, meters, world.int()));
    assert!(is_subtype_of_with_annotations(
        &world.types,
        &world.symbols,
        world.int(),
        meters,
        policy,
        NoopAnnotationChecker,
    ));

    let mut checker = SubtypeChecker::with_annotation_checker(world.env(), policy, &NoopAnnotationChecker);
    assert!(checker.is_same_type(meters, world.int()));
}

#[test]
fn test_higher_kinded_arguments() {
    let world = World::new();
    let env = world.env();
    let seq = world.generic("Seq", &[("A", Variance::Covariant)]);
    let list = world.generic("List", &[("A", Variance::Covariant)]);
    world.extend(list, &[world.apply(seq, &[world.param(list, 0)])]);
    let cell = world.generic("Cell", &[("A", Variance::Invariant)]);
    world.extend(cell, &[world.apply(seq, &[world.param(cell, 0)])]);
    let (seq_ctor, list_ctor, cell_ctor) = (
        env.class_type(seq, vec![]),
        env.class_type(list, vec![]),
        env.class_type(cell, vec![]),
    );

    // class Functor[F[+_]]
    let functor = world.generic("Functor", &[("F", Variance::Covariant)]);
    let f = world.symbols.type_params(functor)[0];
    let hole = world.symbols.new_type_param(f, "_", Variance::Covariant);
    world.symbols.set_type_params(f, vec![hole]);

    let mut checker = world.checker();
    assert!(checker.is_subtype(world.apply(functor, &[list_ctor]), world.apply(functor, &[seq_ctor])));
    assert!(!checker.is_subtype(world.apply(functor, &[seq_ctor]), world.apply(functor, &[list_ctor])));
    assert!(!checker.is_subtype(cell_ctor, world.any_ref()));
    assert!(!checker.is_subtype(cell_ctor, seq_ctor));

    let lenient = SubtypePolicy::default().with_check_hk_variance(false);
    let mut checker = world.checker_with(lenient);
    assert!(checker.is_subtype(cell_ctor, seq_ctor));
}

#[test]
fn test_raw_java_types_are_existentials() {
    let world = World::new();
    let jlist = world.symbols.new_class(world.pkg, "JList", SymbolFlags::JAVA);
    let e = world.symbols.new_type_param(jlist, "E", Variance::Invariant);
    world.symbols.set_type_params(jlist, vec![e]);
    world.extend(jlist, &[]);
    let env = world.env();
    let raw = env.class_type(jlist, vec![]);
    let of_string = world.apply(jlist, &[world.string()]);

    let mut checker = world.checker();
    assert!(checker.is_subtype(of_string, raw));
    assert!(checker.is_subtype(raw, world.any_ref()));
    assert!(!checker.is_subtype(raw, of_string));
}

#[test]
fn test_existential_bounds() {
    let world = World::new();
    let animal = world.class("Animal", &[]);
    let dog = world.class("Dog", &[animal]);
    let cell = world.generic("Cell", &[("A", Variance::Invariant)]);
    let some_animal_cell = world.exists(animal, |t| world.apply(cell, &[t]));

    let mut checker = world.checker();
    assert!(checker.is_subtype(world.apply(cell, &[dog]), some_animal_cell));
    assert!(checker.is_subtype(world.apply(cell, &[animal]), some_animal_cell));
    assert!(!checker.is_subtype(world.apply(cell, &[world.string()]), some_animal_cell));
    assert!(!checker.is_subtype(some_animal_cell, world.apply(cell, &[animal])));
    assert!(checker.is_subtype(some_animal_cell, world.any_ref()));
}

#[test]
fn test_same_type_through_aliases() {
    let world = World::new();
    let alias = world.symbols.new_alias_type(world.pkg, "Text");
    world.symbols.set_info(alias, world.string());
    let text = world.env().class_type(alias, vec![]);
    assert!(is_same_type_of(&world.types, &world.symbols, text, world.string()));
    assert!(!is_same_type_of(&world.types, &world.symbols, text, world.int()));
}

#[test]
fn test_formatter_renders_scenario_types() {
    let world = World::new();
    let cell = world.generic("Cell", &[("A", Variance::Invariant)]);
    let animal = world.class("Animal", &[]);
    let some_cell = world.exists(animal, |t| world.apply(cell, &[t]));
    let formatted = TypeFormatter::new(world.env()).format(some_cell);
    assert_eq!(formatted, "Cell[T] forSome { type T <: Animal }");
}

#[derive(Clone, Default)]
struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_query_events_reach_json_subscriber() {
    let world = World::new();
    let animal = world.class("Animal", &[]);
    let dog = world.class("Dog", &[animal]);

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        assert!(world.checker().is_subtype(dog, animal));
    });

    let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("tyrel::query_json"), "no query events in {output}");
    assert!(output.contains("\"phase\":\"start\""));
    assert!(output.contains("\"phase\":\"end\""));
}
