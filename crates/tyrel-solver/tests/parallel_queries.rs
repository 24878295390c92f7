//! Many checkers over one shared interner and symbol table.

mod support;

use rayon::prelude::*;
use support::World;
use tyrel_solver::{SubtypeChecker, TypeId, Variance};

/// With `sinks`, contravariant applications are included; their lubs build
/// fresh refinements, so they are left out where results are compared by id.
fn universe(world: &World, sinks: bool) -> Vec<TypeId> {
    let animal = world.class("Animal", &[]);
    let mammal = world.class("Mammal", &[animal]);
    let pet = world.trait_("Pet", &[]);
    let dog = world.class("Dog", &[mammal, pet]);
    let cat = world.class("Cat", &[mammal, pet]);
    let list = world.generic("List", &[("A", Variance::Covariant)]);
    let cell = world.generic("Cell", &[("A", Variance::Invariant)]);
    let sink = world.generic("Sink", &[("A", Variance::Contravariant)]);

    let mut types = vec![world.any(), world.any_ref(), world.nothing(), world.null(), world.string()];
    types.extend([animal, mammal, pet, dog, cat]);
    for base in [animal, dog, cat] {
        types.push(world.apply(list, &[base]));
        types.push(world.apply(cell, &[base]));
        if sinks {
            types.push(world.apply(sink, &[base]));
        }
    }
    types
}

fn pairs(types: &[TypeId]) -> Vec<(TypeId, TypeId)> {
    types
        .iter()
        .flat_map(|&a| types.iter().map(move |&b| (a, b)))
        .collect()
}

#[test]
fn test_parallel_results_match_sequential() {
    let world = World::new();
    let types = universe(&world, true);
    let pairs = pairs(&types);

    let mut checker = world.checker();
    let sequential: Vec<bool> = pairs.iter().map(|&(a, b)| checker.is_subtype(a, b)).collect();

    let parallel: Vec<bool> = pairs
        .par_iter()
        .map_init(|| world.checker(), |checker, &(a, b)| checker.is_subtype(a, b))
        .collect();
    assert_eq!(parallel, sequential);
}

#[test]
fn test_parallel_equivalence_and_lub() {
    let world = World::new();
    let types = universe(&world, false);
    let pairs = pairs(&types);

    let expected: Vec<(bool, TypeId)> = {
        let mut checker = world.checker();
        pairs
            .iter()
            .map(|&(a, b)| (checker.is_same_type(a, b), checker.lub(&[a, b])))
            .collect()
    };
    let actual: Vec<(bool, TypeId)> = pairs
        .par_iter()
        .map(|&(a, b)| {
            let mut checker = SubtypeChecker::new(world.env());
            (checker.is_same_type(a, b), checker.lub(&[a, b]))
        })
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_parallel_declarations_are_visible_everywhere() {
    let world = World::new();
    let animal = world.class("Animal", &[]);
    let breeds: Vec<TypeId> = (0..64)
        .into_par_iter()
        .map(|i| world.class(&format!("Breed{i}"), &[animal]))
        .collect();

    let mut checker = world.checker();
    for &breed in &breeds {
        assert!(checker.is_subtype(breed, animal));
    }
    assert!(!checker.is_subtype(breeds[0], breeds[1]));
}
