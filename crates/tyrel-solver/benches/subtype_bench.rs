//! Subtype Query Benchmark
//!
//! Measures the relation queries on shapes that stress different parts of
//! the engine: long nominal chains (base-type lookup), nested variant
//! arguments, expansive inheritance (the pending-pair guard) and lubs.

#[path = "../tests/support/mod.rs"]
mod support;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use support::World;
use tyrel_solver::{TypeId, Variance};

/// `C0 <: C1 <: ... <: Cn`; returns the chain bottom-up.
fn chain(world: &World, len: usize) -> Vec<TypeId> {
    let mut chain = Vec::with_capacity(len);
    let mut parent = world.class("C0", &[]);
    chain.push(parent);
    for i in 1..len {
        parent = world.class(&format!("C{i}"), &[parent]);
        chain.push(parent);
    }
    chain.reverse();
    chain
}

fn bench_nominal_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("nominal_chain");
    for len in [8, 64, 256] {
        let world = World::new();
        let chain = chain(&world, len);
        let (bottom, top) = (chain[0], chain[len - 1]);
        group.bench_with_input(BenchmarkId::new("bottom_to_top", len), &len, |b, _| {
            b.iter(|| {
                let mut checker = world.checker();
                black_box(checker.is_subtype(bottom, top))
            })
        });
        group.bench_with_input(BenchmarkId::new("rejected", len), &len, |b, _| {
            b.iter(|| {
                let mut checker = world.checker();
                black_box(checker.is_subtype(top, bottom))
            })
        });
    }
    group.finish();
}

fn bench_variant_arguments(c: &mut Criterion) {
    let mut group = c.benchmark_group("variant_arguments");
    let world = World::new();
    let chain = chain(&world, 16);
    let list = world.generic("List", &[("A", Variance::Covariant)]);
    let sink = world.generic("Sink", &[("A", Variance::Contravariant)]);
    for nesting in [1, 4, 16] {
        let mut lhs = chain[0];
        let mut rhs = chain[15];
        for level in 0..nesting {
            let wrapper = if level % 2 == 0 { list } else { sink };
            let (l, r) = if level % 2 == 0 { (lhs, rhs) } else { (rhs, lhs) };
            lhs = world.apply(wrapper, &[l]);
            rhs = world.apply(wrapper, &[r]);
        }
        group.bench_with_input(BenchmarkId::new("nested", nesting), &nesting, |b, _| {
            b.iter(|| {
                let mut checker = world.checker();
                black_box(checker.is_subtype(lhs, rhs))
            })
        });
    }
    group.finish();
}

fn bench_expansive_inheritance(c: &mut Criterion) {
    // class N[-Z]; class C extends N[N[C]]
    let world = World::new();
    let n = world.generic("N", &[("Z", Variance::Contravariant)]);
    let class = world.class("C", &[]);
    world.extend(world.sym_of(class), &[world.apply(n, &[world.apply(n, &[class])])]);
    let target = world.apply(n, &[class]);

    c.bench_function("expansive_inheritance", |b| {
        b.iter(|| {
            let mut checker = world.checker();
            black_box(checker.is_subtype(class, target))
        })
    });
}

fn bench_lub(c: &mut Criterion) {
    let mut group = c.benchmark_group("lub");
    let world = World::new();
    let root = world.class("Root", &[]);
    let list = world.generic("List", &[("A", Variance::Covariant)]);
    for width in [2, 8, 32] {
        let leaves: Vec<TypeId> = (0..width)
            .map(|i| {
                let leaf = world.class(&format!("Leaf{width}_{i}"), &[root]);
                world.apply(list, &[leaf])
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("siblings", width), &leaves, |b, leaves| {
            b.iter(|| {
                let mut checker = world.checker();
                black_box(checker.lub(leaves))
            })
        });
    }
    group.finish();
}

criterion_group!(
    subtype_benches,
    bench_nominal_chain,
    bench_variant_arguments,
    bench_expansive_inheritance,
    bench_lub
);
criterion_main!(subtype_benches);
