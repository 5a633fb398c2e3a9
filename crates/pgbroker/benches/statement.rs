use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgbroker::{
    ConstraintFactory, ProfileRegistry, Statement, TableProfile, ValueMap, ValueMapFactory,
};

/// Registry with one entity whose table carries `id` plus `n` data columns.
fn registry(n: usize) -> Arc<ProfileRegistry> {
    let columns = std::iter::once(("id".to_string(), "id".to_string()))
        .chain((0..n).map(|i| (format!("prop{i}"), format!("col{i}"))));
    let profile = TableProfile::new("Bench", "bench", columns).unwrap();
    let mut registry = ProfileRegistry::new();
    registry.insert(profile).unwrap();
    Arc::new(registry)
}

/// Mapping with `n` bound data properties:
/// INSERT INTO bench (col0, col1, ...) VALUES (:valT_col0, :valT_col1, ...)
fn bound_values(maps: &ValueMapFactory, n: usize) -> ValueMap {
    let mut map = maps.build("Bench").unwrap();
    for i in 0..n {
        map.add_property(&format!("prop{i}"), i as i64).unwrap();
    }
    map
}

fn bench_render_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/render_insert");

    for n in [1, 5, 10, 50] {
        let maps = ValueMapFactory::new(registry(n));
        let statement = Statement::insert()
            .set_values(bound_values(&maps, n))
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &statement, |b, stmt| {
            b.iter(|| black_box(stmt.to_sql().unwrap()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/build_and_render");

    for n in [1, 5, 10, 50] {
        let maps = ValueMapFactory::new(registry(n));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let constraint = ConstraintFactory::new(maps.clone(), "Bench")
                    .equals("id", 1i64)
                    .unwrap();
                let statement = Statement::update()
                    .set_values(bound_values(&maps, n))
                    .unwrap()
                    .set_constraints(constraint)
                    .unwrap();
                black_box(statement.to_sql().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_bind_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/bind_values");

    for n in [1, 5, 10, 50] {
        let maps = ValueMapFactory::new(registry(n));
        let constraint = ConstraintFactory::new(maps.clone(), "Bench")
            .equals("id", 1i64)
            .unwrap();
        let statement = Statement::update()
            .set_values(bound_values(&maps, n))
            .unwrap()
            .set_constraints(constraint)
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &statement, |b, stmt| {
            b.iter(|| black_box(stmt.bind_values().unwrap()));
        });
    }

    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/merge");

    for n in [5, 20, 100] {
        let maps = ValueMapFactory::new(registry(n));
        let left = bound_values(&maps, n);
        let right = bound_values(&maps, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(left, right), |b, maps| {
            let (left, right) = maps;
            b.iter(|| black_box(left.merge(right).unwrap()));
        });
    }

    group.finish();
}

fn bench_to_positional(c: &mut Criterion) {
    let mut group = c.benchmark_group("statement/to_positional");

    for n in [1, 5, 10, 50] {
        let maps = ValueMapFactory::new(registry(n));
        let statement = Statement::insert()
            .set_values(bound_values(&maps, n))
            .unwrap();
        let sql = statement.to_sql().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &sql, |b, sql| {
            b.iter(|| black_box(pgbroker::postgres::to_positional(sql)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_render_insert,
    bench_build_and_render,
    bench_bind_values,
    bench_merge,
    bench_to_positional
);
criterion_main!(benches);
