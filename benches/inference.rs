//! Benchmarks for IT2 inference operations

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use it2fls::{BatchConfig, FlsConfig, IntervalMembership, Panel, Shape, TypeReduction, Universe};

fn panel(sbp: f64) -> Panel {
    [("SBP", sbp), ("HR", 70.0), ("SPO2", 96.0), ("Temp", 37.5), ("BS", 90.0)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect::<HashMap<_, _>>()
}

fn engine_build_benchmark(c: &mut Criterion) {
    let config = FlsConfig::mews().unwrap();
    c.bench_function("build_mews_engine", |b| {
        b.iter(|| black_box(config.build_engine().unwrap()))
    });
}

fn sampling_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_footprint");
    let shape = Shape::trapezoid(95.0, 100.0, 180.0, 185.0).unwrap();
    let membership = IntervalMembership::shifted(shape, 2.0).unwrap();

    for step in [1.0, 0.1, 0.01] {
        let universe = Universe::new(0.0, 200.0, step).unwrap();
        group.bench_with_input(BenchmarkId::new("trapezoid", universe.len()), &universe, |b, u| {
            b.iter(|| black_box(membership.sample("Normal", u).unwrap()))
        });
    }

    group.finish();
}

fn infer_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer");
    let engine = FlsConfig::mews_engine().unwrap();

    for (name, sbp) in [("normal", 110.0), ("hypotensive", 50.0), ("borderline", 84.0)] {
        let input = panel(sbp);
        group.bench_with_input(BenchmarkId::new("centroid_of_bounds", name), &input, |b, p| {
            b.iter(|| black_box(engine.infer(p).unwrap()))
        });
    }

    let mean = engine.clone().with_type_reduction(TypeReduction::MeanOfMeans);
    let input = panel(84.0);
    group.bench_with_input(BenchmarkId::new("mean_of_means", "borderline"), &input, |b, p| {
        b.iter(|| black_box(mean.infer(p).unwrap()))
    });

    group.finish();
}

fn batch_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("infer_batch");
    let engine = FlsConfig::mews_engine().unwrap();
    let panels: Vec<Panel> = (0..1000).map(|i| panel(50.0 + (i % 150) as f64)).collect();

    group.bench_function("sequential", |b| {
        let config = BatchConfig::default().sequential();
        b.iter(|| black_box(engine.infer_batch(&panels, &config)))
    });

    group.bench_function("parallel", |b| {
        let config = BatchConfig::default();
        b.iter(|| black_box(engine.infer_batch(&panels, &config)))
    });

    group.finish();
}

criterion_group!(
    benches,
    engine_build_benchmark,
    sampling_benchmark,
    infer_benchmark,
    batch_benchmark,
);
criterion_main!(benches);
