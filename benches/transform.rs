//! Benchmarks for field generation and the CPU particle transform.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tinsel::field::ParticleField;
use tinsel::noise::simplex3;
use tinsel::transform::{transform_into, RenderBuffers};
use tinsel::Vec3;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for count in [1_000u32, 5_000, 20_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(ParticleField::generate_seeded(count, 42)))
        });
    }
    group.finish();
}

fn bench_transform(c: &mut Criterion) {
    let field = ParticleField::generate_seeded(5_000, 42);
    let mut out = RenderBuffers::with_capacity(field.len());
    let mut group = c.benchmark_group("transform_5000");

    for factor in [0.0f32, 0.5, 1.0] {
        group.bench_with_input(BenchmarkId::from_parameter(factor), &factor, |b, &factor| {
            b.iter(|| transform_into(&field, black_box(factor), black_box(12.5), &mut out))
        });
    }
    group.finish();
}

fn bench_noise(c: &mut Criterion) {
    c.bench_function("simplex3", |b| {
        let p = Vec3::new(1.3, -0.7, 2.1);
        b.iter(|| black_box(simplex3(black_box(p))))
    });
}

criterion_group!(benches, bench_generate, bench_transform, bench_noise);
criterion_main!(benches);
