use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quandary::examples::n_queens::build_n_queens;
use quandary::examples::map_colouring::build_australia_problem;

fn n_queens_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("N-Queens");
    for n in [6, 8].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let problem = build_n_queens(n).unwrap();
            b.iter(|| {
                black_box(&problem).solve().unwrap();
            });
        });
    }
    group.finish();
}

fn map_colouring_benchmark(c: &mut Criterion) {
    c.bench_function("Australia enumeration", |b| {
        let problem = build_australia_problem().unwrap();
        b.iter(|| black_box(&problem).count_solutions());
    });
}

criterion_group!(benches, n_queens_benchmark, map_colouring_benchmark);
criterion_main!(benches);
