//! Inference benchmark: isolation forest fit + score over a synthetic feature matrix.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use wallet_risk::config::ModelConfig;
use wallet_risk::model::{AnomalyDetector, IsolationForest};

fn matrix(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| ((i * 31 + j * 17) % 97) as f64 / 7.0)
}

fn bench_fit_score(c: &mut Criterion) {
    let x = matrix(1_000, 23);
    let config = ModelConfig::default();

    c.bench_function("iforest_fit_1000x23", |b| {
        b.iter(|| {
            let mut f = IsolationForest::new(&config);
            f.fit(black_box(x.view())).unwrap();
            black_box(f)
        })
    });

    let mut fitted = IsolationForest::new(&config);
    fitted.fit(x.view()).unwrap();
    c.bench_function("iforest_score_1000x23", |b| {
        b.iter(|| black_box(fitted.score_samples(black_box(x.view())).unwrap()))
    });
}

fn bench_by_rows(c: &mut Criterion) {
    let config = ModelConfig::default();
    let mut g = c.benchmark_group("iforest_fit_score_by_rows");
    for n in [100, 1_000, 10_000] {
        let x = matrix(n, 23);
        g.bench_function(format!("rows_{}", n).as_str(), |b| {
            b.iter(|| {
                let mut f = IsolationForest::new(&config);
                f.fit(x.view()).unwrap();
                black_box(f.score_samples(x.view()).unwrap())
            })
        });
    }
    g.finish();
}

criterion_group!(benches, bench_fit_score, bench_by_rows);
criterion_main!(benches);
