use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use shapley_attribution::prelude::*;

fn create_feature_data(n_rows: usize, n_features: usize) -> DataFrame {
    let mut columns: Vec<Column> = (0..n_features)
        .map(|i| {
            let values: Vec<f64> = (0..n_rows)
                .map(|r| ((r * 31 + i * 17) as f64 * 0.37).sin() * 10.0)
                .collect();
            Column::new(format!("feature_{}", i).into(), values)
        })
        .collect();

    columns.push(Column::new("target".into(), vec![0.0; n_rows]));

    DataFrame::new(columns).unwrap()
}

fn bench_linear(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear");
    group.sample_size(10);

    for n_features in [4, 8, 12].iter() {
        let df = create_feature_data(500, *n_features);
        let coefficients: Vec<f64> = (0..*n_features).map(|i| i as f64 - 2.5).collect();
        let model = LinearScorer::new(coefficients, 1.0);

        group.bench_with_input(BenchmarkId::new("features", n_features), &df, |b, df| {
            b.iter(|| compute_attribution(black_box(df), "target", &model).unwrap())
        });
    }

    group.finish();
}

fn bench_threads(c: &mut Criterion) {
    let mut group = c.benchmark_group("threads");
    group.sample_size(10);

    let df = create_feature_data(2000, 10);
    let model = |x: &Array2<f64>| -> shapley_attribution::Result<Array1<f64>> {
        Ok(x.map_axis(Axis(1), |row| row.iter().map(|v| v.tanh()).sum::<f64>()))
    };

    for n_threads in [1, 2, 4].iter() {
        let config = AttributionConfig::new().with_n_threads(*n_threads);
        group.bench_with_input(BenchmarkId::new("n_threads", n_threads), &config, |b, config| {
            b.iter(|| {
                compute_attribution_with_config(black_box(&df), "target", &model, config.clone())
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_linear, bench_threads);
criterion_main!(benches);
