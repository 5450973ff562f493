use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration,
};
use rand::Rng;

use traffic_predictor::flow_analyzer::{classify, StatusThresholds};

/// Random (flow, occupancy) pairs spread across every status band.
fn generate_readings(batch_size: usize) -> Vec<(f64, f64)> {
    let mut rng = rand::rng();
    (0..batch_size)
        .map(|_| (rng.random_range(0.0..600.0), rng.random_range(0.0..40.0)))
        .collect()
}

fn bench_status_classifier(c: &mut Criterion) {
    let batch_sizes = [100, 1_000, 10_000];
    let tuned = StatusThresholds {
        free_flow_max_occupancy: 6.0,
        congested_max_occupancy: 18.0,
        gridlock_max_flow: 80.0,
        gridlock_min_occupancy: 25.0,
    };

    let mut group = c.benchmark_group("Status_Classifier_Benchmarks");
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Logarithmic));

    for &batch in batch_sizes.iter() {
        let readings = generate_readings(batch);

        group.bench_with_input(BenchmarkId::new("classify_default", batch), &batch, |b, &_batch| {
            b.iter(|| {
                for &(flow, occupancy) in &readings {
                    black_box(classify(black_box(flow), black_box(occupancy)));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("classify_tuned", batch), &batch, |b, &_batch| {
            b.iter(|| {
                for &(flow, occupancy) in &readings {
                    black_box(tuned.classify(black_box(flow), black_box(occupancy)));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_status_classifier);
criterion_main!(benches);
