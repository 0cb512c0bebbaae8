use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use probe_pool::{
    config::PoolConfig,
    model::Target,
    pool::Pool,
    probe::probe_fn,
    result::ProbeSuccess,
    sink::LineReporter,
    source::TaskSource,
};
use std::hint::black_box;
use tokio::time::Duration;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .enable_all()
        .build()
        .unwrap()
}

async fn run_instant(workers: usize, targets: u16, buffer: usize) -> usize {
    let pool = Pool::new(
        PoolConfig::new(workers, Duration::from_secs(1))
            .with_queue_capacity(workers * 4)
            .with_result_buffer(buffer),
    )
    .unwrap();
    let probe = probe_fn(|t: Target, _d| async move {
        black_box(t);
        Ok(ProbeSuccess::reachable())
    });
    let summary = pool
        .run(TaskSource::tcp_ports("10.0.0.1", 1..=targets), probe)
        .unwrap()
        .drain(LineReporter::default())
        .await;
    summary.tally.up
}

// Benchmark 1: dispatch overhead per target
fn bench_dispatch_overhead(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_overhead");

    for size in [100u16, 1000, 10000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("targets", size), &size, |b, &size| {
            let rt = create_runtime();
            b.to_async(&rt)
                .iter(|| async move { black_box(run_instant(16, size, 64).await) });
        });
    }

    group.finish();
}

// Benchmark 2: worker count scaling
fn bench_worker_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("worker_scaling");
    group.sample_size(20);

    let targets = 5000u16;
    group.throughput(Throughput::Elements(targets as u64));

    for workers in [1usize, 4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            let rt = create_runtime();
            b.to_async(&rt)
                .iter(|| async move { black_box(run_instant(workers, targets, 256).await) });
        });
    }

    group.finish();
}

// Benchmark 3: result buffer size under a fixed pool
fn bench_result_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("result_buffer");
    group.sample_size(20);

    for buffer in [0usize, 16, 1024] {
        group.bench_with_input(BenchmarkId::new("buffer", buffer), &buffer, |b, &buffer| {
            let rt = create_runtime();
            b.to_async(&rt)
                .iter(|| async move { black_box(run_instant(16, 5000, buffer).await) });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_dispatch_overhead,
    bench_worker_scaling,
    bench_result_buffer,
);
criterion_main!(benches);
