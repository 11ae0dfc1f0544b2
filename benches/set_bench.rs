//! Benchmarks for parameter updates
//!
//! Measures the cost of a `set` call, from a single derived value up to
//! redesigning a pulse-shaping filter.
//!
//! Run with: cargo bench --bench set_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use txchain::config::ConfigRecord;
use txchain::flowgraphs::Transmitter;
use txchain::sink::SinkRecorder;

fn psk_config() -> ConfigRecord {
    ConfigRecord::new()
        .with("centerFreq", 915.0)
        .with("rfPwr", -60.0)
        .with("bitsPerSym", 2)
        .with("symRate", 100.0)
}

fn bench_center_freq(c: &mut Criterion) {
    let mut params = Transmitter::AmSine
        .initialize(
            &ConfigRecord::new()
                .with("centerFreq", 100.0)
                .with("rfPwr", -60.0),
        )
        .unwrap();
    let mut freq = 100.0;

    c.bench_function("set_center_freq", |b| {
        b.iter(|| {
            freq = if freq > 2000.0 { 100.0 } else { freq + 1.0 };
            black_box(params.set("centerFreq", freq).unwrap());
        })
    });
}

fn bench_symbol_rate(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_symbol_rate");

    // Lower rates mean more samples per symbol and longer RRC filters
    for &(low, high) in &[(250.0, 500.0), (50.0, 100.0), (5.0, 10.0)] {
        let mut params = Transmitter::Psk.initialize(&psk_config()).unwrap();
        let recorder = SinkRecorder::new();
        params
            .bind("filter_fft_rrc_filter_0.set_taps", recorder.sink("taps"))
            .unwrap();
        let mut toggle = false;

        group.bench_with_input(BenchmarkId::from_parameter(low), &(low, high), |b, &(low, high)| {
            b.iter(|| {
                toggle = !toggle;
                let rate = if toggle { low } else { high };
                black_box(params.set("symRate", rate).unwrap());
                recorder.clear();
            })
        });
    }

    group.finish();
}

fn bench_initialize(c: &mut Criterion) {
    let config = psk_config();
    c.bench_function("initialize_psk", |b| {
        b.iter(|| black_box(Transmitter::Psk.initialize(&config).unwrap()))
    });
}

criterion_group!(benches, bench_center_freq, bench_symbol_rate, bench_initialize);
criterion_main!(benches);
