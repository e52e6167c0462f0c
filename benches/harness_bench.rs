//! Performance benchmarks for the spiprobe harness.
//!
//! Run with: `cargo bench`
//! Or for specific bench: `cargo bench --bench harness_bench`
//! Parallel survey: `cargo bench --bench harness_bench --features parallel`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use spiprobe::sim::{ModelDut, PwmPeripheral, SquareWave};
use spiprobe::{ClockTiming, Dut, EdgeAnalyzer, Harness, HarnessConfig, SpiDriver, SpiFrame};

fn pwm_harness(duty: u32) -> Harness<ModelDut<PwmPeripheral>> {
    let dut = ModelDut::new(PwmPeripheral::new(), 100);
    let mut harness = Harness::with_defaults(dut);
    harness.reset();
    for address in 0x00..=0x03 {
        harness.write_register(address, 0xFF).unwrap();
    }
    harness.write_register(0x04, duty).unwrap();
    harness
}

// ============================================================================
// Driver Benchmarks
// ============================================================================

fn bench_transaction(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction");

    for half_period in [1u64, 10, 50].iter() {
        let timing = ClockTiming::new(100, *half_period, 600).unwrap();
        group.throughput(Throughput::Elements(timing.transaction_ticks()));
        group.bench_with_input(
            BenchmarkId::new("half_period_ticks", half_period),
            &timing,
            |b, &timing| {
                let driver = SpiDriver::new(timing);
                let frame = SpiFrame::write(0x04, 0x80).unwrap();
                let mut dut = ModelDut::new(PwmPeripheral::new(), 100);

                b.iter(|| {
                    black_box(driver.execute(&mut dut, &frame).unwrap());
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Analyzer Benchmarks
// ============================================================================

fn bench_measure_square_wave(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure_square_wave");

    for period in [10u64, 1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*period));
        group.bench_with_input(BenchmarkId::new("period_ticks", period), period, |b, &period| {
            let analyzer = EdgeAnalyzer::new(2 * period);
            let mut dut = ModelDut::new(SquareWave::symmetric(period), 10);
            dut.advance_clock(1);

            b.iter(|| {
                black_box(analyzer.measure(&mut dut, 0).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_measure_pwm(c: &mut Criterion) {
    let mut group = c.benchmark_group("measure_pwm");

    for duty in [0x00u32, 0x80, 0xFF].iter() {
        group.bench_with_input(BenchmarkId::new("duty", duty), duty, |b, &duty| {
            let mut harness = pwm_harness(duty);
            b.iter(|| {
                black_box(harness.measure(0).unwrap());
            });
        });
    }

    group.finish();
}

// ============================================================================
// Survey Benchmarks
// ============================================================================

fn bench_survey(c: &mut Criterion) {
    let mut group = c.benchmark_group("survey");
    group.sample_size(20);

    group.bench_function("sequential", |b| {
        b.iter_batched(
            || pwm_harness(0x40),
            |mut harness| black_box(harness.survey(0..8).unwrap()),
            criterion::BatchSize::SmallInput,
        );
    });

    #[cfg(feature = "parallel")]
    group.bench_function("parallel", |b| {
        b.iter_batched(
            || pwm_harness(0x40),
            |mut harness| black_box(harness.survey_parallel(0..8).unwrap()),
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_config_parse(c: &mut Criterion) {
    let yaml = HarnessConfig::default().to_yaml().unwrap();
    c.bench_function("config_from_yaml", |b| {
        b.iter(|| black_box(HarnessConfig::from_yaml(&yaml).unwrap()));
    });
}

// ============================================================================
// Criterion Groups
// ============================================================================

criterion_group!(
    benches,
    bench_transaction,
    bench_measure_square_wave,
    bench_measure_pwm,
    bench_survey,
    bench_config_parse,
);

criterion_main!(benches);
