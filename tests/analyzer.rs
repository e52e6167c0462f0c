//! Integration tests for the edge/timing analyzer.
//!
//! All waveforms come from synthetic sources clocked by `ModelDut`, so the
//! expected timestamps are known exactly.

use spiprobe::sim::{Constant, ModelDut, SquareWave, StepSignal};
use spiprobe::{Dut, EdgeAnalyzer, EdgeDirection, HarnessError, Measurement, Pulse, Unavailable};

const CLOCK_NS: u64 = 100;

fn approx(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= expected.abs() * tolerance
}

// ============================================================================
// wait_for_edge
// ============================================================================

#[test]
fn test_zero_budget_always_times_out() {
    for initial in [Constant::high(), Constant::low()] {
        let mut dut = ModelDut::new(initial, CLOCK_NS);
        dut.advance_clock(3);
        for direction in [EdgeDirection::Rising, EdgeDirection::Falling] {
            let err = EdgeAnalyzer::new(0)
                .wait_for_edge(&mut dut, 0, direction)
                .unwrap_err();
            assert!(err.is_recoverable());
        }
        assert_eq!(dut.current_time_ns(), 300);
    }
}

#[test]
fn test_budget_against_known_flip() {
    const FLIP_AT: u64 = 25;

    for budget in [1, 10, 24] {
        let mut dut = ModelDut::new(StepSignal::rising_at(4, FLIP_AT), CLOCK_NS);
        let err = EdgeAnalyzer::new(budget)
            .wait_for_edge(&mut dut, 4, EdgeDirection::Rising)
            .unwrap_err();
        let timeout = err.as_timeout().unwrap();
        assert_eq!(timeout.budget_ticks, budget);
        assert_eq!(timeout.bit, 4);
        assert_eq!(timeout.direction, EdgeDirection::Rising);
        assert_eq!(timeout.expired_ns, budget * CLOCK_NS);
    }

    for budget in [25, 26, 1_000] {
        let mut dut = ModelDut::new(StepSignal::rising_at(4, FLIP_AT), CLOCK_NS);
        let edge = EdgeAnalyzer::new(budget)
            .wait_for_edge(&mut dut, 4, EdgeDirection::Rising)
            .unwrap();
        assert_eq!(edge.time_ns, FLIP_AT * CLOCK_NS);
        // The wait stops at the edge, not at the end of the budget
        assert_eq!(dut.current_time_ns(), FLIP_AT * CLOCK_NS);
    }
}

#[test]
fn test_falling_edge() {
    let mut dut = ModelDut::new(StepSignal::falling_at(1, 7), CLOCK_NS);
    let edge = EdgeAnalyzer::new(20)
        .wait_for_edge(&mut dut, 1, EdgeDirection::Falling)
        .unwrap();
    assert_eq!(edge.time_ns, 700);
    assert_eq!(edge.direction, EdgeDirection::Falling);
}

#[test]
fn test_timeout_reports_window() {
    let mut dut = ModelDut::new(Constant::low(), CLOCK_NS);
    dut.advance_clock(10);

    let err = EdgeAnalyzer::new(50)
        .wait_for_edge(&mut dut, 6, EdgeDirection::Rising)
        .unwrap_err();
    match err {
        HarnessError::Timeout(t) => {
            assert_eq!(t.started_ns, 1_000);
            assert_eq!(t.expired_ns, 6_000);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

// ============================================================================
// measure
// ============================================================================

#[test]
fn test_symmetric_wave_duty() {
    let mut dut = ModelDut::new(SquareWave::symmetric(200), CLOCK_NS);
    dut.advance_clock(1);
    let m = EdgeAnalyzer::new(1_000).measure(&mut dut, 0).unwrap();
    let timing = m.timing().expect("complete measurement");

    assert_eq!(timing.period_ns, 200 * CLOCK_NS);
    assert!(approx(timing.duty_cycle, 0.5, 0.01));
}

#[test]
fn test_frequency_independent_of_phase() {
    let period_ticks = 333;
    let expected_hz = 1e9 / (period_ticks * CLOCK_NS) as f64;

    for phase in [0, 1, 50, 110, 111, 200, 332] {
        let wave = SquareWave::new(period_ticks, 111).with_phase(phase).on_bit(3);
        let mut dut = ModelDut::new(wave, CLOCK_NS);
        // Let the output settle onto the waveform before measuring
        dut.advance_clock(1);

        let m = EdgeAnalyzer::new(1_000).measure(&mut dut, 3).unwrap();
        let timing = m.timing().unwrap_or_else(|| panic!("phase {}: {:?}", phase, m));
        assert!(
            approx(timing.frequency_hz, expected_hz, 0.001),
            "phase {}: {} Hz",
            phase,
            timing.frequency_hz
        );
        assert_eq!(timing.high_time_ns, 111 * CLOCK_NS, "phase {}", phase);
    }
}

#[test]
fn test_always_high_is_full_duty() {
    let mut dut = ModelDut::new(Constant::high(), CLOCK_NS);
    let m = EdgeAnalyzer::new(500).measure(&mut dut, 0).unwrap();

    match m {
        Measurement::Unavailable(Unavailable::StuckHigh(t)) => {
            assert_eq!(t.direction, EdgeDirection::Falling);
        }
        other => panic!("expected stuck high, got {:?}", other),
    }
    assert_eq!(m.duty_cycle(), Some(1.0));
    assert_eq!(m.frequency_hz(), None);
}

#[test]
fn test_always_low_is_zero_duty() {
    let mut dut = ModelDut::new(Constant::low(), CLOCK_NS);
    let m = EdgeAnalyzer::new(500).measure(&mut dut, 0).unwrap();

    match m {
        Measurement::Unavailable(Unavailable::StuckLow(t)) => {
            assert_eq!(t.direction, EdgeDirection::Rising);
            // Only the first wait ran
            assert_eq!(t.started_ns, 0);
            assert_eq!(dut.current_time_ns(), 500 * CLOCK_NS);
        }
        other => panic!("expected stuck low, got {:?}", other),
    }
    assert_eq!(m.duty_cycle(), Some(0.0));
}

#[test]
fn test_budget_shorter_than_period_reports_stuck() {
    // Healthy but slow: the low phase outlasts the budget
    let mut dut = ModelDut::new(SquareWave::new(1_000, 100).with_phase(200), CLOCK_NS);
    let m = EdgeAnalyzer::new(300).measure(&mut dut, 0).unwrap();
    assert!(matches!(m, Measurement::Unavailable(Unavailable::StuckLow(_))));

    let mut dut = ModelDut::new(SquareWave::new(1_000, 100).with_phase(200), CLOCK_NS);
    let m = EdgeAnalyzer::new(1_000).measure(&mut dut, 0).unwrap();
    assert!(m.is_complete());
}

#[test]
fn test_invalid_bit_is_validation_error() {
    let mut dut = ModelDut::new(Constant::high(), CLOCK_NS);
    let err = EdgeAnalyzer::new(10).measure(&mut dut, 9).unwrap_err();
    assert!(matches!(err, HarnessError::Validation(_)));
    assert_eq!(dut.current_time_ns(), 0);
}

#[test]
fn test_pulse_width() {
    let mut dut = ModelDut::new(SquareWave::new(50, 20).with_phase(30), CLOCK_NS);
    let pulse = EdgeAnalyzer::new(100).measure_pulse(&mut dut, 0).unwrap();
    assert_eq!(pulse, Pulse::Width(20 * CLOCK_NS));
}
