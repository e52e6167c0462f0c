//! Integration tests for the SPI transaction driver.
//!
//! These tests verify:
//! - Transaction length and final idle state
//! - Deterministic write traces
//! - Validation at the domain boundaries
//! - Wire format as seen by a receiving peripheral

use spiprobe::sim::{Constant, ModelDut, PwmPeripheral};
use spiprobe::trace::RecordingDut;
use spiprobe::{ClockTiming, Dut, HarnessError, SignalVector, SpiDriver, SpiFrame, SpiLines};

fn recording_dut(period_ns: u64) -> RecordingDut<ModelDut<PwmPeripheral>> {
    RecordingDut::new(ModelDut::new(PwmPeripheral::new(), period_ns))
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn test_default_transaction_length() {
    let driver = SpiDriver::new(ClockTiming::default());
    let mut dut = recording_dut(100);

    let idle = driver.send(&mut dut, true, 0x00, 0xF0).unwrap();

    assert_eq!(idle, SpiLines::IDLE.to_vector());
    assert_eq!(idle.to_string(), "00000100");
    assert_eq!(dut.ticks(), 2_201);
    assert_eq!(dut.current_time_ns(), 220_100);
}

#[test]
fn test_bit_cells_last_one_sclk_period() {
    let timing = ClockTiming::new(100, 50, 600).unwrap();
    let driver = SpiDriver::new(timing);
    let mut dut = recording_dut(100);
    driver.send(&mut dut, true, 0x2A, 0x55).unwrap();

    let writes = dut.trace().writes();
    // 32 half cells followed by the deselect write
    for pair in writes[1..34].windows(2) {
        assert_eq!(pair[1].time_ns - pair[0].time_ns, 5_000);
    }
}

#[test]
fn test_settle_is_configurable() {
    let mut dut = recording_dut(100);
    SpiDriver::new(ClockTiming::new(100, 50, 0).unwrap())
        .send(&mut dut, true, 1, 1)
        .unwrap();
    assert_eq!(dut.ticks(), 1_601);

    let mut dut = recording_dut(100);
    SpiDriver::new(ClockTiming::new(100, 50, 30_000).unwrap())
        .send(&mut dut, true, 1, 1)
        .unwrap();
    assert_eq!(dut.ticks(), 31_601);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_identical_inputs_identical_trace() {
    let driver = SpiDriver::new(ClockTiming::new(10, 3, 7).unwrap());

    let run = |rw: bool, addr: u32, data: u32| {
        let mut dut = RecordingDut::new(ModelDut::new(Constant::low(), 10));
        driver.send(&mut dut, rw, addr, data).unwrap();
        dut.into_parts().1
    };

    assert_eq!(run(true, 0x04, 0xCF), run(true, 0x04, 0xCF));
    assert_eq!(run(false, 0x41, 0xEF), run(false, 0x41, 0xEF));
    assert_ne!(run(true, 0x04, 0xCF), run(true, 0x04, 0xCE));
}

#[test]
fn test_trace_obeys_mode0() {
    let driver = SpiDriver::new(ClockTiming::new(10, 2, 4).unwrap());
    let mut dut = recording_dut(10);
    for (addr, data) in [(0x00, 0xFF), (0x7F, 0x00), (0x55, 0xAA)] {
        driver.send(&mut dut, true, addr, data).unwrap();
    }

    assert!(dut.trace().check_mode0().is_empty());
    for write in dut.trace().writes() {
        assert_eq!(write.value.bits() & 0b1111_1000, 0, "unused lines must stay low");
    }
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validation_boundary() {
    let driver = SpiDriver::new(ClockTiming::new(10, 1, 0).unwrap());
    let mut dut = recording_dut(10);

    assert!(matches!(
        driver.send(&mut dut, true, 128, 0),
        Err(HarnessError::Validation(_))
    ));
    assert!(matches!(
        driver.send(&mut dut, true, 0, 256),
        Err(HarnessError::Validation(_))
    ));
    assert!(dut.trace().is_empty());
    assert_eq!(dut.ticks(), 0);

    assert!(driver.send(&mut dut, true, 127, 255).is_ok());
    assert!(!dut.trace().is_empty());
}

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn test_peripheral_receives_frames() {
    let driver = SpiDriver::new(ClockTiming::default());
    let mut dut = recording_dut(100);

    let frames = [
        SpiFrame::write(0x00, 0xF0).unwrap(),
        SpiFrame::write(0x01, 0xCC).unwrap(),
        SpiFrame::read(0x30, 0xBE).unwrap(),
    ];
    for frame in &frames {
        driver.execute(&mut dut, frame).unwrap();
    }

    assert_eq!(dut.inner().model().received(), &frames);
    assert_eq!(dut.trace().decode_frames(), frames.to_vec());

    let model = dut.inner().model();
    assert_eq!(model.register(0x00), Some(0xF0));
    assert_eq!(model.register(0x01), Some(0xCC));
    assert_eq!(dut.get_output_vector(), SignalVector::new(0xF0));
}

#[test]
fn test_fast_sclk_still_decodes() {
    // One tick per half period is the fastest legal SCLK
    let driver = SpiDriver::new(ClockTiming::new(100, 1, 2).unwrap());
    let mut dut = recording_dut(100);
    driver.send(&mut dut, true, 0x04, 0x80).unwrap();

    assert_eq!(dut.inner().model().register(0x04), Some(0x80));
    assert_eq!(dut.inner().model().dropped_frames(), 0);
}
