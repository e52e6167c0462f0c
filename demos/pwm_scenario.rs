//! PWM peripheral scenario.
//!
//! Runs three sessions against the in-process PWM peripheral model:
//! - Register writes through the SPI driver, including ignored frames
//! - PWM frequency on the first toggling output
//! - PWM duty cycle across several register values
//!
//! Usage: `cargo run --example pwm_scenario [config.yaml]`

use tracing::{info, warn};

use spiprobe::sim::{ModelDut, PwmPeripheral};
use spiprobe::{Dut, Harness, HarnessConfig, HarnessResult, Measurement};

type PwmHarness = Harness<ModelDut<PwmPeripheral>>;

// ============================================================================
// Scenarios
// ============================================================================

fn register_writes(harness: &mut PwmHarness) -> HarnessResult<()> {
    info!("Write transaction, address 0x00, data 0xF0");
    harness.write_register(0x00, 0xF0)?;
    let out = harness.dut().get_output_vector();
    info!("uo_out = {}", out);
    harness.idle(1_000);

    info!("Write transaction, address 0x01, data 0xCC");
    harness.write_register(0x01, 0xCC)?;
    harness.idle(100);

    info!("Write transaction, address 0x30 (unmapped), data 0xAA");
    harness.write_register(0x30, 0xAA)?;
    harness.idle(100);

    info!("Read transaction, address 0x30, data 0xBE");
    harness.transact(false, 0x30, 0xBE)?;
    info!("uo_out = {}", harness.dut().get_output_vector());
    harness.idle(100);

    info!("Write transaction, address 0x80 (out of range)");
    if let Err(e) = harness.write_register(0x80, 0x00) {
        warn!("Rejected: {}", e);
    }

    for duty in [0xCF, 0xFF, 0x00, 0x01] {
        info!("Write transaction, address 0x04, data 0x{:02X}", duty);
        harness.write_register(0x04, duty)?;
        harness.idle(30_000);
    }
    Ok(())
}

fn enable_all_outputs(harness: &mut PwmHarness) -> HarnessResult<()> {
    for address in 0x00..=0x03 {
        harness.write_register(address, 0xFF)?;
    }
    Ok(())
}

fn pwm_frequency(harness: &mut PwmHarness) -> HarnessResult<Option<f64>> {
    enable_all_outputs(harness)?;
    harness.write_register(0x04, 0x80)?;
    harness.idle(10_000);

    match harness.find_active_output(0..8)? {
        Some(m) => {
            let freq = m.frequency_hz();
            if let Some(timing) = m.timing() {
                info!("Bit {} frequency = {:.2} Hz", timing.bit, timing.frequency_hz);
            }
            Ok(freq)
        }
        None => {
            warn!("No output toggled");
            Ok(None)
        }
    }
}

fn pwm_duty(harness: &mut PwmHarness) -> HarnessResult<Vec<(u32, Option<f64>)>> {
    enable_all_outputs(harness)?;

    let mut results = Vec::new();
    for duty in [0x00, 0x40, 0x80, 0xFF] {
        harness.write_register(0x04, duty)?;
        let measured = match harness.measure(0)? {
            Measurement::Complete(m) => {
                info!("Duty 0x{:02X}: {:.1}% at {:.2} Hz", duty, m.duty_percent(), m.frequency_hz);
                Some(m.duty_cycle)
            }
            Measurement::Unavailable(u) => {
                info!("Duty 0x{:02X}: no full period ({})", duty, u.timeout());
                u.duty_cycle()
            }
        };
        results.push((duty, measured));
    }
    Ok(results)
}

// ============================================================================
// Main
// ============================================================================

fn new_harness(config: &HarnessConfig) -> HarnessResult<PwmHarness> {
    let dut = ModelDut::new(PwmPeripheral::new(), config.clock.period_ns);
    let mut harness = Harness::new(dut, config.clone())?;
    harness.reset();
    Ok(harness)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => HarnessConfig::from_file(path)?,
        None => HarnessConfig::default(),
    };
    spiprobe::init_logging(&config.log_level);

    info!("Start SPI test");
    let mut harness = new_harness(&config)?;
    register_writes(&mut harness)?;
    info!("SPI test completed");
    println!("{}", harness.stats());

    info!("Start PWM frequency test");
    let mut harness = new_harness(&config)?;
    let freq = pwm_frequency(&mut harness)?;

    info!("Start PWM duty test");
    let mut harness = new_harness(&config)?;
    let duties = pwm_duty(&mut harness)?;

    println!();
    println!("=== Results ===");
    match freq {
        Some(hz) => println!("PWM frequency: {:.2} Hz", hz),
        None => println!("PWM frequency: unavailable"),
    }
    for (duty, measured) in duties {
        match measured {
            Some(d) => println!("Duty 0x{:02X}: {:.1}%", duty, d * 100.0),
            None => println!("Duty 0x{:02X}: unavailable", duty),
        }
    }
    println!();
    println!("{}", harness.stats());

    Ok(())
}
