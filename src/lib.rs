//! # spiprobe
//!
//! A tick-synchronous verification harness for register-mapped peripherals
//! controlled over an SPI-style interface and driving PWM-style outputs.
//!
//! ## Design Principles
//!
//! - **Simulated time only**: every wait is an explicit poll of the DUT's
//!   `advance_clock(1)`; nothing sleeps and nothing blocks.
//! - **Cooperative**: the driver and the analyzer borrow the DUT mutably in
//!   turn, so no two components observe a half-updated signal vector.
//! - **Bounded**: each edge wait carries a tick budget. Running out of
//!   budget is an expected outcome that identifies 0% and 100% duty cycles.
//!
//! ## Features
//!
//! - `parallel` - Enable per-bit parallel surveys using rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use spiprobe::sim::{ModelDut, PwmPeripheral};
//! use spiprobe::{Harness, HarnessConfig};
//!
//! let dut = ModelDut::new(PwmPeripheral::new(), 100);
//! let mut harness = Harness::new(dut, HarnessConfig::default()).unwrap();
//!
//! harness.reset();
//! harness.write_register(0x00, 0xF0).unwrap();
//! assert_eq!(harness.dut().model().register(0x00), Some(0xF0));
//! ```
//!
//! ## Measuring a PWM Output
//!
//! ```rust,ignore
//! match harness.measure(0)? {
//!     Measurement::Complete(m) => println!("{:.1} Hz, {:.1}%", m.frequency_hz, m.duty_percent()),
//!     Measurement::Unavailable(u) => println!("stuck, duty {:?}", u.duty_cycle()),
//! }
//! ```

pub mod types;
pub mod error;
pub mod signal;
pub mod dut;
pub mod frame;
pub mod driver;
pub mod analyzer;
pub mod harness;
pub mod config;
pub mod stats;
pub mod trace;
pub mod sim;

// Re-export commonly used types
pub use types::{BitIndex, SimTime, Ticks};
pub use error::{EdgeTimeout, HarnessError, HarnessResult};
pub use signal::{EdgeDirection, SignalVector, SpiLines};
pub use dut::Dut;
pub use frame::SpiFrame;
pub use driver::{ClockTiming, SpiDriver};
pub use analyzer::{EdgeAnalyzer, EdgeEvent, Measurement, Pulse, TimingMeasurement, Unavailable};
pub use harness::Harness;
pub use config::{ConfigError, HarnessConfig, HarnessConfigBuilder};
pub use stats::HarnessStats;
pub use trace::{RecordingDut, SignalWrite, WriteTrace};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// takes precedence over `level`.
///
/// # Example
///
/// ```rust,ignore
/// spiprobe::init_logging("info");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
