//! Recording of input-vector writes.
//!
//! [`RecordingDut`] sits between the driver and any DUT and logs each write
//! with its timestamp. The resulting [`WriteTrace`] can be compared between
//! runs, decoded back into frames, and checked for SPI mode 0 discipline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dut::Dut;
use crate::frame::{SpiFrame, FRAME_BITS};
use crate::signal::{SignalVector, SpiLines};
use crate::types::{SimTime, Ticks};

/// One input-vector write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalWrite {
    /// Simulation time at which the write was issued
    pub time_ns: SimTime,
    pub value: SignalVector,
}

/// A COPI change observed while SCLK was high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode0Violation {
    /// Index of the offending write in the trace
    pub index: usize,
    pub time_ns: SimTime,
}

/// An ordered list of input writes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteTrace {
    writes: Vec<SignalWrite>,
}

impl WriteTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time_ns: SimTime, value: SignalVector) {
        self.writes.push(SignalWrite { time_ns, value });
    }

    pub fn writes(&self) -> &[SignalWrite] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }

    /// Recovers the frames carried by the trace.
    ///
    /// COPI is sampled on each SCLK rising edge while nCS is low; a frame is
    /// emitted when nCS returns high after exactly 16 samples.
    pub fn decode_frames(&self) -> Vec<SpiFrame> {
        let mut frames = Vec::new();
        let mut prev = SpiLines::IDLE;
        let mut word: u16 = 0;
        let mut count = 0;

        for write in &self.writes {
            let lines = SpiLines::from_vector(write.value);
            if lines.selected() && !prev.selected() {
                word = 0;
                count = 0;
            }
            if lines.selected() && lines.sclk && !prev.sclk {
                word = (word << 1) | lines.copi as u16;
                count += 1;
            }
            if !lines.selected() && prev.selected() && count == FRAME_BITS {
                frames.push(SpiFrame::from_word(word));
            }
            prev = lines;
        }

        frames
    }

    /// Lists every write that changed COPI while SCLK stayed high.
    pub fn check_mode0(&self) -> Vec<Mode0Violation> {
        self.writes
            .windows(2)
            .enumerate()
            .filter_map(|(i, pair)| {
                let before = SpiLines::from_vector(pair[0].value);
                let after = SpiLines::from_vector(pair[1].value);
                let copi_moved = before.copi != after.copi;
                (copi_moved && before.sclk && after.sclk && after.selected()).then_some(
                    Mode0Violation {
                        index: i + 1,
                        time_ns: pair[1].time_ns,
                    },
                )
            })
            .collect()
    }

    /// Exports the trace as JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports the trace as CSV (`time_ns,value`).
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("time_ns,value\n");
        for write in &self.writes {
            csv.push_str(&format!("{},{}\n", write.time_ns, write.value));
        }
        csv
    }

    /// Exports the trace as a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }
}

/// A DUT wrapper that records input writes and counts ticks.
#[derive(Clone, Debug)]
pub struct RecordingDut<D> {
    inner: D,
    trace: WriteTrace,
    ticks: Ticks,
}

impl<D: Dut> RecordingDut<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            trace: WriteTrace::new(),
            ticks: 0,
        }
    }

    pub fn trace(&self) -> &WriteTrace {
        &self.trace
    }

    /// Ticks advanced through this wrapper.
    pub fn ticks(&self) -> Ticks {
        self.ticks
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    /// Returns the wrapped DUT and the recorded trace.
    pub fn into_parts(self) -> (D, WriteTrace) {
        (self.inner, self.trace)
    }
}

impl<D: Dut> Dut for RecordingDut<D> {
    fn advance_clock(&mut self, ticks: Ticks) {
        self.ticks += ticks;
        self.inner.advance_clock(ticks);
    }

    fn set_input_vector(&mut self, bits: SignalVector) {
        self.trace.push(self.inner.current_time_ns(), bits);
        self.inner.set_input_vector(bits);
    }

    fn get_output_vector(&self) -> SignalVector {
        self.inner.get_output_vector()
    }

    fn current_time_ns(&self) -> SimTime {
        self.inner.current_time_ns()
    }

    fn set_reset(&mut self, asserted: bool) {
        self.inner.set_reset(asserted);
    }

    fn set_enable(&mut self, enabled: bool) {
        self.inner.set_enable(enabled);
    }
}
