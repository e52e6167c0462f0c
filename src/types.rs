//! Core type definitions for the harness.
//!
//! This module defines the fundamental units shared by the driver, the
//! analyzer and the simulation models.

/// Simulation time in nanoseconds.
///
/// Every timestamp produced by a DUT and every edge event uses this unit,
/// so measurements can be compared directly against `1e9 / frequency`.
pub type SimTime = u64;

/// A count of DUT clock ticks.
///
/// Half periods, settle delays and timeout budgets are all expressed in
/// ticks of the DUT's own clock, never in wall time.
pub type Ticks = u64;

/// Index of a single line inside a signal vector.
pub type BitIndex = u8;
