//! Error types for the driver and the analyzer.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::signal::EdgeDirection;
use crate::types::{BitIndex, SimTime, Ticks};

/// Errors surfaced by the driver, the analyzer and the harness.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// A frame field or bit index lies outside its domain.
    ///
    /// Raised before any signal is driven.
    #[error("Validation error: {0}")]
    Validation(String),

    /// No edge was seen within the polling budget.
    #[error("Timeout: {0}")]
    Timeout(EdgeTimeout),

    /// The DUT did not advance its clock when asked to.
    #[error("DUT clock stalled at {at_ns} ns")]
    ClockStalled {
        /// Simulation time reported before and after the failed advance
        at_ns: SimTime,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl HarnessError {
    /// Returns true for conditions a scenario is expected to branch on
    /// rather than abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, HarnessError::Timeout(_))
    }

    /// Returns the timeout details if this is an edge timeout.
    pub fn as_timeout(&self) -> Option<&EdgeTimeout> {
        match self {
            HarnessError::Timeout(t) => Some(t),
            _ => None,
        }
    }
}

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Diagnostic payload of an exhausted edge wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTimeout {
    /// The observed output bit
    pub bit: BitIndex,
    /// The edge that was awaited
    pub direction: EdgeDirection,
    /// Number of ticks polled
    pub budget_ticks: Ticks,
    /// Simulation time when the wait started
    pub started_ns: SimTime,
    /// Simulation time when the budget ran out
    pub expired_ns: SimTime,
}

impl fmt::Display for EdgeTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no {} edge on bit {} within {} ticks ({} ns -> {} ns)",
            self.direction, self.bit, self.budget_ticks, self.started_ns, self.expired_ns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_timeout() -> EdgeTimeout {
        EdgeTimeout {
            bit: 3,
            direction: EdgeDirection::Falling,
            budget_ticks: 10,
            started_ns: 100,
            expired_ns: 1_100,
        }
    }

    #[test]
    fn test_timeout_is_recoverable() {
        let err = HarnessError::Timeout(sample_timeout());
        assert!(err.is_recoverable());
        assert_eq!(err.as_timeout().map(|t| t.bit), Some(3));

        let err = HarnessError::Validation("address 128".into());
        assert!(!err.is_recoverable());
        assert!(err.as_timeout().is_none());
    }

    #[test]
    fn test_timeout_message() {
        let msg = HarnessError::Timeout(sample_timeout()).to_string();
        assert!(msg.contains("falling"));
        assert!(msg.contains("bit 3"));
        assert!(msg.contains("1100 ns"));
    }
}
