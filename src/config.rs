//! Configuration for the harness.
//!
//! Timing parameters can be given programmatically through
//! [`HarnessConfigBuilder`] or loaded from YAML/JSON files.
//!
//! # Configuration File Structure
//!
//! ```yaml
//! clock:
//!   period_ns: 100
//!
//! spi:
//!   half_period_ticks: 50
//!   settle_ticks: 600
//!
//! analyzer:
//!   timeout_ticks: 10000
//!
//! reset_cycles: 5
//! log_level: info
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::driver::ClockTiming;
use crate::types::{SimTime, Ticks};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// DUT clock parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockParams {
    /// DUT clock period in nanoseconds
    #[serde(default = "default_period_ns")]
    pub period_ns: SimTime,
}

fn default_period_ns() -> SimTime {
    100
}

impl Default for ClockParams {
    fn default() -> Self {
        Self {
            period_ns: default_period_ns(),
        }
    }
}

/// SPI driver parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiParams {
    /// SCLK half period in DUT ticks
    #[serde(default = "default_half_period_ticks")]
    pub half_period_ticks: Ticks,

    /// Ticks after deselect before the next action
    #[serde(default = "default_settle_ticks")]
    pub settle_ticks: Ticks,
}

fn default_half_period_ticks() -> Ticks {
    50
}

fn default_settle_ticks() -> Ticks {
    600
}

impl Default for SpiParams {
    fn default() -> Self {
        Self {
            half_period_ticks: default_half_period_ticks(),
            settle_ticks: default_settle_ticks(),
        }
    }
}

/// Edge analyzer parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerParams {
    /// Polling budget of a single edge wait
    #[serde(default = "default_timeout_ticks")]
    pub timeout_ticks: Ticks,
}

fn default_timeout_ticks() -> Ticks {
    10_000
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            timeout_ticks: default_timeout_ticks(),
        }
    }
}

fn default_reset_cycles() -> Ticks {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Complete harness configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub clock: ClockParams,

    #[serde(default)]
    pub spi: SpiParams,

    #[serde(default)]
    pub analyzer: AnalyzerParams,

    /// Ticks held in reset, and ticks waited after release
    #[serde(default = "default_reset_cycles")]
    pub reset_cycles: Ticks,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl HarnessConfig {
    /// Creates a configuration with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: HarnessConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: HarnessConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.clock.period_ns == 0 {
            return Err(ConfigError::Validation(
                "clock.period_ns must be non-zero".to_string(),
            ));
        }
        if self.spi.half_period_ticks == 0 {
            return Err(ConfigError::Validation(
                "spi.half_period_ticks must be non-zero".to_string(),
            ));
        }
        if self.reset_cycles == 0 {
            return Err(ConfigError::Validation(
                "reset_cycles must be non-zero".to_string(),
            ));
        }
        if self.analyzer.timeout_ticks < 2 * self.spi.half_period_ticks {
            tracing::warn!(
                "analyzer.timeout_ticks ({}) is shorter than one SCLK period; slow outputs will read as stuck",
                self.analyzer.timeout_ticks
            );
        }
        Ok(())
    }

    /// Driver timing derived from the clock and SPI sections.
    pub fn timing(&self) -> ClockTiming {
        ClockTiming {
            clock_period_ns: self.clock.period_ns,
            half_period_ticks: self.spi.half_period_ticks,
            settle_ticks: self.spi.settle_ticks,
        }
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            clock: ClockParams::default(),
            spi: SpiParams::default(),
            analyzer: AnalyzerParams::default(),
            reset_cycles: default_reset_cycles(),
            log_level: default_log_level(),
        }
    }
}

/// Builder for creating HarnessConfig programmatically.
#[derive(Default)]
pub struct HarnessConfigBuilder {
    config: HarnessConfig,
}

impl HarnessConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the DUT clock period.
    pub fn clock_period_ns(mut self, period: SimTime) -> Self {
        self.config.clock.period_ns = period;
        self
    }

    /// Sets the SCLK half period in DUT ticks.
    pub fn half_period_ticks(mut self, ticks: Ticks) -> Self {
        self.config.spi.half_period_ticks = ticks;
        self
    }

    /// Sets the post-transaction settle delay.
    pub fn settle_ticks(mut self, ticks: Ticks) -> Self {
        self.config.spi.settle_ticks = ticks;
        self
    }

    /// Sets the edge wait budget.
    pub fn timeout_ticks(mut self, ticks: Ticks) -> Self {
        self.config.analyzer.timeout_ticks = ticks;
        self
    }

    /// Sets the reset hold length.
    pub fn reset_cycles(mut self, ticks: Ticks) -> Self {
        self.config.reset_cycles = ticks;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<HarnessConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
