//! Run-wide simulation parameters.
//!
//! A [`SimulationConfig`] is built once (defaults, or a TOML file), validated
//! when the harness is constructed and never mutated afterwards.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, Result};

/// What a wait loop does once its timeout threshold is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StallPolicy {
    /// Record a stall and keep waiting.
    #[default]
    Continue,
    /// Record a stall and fail the run with [`HarnessError::Stalled`].
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Time units per clock half-cycle.
    pub half_period: u32,
    pub timeout_cycles: u64,
    pub stall_policy: StallPolicy,
    /// Full cycles reset is held asserted.
    pub reset_cycles: u32,
    /// Full cycles after reset release before outputs are trusted.
    pub settle_cycles: u32,
    /// Bytes in the memory under test.
    pub memory_capacity: usize,
    pub lot_capacity: u32,
    /// Seed for the reference memory's initial fill.
    pub seed: u64,
    pub sweep_workers: usize,
    /// Verilator build products land here.
    pub artifact_dir: Utf8PathBuf,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            half_period: 5,
            timeout_cycles: 1024,
            stall_policy: StallPolicy::Continue,
            reset_cycles: 2,
            settle_cycles: 1,
            memory_capacity: 8,
            lot_capacity: 16,
            seed: 0,
            sweep_workers: 1,
            artifact_dir: Utf8PathBuf::from("artifacts"),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_stall_policy(mut self, policy: StallPolicy) -> Self {
        self.stall_policy = policy;
        self
    }

    pub fn with_timeout_cycles(mut self, cycles: u64) -> Self {
        self.timeout_cycles = cycles;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(HarnessError::InvalidConfig(msg)) };

        if self.half_period == 0 {
            return invalid("half_period must be at least 1".into());
        }
        if self.timeout_cycles == 0 {
            return invalid("timeout_cycles must be at least 1".into());
        }
        if self.reset_cycles < 2 {
            return invalid(format!(
                "reset_cycles must be at least 2, got {}",
                self.reset_cycles
            ));
        }
        if self.settle_cycles == 0 {
            return invalid("settle_cycles must be at least 1".into());
        }
        if !(2..=256).contains(&self.memory_capacity) || !self.memory_capacity.is_power_of_two() {
            return invalid(format!(
                "memory_capacity must be a power of two in 2..=256, got {}",
                self.memory_capacity
            ));
        }
        if !(1..=255).contains(&self.lot_capacity) {
            return invalid(format!(
                "lot_capacity must be in 1..=255, got {}",
                self.lot_capacity
            ));
        }
        if !(1..=256).contains(&self.sweep_workers) {
            return invalid(format!(
                "sweep_workers must be in 1..=256, got {}",
                self.sweep_workers
            ));
        }
        Ok(())
    }
}
