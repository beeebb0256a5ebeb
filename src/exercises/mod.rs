//! The four scenario families, one per block under test.

pub mod lot_counter;
pub mod memory;
pub mod multiplier;
pub mod mux;

use std::fmt;

use clap::ValueEnum;

use crate::checker::Checker;
use crate::config::SimulationConfig;
use crate::dut::{Fault, LotCounterDut, MemoryDut, MultiplierDut, MuxDut};
use crate::error::Result;
use crate::harness::Harness;
use crate::scenario::{Scenario, ScenarioRunner};
use crate::signal::Dut;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Exercise {
    Mux,
    LotCounter,
    Multiplier,
    Memory,
}

impl Exercise {
    pub const ALL: [Exercise; 4] = [
        Exercise::Mux,
        Exercise::LotCounter,
        Exercise::Multiplier,
        Exercise::Memory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Exercise::Mux => "mux",
            Exercise::LotCounter => "lot-counter",
            Exercise::Multiplier => "multiplier",
            Exercise::Memory => "memory",
        }
    }

    pub fn scenarios(self, config: &SimulationConfig) -> Vec<Scenario> {
        match self {
            Exercise::Mux => mux::scenarios(),
            Exercise::LotCounter => lot_counter::scenarios(config.lot_capacity),
            Exercise::Multiplier => multiplier::scenarios(),
            Exercise::Memory => memory::scenarios(config.memory_capacity, config.seed),
        }
    }

    /// Software stand-in for this exercise's block, sized from `config`.
    pub fn software_dut(self, config: &SimulationConfig, faults: &[Fault]) -> Box<dyn Dut + Send> {
        match self {
            Exercise::Mux => Box::new(MuxDut::new(faults)),
            Exercise::LotCounter => Box::new(LotCounterDut::new(config.lot_capacity, faults)),
            Exercise::Multiplier => Box::new(MultiplierDut::new(faults)),
            Exercise::Memory => Box::new(MemoryDut::new(config.memory_capacity, faults)),
        }
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run every scenario of `exercise` against `dut` and hand back the
/// divergence log.
pub fn run_exercise<D: Dut>(
    exercise: Exercise,
    dut: D,
    config: &SimulationConfig,
) -> Result<Checker> {
    let harness = Harness::new(dut, config.clone())?;
    let mut runner = ScenarioRunner::new(harness);
    runner.run(&exercise.scenarios(config))?;
    Ok(runner.into_harness().into_checker())
}
