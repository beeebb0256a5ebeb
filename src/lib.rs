pub mod checker;
pub mod clock;
pub mod config;
pub mod dut;
pub mod error;
pub mod exercises;
pub mod handshake;
pub mod harness;
pub mod reference;
pub mod report;
pub mod scenario;
pub mod signal;
#[cfg(feature = "verilator")]
pub mod simulator;
pub mod sweep;

pub use checker::{Checker, CounterSample, DivergenceKind, DivergenceRecord, Summary};
pub use clock::ClockDriver;
pub use config::{SimulationConfig, StallPolicy};
pub use dut::Fault;
pub use error::{HarnessError, Result};
pub use exercises::{run_exercise, Exercise};
pub use handshake::{
    Acceptance, Amendment, Channel, HandshakeController, Request, TimeoutGuard, Wait, WaitOutcome,
};
pub use harness::Harness;
pub use reference::{multiply, MemoryImage, ReferenceModel};
pub use scenario::{CounterPorts, Expected, ResponsePort, Scenario, ScenarioRunner, Step};
pub use signal::{Direction, Dut, Port, Role, SignalBus};
pub use sweep::{parallel_multiplier_sweep, SweepReport};
