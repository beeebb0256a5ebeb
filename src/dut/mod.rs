//! Pure-software stand-ins for the blocks under test.
//!
//! Each model behaves like its RTL counterpart at the port level: registered
//! state changes only on a rising clock edge seen by `evaluate()`, outputs
//! are recomputed on every `evaluate()`. A model can be built with
//! [`Fault`]s to show that the harness catches the bug.

pub mod lot_counter;
pub mod memory;
pub mod multiplier;
pub mod mux;

pub use lot_counter::LotCounterDut;
pub use memory::MemoryDut;
pub use multiplier::MultiplierDut;
pub use mux::MuxDut;

use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Fault {
    /// Accept new requests while a response is still undelivered.
    IgnoreBackpressure,
    /// Report not-ready while a response is held, but latch a request on
    /// `valid` anyway.
    LatchWhileHeld,
    /// Never raise request-ready.
    NeverReady,
    /// Keep sampling the operand wires after acceptance.
    RelatchOperands,
    /// Same-cycle reads return the old byte instead of the new write.
    NoWriteBypass,
    /// Count on every cycle a sensor is held instead of once per car.
    LevelCounting,
    /// Raise `full` one car early.
    FullFlagEarly,
    /// Ignore the high bit of the mux select.
    StuckSelect,
}

impl Fault {
    pub fn is_in(self, faults: &[Fault]) -> bool {
        faults.contains(&self)
    }
}

/// Rising-edge detector for a model's clock input.
#[derive(Debug, Default, Clone, Copy)]
struct Edge {
    last: bool,
}

impl Edge {
    fn rising(&mut self, clk: bool) -> bool {
        let rose = clk && !self.last;
        self.last = clk;
        rose
    }
}

/// Bits needed to hold `value`.
fn bits_for(value: u64) -> u32 {
    (u64::BITS - value.leading_zeros()).max(1)
}
