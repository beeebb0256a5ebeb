use crate::error::Result;
use crate::signal::{Dut, SignalBus};

/// Owns simulated time and the DUT clock.
///
/// Time only moves forward, one unit per [`step`](Self::step). A full cycle
/// is two phase flips, each held for `half_period` steps.
#[derive(Debug, Clone)]
pub struct ClockDriver {
    signal: Option<&'static str>,
    half_period: u32,
    phase: bool,
    time: u64,
}

impl ClockDriver {
    /// `signal` is `None` for purely combinational DUTs, which can only be
    /// stepped.
    pub fn new(signal: Option<&'static str>, half_period: u32) -> Self {
        Self {
            signal,
            half_period,
            phase: false,
            time: 0,
        }
    }

    pub fn time(&self) -> u64 {
        self.time
    }

    /// Current clock level.
    pub fn phase(&self) -> bool {
        self.phase
    }

    pub fn signal(&self) -> Option<&'static str> {
        self.signal
    }

    /// Drive the clock to its idle-low level without advancing time.
    pub fn park<D: Dut>(&mut self, bus: &mut SignalBus<D>) -> Result<()> {
        self.phase = false;
        if let Some(signal) = self.signal {
            bus.set_bool(signal, false)?;
        }
        Ok(())
    }

    pub fn step<D: Dut>(&mut self, bus: &mut SignalBus<D>) {
        self.time += 1;
        bus.evaluate();
    }

    pub fn half_cycle<D: Dut>(&mut self, bus: &mut SignalBus<D>) -> Result<()> {
        self.phase = !self.phase;
        if let Some(signal) = self.signal {
            bus.set_bool(signal, self.phase)?;
        }
        for _ in 0..self.half_period {
            self.step(bus);
        }
        Ok(())
    }

    pub fn full_cycle<D: Dut>(&mut self, bus: &mut SignalBus<D>) -> Result<()> {
        self.half_cycle(bus)?;
        self.half_cycle(bus)
    }
}
