//! Run state for one DUT: signals, time, reference model and divergence log.

use log::{debug, info};

use crate::checker::Checker;
use crate::clock::ClockDriver;
use crate::config::{SimulationConfig, StallPolicy};
use crate::error::{HarnessError, Result};
use crate::handshake::HandshakeController;
use crate::reference::ReferenceModel;
use crate::report;
use crate::signal::{Dut, Role, SignalBus};

/// Exclusive owner of a DUT and everything that advances or judges it.
///
/// Built once per run from a validated [`SimulationConfig`]. The clock port,
/// if the DUT has one, belongs to the [`ClockDriver`] and cannot be driven
/// directly.
pub struct Harness<D: Dut> {
    bus: SignalBus<D>,
    clock: ClockDriver,
    checker: Checker,
    reference: ReferenceModel,
    config: SimulationConfig,
    reset: Option<&'static str>,
    in_reset: bool,
}

impl<D: Dut> Harness<D> {
    pub fn new(dut: D, config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let mut bus = SignalBus::new(dut);
        let clock_signal = bus.port_with_role(Role::Clock).map(|port| port.name);
        let reset = bus.port_with_role(Role::Reset).map(|port| port.name);

        let mut clock = ClockDriver::new(clock_signal, config.half_period);
        clock.park(&mut bus)?;
        bus.evaluate();

        let reference = ReferenceModel::new(config.memory_capacity, config.seed);
        Ok(Self {
            bus,
            clock,
            checker: Checker::new(),
            reference,
            config,
            reset,
            in_reset: false,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn time(&self) -> u64 {
        self.clock.time()
    }

    /// Whether reset is currently driven asserted. Outputs are not checked
    /// while it is.
    pub fn in_reset(&self) -> bool {
        self.in_reset
    }

    pub fn bus(&self) -> &SignalBus<D> {
        &self.bus
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    pub fn checker_mut(&mut self) -> &mut Checker {
        &mut self.checker
    }

    pub fn reference(&self) -> &ReferenceModel {
        &self.reference
    }

    pub fn reference_mut(&mut self) -> &mut ReferenceModel {
        &mut self.reference
    }

    pub fn into_checker(self) -> Checker {
        self.checker
    }

    pub fn drive(&mut self, signal: &str, value: u64) -> Result<()> {
        if self.clock.signal().is_some_and(|clock| clock == signal) {
            return Err(HarnessError::ClockOwned {
                signal: signal.to_string(),
            });
        }
        self.bus.set(signal, value)?;
        if self.reset.is_some_and(|reset| reset == signal) {
            self.in_reset = value != 0;
        }
        Ok(())
    }

    pub fn drive_bool(&mut self, signal: &str, level: bool) -> Result<()> {
        self.drive(signal, level as u64)
    }

    pub fn drive_all(&mut self, assignments: &[(&'static str, u64)]) -> Result<()> {
        for &(signal, value) in assignments {
            self.drive(signal, value)?;
        }
        Ok(())
    }

    pub fn observe(&self, signal: &str) -> Result<u64> {
        self.bus.get(signal)
    }

    pub fn observe_level(&self, signal: &str) -> Result<bool> {
        self.bus.get_bool(signal)
    }

    pub fn step(&mut self) {
        self.clock.step(&mut self.bus);
    }

    pub fn half_cycle(&mut self) -> Result<()> {
        self.clock.half_cycle(&mut self.bus)
    }

    pub fn full_cycle(&mut self) -> Result<()> {
        self.clock.full_cycle(&mut self.bus)
    }

    pub fn cycles(&mut self, count: u32) -> Result<()> {
        for _ in 0..count {
            self.full_cycle()?;
        }
        Ok(())
    }

    /// Hold reset for `reset_cycles`, release it, then let the DUT settle
    /// for `settle_cycles`. Starts and ends with the clock low.
    pub fn reset(&mut self) -> Result<()> {
        let signal = self.reset.ok_or_else(|| HarnessError::MissingPort {
            dut: self.bus.dut().name(),
            role: "reset",
        })?;

        self.drive_bool(signal, true)?;
        self.cycles(self.config.reset_cycles)?;
        info!(
            "[{}] {} held in reset for {} cycle(s)",
            self.time(),
            self.bus.dut().name(),
            self.config.reset_cycles
        );
        self.drive_bool(signal, false)?;
        self.cycles(self.config.settle_cycles)
    }

    /// Log the current value of `signals` as one status line.
    pub fn status(&self, signals: &[&'static str]) -> Result<()> {
        let snapshot = self.bus.snapshot(signals)?;
        info!("{}", report::status_line(self.time(), &snapshot));
        Ok(())
    }

    /// Record a timed-out wait; under [`StallPolicy::Abort`] this also ends
    /// the run.
    pub fn record_stall(&mut self, signal: &'static str, waited: u64) -> Result<()> {
        let time = self.time();
        let timeout = self.config.timeout_cycles;
        self.checker.record_stall(time, signal, timeout, waited);
        match self.config.stall_policy {
            StallPolicy::Continue => {
                debug!("[{time}] still waiting for {signal}");
                Ok(())
            }
            StallPolicy::Abort => Err(HarnessError::Stalled {
                signal: signal.to_string(),
                cycles: waited,
            }),
        }
    }

    pub fn handshake(&mut self) -> HandshakeController<'_, D> {
        HandshakeController::new(self)
    }
}
