//! Named, width-checked access to a device under test.

use crate::error::{HarnessError, Result};

/// Who writes a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Written by the harness.
    Driven,
    /// Written by the DUT; read-only to the harness.
    Observed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Clock,
    Reset,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Port {
    pub name: &'static str,
    pub width: u32,
    pub direction: Direction,
    pub role: Role,
}

impl Port {
    pub const fn driven(name: &'static str, width: u32) -> Self {
        Self {
            name,
            width,
            direction: Direction::Driven,
            role: Role::Data,
        }
    }

    pub const fn observed(name: &'static str, width: u32) -> Self {
        Self {
            name,
            width,
            direction: Direction::Observed,
            role: Role::Data,
        }
    }

    pub const fn clock(name: &'static str) -> Self {
        Self {
            name,
            width: 1,
            direction: Direction::Driven,
            role: Role::Clock,
        }
    }

    pub const fn reset(name: &'static str) -> Self {
        Self {
            name,
            width: 1,
            direction: Direction::Driven,
            role: Role::Reset,
        }
    }

    pub fn max_value(&self) -> u64 {
        if self.width >= 64 {
            u64::MAX
        } else {
            (1u64 << self.width) - 1
        }
    }
}

/// A synchronous block the harness can exercise.
///
/// Implementations only need to store and return values by port name; the
/// [`SignalBus`] in front of them does the direction and width checking.
pub trait Dut {
    fn name(&self) -> &'static str;

    fn ports(&self) -> &[Port];

    /// Current value of any port, driven or observed.
    fn read(&self, signal: &str) -> Option<u64>;

    /// Store a driven value. Returns `false` for names the DUT does not have.
    fn write(&mut self, signal: &str, value: u64) -> bool;

    /// Recompute outputs (and registered state on a clock edge) from the
    /// current inputs.
    fn evaluate(&mut self);
}

impl<T: Dut + ?Sized> Dut for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn ports(&self) -> &[Port] {
        (**self).ports()
    }

    fn read(&self, signal: &str) -> Option<u64> {
        (**self).read(signal)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        (**self).write(signal, value)
    }

    fn evaluate(&mut self) {
        (**self).evaluate()
    }
}

/// The harness's only window onto a DUT.
pub struct SignalBus<D: Dut> {
    dut: D,
}

impl<D: Dut> SignalBus<D> {
    pub fn new(dut: D) -> Self {
        Self { dut }
    }

    pub fn dut(&self) -> &D {
        &self.dut
    }

    pub fn into_dut(self) -> D {
        self.dut
    }

    pub fn port(&self, signal: &str) -> Result<Port> {
        self.dut
            .ports()
            .iter()
            .find(|port| port.name == signal)
            .copied()
            .ok_or_else(|| HarnessError::UnknownSignal {
                dut: self.dut.name(),
                signal: signal.to_string(),
            })
    }

    /// First port with the given role, if the DUT has one.
    pub fn port_with_role(&self, role: Role) -> Option<Port> {
        self.dut.ports().iter().find(|port| port.role == role).copied()
    }

    pub fn get(&self, signal: &str) -> Result<u64> {
        let port = self.port(signal)?;
        self.dut
            .read(port.name)
            .ok_or_else(|| HarnessError::UnknownSignal {
                dut: self.dut.name(),
                signal: signal.to_string(),
            })
    }

    pub fn get_bool(&self, signal: &str) -> Result<bool> {
        Ok(self.get(signal)? != 0)
    }

    pub fn set(&mut self, signal: &str, value: u64) -> Result<()> {
        let port = self.port(signal)?;
        if port.direction == Direction::Observed {
            return Err(HarnessError::ReadOnlySignal {
                signal: signal.to_string(),
            });
        }
        if value > port.max_value() {
            return Err(HarnessError::ValueTooWide {
                signal: signal.to_string(),
                value,
                width: port.width,
            });
        }
        if !self.dut.write(port.name, value) {
            return Err(HarnessError::UnknownSignal {
                dut: self.dut.name(),
                signal: signal.to_string(),
            });
        }
        Ok(())
    }

    pub fn set_bool(&mut self, signal: &str, level: bool) -> Result<()> {
        self.set(signal, level as u64)
    }

    pub fn evaluate(&mut self) {
        self.dut.evaluate();
    }

    /// `(name, value)` pairs for a status line.
    pub fn snapshot(&self, signals: &[&'static str]) -> Result<Vec<(&'static str, u64)>> {
        signals
            .iter()
            .map(|&signal| Ok((signal, self.get(signal)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dut::MuxDut;

    #[test]
    fn test_unknown_signal_is_rejected() {
        let mut bus = SignalBus::new(MuxDut::new(&[]));
        assert!(matches!(
            bus.get("data_7"),
            Err(HarnessError::UnknownSignal { .. })
        ));
        assert!(matches!(
            bus.set("data_7", 1),
            Err(HarnessError::UnknownSignal { .. })
        ));
    }

    #[test]
    fn test_observed_signals_are_read_only() {
        let mut bus = SignalBus::new(MuxDut::new(&[]));
        let err = bus.set("data_out", 3).unwrap_err();
        assert!(matches!(err, HarnessError::ReadOnlySignal { .. }));
    }

    #[test]
    fn test_width_is_enforced() {
        let mut bus = SignalBus::new(MuxDut::new(&[]));
        assert!(bus.set("data_sel", 3).is_ok());
        let err = bus.set("data_sel", 4).unwrap_err();
        assert!(matches!(err, HarnessError::ValueTooWide { width: 2, .. }));
    }

    #[test]
    fn test_outputs_follow_evaluate() {
        let mut bus = SignalBus::new(MuxDut::new(&[]));
        bus.set("data_2", 0x5a).unwrap();
        bus.set("data_sel", 2).unwrap();
        bus.evaluate();
        assert_eq!(bus.get("data_out").unwrap(), 0x5a);
        assert_eq!(
            bus.snapshot(&["data_sel", "data_out"]).unwrap(),
            vec![("data_sel", 2), ("data_out", 0x5a)]
        );
    }

    #[test]
    fn test_max_value() {
        assert_eq!(Port::driven("a", 1).max_value(), 1);
        assert_eq!(Port::driven("a", 8).max_value(), 0xff);
        assert_eq!(Port::driven("a", 64).max_value(), u64::MAX);
    }
}
