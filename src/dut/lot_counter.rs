use super::{bits_for, Edge, Fault};
use crate::signal::{Dut, Port};

pub const CLK: &str = "clk";
pub const RST: &str = "rst";
pub const OUTER_SENSOR: &str = "outer_sensor";
pub const INNER_SENSOR: &str = "inner_sensor";
pub const COUNT: &str = "count";
pub const FULL: &str = "full";
pub const EMPTY: &str = "empty";

// sensor sequence states, encoded the way the RTL register holds them
const IDLE: u8 = 0;
const ENTER_OUTER: u8 = 1;
const ENTER_BOTH: u8 = 2;
const ENTER_INNER: u8 = 3;
const EXIT_INNER: u8 = 4;
const EXIT_BOTH: u8 = 5;
const EXIT_OUTER: u8 = 6;

/// Parking-lot occupancy counter fed by two presence sensors.
///
/// A car entering trips outer, both, inner, then neither; leaving is the
/// mirror image. The count moves once per completed sequence however long
/// each sensor level is held, and saturates at `0` and `capacity`.
#[derive(Debug, Clone)]
pub struct LotCounterDut {
    ports: Vec<Port>,
    capacity: u32,

    clk: bool,
    rst: bool,
    outer: bool,
    inner: bool,

    edge: Edge,
    state: u8,
    count: u32,

    full: bool,
    empty: bool,

    faults: Vec<Fault>,
}

impl LotCounterDut {
    pub fn new(capacity: u32, faults: &[Fault]) -> Self {
        let ports = vec![
            Port::clock(CLK),
            Port::reset(RST),
            Port::driven(OUTER_SENSOR, 1),
            Port::driven(INNER_SENSOR, 1),
            Port::observed(COUNT, bits_for(u64::from(capacity))),
            Port::observed(FULL, 1),
            Port::observed(EMPTY, 1),
        ];
        Self {
            ports,
            capacity,
            clk: false,
            rst: false,
            outer: false,
            inner: false,
            edge: Edge::default(),
            state: IDLE,
            count: 0,
            full: false,
            empty: true,
            faults: faults.to_vec(),
        }
    }

    fn next_state(&self) -> u8 {
        match (self.state, self.outer, self.inner) {
            (IDLE, true, false) => ENTER_OUTER,
            (IDLE, false, true) => EXIT_INNER,
            (IDLE, _, _) => IDLE,

            (ENTER_OUTER, true, false) => ENTER_OUTER,
            (ENTER_OUTER, true, true) => ENTER_BOTH,
            (ENTER_BOTH, true, true) => ENTER_BOTH,
            (ENTER_BOTH, true, false) => ENTER_OUTER,
            (ENTER_BOTH, false, true) => ENTER_INNER,
            (ENTER_INNER, false, true) => ENTER_INNER,
            (ENTER_INNER, true, true) => ENTER_BOTH,

            (EXIT_INNER, false, true) => EXIT_INNER,
            (EXIT_INNER, true, true) => EXIT_BOTH,
            (EXIT_BOTH, true, true) => EXIT_BOTH,
            (EXIT_BOTH, false, true) => EXIT_INNER,
            (EXIT_BOTH, true, false) => EXIT_OUTER,
            (EXIT_OUTER, true, false) => EXIT_OUTER,
            (EXIT_OUTER, true, true) => EXIT_BOTH,

            // sequence completed or abandoned
            _ => IDLE,
        }
    }

    fn on_rising_edge(&mut self) {
        if self.rst {
            self.state = IDLE;
            self.count = 0;
            return;
        }

        let next = self.next_state();
        let level_counting = Fault::LevelCounting.is_in(&self.faults);
        let entered = if level_counting {
            next == ENTER_INNER
        } else {
            self.state == ENTER_INNER && next == IDLE && !self.outer
        };
        let left = if level_counting {
            next == EXIT_OUTER
        } else {
            self.state == EXIT_OUTER && next == IDLE && !self.inner
        };

        if entered && self.count < self.capacity {
            self.count += 1;
        }
        if left && self.count > 0 {
            self.count -= 1;
        }
        self.state = next;
    }
}

impl Dut for LotCounterDut {
    fn name(&self) -> &'static str {
        "lot_counter_top"
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            CLK => u64::from(self.clk),
            RST => u64::from(self.rst),
            OUTER_SENSOR => u64::from(self.outer),
            INNER_SENSOR => u64::from(self.inner),
            COUNT => u64::from(self.count),
            FULL => u64::from(self.full),
            EMPTY => u64::from(self.empty),
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            CLK => self.clk = value != 0,
            RST => self.rst = value != 0,
            OUTER_SENSOR => self.outer = value != 0,
            INNER_SENSOR => self.inner = value != 0,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        if self.edge.rising(self.clk) {
            self.on_rising_edge();
        }
        let full_at = if Fault::FullFlagEarly.is_in(&self.faults) {
            self.capacity.saturating_sub(1)
        } else {
            self.capacity
        };
        self.full = self.count >= full_at;
        self.empty = self.count == 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalBus;

    fn cycle(bus: &mut SignalBus<LotCounterDut>, outer: u64, inner: u64) {
        bus.set(OUTER_SENSOR, outer).unwrap();
        bus.set(INNER_SENSOR, inner).unwrap();
        bus.set(CLK, 1).unwrap();
        bus.evaluate();
        bus.set(CLK, 0).unwrap();
        bus.evaluate();
    }

    #[test]
    fn test_enter_then_leave() {
        let mut bus = SignalBus::new(LotCounterDut::new(16, &[]));
        bus.evaluate();
        assert_eq!(bus.get(EMPTY).unwrap(), 1);

        for (outer, inner) in [(1, 0), (1, 1), (0, 1)] {
            cycle(&mut bus, outer, inner);
            assert_eq!(bus.get(COUNT).unwrap(), 0);
        }
        cycle(&mut bus, 0, 0);
        assert_eq!(bus.get(COUNT).unwrap(), 1);
        assert_eq!(bus.get(EMPTY).unwrap(), 0);
        assert_eq!(bus.get(FULL).unwrap(), 0);

        for (outer, inner) in [(0, 1), (1, 1), (1, 0)] {
            cycle(&mut bus, outer, inner);
            assert_eq!(bus.get(COUNT).unwrap(), 1);
        }
        cycle(&mut bus, 0, 0);
        assert_eq!(bus.get(COUNT).unwrap(), 0);
        assert_eq!(bus.get(EMPTY).unwrap(), 1);
    }

    #[test]
    fn test_abandoned_entry_does_not_count() {
        let mut bus = SignalBus::new(LotCounterDut::new(16, &[]));
        for (outer, inner) in [(1, 0), (1, 1), (1, 0), (0, 0)] {
            cycle(&mut bus, outer, inner);
        }
        assert_eq!(bus.get(COUNT).unwrap(), 0);
    }

    #[test]
    fn test_saturates_at_capacity() {
        let mut bus = SignalBus::new(LotCounterDut::new(2, &[]));
        for _ in 0..3 {
            for (outer, inner) in [(1, 0), (1, 1), (0, 1), (0, 0)] {
                cycle(&mut bus, outer, inner);
            }
        }
        assert_eq!(bus.get(COUNT).unwrap(), 2);
        assert_eq!(bus.get(FULL).unwrap(), 1);
    }

    #[test]
    fn test_count_port_width() {
        let dut = LotCounterDut::new(16, &[]);
        let count = dut.ports().iter().find(|p| p.name == COUNT).unwrap();
        assert_eq!(count.width, 5);
    }
}
