use super::Fault;
use crate::signal::{Dut, Port};

pub const DATA: [&str; 4] = ["data_0", "data_1", "data_2", "data_3"];
pub const DATA_SEL: &str = "data_sel";
pub const DATA_OUT: &str = "data_out";

pub(crate) const PORTS: [Port; 6] = [
    Port::driven("data_0", 8),
    Port::driven("data_1", 8),
    Port::driven("data_2", 8),
    Port::driven("data_3", 8),
    Port::driven(DATA_SEL, 2),
    Port::observed(DATA_OUT, 8),
];

/// Four-way 8-bit combinational multiplexer.
#[derive(Debug, Clone)]
pub struct MuxDut {
    data: [u8; 4],
    sel: u8,
    out: u8,
    stuck_select: bool,
}

impl MuxDut {
    pub fn new(faults: &[Fault]) -> Self {
        Self {
            data: [0; 4],
            sel: 0,
            out: 0,
            stuck_select: Fault::StuckSelect.is_in(faults),
        }
    }
}

impl Dut for MuxDut {
    fn name(&self) -> &'static str {
        "mux_sim_top"
    }

    fn ports(&self) -> &[Port] {
        &PORTS
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            DATA_SEL => self.sel,
            DATA_OUT => self.out,
            _ => self.data[DATA.iter().position(|&name| name == signal)?],
        };
        Some(u64::from(value))
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            DATA_SEL => self.sel = value as u8,
            _ => match DATA.iter().position(|&name| name == signal) {
                Some(index) => self.data[index] = value as u8,
                None => return false,
            },
        }
        true
    }

    fn evaluate(&mut self) {
        let sel = if self.stuck_select {
            self.sel & 0b01
        } else {
            self.sel & 0b11
        };
        self.out = self.data[usize::from(sel)];
    }
}
