use super::{bits_for, Edge, Fault};
use crate::signal::{Dut, Port};

pub const CLK: &str = "clk";
pub const RST: &str = "rst";
pub const WR_REQ_VAL: &str = "wr_req_val";
pub const WR_REQ_RDY: &str = "wr_req_rdy";
pub const WR_REQ_ADDR: &str = "wr_req_addr";
pub const WR_REQ_DATA: &str = "wr_req_data";
pub const RD_REQ_VAL: &str = "rd_req_val";
pub const RD_REQ_RDY: &str = "rd_req_rdy";
pub const RD_REQ_ADDR: &str = "rd_req_addr";
pub const RD_RESP_VAL: &str = "rd_resp_val";
pub const RD_RESP_RDY: &str = "rd_resp_rdy";
pub const RD_RESP_DATA: &str = "rd_resp_data";

/// Byte memory with a write channel, a read channel and a registered read
/// response. A write and a read of the same address accepted on the same
/// edge return the written byte. The read channel stalls while a response
/// is waiting for its consumer.
#[derive(Debug, Clone)]
pub struct MemoryDut {
    ports: Vec<Port>,
    mem: Vec<u8>,

    clk: bool,
    rst: bool,
    wr_req_val: bool,
    wr_req_addr: usize,
    wr_req_data: u8,
    rd_req_val: bool,
    rd_req_addr: usize,
    rd_resp_rdy: bool,

    edge: Edge,
    resp_val: bool,
    resp_data: u8,

    wr_req_rdy: bool,
    rd_req_rdy: bool,

    faults: Vec<Fault>,
}

impl MemoryDut {
    /// A zero `capacity` is raised to one byte.
    pub fn new(capacity: usize, faults: &[Fault]) -> Self {
        let capacity = capacity.max(1);
        let addr_width = bits_for(capacity.saturating_sub(1) as u64);
        let ports = vec![
            Port::clock(CLK),
            Port::reset(RST),
            Port::driven(WR_REQ_VAL, 1),
            Port::observed(WR_REQ_RDY, 1),
            Port::driven(WR_REQ_ADDR, addr_width),
            Port::driven(WR_REQ_DATA, 8),
            Port::driven(RD_REQ_VAL, 1),
            Port::observed(RD_REQ_RDY, 1),
            Port::driven(RD_REQ_ADDR, addr_width),
            Port::observed(RD_RESP_VAL, 1),
            Port::driven(RD_RESP_RDY, 1),
            Port::observed(RD_RESP_DATA, 8),
        ];
        Self {
            ports,
            mem: vec![0; capacity],
            clk: false,
            rst: false,
            wr_req_val: false,
            wr_req_addr: 0,
            wr_req_data: 0,
            rd_req_val: false,
            rd_req_addr: 0,
            rd_resp_rdy: false,
            edge: Edge::default(),
            resp_val: false,
            resp_data: 0,
            wr_req_rdy: false,
            rd_req_rdy: false,
            faults: faults.to_vec(),
        }
    }

    fn write_ready(&self) -> bool {
        !self.rst && !Fault::NeverReady.is_in(&self.faults)
    }

    fn read_ready(&self) -> bool {
        if self.rst || Fault::NeverReady.is_in(&self.faults) {
            return false;
        }
        let stalled = self.resp_val && !self.rd_resp_rdy;
        !stalled || Fault::IgnoreBackpressure.is_in(&self.faults)
    }

    fn on_rising_edge(&mut self) {
        if self.rst {
            self.resp_val = false;
            return;
        }

        let wr_fire = self.wr_req_val && self.write_ready();
        let rd_fire = self.rd_req_val
            && (self.read_ready() || Fault::LatchWhileHeld.is_in(&self.faults));

        if self.resp_val && self.rd_resp_rdy {
            self.resp_val = false;
        }
        if rd_fire {
            let forward = wr_fire
                && self.wr_req_addr == self.rd_req_addr
                && !Fault::NoWriteBypass.is_in(&self.faults);
            self.resp_data = if forward {
                self.wr_req_data
            } else {
                self.mem[self.rd_req_addr]
            };
            self.resp_val = true;
        }
        if wr_fire {
            self.mem[self.wr_req_addr] = self.wr_req_data;
        }
    }
}

impl Dut for MemoryDut {
    fn name(&self) -> &'static str {
        "mem_wr_bypass_top"
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            CLK => u64::from(self.clk),
            RST => u64::from(self.rst),
            WR_REQ_VAL => u64::from(self.wr_req_val),
            WR_REQ_RDY => u64::from(self.wr_req_rdy),
            WR_REQ_ADDR => self.wr_req_addr as u64,
            WR_REQ_DATA => u64::from(self.wr_req_data),
            RD_REQ_VAL => u64::from(self.rd_req_val),
            RD_REQ_RDY => u64::from(self.rd_req_rdy),
            RD_REQ_ADDR => self.rd_req_addr as u64,
            RD_RESP_VAL => u64::from(self.resp_val),
            RD_RESP_RDY => u64::from(self.rd_resp_rdy),
            RD_RESP_DATA => u64::from(self.resp_data),
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        // addresses wrap like a truncated bus
        let addr = value as usize % self.mem.len();
        match signal {
            CLK => self.clk = value != 0,
            RST => self.rst = value != 0,
            WR_REQ_VAL => self.wr_req_val = value != 0,
            WR_REQ_ADDR => self.wr_req_addr = addr,
            WR_REQ_DATA => self.wr_req_data = value as u8,
            RD_REQ_VAL => self.rd_req_val = value != 0,
            RD_REQ_ADDR => self.rd_req_addr = addr,
            RD_RESP_RDY => self.rd_resp_rdy = value != 0,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        if self.edge.rising(self.clk) {
            self.on_rising_edge();
        }
        self.wr_req_rdy = self.write_ready();
        self.rd_req_rdy = self.read_ready();
    }
}
