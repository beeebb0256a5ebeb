use super::{Edge, Fault};
use crate::signal::{Dut, Port};

pub const CLK: &str = "clk";
pub const RST: &str = "rst";
pub const REQ_VAL: &str = "req_val";
pub const REQ_RDY: &str = "req_rdy";
pub const REQ_OPERAND_A: &str = "req_operand_a";
pub const REQ_OPERAND_B: &str = "req_operand_b";
pub const RESP_VAL: &str = "resp_val";
pub const RESP_RDY: &str = "resp_rdy";
pub const RESP_PRODUCT: &str = "resp_product";

pub(crate) const PORTS: [Port; 9] = [
    Port::clock(CLK),
    Port::reset(RST),
    Port::driven(REQ_VAL, 1),
    Port::observed(REQ_RDY, 1),
    Port::driven(REQ_OPERAND_A, 8),
    Port::driven(REQ_OPERAND_B, 8),
    Port::observed(RESP_VAL, 1),
    Port::driven(RESP_RDY, 1),
    Port::observed(RESP_PRODUCT, 16),
];

/// Cycles the shift-add datapath needs per product.
pub const LATENCY: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Busy,
    Done,
}

/// 8x8 shift-add multiplier behind request and response ready/valid
/// channels. One partial product is accumulated per cycle; the result is
/// held until the consumer takes it, and no new request is accepted while it
/// is held.
#[derive(Debug, Clone)]
pub struct MultiplierDut {
    clk: bool,
    rst: bool,
    req_val: bool,
    req_operand_a: u8,
    req_operand_b: u8,
    resp_rdy: bool,

    edge: Edge,
    state: State,
    a: u8,
    b: u8,
    acc: u16,
    step: u8,

    req_rdy: bool,
    resp_val: bool,

    faults: Vec<Fault>,
}

impl MultiplierDut {
    pub fn new(faults: &[Fault]) -> Self {
        Self {
            clk: false,
            rst: false,
            req_val: false,
            req_operand_a: 0,
            req_operand_b: 0,
            resp_rdy: false,
            edge: Edge::default(),
            state: State::Idle,
            a: 0,
            b: 0,
            acc: 0,
            step: 0,
            req_rdy: false,
            resp_val: false,
            faults: faults.to_vec(),
        }
    }

    fn accepts_request(&self) -> bool {
        if self.rst || Fault::NeverReady.is_in(&self.faults) {
            return false;
        }
        match self.state {
            State::Idle => true,
            State::Done => Fault::IgnoreBackpressure.is_in(&self.faults),
            State::Busy => false,
        }
    }

    /// Whether a request with `valid` high is taken on the next edge. Only
    /// differs from `req_rdy` when the DUT is faulty.
    fn takes_request(&self) -> bool {
        self.accepts_request()
            || (self.state == State::Done
                && !self.rst
                && Fault::LatchWhileHeld.is_in(&self.faults))
    }

    fn latch(&mut self) {
        self.a = self.req_operand_a;
        self.b = self.req_operand_b;
        self.acc = 0;
        self.step = 0;
        self.state = State::Busy;
    }

    fn on_rising_edge(&mut self) {
        if self.rst {
            self.state = State::Idle;
            self.acc = 0;
            self.step = 0;
            return;
        }

        let accept = self.req_val && self.takes_request();
        match self.state {
            State::Idle => {
                if accept {
                    self.latch();
                }
            }
            State::Busy => {
                if Fault::RelatchOperands.is_in(&self.faults) {
                    self.a = self.req_operand_a;
                    self.b = self.req_operand_b;
                }
                if (self.b >> self.step) & 1 == 1 {
                    self.acc = self.acc.wrapping_add(u16::from(self.a) << self.step);
                }
                self.step += 1;
                if self.step == LATENCY {
                    self.state = State::Done;
                }
            }
            State::Done => {
                if accept {
                    // only reachable on a faulty DUT: the held result is
                    // silently dropped
                    self.latch();
                } else if self.resp_rdy {
                    self.state = State::Idle;
                }
            }
        }
    }
}

impl Dut for MultiplierDut {
    fn name(&self) -> &'static str {
        "multiplier_top"
    }

    fn ports(&self) -> &[Port] {
        &PORTS
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            CLK => u64::from(self.clk),
            RST => u64::from(self.rst),
            REQ_VAL => u64::from(self.req_val),
            REQ_RDY => u64::from(self.req_rdy),
            REQ_OPERAND_A => u64::from(self.req_operand_a),
            REQ_OPERAND_B => u64::from(self.req_operand_b),
            RESP_VAL => u64::from(self.resp_val),
            RESP_RDY => u64::from(self.resp_rdy),
            RESP_PRODUCT => u64::from(self.acc),
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            CLK => self.clk = value != 0,
            RST => self.rst = value != 0,
            REQ_VAL => self.req_val = value != 0,
            REQ_OPERAND_A => self.req_operand_a = value as u8,
            REQ_OPERAND_B => self.req_operand_b = value as u8,
            RESP_RDY => self.resp_rdy = value != 0,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        if self.edge.rising(self.clk) {
            self.on_rising_edge();
        }
        self.req_rdy = self.accepts_request();
        self.resp_val = self.state == State::Done && !self.rst;
    }
}
