//! Verilated RTL behind the [`Dut`] trait.
//!
//! Ports are fixed at the RTL's default parameters: an 8-byte memory and a
//! 16-car lot.

use camino::Utf8Path;
use marlin::{
    verilator::{VerilatorRuntime, VerilatorRuntimeOptions},
    verilog::prelude::*,
};

use crate::checker::Checker;
use crate::config::SimulationConfig;
use crate::dut::{lot_counter, memory, multiplier, mux};
use crate::error::{HarnessError, Result};
use crate::exercises::{run_exercise, Exercise};
use crate::signal::{Dut, Port};

#[verilog(src = "rtl/mux_sim_top.sv", name = "mux_sim_top")]
pub struct MuxSimTop;

#[verilog(src = "rtl/lot_counter_top.sv", name = "lot_counter_top")]
pub struct LotCounterTop;

#[verilog(src = "rtl/multiplier_top.sv", name = "multiplier_top")]
pub struct MultiplierTop;

#[verilog(src = "rtl/mem_wr_bypass_top.sv", name = "mem_wr_bypass_top")]
pub struct MemWrBypassTop;

pub const RTL_MEMORY_CAPACITY: usize = 8;
pub const RTL_LOT_CAPACITY: u32 = 16;

const LOT_PORTS: [Port; 7] = [
    Port::clock(lot_counter::CLK),
    Port::reset(lot_counter::RST),
    Port::driven(lot_counter::OUTER_SENSOR, 1),
    Port::driven(lot_counter::INNER_SENSOR, 1),
    Port::observed(lot_counter::COUNT, 5),
    Port::observed(lot_counter::FULL, 1),
    Port::observed(lot_counter::EMPTY, 1),
];

const MEM_PORTS: [Port; 12] = [
    Port::clock(memory::CLK),
    Port::reset(memory::RST),
    Port::driven(memory::WR_REQ_VAL, 1),
    Port::observed(memory::WR_REQ_RDY, 1),
    Port::driven(memory::WR_REQ_ADDR, 3),
    Port::driven(memory::WR_REQ_DATA, 8),
    Port::driven(memory::RD_REQ_VAL, 1),
    Port::observed(memory::RD_REQ_RDY, 1),
    Port::driven(memory::RD_REQ_ADDR, 3),
    Port::observed(memory::RD_RESP_VAL, 1),
    Port::driven(memory::RD_RESP_RDY, 1),
    Port::observed(memory::RD_RESP_DATA, 8),
];

pub fn create_runtime(config: &SimulationConfig) -> Result<VerilatorRuntime> {
    let include_paths = [Utf8Path::new("rtl")];
    let src_files = [
        Utf8Path::new("rtl/mux_sim_top.sv"),
        Utf8Path::new("rtl/lot_counter_top.sv"),
        Utf8Path::new("rtl/multiplier_top.sv"),
        Utf8Path::new("rtl/mem_wr_bypass_top.sv"),
    ];

    VerilatorRuntime::new(
        config.artifact_dir.as_path(),
        &src_files,
        &include_paths,
        [],
        VerilatorRuntimeOptions::default_logging(),
    )
    .map_err(|e| HarnessError::Verilator(format!("failed to create runtime: {e}")))
}

/// Run `exercise` against its verilated top.
pub fn run_verilated(exercise: Exercise, config: &SimulationConfig) -> Result<Checker> {
    if config.memory_capacity != RTL_MEMORY_CAPACITY || config.lot_capacity != RTL_LOT_CAPACITY {
        return Err(HarnessError::InvalidConfig(format!(
            "the RTL is built for memory_capacity = {RTL_MEMORY_CAPACITY} and \
             lot_capacity = {RTL_LOT_CAPACITY}"
        )));
    }

    let runtime = create_runtime(config)?;
    let model_error = model_error(exercise);
    match exercise {
        Exercise::Mux => {
            let model = runtime.create_model_simple::<MuxSimTop>().map_err(model_error)?;
            run_exercise(exercise, model, config)
        }
        Exercise::LotCounter => {
            let model = runtime
                .create_model_simple::<LotCounterTop>()
                .map_err(model_error)?;
            run_exercise(exercise, model, config)
        }
        Exercise::Multiplier => {
            let model = runtime
                .create_model_simple::<MultiplierTop>()
                .map_err(model_error)?;
            run_exercise(exercise, model, config)
        }
        Exercise::Memory => {
            let model = runtime
                .create_model_simple::<MemWrBypassTop>()
                .map_err(model_error)?;
            run_exercise(exercise, model, config)
        }
    }
}

fn model_error<E: std::fmt::Debug>(exercise: Exercise) -> impl Fn(E) -> HarnessError {
    move |e| HarnessError::Verilator(format!("failed to create {exercise} model: {e:?}"))
}

impl Dut for MuxSimTop<'_> {
    fn name(&self) -> &'static str {
        "mux_sim_top"
    }

    fn ports(&self) -> &[Port] {
        &mux::PORTS
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            "data_0" => self.data_0 as u64,
            "data_1" => self.data_1 as u64,
            "data_2" => self.data_2 as u64,
            "data_3" => self.data_3 as u64,
            mux::DATA_SEL => self.data_sel as u64,
            mux::DATA_OUT => self.data_out as u64,
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            "data_0" => self.data_0 = value as _,
            "data_1" => self.data_1 = value as _,
            "data_2" => self.data_2 = value as _,
            "data_3" => self.data_3 = value as _,
            mux::DATA_SEL => self.data_sel = value as _,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        self.eval();
    }
}

impl Dut for LotCounterTop<'_> {
    fn name(&self) -> &'static str {
        "lot_counter_top"
    }

    fn ports(&self) -> &[Port] {
        &LOT_PORTS
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            lot_counter::CLK => self.clk as u64,
            lot_counter::RST => self.rst as u64,
            lot_counter::OUTER_SENSOR => self.outer_sensor as u64,
            lot_counter::INNER_SENSOR => self.inner_sensor as u64,
            lot_counter::COUNT => self.count as u64,
            lot_counter::FULL => self.full as u64,
            lot_counter::EMPTY => self.empty as u64,
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            lot_counter::CLK => self.clk = value as _,
            lot_counter::RST => self.rst = value as _,
            lot_counter::OUTER_SENSOR => self.outer_sensor = value as _,
            lot_counter::INNER_SENSOR => self.inner_sensor = value as _,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        self.eval();
    }
}

impl Dut for MultiplierTop<'_> {
    fn name(&self) -> &'static str {
        "multiplier_top"
    }

    fn ports(&self) -> &[Port] {
        &multiplier::PORTS
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            multiplier::CLK => self.clk as u64,
            multiplier::RST => self.rst as u64,
            multiplier::REQ_VAL => self.req_val as u64,
            multiplier::REQ_RDY => self.req_rdy as u64,
            multiplier::REQ_OPERAND_A => self.req_operand_a as u64,
            multiplier::REQ_OPERAND_B => self.req_operand_b as u64,
            multiplier::RESP_VAL => self.resp_val as u64,
            multiplier::RESP_RDY => self.resp_rdy as u64,
            multiplier::RESP_PRODUCT => self.resp_product as u64,
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            multiplier::CLK => self.clk = value as _,
            multiplier::RST => self.rst = value as _,
            multiplier::REQ_VAL => self.req_val = value as _,
            multiplier::REQ_OPERAND_A => self.req_operand_a = value as _,
            multiplier::REQ_OPERAND_B => self.req_operand_b = value as _,
            multiplier::RESP_RDY => self.resp_rdy = value as _,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        self.eval();
    }
}

impl Dut for MemWrBypassTop<'_> {
    fn name(&self) -> &'static str {
        "mem_wr_bypass_top"
    }

    fn ports(&self) -> &[Port] {
        &MEM_PORTS
    }

    fn read(&self, signal: &str) -> Option<u64> {
        let value = match signal {
            memory::CLK => self.clk as u64,
            memory::RST => self.rst as u64,
            memory::WR_REQ_VAL => self.wr_req_val as u64,
            memory::WR_REQ_RDY => self.wr_req_rdy as u64,
            memory::WR_REQ_ADDR => self.wr_req_addr as u64,
            memory::WR_REQ_DATA => self.wr_req_data as u64,
            memory::RD_REQ_VAL => self.rd_req_val as u64,
            memory::RD_REQ_RDY => self.rd_req_rdy as u64,
            memory::RD_REQ_ADDR => self.rd_req_addr as u64,
            memory::RD_RESP_VAL => self.rd_resp_val as u64,
            memory::RD_RESP_RDY => self.rd_resp_rdy as u64,
            memory::RD_RESP_DATA => self.rd_resp_data as u64,
            _ => return None,
        };
        Some(value)
    }

    fn write(&mut self, signal: &str, value: u64) -> bool {
        match signal {
            memory::CLK => self.clk = value as _,
            memory::RST => self.rst = value as _,
            memory::WR_REQ_VAL => self.wr_req_val = value as _,
            memory::WR_REQ_ADDR => self.wr_req_addr = value as _,
            memory::WR_REQ_DATA => self.wr_req_data = value as _,
            memory::RD_REQ_VAL => self.rd_req_val = value as _,
            memory::RD_REQ_ADDR => self.rd_req_addr = value as _,
            memory::RD_RESP_RDY => self.rd_resp_rdy = value as _,
            _ => return false,
        }
        true
    }

    fn evaluate(&mut self) {
        self.eval();
    }
}
