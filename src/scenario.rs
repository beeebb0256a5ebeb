//! Data-driven stimulus.
//!
//! A [`Scenario`] is a named list of [`Step`]s built with a consuming
//! builder; one generic [`ScenarioRunner`] executes any of them against any
//! [`Dut`].

use log::{debug, info};

use crate::checker::{CounterSample, Summary};
use crate::error::Result;
use crate::handshake::{Amendment, Channel, Request};
use crate::harness::Harness;
use crate::reference::ReferenceModel;
use crate::signal::Dut;

/// A response channel plus the data signal it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponsePort {
    pub channel: Channel,
    pub data: &'static str,
}

impl ResponsePort {
    pub const fn new(channel: Channel, data: &'static str) -> Self {
        Self { channel, data }
    }
}

/// The occupancy outputs of a counter and the capacity they refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterPorts {
    pub count: &'static str,
    pub full: &'static str,
    pub empty: &'static str,
    pub capacity: u64,
}

/// Where a check gets its expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Literal(u64),
    /// `a * b` from the arithmetic model.
    Product(u8, u8),
    /// The byte the memory model holds at an address.
    Stored(usize),
    /// A read of `addr` accepted on the same edge as `write = (addr, data)`.
    Bypassed { addr: usize, write: (usize, u8) },
}

impl Expected {
    pub fn resolve(&self, reference: &ReferenceModel) -> Result<u64> {
        let value = match *self {
            Expected::Literal(value) => value,
            Expected::Product(a, b) => u64::from(reference.product(a, b)),
            Expected::Stored(addr) => u64::from(reference.memory().read(addr)?),
            Expected::Bypassed { addr, write } => {
                u64::from(reference.memory().read_bypassed(addr, Some(write))?)
            }
        };
        Ok(value)
    }
}

impl From<u64> for Expected {
    fn from(value: u64) -> Self {
        Expected::Literal(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Drive(Vec<(&'static str, u64)>),
    /// Single time steps with no clock change.
    Tick(u32),
    HalfCycle,
    Cycles(u32),
    Reset,
    WaitFor {
        signal: &'static str,
        level: bool,
    },
    Submit {
        requests: Vec<Request>,
        amendments: Vec<Amendment>,
    },
    AwaitResponse {
        channel: Channel,
        ready: bool,
    },
    CompleteResponse,
    /// Submit, await with the consumer ready, check, complete.
    Transaction {
        request: Request,
        response: ResponsePort,
        expected: Expected,
    },
    ExpectResponse {
        response: ResponsePort,
        expected: Expected,
    },
    ExpectValue {
        signal: &'static str,
        expected: Expected,
    },
    ExpectLevel {
        signal: &'static str,
        level: bool,
    },
    ExpectCount {
        ports: CounterPorts,
        expected: u64,
    },
    /// Apply an accepted write to the memory model.
    CommitWrite {
        addr: usize,
        data: u8,
    },
    Status(Vec<&'static str>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn drive(self, signal: &'static str, value: u64) -> Self {
        self.push(Step::Drive(vec![(signal, value)]))
    }

    pub fn drive_all(self, assignments: &[(&'static str, u64)]) -> Self {
        self.push(Step::Drive(assignments.to_vec()))
    }

    pub fn tick(self, steps: u32) -> Self {
        self.push(Step::Tick(steps))
    }

    pub fn half_cycle(self) -> Self {
        self.push(Step::HalfCycle)
    }

    pub fn cycles(self, count: u32) -> Self {
        self.push(Step::Cycles(count))
    }

    pub fn reset(self) -> Self {
        self.push(Step::Reset)
    }

    pub fn wait_for(self, signal: &'static str, level: bool) -> Self {
        self.push(Step::WaitFor { signal, level })
    }

    pub fn submit(self, request: Request) -> Self {
        self.submit_all(vec![request], Vec::new())
    }

    pub fn submit_all(self, requests: Vec<Request>, amendments: Vec<Amendment>) -> Self {
        self.push(Step::Submit {
            requests,
            amendments,
        })
    }

    pub fn await_response(self, channel: Channel, ready: bool) -> Self {
        self.push(Step::AwaitResponse { channel, ready })
    }

    pub fn complete_response(self) -> Self {
        self.push(Step::CompleteResponse)
    }

    pub fn transaction(self, request: Request, response: ResponsePort, expected: Expected) -> Self {
        self.push(Step::Transaction {
            request,
            response,
            expected,
        })
    }

    pub fn expect_response(self, response: ResponsePort, expected: Expected) -> Self {
        self.push(Step::ExpectResponse { response, expected })
    }

    pub fn expect_value(self, signal: &'static str, expected: impl Into<Expected>) -> Self {
        self.push(Step::ExpectValue {
            signal,
            expected: expected.into(),
        })
    }

    pub fn expect_level(self, signal: &'static str, level: bool) -> Self {
        self.push(Step::ExpectLevel { signal, level })
    }

    pub fn expect_count(self, ports: CounterPorts, expected: u64) -> Self {
        self.push(Step::ExpectCount { ports, expected })
    }

    pub fn commit_write(self, addr: usize, data: u8) -> Self {
        self.push(Step::CommitWrite { addr, data })
    }

    pub fn status(self, signals: &[&'static str]) -> Self {
        self.push(Step::Status(signals.to_vec()))
    }
}

/// Executes scenarios in order against one harness.
///
/// Harness faults abort the run; DUT divergences only accumulate in the
/// checker. Checks are skipped while reset is driven.
pub struct ScenarioRunner<D: Dut> {
    harness: Harness<D>,
}

impl<D: Dut> ScenarioRunner<D> {
    pub fn new(harness: Harness<D>) -> Self {
        Self { harness }
    }

    pub fn harness(&self) -> &Harness<D> {
        &self.harness
    }

    pub fn harness_mut(&mut self) -> &mut Harness<D> {
        &mut self.harness
    }

    pub fn into_harness(self) -> Harness<D> {
        self.harness
    }

    /// Run every scenario and return the summary of the whole log.
    pub fn run(&mut self, scenarios: &[Scenario]) -> Result<Summary> {
        for scenario in scenarios {
            self.run_scenario(scenario)?;
        }
        Ok(self.harness.checker().summary())
    }

    pub fn run_scenario(&mut self, scenario: &Scenario) -> Result<()> {
        info!("[{}] scenario `{}`", self.harness.time(), scenario.name());
        self.harness.checker_mut().set_scenario(scenario.name());
        let before = self.harness.checker().records().len();

        for step in scenario.steps() {
            self.execute(step)?;
        }

        let found = self.harness.checker().records().len() - before;
        info!(
            "[{}] scenario `{}` finished with {} divergence(s)",
            self.harness.time(),
            scenario.name(),
            found
        );
        Ok(())
    }

    fn checks_enabled(&self, step: &Step) -> bool {
        if self.harness.in_reset() {
            debug!("[{}] reset asserted, skipping {:?}", self.harness.time(), step);
            return false;
        }
        true
    }

    fn execute(&mut self, step: &Step) -> Result<()> {
        let harness = &mut self.harness;
        match step {
            Step::Drive(assignments) => harness.drive_all(assignments)?,
            Step::Tick(steps) => {
                for _ in 0..*steps {
                    harness.step();
                }
            }
            Step::HalfCycle => harness.half_cycle()?,
            Step::Cycles(count) => harness.cycles(*count)?,
            Step::Reset => harness.reset()?,
            Step::WaitFor { signal, level } => {
                harness.handshake().wait_for(signal, *level)?;
            }
            Step::Submit {
                requests,
                amendments,
            } => {
                harness.handshake().submit_requests(requests, amendments)?;
            }
            Step::AwaitResponse { channel, ready } => {
                harness.handshake().await_response(*channel, *ready)?;
            }
            Step::CompleteResponse => harness.handshake().complete_response()?,
            Step::Transaction {
                request,
                response,
                expected,
            } => {
                let mut handshake = harness.handshake();
                handshake.submit_request(request)?;
                handshake.await_response(response.channel, true)?;
                self.check_response(step, response, expected)?;
                self.harness.handshake().complete_response()?;
            }
            Step::ExpectResponse { response, expected } => {
                self.check_response(step, response, expected)?;
            }
            Step::ExpectValue { signal, expected } => {
                if self.checks_enabled(step) {
                    let expected = expected.resolve(self.harness.reference())?;
                    let actual = self.harness.observe(signal)?;
                    let time = self.harness.time();
                    self.harness
                        .checker_mut()
                        .check_value(time, signal, expected, actual);
                }
            }
            Step::ExpectLevel { signal, level } => {
                if self.checks_enabled(step) {
                    let actual = self.harness.observe_level(signal)?;
                    let time = self.harness.time();
                    self.harness
                        .checker_mut()
                        .check_level(time, signal, *level, actual);
                }
            }
            Step::ExpectCount { ports, expected } => {
                if self.checks_enabled(step) {
                    let sample = CounterSample {
                        count: self.harness.observe(ports.count)?,
                        full: self.harness.observe_level(ports.full)?,
                        empty: self.harness.observe_level(ports.empty)?,
                    };
                    let time = self.harness.time();
                    self.harness.checker_mut().check_counter(
                        time,
                        (ports.count, ports.full, ports.empty),
                        sample,
                        *expected,
                        ports.capacity,
                    );
                }
            }
            Step::CommitWrite { addr, data } => {
                harness.reference_mut().memory_mut().write(*addr, *data)?;
            }
            Step::Status(signals) => harness.status(signals)?,
        }
        Ok(())
    }

    fn check_response(
        &mut self,
        step: &Step,
        response: &ResponsePort,
        expected: &Expected,
    ) -> Result<()> {
        if !self.checks_enabled(step) {
            return Ok(());
        }
        let expected = expected.resolve(self.harness.reference())?;
        let valid = self.harness.observe_level(response.channel.valid)?;
        let value = self.harness.observe(response.data)?;
        let time = self.harness.time();
        self.harness.checker_mut().check_response(
            time,
            response.channel.valid,
            response.data,
            expected,
            valid,
            value,
        );
        Ok(())
    }
}
