//! Ready/valid channel driving.
//!
//! All operations follow one phase convention: the harness drives while the
//! clock is high, observes while it is low, and transfers happen on rising
//! edges. A request is accepted on the rising edge where `valid` and `ready`
//! are both high; a response is delivered the same way on its own channel.

use log::debug;

use crate::error::Result;
use crate::harness::Harness;
use crate::signal::Dut;

/// The `valid` / `ready` pair of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub valid: &'static str,
    pub ready: &'static str,
}

impl Channel {
    pub const fn new(valid: &'static str, ready: &'static str) -> Self {
        Self { valid, ready }
    }
}

/// A payload offered on a request channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub channel: Channel,
    pub payload: Vec<(&'static str, u64)>,
}

impl Request {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            payload: Vec::new(),
        }
    }

    pub fn with(mut self, signal: &'static str, value: u64) -> Self {
        self.payload.push((signal, value));
        self
    }
}

/// Driven values changed while a request is still waiting for `ready`.
///
/// Applied once the wait has seen `ready` low `after_cycles` times, before
/// the next clock cycle runs; `after(0)` goes out with the request itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amendment {
    pub after_cycles: u64,
    pub assignments: Vec<(&'static str, u64)>,
}

impl Amendment {
    pub fn after(cycles: u64) -> Self {
        Self {
            after_cycles: cycles,
            assignments: Vec::new(),
        }
    }

    pub fn with(mut self, signal: &'static str, value: u64) -> Self {
        self.assignments.push((signal, value));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Accepted,
    StillPending,
    /// The wait just reached the timeout threshold. Reported once per wait.
    TimedOut,
}

/// Bounded-retry counter for one wait loop.
#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    timeout_cycles: u64,
    waited: u64,
}

impl TimeoutGuard {
    pub fn new(timeout_cycles: u64) -> Self {
        Self {
            timeout_cycles,
            waited: 0,
        }
    }

    /// Cycles observed without the awaited level so far.
    pub fn waited(&self) -> u64 {
        self.waited
    }

    /// Feed one observation of the awaited signal.
    pub fn poll(&mut self, asserted: bool) -> WaitOutcome {
        if asserted {
            return WaitOutcome::Accepted;
        }
        self.waited += 1;
        if self.waited == self.timeout_cycles {
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::StillPending
        }
    }
}

/// How long a wait took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Wait {
    pub cycles: u64,
    pub timed_out: bool,
}

/// Result of a request handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acceptance {
    pub wait: Wait,
    /// Payload signals as they were on the wires at the accepting edge.
    pub payload: Vec<(&'static str, u64)>,
}

pub struct HandshakeController<'h, D: Dut> {
    harness: &'h mut Harness<D>,
}

impl<'h, D: Dut> HandshakeController<'h, D> {
    pub fn new(harness: &'h mut Harness<D>) -> Self {
        Self { harness }
    }

    /// Offer one request and block until it is accepted.
    pub fn submit_request(&mut self, request: &Request) -> Result<Acceptance> {
        self.submit_requests(std::slice::from_ref(request), &[])
    }

    /// Offer several requests at once and block until every channel is
    /// ready, so all of them are accepted on the same edge. While one
    /// channel is stalled, `valid` is held low on the channels that are
    /// already ready so none of them transfers early.
    ///
    /// `amendments` rewrite driven values mid-wait; `after(0)` applies
    /// before the first observation. Whatever is on the wires at the
    /// accepting edge is what the DUT takes. Driven values must not feed
    /// back into a channel's `ready` within the same cycle.
    pub fn submit_requests(
        &mut self,
        requests: &[Request],
        amendments: &[Amendment],
    ) -> Result<Acceptance> {
        for request in requests {
            self.harness.drive_all(&request.payload)?;
            self.harness.drive_bool(request.channel.valid, true)?;
        }
        self.apply_amendments(amendments, 0)?;
        self.harness.half_cycle()?;

        let mut guard = TimeoutGuard::new(self.harness.config().timeout_cycles);
        let mut timed_out = false;
        let mut ready = vec![false; requests.len()];
        loop {
            for (level, request) in ready.iter_mut().zip(requests) {
                *level = self.harness.observe_level(request.channel.ready)?;
            }
            let stalled_on = requests
                .iter()
                .zip(&ready)
                .find(|&(_, &level)| !level)
                .map(|(request, _)| request.channel.ready);

            match (guard.poll(stalled_on.is_none()), stalled_on) {
                (WaitOutcome::Accepted, _) => break,
                (WaitOutcome::TimedOut, Some(signal)) => {
                    timed_out = true;
                    self.harness.record_stall(signal, guard.waited())?;
                }
                _ => {}
            }

            // a ready channel would transfer on the next edge on its own
            for (request, &level) in requests.iter().zip(&ready) {
                self.harness.drive_bool(request.channel.valid, !level)?;
            }
            self.apply_amendments(amendments, guard.waited())?;
            self.harness.full_cycle()?;
        }

        for request in requests {
            self.harness.drive_bool(request.channel.valid, true)?;
        }
        for amendment in amendments {
            if amendment.after_cycles > guard.waited() {
                debug!(
                    "[{}] amendment after {} cycle(s) not applied, request accepted after {}",
                    self.harness.time(),
                    amendment.after_cycles,
                    guard.waited()
                );
            }
        }

        let mut payload = Vec::new();
        for request in requests {
            for &(signal, _) in &request.payload {
                payload.push((signal, self.harness.observe(signal)?));
            }
        }

        // accepting edge
        self.harness.half_cycle()?;
        for request in requests {
            self.harness.drive_bool(request.channel.valid, false)?;
        }

        let wait = Wait {
            cycles: guard.waited(),
            timed_out,
        };
        debug!(
            "[{}] request accepted after {} cycle(s)",
            self.harness.time(),
            wait.cycles
        );
        Ok(Acceptance { wait, payload })
    }

    fn apply_amendments(&mut self, amendments: &[Amendment], waited: u64) -> Result<()> {
        for amendment in amendments {
            if amendment.after_cycles == waited {
                self.harness.drive_all(&amendment.assignments)?;
            }
        }
        Ok(())
    }

    /// Set the consumer's `ready` and block until the DUT raises `valid`.
    /// Leaves the clock low with the response on the wires.
    pub fn await_response(&mut self, channel: Channel, ready: bool) -> Result<Wait> {
        self.harness.drive_bool(channel.ready, ready)?;
        self.harness.half_cycle()?;
        let wait = self.wait_until(channel.valid, true)?;
        debug!(
            "[{}] {} after {} cycle(s)",
            self.harness.time(),
            channel.valid,
            wait.cycles
        );
        Ok(wait)
    }

    /// Run the delivery edge for a response sampled by
    /// [`await_response`](Self::await_response), then one more cycle.
    pub fn complete_response(&mut self) -> Result<()> {
        self.harness.half_cycle()?;
        self.harness.full_cycle()
    }

    /// Run full cycles until `signal` shows `level`.
    pub fn wait_for(&mut self, signal: &'static str, level: bool) -> Result<Wait> {
        self.wait_until(signal, level)
    }

    fn wait_until(&mut self, signal: &'static str, level: bool) -> Result<Wait> {
        let mut guard = TimeoutGuard::new(self.harness.config().timeout_cycles);
        let mut timed_out = false;
        loop {
            let observed = self.harness.observe_level(signal)? == level;
            match guard.poll(observed) {
                WaitOutcome::Accepted => break,
                WaitOutcome::StillPending => {}
                WaitOutcome::TimedOut => {
                    timed_out = true;
                    self.harness.record_stall(signal, guard.waited())?;
                }
            }
            self.harness.full_cycle()?;
        }
        Ok(Wait {
            cycles: guard.waited(),
            timed_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::DivergenceKind;
    use crate::config::{SimulationConfig, StallPolicy};
    use crate::dut::{multiplier, Fault, MultiplierDut};
    use crate::error::HarnessError;
    use crate::signal::Port;

    const REQ: Channel = Channel::new(multiplier::REQ_VAL, multiplier::REQ_RDY);
    const RESP: Channel = Channel::new(multiplier::RESP_VAL, multiplier::RESP_RDY);

    fn multiply(a: u64, b: u64) -> Request {
        Request::new(REQ)
            .with(multiplier::REQ_OPERAND_A, a)
            .with(multiplier::REQ_OPERAND_B, b)
    }

    fn harness(faults: &[Fault], config: SimulationConfig) -> Harness<MultiplierDut> {
        let mut harness = Harness::new(MultiplierDut::new(faults), config).unwrap();
        harness.reset().unwrap();
        harness.half_cycle().unwrap();
        harness
    }

    #[test]
    fn test_guard_times_out_once() {
        let mut guard = TimeoutGuard::new(3);
        assert_eq!(guard.poll(false), WaitOutcome::StillPending);
        assert_eq!(guard.poll(false), WaitOutcome::StillPending);
        assert_eq!(guard.poll(false), WaitOutcome::TimedOut);
        assert_eq!(guard.poll(false), WaitOutcome::StillPending);
        assert_eq!(guard.poll(true), WaitOutcome::Accepted);
        assert_eq!(guard.waited(), 4);
    }

    #[test]
    fn test_single_transaction() {
        let mut harness = harness(&[], SimulationConfig::default());
        let mut hs = harness.handshake();
        let accepted = hs.submit_request(&multiply(13, 11)).unwrap();
        assert_eq!(accepted.wait.cycles, 0);
        assert_eq!(
            accepted.payload,
            vec![(multiplier::REQ_OPERAND_A, 13), (multiplier::REQ_OPERAND_B, 11)]
        );

        let wait = hs.await_response(RESP, true).unwrap();
        assert!(!wait.timed_out);
        assert_eq!(harness.observe(multiplier::RESP_PRODUCT).unwrap(), 143);
        assert!(!harness.observe_level(multiplier::REQ_VAL).unwrap());
        harness.handshake().complete_response().unwrap();
        assert!(!harness.observe_level(multiplier::RESP_VAL).unwrap());
        assert!(harness.checker().is_clean());
    }

    #[test]
    fn test_amendment_before_ready_is_what_gets_accepted() {
        let mut harness = harness(&[], SimulationConfig::default());
        harness.drive(multiplier::RESP_RDY, 0).unwrap();
        harness.handshake().submit_request(&multiply(3, 5)).unwrap();
        harness.handshake().await_response(RESP, false).unwrap();
        harness.half_cycle().unwrap();

        // the held response keeps req_rdy low until resp_rdy rises
        let amendments = [
            Amendment::after(2)
                .with(multiplier::REQ_OPERAND_A, 11)
                .with(multiplier::REQ_OPERAND_B, 13),
            Amendment::after(3).with(multiplier::RESP_RDY, 1),
        ];
        let accepted = harness
            .handshake()
            .submit_requests(&[multiply(7, 9)], &amendments)
            .unwrap();
        assert_eq!(accepted.wait.cycles, 3);
        assert_eq!(
            accepted.payload,
            vec![(multiplier::REQ_OPERAND_A, 11), (multiplier::REQ_OPERAND_B, 13)]
        );
        harness.handshake().await_response(RESP, true).unwrap();
        assert_eq!(harness.observe(multiplier::RESP_PRODUCT).unwrap(), 143);
    }

    #[test]
    fn test_timeout_is_reported_once_and_waiting_continues() {
        let config = SimulationConfig::default().with_timeout_cycles(4);
        let mut harness = harness(&[], config);
        harness.drive(multiplier::RESP_RDY, 1).unwrap();
        harness.handshake().submit_request(&multiply(2, 3)).unwrap();

        // busy for the whole first product, then one more edge to hand it off
        let accepted = harness.handshake().submit_request(&multiply(4, 5)).unwrap();
        assert_eq!(accepted.wait.cycles, u64::from(multiplier::LATENCY) + 1);
        assert!(accepted.wait.timed_out);

        let records = harness.checker().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, DivergenceKind::ProtocolStall);
        assert_eq!(records[0].signal, multiplier::REQ_RDY);
        assert_eq!(records[0].actual, 4);

        harness.handshake().await_response(RESP, true).unwrap();
        assert_eq!(harness.observe(multiplier::RESP_PRODUCT).unwrap(), 20);
    }

    #[test]
    fn test_abort_policy_stops_the_wait() {
        let config = SimulationConfig::default()
            .with_timeout_cycles(4)
            .with_stall_policy(StallPolicy::Abort);
        let mut harness = harness(&[Fault::NeverReady], config);
        let err = harness
            .handshake()
            .submit_request(&multiply(1, 1))
            .unwrap_err();
        assert!(matches!(err, HarnessError::Stalled { cycles: 4, .. }));
        assert_eq!(
            harness.checker().records()[0].signal,
            multiplier::REQ_RDY
        );
    }

    #[test]
    fn test_amendment_after_zero_goes_out_with_the_request() {
        let mut harness = harness(&[], SimulationConfig::default());
        let amendments = [Amendment::after(0).with(multiplier::REQ_OPERAND_A, 11)];
        let accepted = harness
            .handshake()
            .submit_requests(&[multiply(7, 9)], &amendments)
            .unwrap();
        assert_eq!(accepted.wait.cycles, 0);
        assert_eq!(
            accepted.payload,
            vec![(multiplier::REQ_OPERAND_A, 11), (multiplier::REQ_OPERAND_B, 9)]
        );
        harness.handshake().await_response(RESP, true).unwrap();
        assert_eq!(harness.observe(multiplier::RESP_PRODUCT).unwrap(), 99);
    }

    const A: Channel = Channel::new("a_val", "a_rdy");
    const B: Channel = Channel::new("b_val", "b_rdy");

    /// Two request channels: `a` is always ready, `b` only from the third
    /// rising edge on. Counts transfers per channel.
    #[derive(Debug, Default)]
    struct SplitReadyDut {
        clk: bool,
        last_clk: bool,
        a_val: bool,
        a_data: u8,
        b_val: bool,
        edges: u32,
        a_transfers: u32,
        a_taken: u8,
        b_transfers: u32,
    }

    const SPLIT_PORTS: [Port; 6] = [
        Port::clock("clk"),
        Port::driven("a_val", 1),
        Port::observed("a_rdy", 1),
        Port::driven("a_data", 8),
        Port::driven("b_val", 1),
        Port::observed("b_rdy", 1),
    ];

    impl SplitReadyDut {
        fn b_ready(&self) -> bool {
            self.edges >= 3
        }
    }

    impl Dut for SplitReadyDut {
        fn name(&self) -> &'static str {
            "split_ready"
        }

        fn ports(&self) -> &[Port] {
            &SPLIT_PORTS
        }

        fn read(&self, signal: &str) -> Option<u64> {
            let value = match signal {
                "clk" => u64::from(self.clk),
                "a_val" => u64::from(self.a_val),
                "a_rdy" => 1,
                "a_data" => u64::from(self.a_data),
                "b_val" => u64::from(self.b_val),
                "b_rdy" => u64::from(self.b_ready()),
                _ => return None,
            };
            Some(value)
        }

        fn write(&mut self, signal: &str, value: u64) -> bool {
            match signal {
                "clk" => self.clk = value != 0,
                "a_val" => self.a_val = value != 0,
                "a_data" => self.a_data = value as u8,
                "b_val" => self.b_val = value != 0,
                _ => return false,
            }
            true
        }

        fn evaluate(&mut self) {
            if self.clk && !self.last_clk {
                if self.a_val {
                    self.a_transfers += 1;
                    self.a_taken = self.a_data;
                }
                if self.b_val && self.b_ready() {
                    self.b_transfers += 1;
                }
                self.edges += 1;
            }
            self.last_clk = self.clk;
        }
    }

    #[test]
    fn test_ready_channel_waits_for_stalled_partner() {
        let mut harness =
            Harness::new(SplitReadyDut::default(), SimulationConfig::default()).unwrap();
        harness.half_cycle().unwrap();

        let requests = [Request::new(A).with("a_data", 0x11), Request::new(B)];
        let amendments = [Amendment::after(1).with("a_data", 0x22)];
        let accepted = harness
            .handshake()
            .submit_requests(&requests, &amendments)
            .unwrap();
        assert_eq!(accepted.wait.cycles, 2);
        assert_eq!(accepted.payload, vec![("a_data", 0x22)]);

        let dut = harness.bus().dut();
        assert_eq!(dut.a_transfers, 1);
        assert_eq!(dut.a_taken, 0x22);
        assert_eq!(dut.b_transfers, 1);
        assert!(!harness.observe_level("a_val").unwrap());
        assert!(!harness.observe_level("b_val").unwrap());
    }
}
