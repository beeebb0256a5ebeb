use proptest::prelude::*;

use rvbench::dut::{lot_counter, multiplier, mux, LotCounterDut, MemoryDut, MultiplierDut, MuxDut};
use rvbench::exercises::{self, memory};
use rvbench::{
    Checker, CounterPorts, DivergenceKind, Dut, Expected, Fault, Harness, Scenario,
    ScenarioRunner, SimulationConfig, TimeoutGuard, WaitOutcome,
};

/// Property testing helper functions
struct PropertyHelper {
    config: SimulationConfig,
}

impl PropertyHelper {
    fn new() -> Self {
        Self {
            config: SimulationConfig::default(),
        }
    }

    fn with_lot_capacity(capacity: u32) -> Self {
        Self {
            config: SimulationConfig {
                lot_capacity: capacity,
                ..SimulationConfig::default()
            },
        }
    }

    fn run<D: Dut>(&self, dut: D, scenarios: &[Scenario]) -> Checker {
        let harness = Harness::new(dut, self.config.clone()).unwrap();
        let mut runner = ScenarioRunner::new(harness);
        runner.run(scenarios).unwrap();
        runner.into_harness().into_checker()
    }
}

fn counter_ports(capacity: u32) -> CounterPorts {
    CounterPorts {
        count: lot_counter::COUNT,
        full: lot_counter::FULL,
        empty: lot_counter::EMPTY,
        capacity: u64::from(capacity),
    }
}

/// One car through the sensors, each level held for its own number of
/// cycles, with the count checked after every level and after release.
fn pass_through(
    mut scenario: Scenario,
    capacity: u32,
    levels: [(u64, u64, u32); 3],
    before: u64,
    after: u64,
) -> Scenario {
    for (outer, inner, hold) in levels {
        scenario = scenario
            .drive_all(&[
                (lot_counter::OUTER_SENSOR, outer),
                (lot_counter::INNER_SENSOR, inner),
            ])
            .cycles(hold)
            .expect_count(counter_ports(capacity), before);
    }
    scenario
        .drive_all(&[
            (lot_counter::OUTER_SENSOR, 0),
            (lot_counter::INNER_SENSOR, 0),
        ])
        .cycles(1)
        .expect_count(counter_ports(capacity), after)
}

fn lot_reset() -> Scenario {
    Scenario::new("reset").reset()
}

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Generate an 8-bit operand
    fn operand() -> impl Strategy<Value = u8> {
        any::<u8>()
    }

    /// Generate an address inside the default 8-byte memory
    fn address() -> impl Strategy<Value = usize> {
        0usize..8
    }

    /// Generate a sensor hold length in cycles
    fn hold() -> impl Strategy<Value = u32> {
        1u32..6
    }

    /// Generate a small lot capacity so sequences hit both saturation points
    fn lot_capacity() -> impl Strategy<Value = u32> {
        1u32..5
    }

    /// Generate a sequence of cars arriving (true) or leaving (false)
    fn traffic() -> impl Strategy<Value = Vec<bool>> {
        prop::collection::vec(any::<bool>(), 1..16)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: every product comes back equal to the full-width reference product
        #[test]
        fn prop_products_match_reference(
            pairs in prop::collection::vec((operand(), operand()), 1..8)
        ) {
            let mut scenario = Scenario::new("random-products");
            for &(a, b) in &pairs {
                scenario = scenario.transaction(
                    exercises::multiplier::multiply(a, b),
                    exercises::multiplier::RESPONSE,
                    Expected::Product(a, b),
                );
            }
            let checker = PropertyHelper::new().run(
                MultiplierDut::new(&[]),
                &[exercises::multiplier::reset(), scenario],
            );
            prop_assert!(checker.is_clean(), "{:?}", checker.records());
            for (a, b) in pairs {
                prop_assert_eq!(u32::from(rvbench::multiply(a, b)), u32::from(a) * u32::from(b));
            }
        }

        /// Property: a read returns the last byte written to that address
        #[test]
        fn prop_memory_reads_last_write(
            writes in prop::collection::vec((address(), any::<u8>()), 1..12)
        ) {
            let mut scenario = Scenario::new("random-writes");
            for &(addr, data) in &writes {
                scenario = scenario
                    .submit(memory::write(addr, data))
                    .commit_write(addr, data);
            }
            let mut read_back = Scenario::new("random-reads").cycles(1);
            for &(addr, _) in &writes {
                read_back = read_back.transaction(
                    memory::read(addr),
                    memory::READ_RESPONSE,
                    Expected::Stored(addr),
                );
            }
            let checker = PropertyHelper::new().run(
                MemoryDut::new(8, &[]),
                &[memory::reset(), scenario, read_back],
            );
            prop_assert!(checker.is_clean(), "{:?}", checker.records());
        }

        /// Property: a same-edge write and read of one address returns the new
        /// byte, and a memory without forwarding is caught whenever the old and
        /// new bytes differ
        #[test]
        fn prop_write_bypass(addr in address(), old in any::<u8>(), new in any::<u8>()) {
            let scenario = Scenario::new("bypass")
                .submit(memory::write(addr, old))
                .commit_write(addr, old)
                .cycles(1)
                .submit_all(vec![memory::write(addr, new), memory::read(addr)], Vec::new())
                .await_response(memory::READ_RESPONSE.channel, true)
                .expect_response(
                    memory::READ_RESPONSE,
                    Expected::Bypassed { addr, write: (addr, new) },
                )
                .commit_write(addr, new)
                .complete_response();
            let scenarios = [memory::reset(), scenario];

            let helper = PropertyHelper::new();
            let clean = helper.run(MemoryDut::new(8, &[]), &scenarios);
            prop_assert!(clean.is_clean(), "{:?}", clean.records());

            let faulty = helper.run(MemoryDut::new(8, &[Fault::NoWriteBypass]), &scenarios);
            prop_assert_eq!(faulty.records().len(), usize::from(old != new));
        }

        /// Property: while a result is refused, req_rdy stays low and the
        /// product stays on the wires for as long as the refusal lasts
        #[test]
        fn prop_backpressure_holds_result(a in operand(), b in operand(), held in 1u32..6) {
            let response = exercises::multiplier::RESPONSE;
            let mut scenario = Scenario::new("held-result")
                .drive(multiplier::RESP_RDY, 0)
                .submit(exercises::multiplier::multiply(a, b))
                .await_response(response.channel, false);
            for _ in 0..held {
                scenario = scenario
                    .expect_level(multiplier::REQ_RDY, false)
                    .expect_response(response, Expected::Product(a, b))
                    .cycles(1);
            }
            let scenario = scenario
                .drive(multiplier::RESP_RDY, 1)
                .complete_response()
                .half_cycle()
                .expect_level(multiplier::REQ_RDY, true)
                .half_cycle();
            let scenarios = [exercises::multiplier::reset(), scenario];

            let helper = PropertyHelper::new();
            let clean = helper.run(MultiplierDut::new(&[]), &scenarios);
            prop_assert!(clean.is_clean(), "{:?}", clean.records());

            let faulty = helper.run(MultiplierDut::new(&[Fault::IgnoreBackpressure]), &scenarios);
            prop_assert_eq!(
                faulty.summary().count(DivergenceKind::FlagInconsistency),
                held as usize
            );
            prop_assert_eq!(faulty.summary().total(), held as usize);
        }

        /// Property: full and empty track the saturating count over any
        /// sequence of arrivals and departures
        #[test]
        fn prop_lot_flags_follow_count(capacity in lot_capacity(), cars in traffic()) {
            let cap = u64::from(capacity);
            let mut count = 0u64;
            let mut scenario = Scenario::new("traffic");
            for arriving in cars {
                let (levels, after) = if arriving {
                    ([(1, 0, 1), (1, 1, 1), (0, 1, 1)], (count + 1).min(cap))
                } else {
                    ([(0, 1, 1), (1, 1, 1), (1, 0, 1)], count.saturating_sub(1))
                };
                scenario = pass_through(scenario, capacity, levels, count, after);
                count = after;
            }

            let helper = PropertyHelper::with_lot_capacity(capacity);
            let scenarios = [lot_reset(), scenario];
            let checker = helper.run(LotCounterDut::new(capacity, &[]), &scenarios);
            prop_assert!(checker.is_clean(), "{:?}", checker.records());
        }

        /// Property: a car counts once however long each sensor level is held
        #[test]
        fn prop_held_levels_count_once(
            enter in (hold(), hold(), hold()),
            leave in (hold(), hold(), hold()),
        ) {
            let scenario = pass_through(
                Scenario::new("held-enter"),
                16,
                [(1, 0, enter.0), (1, 1, enter.1), (0, 1, enter.2)],
                0,
                1,
            );
            let scenario = pass_through(
                scenario,
                16,
                [(0, 1, leave.0), (1, 1, leave.1), (1, 0, leave.2)],
                1,
                0,
            );
            let helper = PropertyHelper::with_lot_capacity(16);
            let checker = helper.run(LotCounterDut::new(16, &[]), &[lot_reset(), scenario]);
            prop_assert!(checker.is_clean(), "{:?}", checker.records());
        }

        /// Property: the mux output is always the selected input
        #[test]
        fn prop_mux_selects(data in prop::array::uniform4(any::<u8>()), sel in 0usize..4) {
            let scenario = Scenario::new("random-select")
                .drive_all(&[
                    (mux::DATA[0], u64::from(data[0])),
                    (mux::DATA[1], u64::from(data[1])),
                    (mux::DATA[2], u64::from(data[2])),
                    (mux::DATA[3], u64::from(data[3])),
                ])
                .drive(mux::DATA_SEL, sel as u64)
                .tick(1)
                .expect_value(mux::DATA_OUT, u64::from(data[sel]));
            let checker = PropertyHelper::new().run(MuxDut::new(&[]), &[scenario]);
            prop_assert!(checker.is_clean(), "{:?}", checker.records());
        }

        /// Property: a wait reports its timeout exactly once, and only when it
        /// actually reached the threshold
        #[test]
        fn prop_timeout_fires_once(timeout in 1u64..64, misses in 0u64..128) {
            let mut guard = TimeoutGuard::new(timeout);
            let fired = (0..misses)
                .filter(|_| guard.poll(false) == WaitOutcome::TimedOut)
                .count();
            prop_assert_eq!(fired, usize::from(misses >= timeout));
            prop_assert_eq!(guard.poll(true), WaitOutcome::Accepted);
            prop_assert_eq!(guard.waited(), misses);
        }

        /// Property: time moves by two half periods per full cycle
        #[test]
        fn prop_cycles_advance_time(half_period in 1u32..10, count in 0u32..20) {
            let config = SimulationConfig { half_period, ..SimulationConfig::default() };
            let mut harness = Harness::new(LotCounterDut::new(16, &[]), config).unwrap();
            let start = harness.time();
            harness.cycles(count).unwrap();
            prop_assert_eq!(harness.time() - start, 2 * u64::from(count) * u64::from(half_period));
        }
    }
}
