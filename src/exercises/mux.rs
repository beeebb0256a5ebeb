use crate::dut::mux::{DATA, DATA_OUT, DATA_SEL};
use crate::scenario::Scenario;

const STATUS: [&str; 6] = [DATA[0], DATA[1], DATA[2], DATA[3], DATA_SEL, DATA_OUT];

pub fn scenarios() -> Vec<Scenario> {
    vec![select_each_input(), output_follows_data(), select_order()]
}

/// Walk the select through all four inputs, checking in the same time step.
pub fn select_each_input() -> Scenario {
    let mut scenario = Scenario::new("select-each-input")
        .drive_all(&[(DATA[0], 1), (DATA[1], 2), (DATA[2], 3), (DATA[3], 4)])
        .drive(DATA_SEL, 0)
        .tick(1)
        .status(&STATUS)
        .expect_value(DATA_OUT, 1);
    for sel in 1..4u64 {
        scenario = scenario
            .drive(DATA_SEL, sel)
            .tick(1)
            .status(&STATUS)
            .expect_value(DATA_OUT, sel + 1);
    }
    scenario
}

/// A data change on the selected input shows up without a select change.
pub fn output_follows_data() -> Scenario {
    Scenario::new("output-follows-data")
        .drive(DATA[3], 8)
        .tick(1)
        .expect_value(DATA_OUT, 8)
        .status(&STATUS)
}

pub fn select_order() -> Scenario {
    let mut scenario = Scenario::new("select-order")
        .drive_all(&[(DATA[0], 0x10), (DATA[1], 0x20), (DATA[2], 0x40), (DATA[3], 0x80)]);
    for sel in [3u64, 1, 2, 0] {
        scenario = scenario
            .drive(DATA_SEL, sel)
            .tick(1)
            .expect_value(DATA_OUT, 0x10 << sel);
    }
    scenario.tick(2)
}
