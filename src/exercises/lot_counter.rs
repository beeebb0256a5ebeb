use crate::dut::lot_counter::{COUNT, EMPTY, FULL, INNER_SENSOR, OUTER_SENSOR};
use crate::scenario::{CounterPorts, Scenario};

const STATUS: [&str; 5] = [INNER_SENSOR, OUTER_SENSOR, COUNT, FULL, EMPTY];

fn ports(capacity: u32) -> CounterPorts {
    CounterPorts {
        count: COUNT,
        full: FULL,
        empty: EMPTY,
        capacity: u64::from(capacity),
    }
}

pub fn scenarios(capacity: u32) -> Vec<Scenario> {
    vec![
        Scenario::new("reset").reset().status(&STATUS),
        one_car_enters(capacity),
        fill_the_lot(capacity),
        one_car_leaves(capacity),
        empty_the_lot(capacity),
        hold_on_enter(capacity),
        hold_on_exit(capacity),
    ]
}

/// Step each `(outer, inner)` level pair for `hold` cycles and check that
/// the count has not moved yet; the final release must move it to `after`.
fn sequence(
    mut scenario: Scenario,
    capacity: u32,
    levels: [(u64, u64, u32); 3],
    release: (u64, u64),
    before: u64,
    after: u64,
) -> Scenario {
    for (outer, inner, hold) in levels {
        scenario = scenario
            .drive_all(&[(OUTER_SENSOR, outer), (INNER_SENSOR, inner)])
            .cycles(hold)
            .expect_count(ports(capacity), before);
    }
    scenario
        .drive_all(&[(OUTER_SENSOR, release.0), (INNER_SENSOR, release.1)])
        .cycles(1)
        .status(&STATUS)
        .expect_count(ports(capacity), after)
}

fn enter(scenario: Scenario, capacity: u32, before: u64) -> Scenario {
    let levels = [(1, 0, 1), (1, 1, 1), (0, 1, 1)];
    sequence(scenario, capacity, levels, (0, 0), before, before + 1)
}

fn leave(scenario: Scenario, capacity: u32, before: u64) -> Scenario {
    let levels = [(0, 1, 1), (1, 1, 1), (1, 0, 1)];
    sequence(scenario, capacity, levels, (0, 0), before, before - 1)
}

pub fn one_car_enters(capacity: u32) -> Scenario {
    enter(Scenario::new("one-car-enters"), capacity, 0)
}

pub fn fill_the_lot(capacity: u32) -> Scenario {
    let capacity_u64 = u64::from(capacity);
    (1..capacity_u64).fold(Scenario::new("fill-the-lot"), |scenario, count| {
        enter(scenario, capacity, count)
    })
}

pub fn one_car_leaves(capacity: u32) -> Scenario {
    leave(Scenario::new("one-car-leaves"), capacity, u64::from(capacity))
}

pub fn empty_the_lot(capacity: u32) -> Scenario {
    let capacity_u64 = u64::from(capacity);
    (1..capacity_u64).rev().fold(Scenario::new("empty-the-lot"), |scenario, count| {
        leave(scenario, capacity, count)
    })
}

/// Multi-cycle sensor levels still count one car.
pub fn hold_on_enter(capacity: u32) -> Scenario {
    let levels = [(1, 0, 4), (1, 1, 3), (0, 1, 2)];
    sequence(Scenario::new("hold-on-enter"), capacity, levels, (0, 0), 0, 1)
}

pub fn hold_on_exit(capacity: u32) -> Scenario {
    let levels = [(0, 1, 2), (1, 1, 5), (1, 0, 3)];
    sequence(Scenario::new("hold-on-exit"), capacity, levels, (0, 0), 1, 0)
}
