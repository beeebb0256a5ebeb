use std::ops::Range;

use crate::dut::multiplier::{
    REQ_OPERAND_A, REQ_OPERAND_B, REQ_RDY, REQ_VAL, RESP_PRODUCT, RESP_RDY, RESP_VAL,
};
use crate::handshake::{Amendment, Channel, Request};
use crate::scenario::{Expected, ResponsePort, Scenario};

pub const REQUEST: Channel = Channel::new(REQ_VAL, REQ_RDY);
pub const RESPONSE: ResponsePort =
    ResponsePort::new(Channel::new(RESP_VAL, RESP_RDY), RESP_PRODUCT);

const STATUS: [&str; 5] = [REQ_VAL, REQ_OPERAND_A, REQ_OPERAND_B, RESP_VAL, RESP_PRODUCT];

pub fn multiply(a: u8, b: u8) -> Request {
    Request::new(REQUEST)
        .with(REQ_OPERAND_A, a.into())
        .with(REQ_OPERAND_B, b.into())
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        reset(),
        basic(),
        exhaustive(0..256),
        change_while_busy(),
        change_before_ready(),
        backpressure(),
    ]
}

/// Reset, then move to the drive phase with the consumer ready.
pub fn reset() -> Scenario {
    Scenario::new("reset")
        .drive(RESP_RDY, 1)
        .reset()
        .status(&STATUS)
        .half_cycle()
}

fn product(scenario: Scenario, a: u8, b: u8) -> Scenario {
    scenario.transaction(multiply(a, b), RESPONSE, Expected::Product(a, b))
}

pub fn basic() -> Scenario {
    [(4, 1), (4, 0), (1, 4), (0, 4)]
        .into_iter()
        .fold(Scenario::new("basic"), |scenario, (a, b)| {
            product(scenario, a, b)
        })
        .status(&STATUS)
}

/// Every `b` for each `a` in `operand_a`.
pub fn exhaustive(operand_a: Range<u16>) -> Scenario {
    let name = format!("exhaustive-a{}..{}", operand_a.start, operand_a.end);
    let mut scenario = Scenario::new(name);
    for a in operand_a.filter_map(|a| u8::try_from(a).ok()) {
        for b in 0..=u8::MAX {
            scenario = product(scenario, a, b);
        }
    }
    scenario
}

/// New operands and `valid` after acceptance must not disturb the product
/// already in flight.
pub fn change_while_busy() -> Scenario {
    Scenario::new("change-while-busy")
        .submit(multiply(1, 10))
        .drive_all(&[(REQ_VAL, 1), (REQ_OPERAND_A, 0x32), (REQ_OPERAND_B, 0x16)])
        .cycles(2)
        .drive(REQ_VAL, 0)
        .await_response(RESPONSE.channel, true)
        .expect_response(RESPONSE, Expected::Product(1, 10))
        .complete_response()
}

/// While a held result keeps `req_rdy` low, the operands change twice and
/// only the last pair is on the wires when the request finally goes in.
pub fn change_before_ready() -> Scenario {
    let amendments = vec![
        Amendment::after(2)
            .with(REQ_OPERAND_A, 11)
            .with(REQ_OPERAND_B, 13),
        Amendment::after(3).with(RESP_RDY, 1),
    ];
    Scenario::new("change-before-ready")
        .drive(RESP_RDY, 0)
        .submit(multiply(3, 5))
        .await_response(RESPONSE.channel, false)
        .expect_response(RESPONSE, Expected::Product(3, 5))
        .half_cycle()
        .submit_all(vec![multiply(7, 9)], amendments)
        .await_response(RESPONSE.channel, true)
        .expect_response(RESPONSE, Expected::Product(11, 13))
        .complete_response()
}

/// A result the consumer refuses must keep `req_rdy` low until it is taken,
/// and a competing request offered meanwhile must not displace it.
pub fn backpressure() -> Scenario {
    Scenario::new("backpressure")
        .drive(RESP_RDY, 0)
        .submit(multiply(15, 1))
        .await_response(RESPONSE.channel, false)
        .expect_level(REQ_RDY, false)
        .drive_all(&[(REQ_VAL, 1), (REQ_OPERAND_A, 0x54), (REQ_OPERAND_B, 0x16)])
        .cycles(1)
        .expect_level(REQ_RDY, false)
        .cycles(1)
        .expect_level(REQ_RDY, false)
        .status(&STATUS)
        .expect_response(RESPONSE, Expected::Product(15, 1))
        .drive_all(&[(REQ_VAL, 0), (RESP_RDY, 1)])
        .complete_response()
        .half_cycle()
        .expect_level(REQ_RDY, true)
        .half_cycle()
        .cycles(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Step;

    #[test]
    fn test_backpressure_offers_a_competing_request() {
        let scenario = backpressure();
        let steps = scenario.steps();
        let raised = steps
            .iter()
            .position(|step| matches!(step, Step::Drive(d) if d.contains(&(REQ_VAL, 1))))
            .unwrap();
        let checked = steps
            .iter()
            .position(|step| matches!(step, Step::ExpectResponse { .. }))
            .unwrap();
        assert!(raised < checked);
        assert!(matches!(
            &steps[checked + 1],
            Step::Drive(d) if d.contains(&(REQ_VAL, 0)) && d.contains(&(RESP_RDY, 1))
        ));
    }

    #[test]
    fn test_exhaustive_covers_every_pair_in_range() {
        let scenario = exhaustive(3..5);
        assert_eq!(scenario.steps().len(), 2 * 256);
        assert!(matches!(
            scenario.steps()[256],
            Step::Transaction {
                expected: Expected::Product(4, 0),
                ..
            }
        ));
    }
}
