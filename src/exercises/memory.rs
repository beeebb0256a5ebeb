use crate::dut::memory::{
    RD_REQ_ADDR, RD_REQ_RDY, RD_REQ_VAL, RD_RESP_DATA, RD_RESP_RDY, RD_RESP_VAL, WR_REQ_ADDR,
    WR_REQ_DATA, WR_REQ_RDY, WR_REQ_VAL,
};
use crate::handshake::{Channel, Request};
use crate::reference::MemoryImage;
use crate::scenario::{Expected, ResponsePort, Scenario};

pub const WRITE: Channel = Channel::new(WR_REQ_VAL, WR_REQ_RDY);
pub const READ: Channel = Channel::new(RD_REQ_VAL, RD_REQ_RDY);
pub const READ_RESPONSE: ResponsePort =
    ResponsePort::new(Channel::new(RD_RESP_VAL, RD_RESP_RDY), RD_RESP_DATA);

const STATUS: [&str; 5] = [WR_REQ_VAL, WR_REQ_ADDR, WR_REQ_DATA, RD_RESP_VAL, RD_RESP_DATA];

pub fn write(addr: usize, data: u8) -> Request {
    Request::new(WRITE)
        .with(WR_REQ_ADDR, addr as u64)
        .with(WR_REQ_DATA, data.into())
}

pub fn read(addr: usize) -> Request {
    Request::new(READ).with(RD_REQ_ADDR, addr as u64)
}

/// `capacity` and `seed` must match the harness config so the data written
/// here is what the reference image already holds.
pub fn scenarios(capacity: usize, seed: u64) -> Vec<Scenario> {
    let image = MemoryImage::seeded(capacity, seed);
    vec![
        reset(),
        write_then_read_first(),
        write_then_read_every_address(&image),
        write_bypass(),
        read_backpressure(capacity - 2, capacity - 1),
    ]
}

pub fn reset() -> Scenario {
    Scenario::new("reset")
        .drive(RD_RESP_RDY, 1)
        .reset()
        .status(&STATUS)
        .half_cycle()
}

fn stored_write(scenario: Scenario, addr: usize, data: u8) -> Scenario {
    scenario.submit(write(addr, data)).commit_write(addr, data)
}

fn read_back(scenario: Scenario, addr: usize) -> Scenario {
    scenario
        .transaction(read(addr), READ_RESPONSE, Expected::Stored(addr))
        .status(&STATUS)
}

pub fn write_then_read_first() -> Scenario {
    let scenario = stored_write(Scenario::new("write-then-read-first"), 0, 0xab).cycles(1);
    read_back(scenario, 0)
}

pub fn write_then_read_every_address(image: &MemoryImage) -> Scenario {
    let mut scenario = Scenario::new("write-then-read-every-address");
    for (addr, &data) in image.as_bytes().iter().enumerate().skip(1) {
        scenario = read_back(stored_write(scenario, addr, data), addr);
    }
    scenario
}

/// A write and a read of the same address accepted on one edge; the read
/// must return the new byte.
pub fn write_bypass() -> Scenario {
    Scenario::new("write-bypass")
        .cycles(2)
        .submit_all(vec![write(0, 0x65), read(0)], Vec::new())
        .await_response(READ_RESPONSE.channel, true)
        .expect_response(
            READ_RESPONSE,
            Expected::Bypassed {
                addr: 0,
                write: (0, 0x65),
            },
        )
        .commit_write(0, 0x65)
        .status(&STATUS)
        .complete_response()
}

/// Refusing a read response must stall the read-request channel until the
/// response is taken. A read of `competing` is offered during the stall and
/// must not replace the held response; both addresses get distinct bytes
/// first so a replacement always shows.
pub fn read_backpressure(addr: usize, competing: usize) -> Scenario {
    let scenario = Scenario::new("read-backpressure");
    let scenario = stored_write(stored_write(scenario, addr, 0x5a), competing, 0xa5);
    scenario
        .drive(RD_RESP_RDY, 0)
        .cycles(1)
        .expect_level(RD_REQ_RDY, true)
        .submit(read(addr))
        .await_response(READ_RESPONSE.channel, false)
        .expect_level(RD_REQ_RDY, false)
        .drive_all(&[(RD_REQ_VAL, 1), (RD_REQ_ADDR, competing as u64)])
        .cycles(1)
        .expect_level(RD_REQ_RDY, false)
        .cycles(1)
        .expect_level(RD_REQ_RDY, false)
        .status(&STATUS)
        .expect_response(READ_RESPONSE, Expected::Stored(addr))
        .drive_all(&[(RD_REQ_VAL, 0), (RD_RESP_RDY, 1)])
        .complete_response()
        .half_cycle()
        .expect_level(RD_REQ_RDY, true)
        .half_cycle()
        .cycles(3)
}
