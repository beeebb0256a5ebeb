//! Software oracles the checker compares DUT outputs against.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{HarnessError, Result};

/// Full-width product; 8-bit operands never overflow the 16-bit result.
pub fn multiply(a: u8, b: u8) -> u16 {
    u16::from(a) * u16::from(b)
}

/// Byte-addressable image of the memory under test.
///
/// Only accepted writes mutate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: Vec<u8>,
}

impl MemoryImage {
    pub fn zeroed(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
        }
    }

    /// Pseudo-random fill; the same seed always gives the same image.
    pub fn seeded(capacity: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            bytes: (0..capacity).map(|_| rng.gen()).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, addr: usize) -> Result<()> {
        if addr < self.bytes.len() {
            Ok(())
        } else {
            Err(HarnessError::AddressOutOfRange {
                addr,
                capacity: self.bytes.len(),
            })
        }
    }

    pub fn read(&self, addr: usize) -> Result<u8> {
        self.check(addr)?;
        Ok(self.bytes[addr])
    }

    pub fn write(&mut self, addr: usize, data: u8) -> Result<()> {
        self.check(addr)?;
        self.bytes[addr] = data;
        Ok(())
    }

    /// Value a read of `addr` returns when `write` is accepted on the same
    /// edge: a write to the same address is forwarded, anything else reads
    /// the stored byte.
    pub fn read_bypassed(&self, addr: usize, write: Option<(usize, u8)>) -> Result<u8> {
        match write {
            Some((waddr, data)) if waddr == addr => {
                self.check(waddr)?;
                Ok(data)
            }
            _ => self.read(addr),
        }
    }
}

/// Expected-value source for a run.
#[derive(Debug, Clone)]
pub struct ReferenceModel {
    memory: MemoryImage,
}

impl ReferenceModel {
    pub fn new(memory_capacity: usize, seed: u64) -> Self {
        Self {
            memory: MemoryImage::seeded(memory_capacity, seed),
        }
    }

    pub fn product(&self, a: u8, b: u8) -> u16 {
        multiply(a, b)
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryImage {
        &mut self.memory
    }
}
