//! Exhaustive multiplier sweep split across worker tasks.
//!
//! Every worker owns a separate DUT, clock and checker; nothing is shared
//! while the sweep runs. Results are merged in worker order once all of
//! them have finished.

use std::ops::Range;

use log::info;
use tokio::task;

use crate::checker::{Checker, DivergenceRecord, Summary};
use crate::config::SimulationConfig;
use crate::dut::{Fault, MultiplierDut};
use crate::error::{HarnessError, Result};
use crate::exercises::multiplier;
use crate::harness::Harness;
use crate::scenario::ScenarioRunner;

const OPERAND_VALUES: u16 = 256;

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub workers: usize,
    pub transactions: u64,
    pub records: Vec<DivergenceRecord>,
}

impl SweepReport {
    pub fn summary(&self) -> Summary {
        Summary::from_records(&self.records)
    }
}

/// Split `0..256` into at most `workers` contiguous, non-empty ranges.
pub fn partition(workers: usize) -> Vec<Range<u16>> {
    let workers = workers.clamp(1, usize::from(OPERAND_VALUES));
    let chunk = usize::from(OPERAND_VALUES).div_ceil(workers);
    (0..usize::from(OPERAND_VALUES))
        .step_by(chunk)
        .map(|start| {
            let end = (start + chunk).min(usize::from(OPERAND_VALUES));
            start as u16..end as u16
        })
        .collect()
}

fn sweep_range(operand_a: Range<u16>, config: &SimulationConfig, faults: &[Fault]) -> Result<Checker> {
    let harness = Harness::new(MultiplierDut::new(faults), config.clone())?;
    let mut runner = ScenarioRunner::new(harness);
    runner.run(&[multiplier::reset(), multiplier::exhaustive(operand_a)])?;
    Ok(runner.into_harness().into_checker())
}

pub async fn parallel_multiplier_sweep(
    config: &SimulationConfig,
    faults: &[Fault],
) -> Result<SweepReport> {
    config.validate()?;
    let ranges = partition(config.sweep_workers);
    info!(
        "sweeping {} operand pairs on {} worker(s)",
        u32::from(OPERAND_VALUES) * u32::from(OPERAND_VALUES),
        ranges.len()
    );

    let mut handles = Vec::with_capacity(ranges.len());
    for range in ranges {
        let config = config.clone();
        let faults = faults.to_vec();
        handles.push(task::spawn_blocking(move || {
            sweep_range(range, &config, &faults)
        }));
    }

    let workers = handles.len();
    let mut records = Vec::new();
    for handle in handles {
        let checker = handle
            .await
            .map_err(|err| HarnessError::Worker(err.to_string()))??;
        records.extend(checker.into_records());
    }

    Ok(SweepReport {
        workers,
        transactions: u64::from(OPERAND_VALUES) * u64::from(OPERAND_VALUES),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_all_operands_once() {
        for workers in [1, 3, 7, 16, 256, 1000] {
            let ranges = partition(workers);
            assert!(ranges.len() <= workers.min(256));
            assert_eq!(ranges.first().unwrap().start, 0);
            assert_eq!(ranges.last().unwrap().end, 256);
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert!(ranges.iter().all(|range| !range.is_empty()));
        }
    }

    #[test]
    fn test_partition_sizes() {
        assert_eq!(partition(1), vec![0..256]);
        assert_eq!(partition(3), vec![0..86, 86..172, 172..256]);
    }
}
