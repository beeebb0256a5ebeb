//! Advisory comparison of DUT outputs against expected values.
//!
//! Every check appends to an append-only divergence log and logs a warning;
//! nothing here stops a run.

use std::collections::BTreeMap;
use std::fmt;

use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DivergenceKind {
    /// A ready/valid signal did not assert within the timeout.
    ProtocolStall,
    /// The observed value differs from the reference model.
    ValueMismatch,
    /// A response was sampled while its valid flag was low.
    NotValidWhenExpected,
    /// A status or handshake flag disagrees with the state it reflects.
    FlagInconsistency,
}

impl DivergenceKind {
    pub const ALL: [DivergenceKind; 4] = [
        DivergenceKind::ProtocolStall,
        DivergenceKind::ValueMismatch,
        DivergenceKind::NotValidWhenExpected,
        DivergenceKind::FlagInconsistency,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DivergenceKind::ProtocolStall => "protocol-stall",
            DivergenceKind::ValueMismatch => "value-mismatch",
            DivergenceKind::NotValidWhenExpected => "not-valid-when-expected",
            DivergenceKind::FlagInconsistency => "flag-inconsistency",
        }
    }
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded divergence. For stalls `expected` is the timeout threshold
/// and `actual` the cycles waited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceRecord {
    pub cycle_time: u64,
    pub kind: DivergenceKind,
    pub signal: &'static str,
    pub expected: u64,
    pub actual: u64,
    pub scenario: Option<String>,
}

impl fmt::Display for DivergenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: ", self.cycle_time, self.kind)?;
        match self.kind {
            DivergenceKind::ProtocolStall => write!(
                f,
                "may have timed out waiting for {} ({} cycles)",
                self.signal, self.actual
            )?,
            DivergenceKind::NotValidWhenExpected => write!(
                f,
                "{} not valid, expected {:#x}",
                self.signal, self.expected
            )?,
            DivergenceKind::ValueMismatch | DivergenceKind::FlagInconsistency => write!(
                f,
                "{} expected {:#x}, actual {:#x}",
                self.signal, self.expected, self.actual
            )?,
        }
        if let Some(scenario) = &self.scenario {
            write!(f, " in `{scenario}`")?;
        }
        Ok(())
    }
}

/// Divergence counts per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    counts: BTreeMap<DivergenceKind, usize>,
}

impl Summary {
    pub fn from_records(records: &[DivergenceRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            *summary.counts.entry(record.kind).or_default() += 1;
        }
        summary
    }

    pub fn count(&self, kind: DivergenceKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn passed(&self) -> bool {
        self.total() == 0
    }

    pub fn merge(&mut self, other: &Summary) {
        for (kind, count) in &other.counts {
            *self.counts.entry(*kind).or_default() += count;
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} divergence(s)", self.total())?;
        for kind in DivergenceKind::ALL {
            write!(f, ", {}: {}", kind, self.count(kind))?;
        }
        Ok(())
    }
}

/// Snapshot of the counter outputs taken after an evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSample {
    pub count: u64,
    pub full: bool,
    pub empty: bool,
}

#[derive(Debug, Default)]
pub struct Checker {
    records: Vec<DivergenceRecord>,
    scenario: Option<String>,
}

impl Checker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label attached to records until changed.
    pub fn set_scenario(&mut self, name: impl Into<String>) {
        self.scenario = Some(name.into());
    }

    pub fn records(&self) -> &[DivergenceRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DivergenceRecord> {
        self.records
    }

    pub fn is_clean(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> Summary {
        Summary::from_records(&self.records)
    }

    fn record(
        &mut self,
        cycle_time: u64,
        kind: DivergenceKind,
        signal: &'static str,
        expected: u64,
        actual: u64,
    ) {
        let record = DivergenceRecord {
            cycle_time,
            kind,
            signal,
            expected,
            actual,
            scenario: self.scenario.clone(),
        };
        warn!("{record}");
        self.records.push(record);
    }

    /// Compare a handshake response. Returns `true` when it matched.
    pub fn check_response(
        &mut self,
        cycle_time: u64,
        valid_signal: &'static str,
        data_signal: &'static str,
        expected: u64,
        observed_valid: bool,
        observed_value: u64,
    ) -> bool {
        if !observed_valid {
            self.record(
                cycle_time,
                DivergenceKind::NotValidWhenExpected,
                valid_signal,
                expected,
                observed_value,
            );
            return false;
        }
        self.check_value(cycle_time, data_signal, expected, observed_value)
    }

    pub fn check_value(
        &mut self,
        cycle_time: u64,
        signal: &'static str,
        expected: u64,
        actual: u64,
    ) -> bool {
        if expected == actual {
            return true;
        }
        self.record(
            cycle_time,
            DivergenceKind::ValueMismatch,
            signal,
            expected,
            actual,
        );
        false
    }

    /// A handshake or status flag that must sit at a known level.
    pub fn check_level(
        &mut self,
        cycle_time: u64,
        signal: &'static str,
        expected: bool,
        actual: bool,
    ) -> bool {
        if expected == actual {
            return true;
        }
        self.record(
            cycle_time,
            DivergenceKind::FlagInconsistency,
            signal,
            expected as u64,
            actual as u64,
        );
        false
    }

    /// Three independent checks: the count itself, `full` against
    /// `count == capacity` and `empty` against `count == 0`.
    pub fn check_counter(
        &mut self,
        cycle_time: u64,
        signals: (&'static str, &'static str, &'static str),
        sample: CounterSample,
        expected_count: u64,
        capacity: u64,
    ) -> bool {
        let (count_signal, full_signal, empty_signal) = signals;
        let count_ok = self.check_value(cycle_time, count_signal, expected_count, sample.count);
        let full_ok = self.check_level(
            cycle_time,
            full_signal,
            sample.count == capacity,
            sample.full,
        );
        let empty_ok = self.check_level(cycle_time, empty_signal, sample.count == 0, sample.empty);
        count_ok && full_ok && empty_ok
    }

    pub fn record_stall(&mut self, cycle_time: u64, signal: &'static str, timeout: u64, waited: u64) {
        self.record(
            cycle_time,
            DivergenceKind::ProtocolStall,
            signal,
            timeout,
            waited,
        );
    }
}
