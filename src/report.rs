//! Line-oriented console diagnostics.

use std::fmt::Write;

use crate::checker::{DivergenceKind, DivergenceRecord, Summary};

/// `[time] sig: value, sig: value` with values in hex.
pub fn status_line(time: u64, snapshot: &[(&'static str, u64)]) -> String {
    let mut line = format!("[{time}]");
    for (i, (signal, value)) in snapshot.iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        let _ = write!(line, "{sep}{signal}: {value:#x}");
    }
    line
}

/// Per-kind summary followed by every record, one per line.
pub fn divergence_report(label: &str, records: &[DivergenceRecord]) -> String {
    let summary = Summary::from_records(records);
    let mut out = String::new();
    let verdict = if summary.passed() { "PASS" } else { "FAIL" };
    let _ = writeln!(out, "{label}: {verdict} ({} divergence(s))", summary.total());
    for kind in DivergenceKind::ALL {
        let count = summary.count(kind);
        if count > 0 {
            let _ = writeln!(out, "  {kind:<24} {count}");
        }
    }
    for record in records {
        let _ = writeln!(out, "  {record}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(7, &[]), "[7]");
        assert_eq!(
            status_line(30, &[("count", 1), ("full", 0)]),
            "[30] count: 0x1, full: 0x0"
        );
    }

    #[test]
    fn test_report_lists_records() {
        let records = vec![DivergenceRecord {
            cycle_time: 12,
            kind: DivergenceKind::ValueMismatch,
            signal: "data_out",
            expected: 4,
            actual: 2,
            scenario: None,
        }];
        let report = divergence_report("mux", &records);
        let lines: Vec<_> = report.lines().collect();
        assert_eq!(lines[0], "mux: FAIL (1 divergence(s))");
        assert!(lines[1].trim_start().starts_with("value-mismatch"));
        assert_eq!(lines[2], "  [12] value-mismatch: data_out expected 0x4, actual 0x2");

        assert_eq!(divergence_report("mux", &[]), "mux: PASS (0 divergence(s))\n");
    }
}
