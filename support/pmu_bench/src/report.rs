use crate::error::BenchResult;
use crate::stats::Summary;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io::Write;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Timing of an empty loop of `iterations` turns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpinRow {
    pub iterations: u64,
    pub cycles: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    Probe {
        backend: &'static str,
        user_access: bool,
        first_read: u32,
    },
    Overhead(Summary),
    Spin { rows: Vec<SpinRow> },
}

fn write_summary(out: &mut dyn Write, label: &str, s: &Summary) -> BenchResult<()> {
    writeln!(
        out,
        "{label:>10} | n: {:6} | min: {:10} | median: {:10} | max: {:10} | mean: {:15.4} | sd: {:15.4} | cv: {:6.4}",
        s.samples, s.min, s.median, s.max, s.mean, s.stddev, s.cv
    )?;
    Ok(())
}

/// Writes `report` to `out` in the requested format.
pub fn write_report(report: &Report, format: ReportFormat, out: &mut dyn Write) -> BenchResult<()> {
    match format {
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, report)?;
            writeln!(out)?;
        }
        ReportFormat::Text => match report {
            Report::Probe {
                backend,
                user_access,
                first_read,
            } => {
                writeln!(out, "backend:     {backend}")?;
                writeln!(out, "user access: {user_access}")?;
                writeln!(out, "first read:  {first_read:#010x}")?;
            }
            Report::Overhead(summary) => write_summary(out, "read", summary)?,
            Report::Spin { rows } => {
                for row in rows {
                    write_summary(out, &row.iterations.to_string(), &row.cycles)?;
                }
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmu_clock::CycleDelta;

    fn summary() -> Summary {
        Summary::from_deltas(&[CycleDelta(10), CycleDelta(20)]).unwrap()
    }

    #[test]
    fn test_json_is_tagged() {
        let mut out = Vec::new();
        write_report(&Report::Overhead(summary()), ReportFormat::Json, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["command"], "overhead");
        assert_eq!(value["min"], 10);
        assert_eq!(value["max"], 20);
    }

    #[test]
    fn test_text_has_one_line_per_row() {
        let rows = vec![
            SpinRow {
                iterations: 1,
                cycles: summary(),
            },
            SpinRow {
                iterations: 100,
                cycles: summary(),
            },
        ];
        let mut out = Vec::new();
        write_report(&Report::Spin { rows }, ReportFormat::Text, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().trim_start().starts_with("100 |"));
    }

    #[test]
    fn test_probe_text() {
        let report = Report::Probe {
            backend: "mock",
            user_access: true,
            first_read: 0x10,
        };
        let mut out = Vec::new();
        write_report(&report, ReportFormat::Text, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("0x00000010"));
        assert!(text.contains("mock"));
    }
}
