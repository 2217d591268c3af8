//! Micro-benchmarks driven by the PMU cycle counter.
#[cfg(test)]
#[macro_use]
extern crate approx;

pub mod config;
pub mod error;
pub mod report;
pub mod stats;

use clap::builder::RangedU64ValueParser;
use clap::{ArgAction, Parser, Subcommand};
use config::{read_configuration, BenchConfig};
use error::BenchResult;
use log::{debug, info};
use pmu_clock::{CycleCounter, CycleDelta, DefaultBackend, PmuBackend};
use report::{write_report, Report, ReportFormat, SpinRow};
use stats::Summary;
use std::hint::black_box;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// RON file with default settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Report format, overrides the configuration file.
    #[arg(short, long)]
    pub format: Option<ReportFormat>,

    /// More logging, repeat for more.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check user mode access to the PMU and take one reading
    Probe,
    /// Cost of two back-to-back timestamp reads
    Overhead {
        #[arg(short, long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        samples: Option<usize>,
    },
    /// Cycles taken by empty loops of increasing length
    Spin {
        #[arg(short, long, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
        samples: Option<usize>,
        /// Loop lengths, comma separated (ex: 1,10,100).
        #[arg(short, long, value_delimiter = ',')]
        iterations: Vec<u64>,
    },
}

#[cfg(all(target_arch = "arm", not(target_feature = "mclass")))]
const BACKEND_NAME: &str = "cp15";
#[cfg(not(target_arch = "arm"))]
const BACKEND_NAME: &str = "host";

/// Samples the cost of taking two timestamps with nothing in between.
pub fn overhead<B: PmuBackend>(counter: &CycleCounter<B>, samples: usize) -> Option<Summary> {
    let deltas: Vec<CycleDelta> = (0..samples).map(|_| counter.measure(|| ()).1).collect();
    Summary::from_deltas(&deltas)
}

/// Times an empty loop of `iterations` turns, `samples` times.
pub fn spin<B: PmuBackend>(
    counter: &CycleCounter<B>,
    iterations: u64,
    samples: usize,
) -> Option<Summary> {
    let deltas: Vec<CycleDelta> = (0..samples)
        .map(|_| {
            counter
                .measure(|| {
                    for i in 0..iterations {
                        black_box(i);
                    }
                })
                .1
        })
        .collect();
    Summary::from_deltas(&deltas)
}

/// Runs one command against `counter`.
pub fn execute<B: PmuBackend>(
    counter: &CycleCounter<B>,
    backend: &'static str,
    command: &Command,
    config: &BenchConfig,
) -> BenchResult<Report> {
    match command {
        Command::Probe => {
            let user_access = counter.backend().user_access_enabled();
            // Reading with access disabled would kill the process.
            let first_read = if user_access { counter.raw_read() } else { 0 };
            Ok(Report::Probe {
                backend,
                user_access,
                first_read,
            })
        }
        Command::Overhead { samples } => {
            let samples = samples.unwrap_or(config.samples);
            debug!("measuring read overhead over {samples} samples");
            let summary = overhead(counter, samples).ok_or_else(no_samples)?;
            Ok(Report::Overhead(summary))
        }
        Command::Spin {
            samples,
            iterations,
        } => {
            let samples = samples.unwrap_or(config.samples);
            let iterations = if iterations.is_empty() {
                &config.iterations
            } else {
                iterations
            };
            let mut rows = Vec::with_capacity(iterations.len());
            for &n in iterations {
                debug!("spinning {n} iterations, {samples} samples");
                let cycles = spin(counter, n, samples).ok_or_else(no_samples)?;
                rows.push(SpinRow {
                    iterations: n,
                    cycles,
                });
            }
            Ok(Report::Spin { rows })
        }
    }
}

fn no_samples() -> error::BenchError {
    error::BenchError::Report("no samples collected".to_string())
}

/// Entry point of the `pmu-bench` binary, writes the report to `out`.
pub fn run(cli: &Cli, out: &mut dyn Write) -> BenchResult<()> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            read_configuration(path)?
        }
        None => BenchConfig::default(),
    };
    if let Some(format) = cli.format {
        config.format = format;
    }

    let report = match cli.command {
        // The probe must survive a disabled PMU, so it skips the precondition check.
        Command::Probe => {
            let counter = CycleCounter::new(DefaultBackend::default());
            execute(&counter, BACKEND_NAME, &cli.command, &config)?
        }
        _ => {
            let counter = CycleCounter::try_new(DefaultBackend::default())?;
            execute(&counter, BACKEND_NAME, &cli.command, &config)?
        }
    };
    write_report(&report, config.format, out)
}
