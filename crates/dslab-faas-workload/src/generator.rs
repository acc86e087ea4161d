//! End-to-end trace generation: profiles are sampled, merged and written out.
use std::io::Write;
use std::path::Path;

use log::info;

use crate::config::{load_profiles, FunctionProfile};
use crate::error::WorkloadError;
use crate::merge::StreamMerger;
use crate::sampler::{sample_all, ArrivalProcess};
use crate::writer::TraceWriter;

/// Counts of the generated trace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceSummary {
    pub events: usize,
    /// Absolute time of the last event, which is also the sum of all intervals.
    pub last_timestamp: u64,
    pub per_function: Vec<(String, usize)>,
}

impl TraceSummary {
    fn from_processes(processes: &[ArrivalProcess]) -> Self {
        Self {
            events: processes.iter().map(|p| p.len()).sum(),
            last_timestamp: processes.iter().filter_map(|p| p.last_timestamp()).max().unwrap_or(0),
            per_function: processes.iter().map(|p| (p.function.clone(), p.len())).collect(),
        }
    }

    pub fn log(&self) {
        for (name, count) in &self.per_function {
            info!("{}: {} invocations", name, count);
        }
        info!("total: {} invocations over {} ms", self.events, self.last_timestamp);
    }
}

pub struct TraceGenerator {
    profiles: Vec<FunctionProfile>,
    seed: u64,
}

impl TraceGenerator {
    pub fn new(profiles: Vec<FunctionProfile>, seed: u64) -> Self {
        Self { profiles, seed }
    }

    pub fn profiles(&self) -> &[FunctionProfile] {
        &self.profiles
    }

    /// Samples the arrival processes of all functions. Fails on the first invalid profile.
    pub fn sample_all(&self) -> Result<Vec<ArrivalProcess>, WorkloadError> {
        Ok(sample_all(&self.profiles, self.seed)?)
    }

    /// Samples, merges and writes the whole trace.
    pub fn write_trace<W: Write>(&self, writer: &mut TraceWriter<W>) -> Result<TraceSummary, WorkloadError> {
        let processes = self.sample_all()?;
        write_merged(&processes, writer)
    }
}

fn write_merged<W: Write>(
    processes: &[ArrivalProcess],
    writer: &mut TraceWriter<W>,
) -> Result<TraceSummary, WorkloadError> {
    for event in StreamMerger::new(processes) {
        writer.write_event(&event)?;
    }
    Ok(TraceSummary::from_processes(processes))
}

/// Reads the workload config at `config_path` and writes the generated trace to `output_path`.
///
/// Nothing is written if the config is invalid or some function cannot be sampled.
pub fn generate_trace_file(
    config_path: &Path,
    output_path: &Path,
    seed: u64,
    experiment_end: Option<u64>,
) -> Result<TraceSummary, WorkloadError> {
    let workload = load_profiles(config_path, experiment_end)?;
    let generator = TraceGenerator::new(workload.profiles, seed);
    let processes = generator.sample_all()?;

    let mut writer = TraceWriter::create(output_path)?;
    let summary = write_merged(&processes, &mut writer)?;
    writer.finish()?;
    summary.log();
    Ok(summary)
}
