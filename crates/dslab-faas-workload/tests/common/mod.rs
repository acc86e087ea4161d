#![allow(dead_code)]

use serde::Deserialize;

use dslab_faas_workload::merge::StreamMerger;
use dslab_faas_workload::sampler::ArrivalProcess;

#[derive(Debug, Deserialize, PartialEq)]
pub struct TraceLine {
    pub interval: u64,
    pub function: String,
    pub payload: serde_json::Value,
}

pub fn parse_trace(text: &str) -> Vec<TraceLine> {
    text.lines().map(|line| serde_json::from_str(line).unwrap()).collect()
}

/// Restores absolute (function, timestamp) pairs from delta-encoded events.
pub fn absolute_times<'a>(events: impl Iterator<Item = (u64, &'a str)>) -> Vec<(String, u64)> {
    let mut t = 0;
    events
        .map(|(interval, function)| {
            t += interval;
            (function.to_string(), t)
        })
        .collect()
}

pub fn merge_absolute(processes: &[ArrivalProcess]) -> Vec<(String, u64)> {
    absolute_times(StreamMerger::new(processes).map(|e| (e.interval, e.function)))
}
