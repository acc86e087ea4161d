//! Arrival process sampling.
use std::collections::VecDeque;
use std::hash::Hasher;

use log::{debug, warn};
use fnv::FnvHasher;
use rand::prelude::*;
use rand_distr::Exp;
use rand_pcg::Pcg64;

use crate::config::{ArrivalRegime, FunctionProfile, RateWindow};
use crate::error::SamplingError;

/// Source of inter-arrival times.
pub trait InterArrivalSource {
    /// Returns the next inter-arrival time (ms) drawn from a distribution with the given mean.
    fn next_interval(&mut self, mean_ms: f64) -> f64;
}

/// Draws exponentially distributed inter-arrival times from a seeded PCG generator.
pub struct ExponentialSource {
    gen: Pcg64,
}

impl ExponentialSource {
    pub fn new(seed: u64) -> Self {
        Self {
            gen: Pcg64::seed_from_u64(seed),
        }
    }

    /// Creates the source of function `name`, derived from the global `seed` and the name only so
    /// that the process of a function does not depend on the other functions in the config.
    /// The name hash (64-bit FNV-1a over the bytes) is the same on every platform.
    pub fn for_function(seed: u64, name: &str) -> Self {
        let mut hasher = FnvHasher::default();
        hasher.write(name.as_bytes());
        Self::new(seed ^ hasher.finish())
    }
}

impl InterArrivalSource for ExponentialSource {
    fn next_interval(&mut self, mean_ms: f64) -> f64 {
        match Exp::new(1. / mean_ms) {
            Ok(dist) => dist.sample(&mut self.gen),
            // negative and NaN means are rejected before sampling
            Err(_) => f64::INFINITY,
        }
    }
}

/// Replays the given inter-arrival times ignoring the requested mean. Once exhausted, every
/// interval is infinite.
#[derive(Default)]
pub struct FixedSource {
    values: VecDeque<f64>,
}

impl FixedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values: values.into() }
    }
}

impl InterArrivalSource for FixedSource {
    fn next_interval(&mut self, _mean_ms: f64) -> f64 {
        self.values.pop_front().unwrap_or(f64::INFINITY)
    }
}

/// Sorted absolute invocation times (ms) of one function.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrivalProcess {
    pub function: String,
    pub timestamps: Vec<u64>,
    pub payload: serde_json::Value,
}

impl ArrivalProcess {
    /// `timestamps` must be sorted in non-decreasing order.
    pub fn new(function: &str, timestamps: Vec<u64>) -> Self {
        Self {
            function: function.to_string(),
            timestamps,
            payload: crate::config::default_payload(),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.timestamps.last().copied()
    }
}

/// Appends to `out` the cumulative sums of `count` ceiled intervals starting from `start`,
/// stopping at the first sum greater than `limit`.
fn draw_arrivals(
    source: &mut dyn InterArrivalSource,
    mean_ms: f64,
    count: u64,
    start: u64,
    limit: Option<u64>,
    out: &mut Vec<u64>,
) {
    let mut t = start;
    for _ in 0..count {
        let interval = source.next_interval(mean_ms).ceil();
        // `as` saturates, so an infinite interval pushes t past any limit
        t = t.saturating_add((interval as u64).max(1));
        match limit {
            // every arrival advances t by at least 1 ms, so a window holds at most its length in arrivals
            Some(limit) if t > limit => break,
            _ => out.push(t),
        }
    }
}

fn check_mean(function: &str, mean: f64) -> Result<(), SamplingError> {
    if mean > 0. {
        Ok(())
    } else {
        Err(SamplingError::InvalidMean {
            function: function.to_string(),
            mean,
        })
    }
}

/// Upper bound on the arrivals preallocated for a fixed-count process.
const MAX_RESERVED_ARRIVALS: u64 = 1 << 20;

fn reserved_arrivals(count: u64) -> usize {
    count.min(MAX_RESERVED_ARRIVALS) as usize
}

/// Number of draws for a window: its length divided by the mean, rounded down.
pub fn expected_count(window: &RateWindow) -> u64 {
    (window.len() as f64 / window.mean_interval_ms).floor() as u64
}

/// Samples the arrival process of one function.
pub fn sample_arrivals(
    profile: &FunctionProfile,
    source: &mut dyn InterArrivalSource,
) -> Result<ArrivalProcess, SamplingError> {
    let mut timestamps = Vec::new();
    match &profile.regime {
        ArrivalRegime::FixedCount { arrival_rate, count } => {
            if arrival_rate.is_nan() || *arrival_rate < 0. {
                return Err(SamplingError::InvalidRate {
                    function: profile.name.clone(),
                    rate: *arrival_rate,
                });
            }
            if *arrival_rate > 0. {
                let mean_ms = 1000. / arrival_rate;
                timestamps.reserve(reserved_arrivals(*count));
                draw_arrivals(source, mean_ms, *count, 0, None, &mut timestamps);
            }
        }
        ArrivalRegime::Windowed(windows) => {
            for window in windows {
                check_mean(&profile.name, window.mean_interval_ms)?;
            }
            for window in windows {
                let count = expected_count(window);
                let before = timestamps.len();
                draw_arrivals(
                    source,
                    window.mean_interval_ms,
                    count,
                    window.start,
                    Some(window.end),
                    &mut timestamps,
                );
                debug!(
                    "{}: {:?} window [{}, {}] mean {} ms, {} draws, {} arrivals",
                    profile.name,
                    window.kind,
                    window.start,
                    window.end,
                    window.mean_interval_ms,
                    count,
                    timestamps.len() - before
                );
            }
        }
    }
    if timestamps.is_empty() {
        warn!("function {} has no arrivals", profile.name);
    }
    Ok(ArrivalProcess {
        function: profile.name.clone(),
        timestamps,
        payload: profile.payload.clone(),
    })
}

/// Samples all profiles, each with its own source derived from `seed`.
pub fn sample_all(profiles: &[FunctionProfile], seed: u64) -> Result<Vec<ArrivalProcess>, SamplingError> {
    profiles
        .iter()
        .map(|profile| sample_arrivals(profile, &mut ExponentialSource::for_function(seed, &profile.name)))
        .collect()
}
