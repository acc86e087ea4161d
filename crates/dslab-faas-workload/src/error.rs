//! Error types of the workload generator.
use thiserror::Error;

/// Malformed or incomplete workload configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse workload config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to read workload config: {0}")]
    Read(#[source] std::io::Error),
    #[error("function record #{index}: missing `name`")]
    MissingName { index: usize },
    #[error("function record #{index}: empty `name`")]
    EmptyName { index: usize },
    #[error("function `{name}` is defined more than once")]
    DuplicateName { name: String },
    #[error("function `{function}`: missing field `{field}`")]
    MissingField { function: String, field: &'static str },
    #[error("function `{function}`: both fixed-count and windowed fields are set")]
    AmbiguousRegime { function: String },
    #[error("function `{function}`: `background_mu` requires a spike window")]
    OrphanBackground { function: String },
    #[error("function `{function}`: background_mu must be positive, got {mean}")]
    InvalidBackgroundMean { function: String, mean: f64 },
    #[error("function `{function}`: start_time {start} is greater than end_time {end}")]
    InvalidWindow { function: String, start: u64, end: u64 },
    #[error("experiment end {experiment_end} is before the end_time {end} of function `{function}`")]
    ExperimentEndTooEarly {
        function: String,
        end: u64,
        experiment_end: u64,
    },
}

/// A rate parameter that makes the renewal process ill-defined.
#[derive(Debug, Error, PartialEq)]
pub enum SamplingError {
    #[error("function `{function}`: mean inter-arrival time must be positive, got {mean}")]
    InvalidMean { function: String, mean: f64 },
    #[error("function `{function}`: arrival rate must be non-negative, got {rate}")]
    InvalidRate { function: String, rate: f64 },
}

/// Any failure of the generation pipeline.
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error("trace output failed: {0}")]
    Io(#[from] std::io::Error),
}
