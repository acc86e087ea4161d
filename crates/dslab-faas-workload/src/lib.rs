//! Generator of synthetic invocation traces for load-testing FaaS platforms.
//!
//! Every function of the workload gets an independent renewal process with exponential
//! inter-arrival times, either a fixed number of invocations at a constant rate or a set of rate
//! windows (a spike window optionally surrounded by a background rate). The per-function
//! processes are merged into a single time-ordered stream of events, each carrying the delay
//! since the previous event, and written as line-delimited JSON:
//!
//! ```text
//! {"interval":50,"function":"f1","payload":{"request":42}}
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod merge;
pub mod sampler;
pub mod writer;
