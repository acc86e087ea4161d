use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Builder;
use log::{error, info, LevelFilter};

use dslab_faas_workload::generator::generate_trace_file;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Generates a time-ordered invocation trace for FaaS load testing
struct Args {
    /// Path to YAML file with function arrival profiles
    config: PathBuf,

    /// Path to produced trace (one JSON record per line)
    output: PathBuf,

    /// Random seed
    #[arg(short, long, default_value_t = 123)]
    seed: u64,

    /// Experiment end in ms (default - latest end_time among windowed functions)
    #[arg(short, long)]
    experiment_end: Option<u64>,
}

fn main() -> ExitCode {
    // log level INFO by default
    let mut builder = Builder::from_default_env();
    if env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Info);
    }
    builder.format(|buf, record| writeln!(buf, "{}", record.args())).init();

    let args = Args::parse();
    info!("loading workload config from {}", args.config.display());

    match generate_trace_file(&args.config, &args.output, args.seed, args.experiment_end) {
        Ok(summary) => {
            info!("wrote {} events to {}", summary.events, args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
