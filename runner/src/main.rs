//! `bounded-bench`: runs one bounded-rand strategy over the benchmark workloads.
//!
//! ```text
//! bounded-bench [OPTIONS] [SEED]
//! ```
//!
//! The report goes to stdout, logs to stderr. A strategy that returns a value
//! outside `[0, range)` aborts the process.

use bounded_rand::config::parse_seed;
use bounded_rand::{run_benchmark, Algorithm, BenchConfig, ScalePreset, SeedPolicy, Width};
use clap::Parser;
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "bounded-bench", version, about)]
struct Opt {
    /// Seed for the bit source: `0x` prefix for hex, leading `0` for octal,
    /// otherwise decimal. Drawn from the OS when omitted.
    #[arg(value_parser = parse_seed)]
    seed: Option<u64>,
    /// Word width in bits (32 or 64).
    #[arg(short, long, default_value_t = 32)]
    width: u32,
    /// Strategy to run; see `--list`.
    #[arg(short, long, default_value_t = Algorithm::default())]
    algorithm: Algorithm,
    /// Workload sizes: full, quick or smoke.
    #[arg(short, long, default_value = "full")]
    scale: ScalePreset,
    /// Print the strategy catalog and exit.
    #[arg(long)]
    list: bool,
    /// Print the run report as JSON instead of the text report.
    #[arg(long)]
    json: bool,
    /// Log level for stderr output.
    #[arg(long, default_value_t = tracing::Level::WARN)]
    log_level: tracing::Level,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(opt.log_level)
            .finish(),
    )?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if opt.list {
        for algorithm in Algorithm::ALL {
            let bias = if algorithm.is_biased() { "biased" } else { "" };
            writeln!(out, "{:<34} {:<20} {bias}", algorithm.name(), algorithm.family().as_str())?;
        }
        return Ok(());
    }

    let width = Width::from_bits(opt.width)?;
    let config = BenchConfig::new()
        .with_width(width)
        .with_algorithm(opt.algorithm)
        .with_preset(opt.scale)
        .with_seed(opt.seed.map_or(SeedPolicy::Entropy, SeedPolicy::Fixed));
    config.validate()?;
    tracing::info!(algorithm = %config.algorithm, %width, scale = ?opt.scale, "starting");

    if opt.json {
        let report = run_benchmark(&config, &mut io::sink())?;
        writeln!(out, "{}", report.to_json()?)?;
    } else {
        let report = run_benchmark(&config, &mut out)?;
        tracing::info!(
            seed = report.seed,
            elapsed_secs = report.elapsed_secs(),
            draws_per_sample = report.draws_per_sample(),
            "finished"
        );
    }
    Ok(())
}
