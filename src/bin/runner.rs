//! Benchmark runner for sparse Cholesky factorization and solve.
//!
//! Benchmarks every Matrix Market file of a directory, smallest first, and
//! appends one CSV row per successfully solved matrix to a log file named
//! `<platform>_<tag>_<YYYY_MM_DD_HHMMSS>.csv` in the logs directory.
//!
//! Matrices are processed sequentially in this single process so that the
//! memory samples of one matrix are not disturbed by another. A matrix that
//! fails to load, factorize or solve is reported and skipped.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cholesky_bench::{
    pipeline::BenchmarkPipeline,
    sink::{ResultSink, count_lines},
    utils::perf::{default_probe, platform_name, platform_tag},
};
use std::path::PathBuf;

/// Command-line arguments for the benchmark runner.
#[derive(Parser, Debug)]
#[clap(
    name = "chol-bench",
    about = "Benchmarks sparse Cholesky factorization and solve on a directory of .mtx files."
)]
struct RunnerArgs {
    /// Directory containing the Matrix Market (.mtx) files.
    #[clap(long, value_name = "PATH", default_value = ".")]
    matrices_dir: PathBuf,

    /// Directory where the CSV log is created. Empty means the current directory.
    #[clap(long, value_name = "PATH", default_value = "")]
    logs_dir: PathBuf,

    /// Runtime tag placed after the platform name in the log file name.
    #[clap(long, default_value = "rust")]
    tag: String,

    /// Logging verbosity.
    #[clap(long, default_value_t = log::LevelFilter::Info)]
    log_level: log::LevelFilter,
}

fn main() -> Result<()> {
    let args = RunnerArgs::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    log::info!("Starting benchmark with parameters: {:?}", &args);

    let tag = format!("{}_{}", platform_tag(), args.tag);
    let sink = ResultSink::new(&tag, &args.logs_dir)
        .with_context(|| format!("Failed to create log file in {:?}", &args.logs_dir))?;
    let pipeline = BenchmarkPipeline::new(sink, default_probe(), platform_name());

    let summary = pipeline
        .run(&args.matrices_dir)
        .with_context(|| format!("Failed to benchmark matrices in {:?}", &args.matrices_dir))?;

    if summary.processed() == 0 {
        println!("No matrices found in specified path");
        pipeline.into_sink().remove_if_empty()?;
        return Ok(());
    }

    for (name, error) in &summary.failed {
        log::warn!("Skipped {name}: {error}");
    }
    log::info!(
        "Benchmark complete: {} succeeded, {} failed.",
        summary.succeeded.len(),
        summary.failed.len()
    );

    let sink = pipeline.into_sink();
    let log_file = sink.log_file().to_path_buf();
    if summary.succeeded.is_empty() && sink.remove_if_empty()? {
        log::warn!("No matrix was benchmarked successfully; no log file was kept.");
        return Ok(());
    }

    let rows = count_lines(&log_file)
        .with_context(|| format!("Failed to read back {:?}", &log_file))?
        .saturating_sub(1);
    log::info!("{rows} rows in {:?}", &log_file);
    println!("\nLog file: {}\n", log_file.display());
    Ok(())
}
