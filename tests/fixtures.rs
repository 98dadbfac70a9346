//! Accuracy tests over the matrices shipped in `data/`.
//!
//! One test per fixture is generated by `build.rs`.

use anyhow::{Result, ensure};
use cholesky_bench::{
    catalog::{MatrixFile, NnzKey},
    pipeline::BenchmarkPipeline,
    sink::ResultSink,
    utils::{data_loader::load_matrix_market, perf::UnsupportedProbe},
};
use std::path::PathBuf;

fn run_fixture(path: &str) -> Result<()> {
    let path = PathBuf::from(path);
    let parsed = load_matrix_market(&path)?;

    let logs = tempfile::tempdir()?;
    let sink = ResultSink::new("fixtures", logs.path())?;
    let pipeline = BenchmarkPipeline::new(sink, UnsupportedProbe, "TestOS");
    let record = pipeline.benchmark_matrix(&MatrixFile {
        path,
        nnz_key: NnzKey::Counted(parsed.nnz()),
    })?;

    ensure!(record.non_zeros == parsed.nnz(), "nnz mismatch");
    ensure!((record.rows, record.cols) == parsed.shape(), "shape mismatch");
    ensure!(
        record.relative_error < 1e-10,
        "{} error too high: {}",
        record.matrix_name,
        record.relative_error
    );
    Ok(())
}

include!(concat!(env!("OUT_DIR"), "/fixture_tests.rs"));
