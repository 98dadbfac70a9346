//! The instrumented load → factorize → solve pipeline.
//!
//! For each cataloged matrix the pipeline:
//! 1. loads the Matrix Market file (timed, memory sampled before and after),
//! 2. builds the reference solution `x = 1` and the right-hand side `b = A x`
//!    using the row-compressed form of `A`,
//! 3. computes a sparse Cholesky factorization `A = L L^T` of the
//!    column-compressed form (timed, with current and peak memory),
//! 4. solves `A x = b` with the factorization (timed, same sampling),
//! 5. measures `||x - 1||_2 / ||1||_2` and emits one [`BenchmarkRecord`].
//!
//! Any failure is confined to its matrix: [`BenchmarkPipeline::benchmark_matrix`]
//! returns a typed error, and [`BenchmarkPipeline::run`] logs it and moves on.
//! Matrices are processed strictly one after another, since concurrent runs
//! would pollute each other's memory samples.

use crate::{
    catalog::{MatrixFile, list_matrices},
    error::{BenchmarkError, BenchmarkErrorKind},
    record::{BenchmarkRecord, TIMESTAMP_FORMAT},
    sink::ResultSink,
    utils::{data_loader::load_matrix_market, perf::MemoryProbe},
};
use chrono::Local;
use faer::{Side, prelude::*};
use std::{path::Path, time::Instant};

/// Outcome of a whole run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    /// Matrices that produced a row, in processing order.
    pub succeeded: Vec<String>,
    /// Matrices that failed, with the error text.
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Runs the benchmark over a directory and records the results.
pub struct BenchmarkPipeline<P: MemoryProbe> {
    sink: ResultSink,
    probe: P,
    platform: String,
}

impl<P: MemoryProbe> BenchmarkPipeline<P> {
    /// `platform` is the value written in the `os` column.
    pub fn new(sink: ResultSink, probe: P, platform: impl Into<String>) -> Self {
        Self {
            sink,
            probe,
            platform: platform.into(),
        }
    }

    pub fn sink(&self) -> &ResultSink {
        &self.sink
    }

    pub fn into_sink(self) -> ResultSink {
        self.sink
    }

    /// Benchmarks every matrix of `dir` in catalog order.
    ///
    /// Only a failure to read the directory is returned as an error; failures of
    /// individual matrices (including writing their row) are logged and
    /// collected in the summary.
    pub fn run(&self, dir: impl AsRef<Path>) -> Result<RunSummary, BenchmarkError> {
        let files = list_matrices(dir)?;
        let mut summary = RunSummary::default();

        if files.is_empty() {
            log::warn!("No matrices found in specified path");
            return Ok(summary);
        }

        for file in &files {
            let name = file.name();
            let outcome = self
                .benchmark_matrix(file)
                .and_then(|record| self.sink.write_row(&record).map_err(BenchmarkError::from));

            match outcome {
                Ok(()) => summary.succeeded.push(name),
                Err(e) => {
                    log::error!("Error in {name}: {e}");
                    summary.failed.push((name, e.to_string()));
                }
            }
        }

        Ok(summary)
    }

    /// Runs the three timed stages on one matrix.
    ///
    /// Memory deltas are recorded as measured and may be negative.
    pub fn benchmark_matrix(&self, file: &MatrixFile) -> Result<BenchmarkRecord, BenchmarkError> {
        let name = file.name();

        // Load.
        log::info!("Loading matrix: {name}");
        let mem0 = self.probe.current_memory_mb();
        let t0 = Instant::now();
        let matrix = load_matrix_market(&file.path)?;
        let load_time = t0.elapsed().as_secs_f64();
        let load_mem = self.probe.current_memory_mb() - mem0;

        let (rows, cols) = matrix.shape();
        let non_zeros = matrix.nnz();
        if rows != cols {
            return Err(BenchmarkErrorKind::NotSquare { rows, cols }.into());
        }
        if rows == 0 {
            return Err(BenchmarkErrorKind::Empty.into());
        }

        let x_exact = Mat::<f64>::from_fn(rows, 1, |_, _| 1.0);
        let a_csr = matrix.to_row_major()?;
        let a_csc = matrix.to_col_major()?;
        let b = &a_csr * &x_exact;
        drop(matrix);

        // Decompose. Only the lower triangle of the column-major form is read.
        log::info!("Decomposing matrix: {name}");
        let mem2 = self.probe.current_memory_mb();
        let t2 = Instant::now();
        let llt = a_csc
            .as_ref()
            .sp_cholesky(Side::Lower)
            .map_err(|e| BenchmarkErrorKind::Factorization(format!("{e:?}")))?;
        let decomp_time = t2.elapsed().as_secs_f64();
        let decomp_mem = self.probe.current_memory_mb() - mem2;
        let decomp_peak_mem = self.probe.peak_memory_mb();

        // Solve.
        log::info!("Solving matrix: {name}");
        let mem4 = self.probe.current_memory_mb();
        let t4 = Instant::now();
        let x = llt.solve(b.as_ref());
        let solve_time = t4.elapsed().as_secs_f64();
        let solve_mem = self.probe.current_memory_mb() - mem4;
        let solve_peak_mem = self.probe.peak_memory_mb();

        let relative_error = (&x - &x_exact).norm_l2() / x_exact.norm_l2();

        let record = BenchmarkRecord {
            os: self.platform.clone(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            matrix_name: name,
            rows,
            cols,
            non_zeros,
            load_time,
            load_mem,
            decomp_time,
            decomp_mem,
            decomp_peak_mem,
            solve_time,
            solve_mem,
            solve_peak_mem,
            relative_error,
        };
        log::info!(
            "Completed: {} | total time: {:.4}s | relative error: {:.2e}",
            record.matrix_name,
            record.total_time(),
            record.relative_error
        );
        Ok(record)
    }
}
