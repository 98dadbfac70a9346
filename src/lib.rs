//! Benchmark harness for sparse symmetric positive-definite linear solves.
//!
//! The harness walks a directory of Matrix Market (`.mtx`) files and, for each
//! matrix, measures three stages: loading the file, computing a sparse Cholesky
//! factorization `A = L L^T`, and solving `A x = b` with it. Every stage records its
//! wall-clock time and the change in resident memory of the process; the
//! factorization and solve also record the peak resident memory. The solution is
//! checked against the known answer `x = 1` (the right-hand side is built as
//! `b = A 1`), and one CSV row per matrix is appended to a timestamped log file.
//!
//! Built on [`faer`] for the sparse storage formats, the factorization and the
//! triangular solves.
//!
//! ## Modules
//!
//! - [`catalog`]: finds `.mtx` files and orders them by nonzero count, smallest
//!   first; files that cannot be parsed are kept and placed last.
//! - [`pipeline`]: the timed load/factorize/solve sequence. A failure on one
//!   matrix is logged and skipped without aborting the run.
//! - [`sink`]: the append-only CSV log, one file per run.
//! - [`record`]: the row type and its column formatting.
//! - [`utils`]: the Matrix Market reader/writer and process memory probes.
//!
//! ## Example Usage
//!
//! ```no_run
//! use cholesky_bench::{
//!     pipeline::BenchmarkPipeline,
//!     sink::ResultSink,
//!     utils::perf::{default_probe, platform_name, platform_tag},
//! };
//!
//! let sink = ResultSink::new(&format!("{}_rust", platform_tag()), "logs")?;
//! let pipeline = BenchmarkPipeline::new(sink, default_probe(), platform_name());
//! let summary = pipeline.run("matrices")?;
//! println!("{} rows written to {:?}", summary.succeeded.len(), pipeline.sink().log_file());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod catalog;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod utils;

pub use catalog::{MatrixFile, NnzKey, list_matrices};
pub use error::BenchmarkError;
pub use pipeline::{BenchmarkPipeline, RunSummary};
pub use record::BenchmarkRecord;
pub use sink::ResultSink;
