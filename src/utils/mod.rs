//! Collaborators of the benchmark pipeline.
//!
//! - **`data_loader`**: reads Matrix Market files into triplet form and builds the
//!   compressed row and column layouts used by the pipeline. It can also write
//!   matrices back, which the `matgen` binary and the tests rely on.
//!
//! - **`generator`**: seeded random sparse SPD matrices for fixtures and tests.
//!
//! - **`perf`**: platform-specific process memory readers (current and peak
//!   resident set size) and the platform name written in each log row.
//!

pub mod data_loader;
pub mod generator;
pub mod perf;
