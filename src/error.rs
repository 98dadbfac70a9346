//! This module defines the error type of the benchmark pipeline.
//!
//! Every failure that can happen while benchmarking one matrix is folded into
//! [`BenchmarkError`], so the pipeline can return a typed
//! `Result<BenchmarkRecord, BenchmarkError>` per matrix and let the iteration
//! layer decide what to log and skip. Note that faer's factorization errors do
//! not implement [`std::error::Error`], so their `Debug` text is captured instead.
use crate::{catalog::CatalogError, sink::SinkError, utils::data_loader::DataLoaderError};
use thiserror::Error;

/// Represents all possible errors that can occur during a benchmark run.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct BenchmarkError(#[from] BenchmarkErrorKind);

/// Private enum containing the distinct kinds of errors.
#[derive(Error, Debug)]
pub(crate) enum BenchmarkErrorKind {
    /// The matrix file could not be read or parsed.
    #[error("Failed to load matrix: {0}")]
    Load(#[from] DataLoaderError),

    /// Cholesky factorization needs a square matrix.
    #[error("Matrix is not square: {rows} rows but {cols} columns.")]
    NotSquare { rows: usize, cols: usize },

    /// A 0x0 matrix has no reference solution to compare against.
    #[error("Matrix has no rows.")]
    Empty,

    /// The factorization failed, typically because the matrix is not positive definite.
    #[error("Cholesky factorization failed (matrix is not SPD?): {0}")]
    Factorization(String),

    #[error("Failed to list matrices: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Failed to record result: {0}")]
    Sink(#[from] SinkError),
}

impl From<DataLoaderError> for BenchmarkError {
    fn from(e: DataLoaderError) -> Self {
        BenchmarkError(BenchmarkErrorKind::Load(e))
    }
}

impl From<CatalogError> for BenchmarkError {
    fn from(e: CatalogError) -> Self {
        BenchmarkError(BenchmarkErrorKind::Catalog(e))
    }
}

impl From<SinkError> for BenchmarkError {
    fn from(e: SinkError) -> Self {
        BenchmarkError(BenchmarkErrorKind::Sink(e))
    }
}

impl BenchmarkError {
    /// Returns true if the failure happened while factorizing the matrix.
    pub fn is_factorization(&self) -> bool {
        matches!(self.0, BenchmarkErrorKind::Factorization(_))
    }

    /// Returns true if the matrix could not be loaded.
    pub fn is_load(&self) -> bool {
        matches!(self.0, BenchmarkErrorKind::Load(_))
    }
}
