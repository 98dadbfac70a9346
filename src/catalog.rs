//! Discovery and ordering of the matrices to benchmark.
//!
//! [`list_matrices`] returns every `.mtx` file of a directory sorted by
//! ascending nonzero count, so small problems run first. The count comes from a
//! full trial parse; files that fail to parse are still returned, after all the
//! readable ones, and will fail again (with a diagnostic) in the pipeline.

use crate::utils::data_loader::load_matrix_market;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Extension of Matrix Market files, compared ASCII case-insensitively.
pub const MATRIX_EXTENSION: &str = "mtx";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read directory {path:?}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },
}

/// Ordering key of a matrix file.
///
/// `Unreadable` compares greater than any `Counted` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NnzKey {
    Counted(usize),
    Unreadable,
}

/// A discovered input matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixFile {
    pub path: PathBuf,
    pub nnz_key: NnzKey,
}

impl MatrixFile {
    /// The file name, as written in the `matrixName` column.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn has_matrix_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(MATRIX_EXTENSION))
}

/// Trial-parses `path` to obtain its nonzero count.
fn nnz_key(path: &Path) -> NnzKey {
    match load_matrix_market(path) {
        Ok(matrix) => NnzKey::Counted(matrix.nnz()),
        Err(e) => {
            log::warn!("Error reading {}: {e}", path.display());
            NnzKey::Unreadable
        }
    }
}

/// Lists the Matrix Market files of `dir`, ordered by ascending nonzero count.
///
/// Files with the same count keep file-name order. A directory without
/// matching files yields an empty vector.
pub fn list_matrices(dir: impl AsRef<Path>) -> Result<Vec<MatrixFile>, CatalogError> {
    let dir = dir.as_ref();
    let read_dir_err = |source| CatalogError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        if path.is_file() && has_matrix_extension(&path) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut files: Vec<MatrixFile> = paths
        .into_iter()
        .map(|path| {
            let nnz_key = nnz_key(&path);
            log::debug!("Cataloged {} with key {:?}", path.display(), nnz_key);
            MatrixFile { path, nnz_key }
        })
        .collect();

    // Stable, so ties keep the name order established above.
    files.sort_by_key(|f| f.nnz_key);
    Ok(files)
}
