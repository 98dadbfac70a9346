//! This module provides utilities for loading and writing Matrix Market files.
//!
//! The reader understands the `matrix` object in both `coordinate` and `array`
//! formats with `real`, `integer` or `pattern` fields, and `general`, `symmetric`
//! or `skew-symmetric` storage. Symmetric storage is expanded while reading, so
//! the resulting triplets always describe the full matrix.

use faer::sparse::{SparseColMat, SparseRowMat, Triplet};
use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};
use thiserror::Error;

/// Upper bound on the buffer reserved from a size line before any entry is read.
const MAX_PREALLOCATED_ENTRIES: usize = 1 << 20;

/// Represents all possible errors that can occur while reading a Matrix Market file.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The first line is not a `%%MatrixMarket` banner.
    #[error("Format error: missing or malformed '%%MatrixMarket' banner line.")]
    BannerMissing,
    /// The banner names an object, format, field or symmetry that is not supported.
    #[error("Unsupported Matrix Market qualifier '{0}'.")]
    Unsupported(String),
    /// The size line is absent or does not contain the expected integers.
    #[error("Format error: malformed size line '{0}'.")]
    SizeLine(String),
    /// Occurs when a string cannot be parsed into an integer.
    #[error("Parse error: Failed to parse integer from '{0}'")]
    ParseInt(String),
    /// Occurs when a string cannot be parsed into a float.
    #[error("Parse error: Failed to parse float from '{0}'")]
    ParseFloat(String),
    /// An entry refers to a position outside the declared dimensions.
    #[error("Entry ({row}, {col}) is outside of a {nrows}x{ncols} matrix.")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        nrows: usize,
        ncols: usize,
    },
    /// Occurs when the end of a file is reached unexpectedly during parsing.
    #[error("Format error: Unexpected end of file after {found} of {expected} entries.")]
    UnexpectedEof { expected: usize, found: usize },
    /// Data lines remain after all declared entries have been read.
    #[error("Format error: more entries than the {expected} declared in the size line.")]
    TrailingEntries { expected: usize },
    /// Occurs if the sparse matrix construction fails internally.
    #[error("Internal error: Failed to construct the sparse matrix from triplets.")]
    SparseMatrixConstructionError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Coordinate,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Real,
    Integer,
    Pattern,
}

/// Storage scheme declared in the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
}

/// An in-memory Matrix Market matrix in triplet (COO) form.
///
/// Entries are 0-based. Off-diagonal entries of symmetric files have already
/// been mirrored, so `nnz()` matches the number of stored entries of the full
/// matrix.
#[derive(Debug, Clone)]
pub struct MatrixMarket {
    nrows: usize,
    ncols: usize,
    symmetry: Symmetry,
    triplets: Vec<Triplet<usize, usize, f64>>,
}

impl MatrixMarket {
    /// Builds a general matrix from 0-based triplets.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: Vec<Triplet<usize, usize, f64>>,
    ) -> Result<Self, DataLoaderError> {
        if let Some(t) = triplets.iter().find(|t| t.row >= nrows || t.col >= ncols) {
            return Err(DataLoaderError::IndexOutOfBounds {
                row: t.row + 1,
                col: t.col + 1,
                nrows,
                ncols,
            });
        }
        Ok(Self {
            nrows,
            ncols,
            symmetry: Symmetry::General,
            triplets,
        })
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.triplets.len()
    }

    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }

    pub fn triplets(&self) -> &[Triplet<usize, usize, f64>] {
        &self.triplets
    }

    /// Compressed sparse column form. Duplicate entries are summed.
    pub fn to_col_major(&self) -> Result<SparseColMat<usize, f64>, DataLoaderError> {
        SparseColMat::try_new_from_triplets(self.nrows, self.ncols, &self.triplets)
            .map_err(|_| DataLoaderError::SparseMatrixConstructionError)
    }

    /// Compressed sparse row form. Duplicate entries are summed.
    pub fn to_row_major(&self) -> Result<SparseRowMat<usize, f64>, DataLoaderError> {
        SparseRowMat::try_new_from_triplets(self.nrows, self.ncols, &self.triplets)
            .map_err(|_| DataLoaderError::SparseMatrixConstructionError)
    }
}

/// Reads a Matrix Market file from disk.
pub fn load_matrix_market(path: impl AsRef<Path>) -> Result<MatrixMarket, DataLoaderError> {
    let file = File::open(path)?;
    parse_matrix_market(BufReader::new(file))
}

/// Parses a Matrix Market stream.
pub fn parse_matrix_market(reader: impl BufRead) -> Result<MatrixMarket, DataLoaderError> {
    let mut lines = reader.lines();

    let banner = lines.next().ok_or(DataLoaderError::BannerMissing)??;
    let (layout, field, symmetry) = parse_banner(&banner)?;

    // Skip comments and blank lines up to the size line.
    let size_line = loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('%') {
                    continue;
                }
                break line;
            }
            None => return Err(DataLoaderError::SizeLine(String::new())),
        }
    };

    let sizes = size_line
        .split_whitespace()
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| DataLoaderError::SizeLine(size_line.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // The remaining data lines, with blanks and comments filtered out.
    let data = lines.filter(|line| {
        line.as_ref()
            .map(|l| {
                let t = l.trim();
                !t.is_empty() && !t.starts_with('%')
            })
            .unwrap_or(true)
    });

    match layout {
        Layout::Coordinate => {
            let &[nrows, ncols, entries] = sizes.as_slice() else {
                return Err(DataLoaderError::SizeLine(size_line));
            };
            read_coordinate(data, nrows, ncols, entries, field, symmetry)
        }
        Layout::Array => {
            let &[nrows, ncols] = sizes.as_slice() else {
                return Err(DataLoaderError::SizeLine(size_line));
            };
            read_array(data, nrows, ncols, symmetry)
        }
    }
}

fn parse_banner(banner: &str) -> Result<(Layout, Field, Symmetry), DataLoaderError> {
    let parts: Vec<String> = banner
        .split_whitespace()
        .map(|s| s.to_ascii_lowercase())
        .collect();
    if parts.len() != 5 || parts[0] != "%%matrixmarket" {
        return Err(DataLoaderError::BannerMissing);
    }
    if parts[1] != "matrix" {
        return Err(DataLoaderError::Unsupported(parts[1].clone()));
    }

    let layout = match parts[2].as_str() {
        "coordinate" => Layout::Coordinate,
        "array" => Layout::Array,
        other => return Err(DataLoaderError::Unsupported(other.to_string())),
    };
    let field = match parts[3].as_str() {
        "real" | "double" => Field::Real,
        "integer" => Field::Integer,
        "pattern" if layout == Layout::Coordinate => Field::Pattern,
        other => return Err(DataLoaderError::Unsupported(other.to_string())),
    };
    let symmetry = match parts[4].as_str() {
        "general" => Symmetry::General,
        "symmetric" => Symmetry::Symmetric,
        "skew-symmetric" => Symmetry::SkewSymmetric,
        other => return Err(DataLoaderError::Unsupported(other.to_string())),
    };
    Ok((layout, field, symmetry))
}

/// Pushes an entry, mirroring it across the diagonal when the storage is symmetric.
fn push_entry(
    triplets: &mut Vec<Triplet<usize, usize, f64>>,
    row: usize,
    col: usize,
    val: f64,
    symmetry: Symmetry,
) {
    triplets.push(Triplet { row, col, val });
    if row != col {
        match symmetry {
            Symmetry::General => {}
            Symmetry::Symmetric => triplets.push(Triplet {
                row: col,
                col: row,
                val,
            }),
            Symmetry::SkewSymmetric => triplets.push(Triplet {
                row: col,
                col: row,
                val: -val,
            }),
        }
    }
}

fn parse_index(token: Option<&str>, line: &str) -> Result<usize, DataLoaderError> {
    let token = token.ok_or_else(|| DataLoaderError::ParseInt(line.to_string()))?;
    token
        .parse::<usize>()
        .map_err(|_| DataLoaderError::ParseInt(token.to_string()))
}

fn parse_value(token: Option<&str>, line: &str) -> Result<f64, DataLoaderError> {
    let token = token.ok_or_else(|| DataLoaderError::ParseFloat(line.to_string()))?;
    token
        .parse::<f64>()
        .map_err(|_| DataLoaderError::ParseFloat(token.to_string()))
}

fn read_coordinate(
    mut data: impl Iterator<Item = io::Result<String>>,
    nrows: usize,
    ncols: usize,
    entries: usize,
    field: Field,
    symmetry: Symmetry,
) -> Result<MatrixMarket, DataLoaderError> {
    // The size line is untrusted; mirrored entries grow the buffer on demand.
    let mut triplets = Vec::with_capacity(entries.min(MAX_PREALLOCATED_ENTRIES));

    for found in 0..entries {
        let line = data.next().ok_or(DataLoaderError::UnexpectedEof {
            expected: entries,
            found,
        })??;
        let mut parts = line.split_whitespace();

        // Matrix Market indices are 1-based.
        let row = parse_index(parts.next(), &line)?;
        let col = parse_index(parts.next(), &line)?;
        if row == 0 || col == 0 || row > nrows || col > ncols {
            return Err(DataLoaderError::IndexOutOfBounds {
                row,
                col,
                nrows,
                ncols,
            });
        }
        let val = match field {
            Field::Pattern => 1.0,
            Field::Real | Field::Integer => parse_value(parts.next(), &line)?,
        };
        push_entry(&mut triplets, row - 1, col - 1, val, symmetry);
    }

    if data.next().is_some() {
        return Err(DataLoaderError::TrailingEntries { expected: entries });
    }

    Ok(MatrixMarket {
        nrows,
        ncols,
        symmetry,
        triplets,
    })
}

/// Number of values an array-format body must hold, or `None` on overflow.
fn array_len(nrows: usize, ncols: usize, symmetry: Symmetry) -> Option<usize> {
    let offset = match symmetry {
        Symmetry::General => return nrows.checked_mul(ncols),
        Symmetry::Symmetric => 0,
        Symmetry::SkewSymmetric => 1,
    };
    // Column `c` holds `m - c` values; only the first `k` columns are non-empty.
    let m = nrows.saturating_sub(offset);
    let k = ncols.min(m);
    let full = k.checked_mul(m)?;
    Some(full - k * k.saturating_sub(1) / 2)
}

fn read_array(
    data: impl Iterator<Item = io::Result<String>>,
    nrows: usize,
    ncols: usize,
    symmetry: Symmetry,
) -> Result<MatrixMarket, DataLoaderError> {
    let expected = array_len(nrows, ncols, symmetry)
        .ok_or_else(|| DataLoaderError::SizeLine(format!("{nrows} {ncols}")))?;

    // Column-major; symmetric storage lists only the lower triangle,
    // skew-symmetric only the strict lower triangle.
    let first_row = |col: usize| match symmetry {
        Symmetry::General => 0,
        Symmetry::Symmetric => col,
        Symmetry::SkewSymmetric => col.saturating_add(1),
    };

    let mut triplets = Vec::new();
    let (mut row, mut col) = (first_row(0), 0);
    let mut found = 0;
    for line in data {
        let line = line?;
        for token in line.split_whitespace() {
            if found == expected {
                return Err(DataLoaderError::TrailingEntries { expected });
            }
            let val = parse_value(Some(token), &line)?;
            if val != 0.0 {
                push_entry(&mut triplets, row, col, val, symmetry);
            }
            found += 1;
            row += 1;
            if row == nrows {
                col += 1;
                row = first_row(col);
            }
        }
    }

    if found < expected {
        return Err(DataLoaderError::UnexpectedEof { expected, found });
    }

    Ok(MatrixMarket {
        nrows,
        ncols,
        symmetry,
        triplets,
    })
}

/// Writes `matrix` as a `coordinate real general` Matrix Market file.
pub fn write_matrix_market(
    path: impl AsRef<Path>,
    matrix: &MatrixMarket,
) -> Result<(), DataLoaderError> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "%%MatrixMarket matrix coordinate real general")?;
    writeln!(
        writer,
        "{} {} {}",
        matrix.nrows,
        matrix.ncols,
        matrix.triplets.len()
    )?;
    for t in &matrix.triplets {
        writeln!(writer, "{} {} {:e}", t.row + 1, t.col + 1, t.val)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<MatrixMarket, DataLoaderError> {
        parse_matrix_market(Cursor::new(text))
    }

    #[test]
    fn test_coordinate_general() {
        let m = parse(
            "%%MatrixMarket matrix coordinate real general\n\
             % a comment\n\
             \n\
             3 3 4\n\
             1 1 4.0\n\
             2 2 5.0\n\
             3 3 6.0\n\
             3 1 -1.5e0\n",
        )
        .unwrap();
        assert_eq!(m.shape(), (3, 3));
        assert_eq!(m.nnz(), 4);
        assert_eq!(m.symmetry(), Symmetry::General);
        let last = &m.triplets()[3];
        assert_eq!((last.row, last.col, last.val), (2, 0, -1.5));
    }

    #[test]
    fn test_symmetric_entries_are_mirrored() {
        let m = parse(
            "%%MatrixMarket matrix coordinate real symmetric\n\
             2 2 3\n\
             1 1 2.0\n\
             2 1 -1.0\n\
             2 2 2.0\n",
        )
        .unwrap();
        // The off-diagonal entry is stored twice.
        assert_eq!(m.nnz(), 4);
        let a = m.to_col_major().unwrap();
        assert_eq!(a.nrows(), 2);
        assert_eq!(a.ncols(), 2);
    }

    #[test]
    fn test_skew_symmetric_negates_mirror() {
        let m = parse(
            "%%MatrixMarket matrix coordinate real skew-symmetric\n\
             2 2 1\n\
             2 1 3.0\n",
        )
        .unwrap();
        let vals: Vec<(usize, usize, f64)> =
            m.triplets().iter().map(|t| (t.row, t.col, t.val)).collect();
        assert_eq!(vals, vec![(1, 0, 3.0), (0, 1, -3.0)]);
    }

    #[test]
    fn test_pattern_field_uses_unit_values() {
        let m = parse(
            "%%MatrixMarket matrix coordinate pattern general\n\
             2 2 2\n\
             1 1\n\
             2 2\n",
        )
        .unwrap();
        assert!(m.triplets().iter().all(|t| t.val == 1.0));
    }

    #[test]
    fn test_array_symmetric_skips_zeros() {
        // Lower triangle of [[4, 0], [0, 9]] in column-major order.
        let m = parse(
            "%%MatrixMarket matrix array real symmetric\n\
             2 2\n\
             4.0\n\
             0.0\n\
             9.0\n",
        )
        .unwrap();
        assert_eq!(m.nnz(), 2);
        assert_eq!(m.shape(), (2, 2));
    }

    #[test]
    fn test_missing_banner() {
        let err = parse("3 3 1\n1 1 1.0\n").unwrap_err();
        assert!(matches!(err, DataLoaderError::BannerMissing));
    }

    #[test]
    fn test_complex_field_is_unsupported() {
        let err = parse("%%MatrixMarket matrix coordinate complex general\n1 1 1\n1 1 1.0 0.0\n")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported Matrix Market qualifier 'complex'."
        );
    }

    #[test]
    fn test_truncated_file() {
        let err = parse("%%MatrixMarket matrix coordinate real general\n2 2 2\n1 1 1.0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            DataLoaderError::UnexpectedEof {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_oversized_entry_count_is_not_preallocated() {
        for symmetry in ["general", "symmetric"] {
            let text = format!(
                "%%MatrixMarket matrix coordinate real {symmetry}\n\
                 2 2 18446744073709551615\n\
                 1 1 1.0\n"
            );
            let err = parse(&text).unwrap_err();
            assert!(
                matches!(err, DataLoaderError::UnexpectedEof { found: 1, .. }),
                "{symmetry}: {err:?}"
            );
        }
    }

    #[test]
    fn test_large_array_header_with_short_body() {
        let err = parse("%%MatrixMarket matrix array real general\n100000 100000\n1.0\n2.0\n")
            .unwrap_err();
        assert!(matches!(err, DataLoaderError::UnexpectedEof { found: 2, .. }));

        let err = parse(&format!(
            "%%MatrixMarket matrix array real general\n{} 2\n1.0\n",
            usize::MAX
        ))
        .unwrap_err();
        assert!(matches!(err, DataLoaderError::SizeLine(_)));
    }

    #[test]
    fn test_array_value_count_is_checked() {
        // Strict lower triangle of a 3x3 skew-symmetric matrix has 3 values.
        let m = parse("%%MatrixMarket matrix array real skew-symmetric\n3 3\n1.0 2.0\n3.0\n")
            .unwrap();
        assert_eq!(m.nnz(), 6);
        let mut lower: Vec<_> = m
            .triplets()
            .iter()
            .filter(|t| t.row > t.col)
            .map(|t| (t.row, t.col, t.val))
            .collect();
        lower.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(lower, vec![(1, 0, 1.0), (2, 0, 2.0), (2, 1, 3.0)]);

        let err = parse("%%MatrixMarket matrix array real symmetric\n2 2\n1.0\n0.0\n2.0\n5.0\n")
            .unwrap_err();
        assert!(matches!(err, DataLoaderError::TrailingEntries { expected: 3 }));
    }

    #[test]
    fn test_out_of_bounds_entry() {
        let err = parse("%%MatrixMarket matrix coordinate real general\n2 2 1\n3 1 1.0\n")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Entry (3, 1) is outside of a 2x2 matrix."
        );
    }

    #[test]
    fn test_bad_value() {
        let err = parse("%%MatrixMarket matrix coordinate real general\n1 1 1\n1 1 abc\n")
            .unwrap_err();
        assert!(matches!(err, DataLoaderError::ParseFloat(ref s) if s == "abc"));
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.mtx");
        let triplets = vec![
            Triplet {
                row: 0,
                col: 0,
                val: 2.5,
            },
            Triplet {
                row: 1,
                col: 0,
                val: -0.125,
            },
        ];
        let m = MatrixMarket::from_triplets(2, 2, triplets).unwrap();
        write_matrix_market(&path, &m).unwrap();

        let loaded = load_matrix_market(&path).unwrap();
        assert_eq!(loaded.shape(), (2, 2));
        assert_eq!(loaded.triplets()[1].val, -0.125);
    }
}
