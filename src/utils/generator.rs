//! Random sparse SPD test matrices.
//!
//! A symmetric matrix with negative off-diagonal entries and a diagonal that
//! strictly dominates each row is positive definite (Gershgorin), so the
//! matrices produced here always admit a Cholesky factorization.

use super::data_loader::{DataLoaderError, MatrixMarket};
use faer::sparse::Triplet;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Generates an `n x n` sparse, strictly diagonally dominant SPD matrix.
///
/// Each row `i > 0` receives up to `off_diagonal_per_row` entries in the strict
/// lower triangle (mirrored to the upper one), with values in `(-1, 0]`.
/// The same `seed` always produces the same matrix.
pub fn random_spd(
    n: usize,
    off_diagonal_per_row: usize,
    seed: u64,
) -> Result<MatrixMarket, DataLoaderError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut triplets = Vec::with_capacity(n * (2 * off_diagonal_per_row + 1));
    let mut row_sums = vec![0.0f64; n];

    for i in 1..n {
        let mut cols: Vec<usize> = (0..off_diagonal_per_row.min(i))
            .map(|_| rng.random_range(0..i))
            .collect();
        cols.sort_unstable();
        cols.dedup();

        for j in cols {
            let val = -rng.random::<f64>();
            triplets.push(Triplet { row: i, col: j, val });
            triplets.push(Triplet { row: j, col: i, val });
            row_sums[i] += val.abs();
            row_sums[j] += val.abs();
        }
    }

    for (i, sum) in row_sums.iter().enumerate() {
        triplets.push(Triplet {
            row: i,
            col: i,
            val: sum + 1.0,
        });
    }

    MatrixMarket::from_triplets(n, n, triplets)
}
