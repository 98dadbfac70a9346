//! A data generation utility for creating SPD benchmark matrices.
//!
//! Writes one Matrix Market file per requested size into the output directory.
//! Each matrix is sparse, symmetric and strictly diagonally dominant, hence
//! positive definite, so it is a valid input for the Cholesky benchmark. Files
//! are named `spd-<n>-<per_row>-<seed>.mtx`.

use anyhow::{Context, Result, anyhow, ensure};
use clap::Parser;
use cholesky_bench::utils::{data_loader::write_matrix_market, generator::random_spd};
use std::path::PathBuf;

/// Command-line interface for the matrix generator.
#[derive(Parser, Debug)]
#[clap(
    name = "matgen",
    about = "Generates random sparse SPD matrices in Matrix Market format."
)]
struct MatGenArgs {
    /// Matrix dimensions to generate, comma separated.
    #[clap(long, value_delimiter = ',', required = true)]
    sizes: Vec<usize>,
    /// Maximum number of off-diagonal entries per row in the lower triangle.
    #[clap(long, default_value_t = 4)]
    per_row: usize,
    /// Seed for the random generator.
    #[clap(long, default_value_t = 1)]
    seed: u64,
    /// The directory where the generated .mtx files will be saved.
    #[clap(long)]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))?;

    let args = MatGenArgs::parse();
    log::info!("Starting matrix generation with parameters: {:?}", &args);
    ensure!(
        args.sizes.iter().all(|&n| n > 0),
        "All matrix sizes must be positive."
    );

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", &args.output_dir))?;

    for &n in &args.sizes {
        let path = args
            .output_dir
            .join(format!("spd-{}-{}-{}.mtx", n, args.per_row, args.seed));
        let matrix = random_spd(n, args.per_row, args.seed)
            .with_context(|| format!("Failed to generate a {n}x{n} matrix"))?;
        write_matrix_market(&path, &matrix)
            .with_context(|| format!("Failed to write {:?}", &path))?;
        log::info!("Generated {:?} ({} nonzeros)", path, matrix.nnz());
    }

    log::info!("Matrix generation completed successfully.");
    Ok(())
}
