//! Matrix power with the single-threaded multiply
use anyhow::{Context, Result};
use clap::Parser;
use matpow::{matrix_power, utils, BenchArgs, Matrix, SequentialMultiply, Variant};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<()> {
    let args = BenchArgs::parse();
    args.init_logging();
    let config = args.config()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let a = Matrix::random(config.size, &mut rng).context("failed to allocate the input matrix")?;

    let (result, duration) = utils::measure_time(|| matrix_power(&SequentialMultiply, &a, config.power));
    let result = result.context("sequential matrix power failed")?;

    println!("{}", utils::timing_line(Variant::Sequential, duration));
    if args.show {
        print!("{}", result.preview(4));
    }
    Ok(())
}
