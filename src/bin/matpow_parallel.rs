//! Matrix power with the multi-core multiply
use anyhow::{Context, Result};
use clap::Parser;
use matpow::{matrix_power, utils, BenchArgs, Matrix, ParallelMultiply, Variant};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<()> {
    let args = BenchArgs::parse();
    args.init_logging();
    let config = args.config()?;

    // The pool lives for the whole run, outside the timed region
    let multiply = ParallelMultiply::new(config.threads)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let a = Matrix::random(config.size, &mut rng).context("failed to allocate the input matrix")?;

    let (result, duration) = utils::measure_time(|| matrix_power(&multiply, &a, config.power));
    let result = result.context("parallel matrix power failed")?;

    println!("{}", utils::timing_line(Variant::Parallel, duration));
    if args.show {
        print!("{}", result.preview(4));
    }
    Ok(())
}
