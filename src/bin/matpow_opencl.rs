//! Matrix power on an OpenCL device
use anyhow::{Context, Result};
use clap::Parser;
use matpow::{utils, BenchArgs, Matrix, OpenClAccelerator, Variant};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<()> {
    let args = BenchArgs::parse();
    args.init_logging();
    let config = args.config()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let a = Matrix::random(config.size, &mut rng).context("failed to allocate the input matrix")?;

    // Device setup and teardown are part of the measured time
    let (result, duration) = utils::measure_time(|| {
        let accelerator = OpenClAccelerator::new(config.size)?;
        accelerator.power(&a, config.power)
    });
    let result = result.context("OpenCL matrix power failed")?;

    println!("{}", utils::timing_line(Variant::OpenCl, duration));
    if args.show {
        print!("{}", result.preview(4));
    }
    Ok(())
}
