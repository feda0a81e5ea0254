//! Runs every execution strategy on the same input and compares them

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use matpow::matrix::{max_relative_diff, matrix_power};
use matpow::{utils, BenchArgs, Config, Matrix, ParallelMultiply, SequentialMultiply, Variant};
use prettytable::{row, Table};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Compare sequential, multi-core and OpenCL matrix power
#[derive(Parser)]
#[command(name = "matpow", version)]
struct Cli {
    #[command(flatten)]
    bench: BenchArgs,

    /// Report format
    #[arg(long, value_enum, default_value = "table")]
    format: Format,

    /// Largest accepted relative difference from the sequential result
    #[arg(long, default_value_t = 1e-9)]
    tolerance: f64,
}

#[derive(Debug, Serialize)]
struct VariantReport {
    variant: Variant,
    millis: Option<f64>,
    max_relative_diff: Option<f64>,
    /// Why the variant did not run
    skipped: Option<String>,
}

#[derive(Debug, Serialize)]
struct Report {
    size: usize,
    power: u32,
    threads: usize,
    seed: u64,
    results: Vec<VariantReport>,
}

fn measured(variant: Variant, reference: Option<&Matrix>, run: impl FnOnce() -> matpow::Result<Matrix>) -> Result<(VariantReport, Matrix)> {
    let (result, duration) = utils::measure_time(run);
    let result = result.with_context(|| format!("{} matrix power failed", variant.label()))?;
    let diff = reference.map(|r| max_relative_diff(result.as_slice(), r.as_slice()));
    log::info!("{} finished in {:.3} ms", variant.label(), utils::millis(duration));
    let report = VariantReport {
        variant,
        millis: Some(utils::millis(duration)),
        max_relative_diff: Some(diff.unwrap_or(0.0)),
        skipped: None,
    };
    Ok((report, result))
}

#[cfg(feature = "opencl")]
fn run_opencl(config: &Config, a: &Matrix, reference: &Matrix) -> Result<VariantReport> {
    use matpow::OpenClAccelerator;

    let accelerator = match OpenClAccelerator::new(config.size) {
        Ok(accelerator) => accelerator,
        Err(e) => {
            log::warn!("OpenCL unavailable, skipping: {}", e);
            return Ok(skipped(Variant::OpenCl, e.to_string()));
        }
    };
    let (report, _) = measured(Variant::OpenCl, Some(reference), || accelerator.power(a, config.power))?;
    Ok(report)
}

#[cfg(not(feature = "opencl"))]
fn run_opencl(_config: &Config, _a: &Matrix, _reference: &Matrix) -> Result<VariantReport> {
    Ok(skipped(Variant::OpenCl, "built without the `opencl` feature".to_string()))
}

fn skipped(variant: Variant, reason: String) -> VariantReport {
    VariantReport { variant, millis: None, max_relative_diff: None, skipped: Some(reason) }
}

fn print_table(report: &Report) {
    let mut table = Table::new();
    table.add_row(row!["Variant", "Time (ms)", "Max rel. diff"]);
    for r in &report.results {
        match (&r.skipped, r.millis, r.max_relative_diff) {
            (Some(reason), _, _) => {
                table.add_row(row![r.variant.label(), "-", format!("skipped: {}", reason)]);
            }
            (None, Some(ms), Some(diff)) => {
                table.add_row(row![r.variant.label(), format!("{:.3}", ms), format!("{:e}", diff)]);
            }
            _ => {}
        }
    }
    println!(
        "A^{} for a {}x{} matrix (seed {}, {} threads)",
        report.power, report.size, report.size, report.seed, report.threads
    );
    table.printstd();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.bench.init_logging();
    let config = cli.bench.config()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let a = Matrix::random(config.size, &mut rng).context("failed to allocate the input matrix")?;

    let (sequential, reference) = measured(Variant::Sequential, None, || {
        matrix_power(&SequentialMultiply, &a, config.power)
    })?;

    let multiply = ParallelMultiply::new(config.threads)?;
    let (parallel, _) = measured(Variant::Parallel, Some(&reference), || {
        matrix_power(&multiply, &a, config.power)
    })?;

    let opencl = run_opencl(&config, &a, &reference)?;

    let report = Report {
        size: config.size,
        power: config.power,
        threads: config.threads,
        seed: config.seed,
        results: vec![sequential, parallel, opencl],
    };

    match cli.format {
        Format::Table => print_table(&report),
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    if cli.bench.show {
        print!("{}", reference.preview(4));
    }

    let diverged: Vec<&str> = report
        .results
        .iter()
        .filter(|r| r.max_relative_diff.map_or(false, |d| d > cli.tolerance))
        .map(|r| r.variant.label())
        .collect();
    if !diverged.is_empty() {
        bail!("results differ from the sequential reference: {}", diverged.join(", "));
    }
    Ok(())
}
