//! Run configuration and the command line shared by every benchmark binary

use crate::error::{MatpowError, Result};
use clap::{Parser, ValueEnum};

pub const DEFAULT_SIZE: usize = 100;
pub const DEFAULT_POWER: u32 = 100;
pub const DEFAULT_THREADS: usize = 8;
pub const DEFAULT_SEED: u64 = 42;

/// Parameters of one benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Matrix side length
    pub size: usize,
    /// Exponent
    pub power: u32,
    /// Worker count of the parallel-CPU pool
    pub threads: usize,
    /// Seed of the input generator
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            power: DEFAULT_POWER,
            threads: DEFAULT_THREADS,
            seed: DEFAULT_SEED,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(MatpowError::invalid("matrix size must be positive"));
        }
        if self.threads == 0 {
            return Err(MatpowError::invalid("thread count must be positive"));
        }
        if self.size.checked_mul(self.size).is_none() {
            return Err(MatpowError::invalid(format!("matrix size {} overflows", self.size)));
        }
        Ok(())
    }
}

/// Execution strategy of the multiply primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Sequential,
    Parallel,
    #[value(name = "opencl")]
    #[serde(rename = "opencl")]
    OpenCl,
}

impl Variant {
    /// Label printed in the `Time (<label>): ...` line
    pub fn label(&self) -> &'static str {
        match self {
            Variant::Sequential => "sequential",
            Variant::Parallel => "parallel",
            Variant::OpenCl => "OpenCL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Arguments common to all binaries: `program [size] [power]`
#[derive(Debug, Clone, Parser)]
pub struct BenchArgs {
    /// Matrix side length
    #[arg(default_value_t = DEFAULT_SIZE)]
    pub size: usize,

    /// Exponent (0 yields the identity)
    #[arg(default_value_t = DEFAULT_POWER)]
    pub power: u32,

    /// Worker threads for the parallel variant
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Seed of the random input matrix
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Log level (RUST_LOG overrides per module)
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Print the top-left corner of the result
    #[arg(long)]
    pub show: bool,
}

impl BenchArgs {
    pub fn config(&self) -> Result<Config> {
        let config = Config {
            size: self.size,
            power: self.power,
            threads: self.threads,
            seed: self.seed,
        };
        config.validate()?;
        Ok(config)
    }

    /// Initializes env_logger with `--log-level` as the default filter
    pub fn init_logging(&self) {
        env_logger::Builder::new()
            .filter_level(self.log_level.into())
            .parse_default_env()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_programs() {
        let args = BenchArgs::parse_from(["matpow"]);
        let config = args.config().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.size, 100);
        assert_eq!(config.power, 100);
        assert_eq!(config.threads, 8);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn positional_size_and_power() {
        let args = BenchArgs::parse_from(["matpow", "64", "7", "--threads", "2"]);
        let config = args.config().unwrap();
        assert_eq!((config.size, config.power, config.threads), (64, 7, 2));
    }

    #[test]
    fn zero_power_is_accepted() {
        let args = BenchArgs::parse_from(["matpow", "3", "0"]);
        assert_eq!(args.config().unwrap().power, 0);
    }

    #[test]
    fn zero_size_is_rejected() {
        let args = BenchArgs::parse_from(["matpow", "0", "3"]);
        assert!(matches!(args.config(), Err(MatpowError::InvalidArgument(_))));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let config = Config { threads: 0, ..Config::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_power_fails_to_parse() {
        assert!(BenchArgs::try_parse_from(["matpow", "10", "-3"]).is_err());
        assert!(BenchArgs::try_parse_from(["matpow", "ten"]).is_err());
    }

    #[test]
    fn variant_labels() {
        assert_eq!(Variant::Sequential.label(), "sequential");
        assert_eq!(Variant::Parallel.label(), "parallel");
        assert_eq!(Variant::OpenCl.label(), "OpenCL");
    }
}
