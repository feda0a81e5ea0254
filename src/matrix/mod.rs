//! Matrix storage, multiply primitives and the power engine
//!
//! Provides:
//! - Row-major square matrices
//! - Sequential and multi-core multiplication
//! - Binary exponentiation over any multiply primitive
//! - OpenCL kernel sources for the accelerator

mod types;
pub mod operations;
pub mod parallel;
pub mod power;
pub mod kernels;

pub use types::Matrix;
pub use operations::{compare_results, max_relative_diff, MatrixMultiply, SequentialMultiply};
pub use parallel::ParallelMultiply;
pub use power::{matrix_power, schedule, Step};
pub use kernels::MATRIX_KERNELS;
