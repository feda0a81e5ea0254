//! Integer matrix powers by repeated squaring, benchmarked across a
//! sequential, a multi-core and an OpenCL-accelerated multiply

pub mod config;
pub mod error;
pub mod matrix;
#[cfg(feature = "opencl")]
pub mod opencl;
pub mod utils;

// Macros exported at crate level
#[macro_use]
mod macros {
    /// Checks the status code returned by an OpenCL call, tagging failures with a stage
    #[macro_export]
    macro_rules! cl_check {
        ($stage:expr, $expr:expr) => {{
            #[allow(unused_unsafe)]
            let code = unsafe { $expr };
            if code != $crate::opencl::types::CL_SUCCESS {
                Err($crate::error::MatpowError::accelerator($stage, code))
            } else {
                Ok(())
            }
        }};
    }

    /// Calls an OpenCL constructor, appending the `errcode_ret` argument and
    /// turning a null handle into an error for the given stage
    #[macro_export]
    macro_rules! cl_create {
        ($stage:expr, $func:ident($($arg:expr),* $(,)?)) => {{
            let mut code: $crate::opencl::types::cl_int = $crate::opencl::types::CL_SUCCESS;
            #[allow(unused_unsafe)]
            let obj = unsafe { $func($($arg,)* &mut code) };
            if obj.is_null() || code != $crate::opencl::types::CL_SUCCESS {
                let code = if code == $crate::opencl::types::CL_SUCCESS {
                    $crate::opencl::types::CL_INVALID_VALUE
                } else {
                    code
                };
                Err($crate::error::MatpowError::accelerator($stage, code))
            } else {
                Ok(obj)
            }
        }};
    }
}

// Re-exports for convenience
pub use config::{BenchArgs, Config, Variant};
pub use error::{MatpowError, Result, Stage};
pub use matrix::{matrix_power, Matrix, MatrixMultiply, ParallelMultiply, SequentialMultiply};
#[cfg(feature = "opencl")]
pub use opencl::OpenClAccelerator;
