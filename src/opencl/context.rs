//! Owning guards for OpenCL handles
//!
//! Each guard releases its handle exactly once when dropped, so partially
//! built setups clean up on every early return.

use super::bindings::*;
use super::types::*;

macro_rules! cl_guard {
    ($(#[$meta:meta])* $name:ident, $raw:ty, $release:ident) => {
        $(#[$meta])*
        pub struct $name {
            raw: $raw,
        }

        impl $name {
            /// Takes ownership of a handle returned by a successful create call
            pub(crate) fn from_raw(raw: $raw) -> Self {
                debug_assert!(!raw.is_null());
                Self { raw }
            }

            pub fn raw(&self) -> $raw {
                self.raw
            }
        }

        impl Drop for $name {
            fn drop(&mut self) {
                let code = unsafe { $release(self.raw) };
                if code != CL_SUCCESS {
                    log::warn!("{} failed with code {}", stringify!($release), code);
                } else {
                    log::trace!("{} released", stringify!($name));
                }
            }
        }
    };
}

cl_guard!(Context, cl_context, clReleaseContext);
cl_guard!(CommandQueue, cl_command_queue, clReleaseCommandQueue);
cl_guard!(Program, cl_program, clReleaseProgram);
cl_guard!(Kernel, cl_kernel, clReleaseKernel);
cl_guard!(
    /// Device-resident buffer
    Buffer,
    cl_mem,
    clReleaseMemObject
);
