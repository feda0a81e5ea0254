//! OpenCL support
//!
//! Raw bindings plus the safe wrappers the accelerator is built from

pub mod bindings;
pub mod types;
pub mod callbacks;
pub mod context;
pub mod accelerator;
pub mod utils;

pub use accelerator::{ContextState, OpenClAccelerator};
