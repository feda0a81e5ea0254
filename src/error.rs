//! Error taxonomy shared by every execution strategy

use std::fmt;
use thiserror::Error;

/// Step of the accelerator pipeline a device call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PlatformDiscovery,
    DeviceDiscovery,
    ContextCreation,
    QueueCreation,
    ProgramBuild,
    KernelCreation,
    BufferAllocation,
    KernelArguments,
    Upload,
    Dispatch,
    Finish,
    Download,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PlatformDiscovery => "platform discovery",
            Stage::DeviceDiscovery => "device discovery",
            Stage::ContextCreation => "context creation",
            Stage::QueueCreation => "queue creation",
            Stage::ProgramBuild => "program build",
            Stage::KernelCreation => "kernel creation",
            Stage::BufferAllocation => "buffer allocation",
            Stage::KernelArguments => "kernel arguments",
            Stage::Upload => "upload",
            Stage::Dispatch => "dispatch",
            Stage::Finish => "finish",
            Stage::Download => "download",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum MatpowError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to allocate a matrix of {elements} elements")]
    AllocationFailure { elements: usize },

    #[error("OpenCL failure during {stage} (code {code}){}", detail_suffix(.detail))]
    Accelerator {
        stage: Stage,
        code: i32,
        detail: Option<String>,
    },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

impl MatpowError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        MatpowError::InvalidArgument(msg.into())
    }

    pub fn accelerator(stage: Stage, code: i32) -> Self {
        MatpowError::Accelerator { stage, code, detail: None }
    }

    /// Stage tag when this is a device failure
    pub fn stage(&self) -> Option<Stage> {
        match self {
            MatpowError::Accelerator { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d.trim_end()),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, MatpowError>;
