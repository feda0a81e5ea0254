//! Matrix power on an OpenCL device
//!
//! The base matrix is uploaded once, the binary-exponentiation steps run on
//! three device-resident buffers whose roles rotate like the host
//! `acc`/`result`/`temp` trio, and only the final result is read back.

use super::bindings::*;
use super::callbacks::LOG_CONTEXT_ERRORS;
use super::context::{Buffer, CommandQueue, Context, Kernel, Program};
use super::types::*;
use super::utils::{info_bytes_to_string, to_c_string};
use crate::error::{MatpowError, Result, Stage};
use crate::matrix::kernels::{IDENTITY_KERNEL_NAME, MATRIX_KERNELS, MULTIPLY_KERNEL_NAME};
use crate::matrix::{schedule, Matrix, MatrixMultiply, Step};
use crate::{cl_check, cl_create};
use std::cell::Cell;
use std::ffi::c_void;
use std::ptr;

/// Lifecycle of the device context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    DeviceBound,
    KernelCompiled,
    BuffersAllocated,
    /// Number of dispatches completed in the current run
    Iterating(usize),
    Drained,
    Released,
}

// Buffer slots; the power loop permutes roles, not contents
const SLOT_A: usize = 0;
const SLOT_B: usize = 1;
const SLOT_C: usize = 2;

/// OpenCL execution context sized for one matrix dimension.
///
/// Fields are declared in reverse acquisition order so that dropping the
/// accelerator releases buffers, kernels, program, queue and context in
/// that order.
pub struct OpenClAccelerator {
    buffers: [Buffer; 3],
    identity_kernel: Kernel,
    multiply_kernel: Kernel,
    _program: Program,
    queue: CommandQueue,
    _context: Context,
    state: Cell<ContextState>,
    size: usize,
    device_name: String,
}

struct Device {
    id: cl_device_id,
    name: String,
    platform_name: String,
}

impl OpenClAccelerator {
    /// Binds a device, compiles the kernels and allocates three
    /// `size`×`size` buffers.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(MatpowError::invalid("matrix size must be positive"));
        }
        if i32::try_from(size).is_err() {
            return Err(MatpowError::invalid(format!("matrix size {} exceeds the kernel index range", size)));
        }
        let bytes = size
            .checked_mul(size)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f64>()))
            .ok_or_else(|| MatpowError::invalid(format!("matrix size {} overflows", size)))?;

        let state = Cell::new(ContextState::Uninitialized);

        let device = select_device()?;
        log::info!("using OpenCL device {} ({})", device.name, device.platform_name);

        let context = Context::from_raw(cl_create!(
            Stage::ContextCreation,
            clCreateContext(ptr::null(), 1, &device.id, LOG_CONTEXT_ERRORS, ptr::null_mut())
        )?);
        let queue = CommandQueue::from_raw(cl_create!(
            Stage::QueueCreation,
            clCreateCommandQueue(context.raw(), device.id, 0)
        )?);
        transition(&state, ContextState::DeviceBound);

        let program = build_program(&context, device.id)?;
        let multiply_kernel = create_kernel(&program, MULTIPLY_KERNEL_NAME)?;
        let identity_kernel = create_kernel(&program, IDENTITY_KERNEL_NAME)?;
        transition(&state, ContextState::KernelCompiled);

        let buffers = [
            create_buffer(&context, bytes)?,
            create_buffer(&context, bytes)?,
            create_buffer(&context, bytes)?,
        ];
        transition(&state, ContextState::BuffersAllocated);

        Ok(Self {
            buffers,
            identity_kernel,
            multiply_kernel,
            _program: program,
            queue,
            _context: context,
            state,
            size,
            device_name: device.name,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn state(&self) -> ContextState {
        self.state.get()
    }

    /// Computes `base^power` with a single upload and a single download
    pub fn power(&self, base: &Matrix, power: u32) -> Result<Matrix> {
        self.check_size(base)?;
        let mut result = Matrix::zeros(self.size)?;

        let (mut acc, mut res, mut tmp) = (SLOT_A, SLOT_B, SLOT_C);
        self.upload(acc, base)?;
        self.fill_identity(res)?;

        let mut dispatches = 0;
        transition(&self.state, ContextState::Iterating(dispatches));
        for step in schedule(power) {
            match step {
                Step::Accumulate => {
                    self.dispatch_multiply(res, acc, tmp)?;
                    std::mem::swap(&mut res, &mut tmp);
                }
                Step::Square => {
                    self.dispatch_multiply(acc, acc, tmp)?;
                    std::mem::swap(&mut acc, &mut tmp);
                }
            }
            dispatches += 1;
            transition(&self.state, ContextState::Iterating(dispatches));
        }

        self.download(res, &mut result)?;
        transition(&self.state, ContextState::Drained);
        Ok(result)
    }

    fn check_size(&self, m: &Matrix) -> Result<()> {
        if m.size() != self.size {
            return Err(MatpowError::invalid(format!(
                "accelerator sized for {}x{}, got {}x{}",
                self.size, self.size, m.size(), m.size()
            )));
        }
        Ok(())
    }

    fn bytes(&self) -> usize {
        self.size * self.size * std::mem::size_of::<f64>()
    }

    fn upload(&self, slot: usize, m: &Matrix) -> Result<()> {
        cl_check!(Stage::Upload, clEnqueueWriteBuffer(
            self.queue.raw(),
            self.buffers[slot].raw(),
            CL_TRUE,
            0,
            self.bytes(),
            m.as_slice().as_ptr() as *const c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ))
    }

    fn download(&self, slot: usize, m: &mut Matrix) -> Result<()> {
        cl_check!(Stage::Download, clEnqueueReadBuffer(
            self.queue.raw(),
            self.buffers[slot].raw(),
            CL_TRUE,
            0,
            self.bytes(),
            m.as_mut_slice().as_mut_ptr() as *mut c_void,
            0,
            ptr::null(),
            ptr::null_mut()
        ))
    }

    fn dispatch_multiply(&self, lhs: usize, rhs: usize, out: usize) -> Result<()> {
        let kernel = &self.multiply_kernel;
        set_arg(kernel, 0, &self.buffers[lhs].raw())?;
        set_arg(kernel, 1, &self.buffers[rhs].raw())?;
        set_arg(kernel, 2, &self.buffers[out].raw())?;
        set_arg(kernel, 3, &(self.size as cl_int))?;
        self.run(kernel)
    }

    fn fill_identity(&self, slot: usize) -> Result<()> {
        let kernel = &self.identity_kernel;
        set_arg(kernel, 0, &self.buffers[slot].raw())?;
        set_arg(kernel, 1, &(self.size as cl_int))?;
        self.run(kernel)
    }

    /// Dispatches one work-item per cell and blocks until the device is done
    fn run(&self, kernel: &Kernel) -> Result<()> {
        let global_size = [self.size, self.size];
        cl_check!(Stage::Dispatch, clEnqueueNDRangeKernel(
            self.queue.raw(),
            kernel.raw(),
            2,
            ptr::null(),
            global_size.as_ptr(),
            ptr::null(),
            0,
            ptr::null(),
            ptr::null_mut()
        ))?;
        cl_check!(Stage::Finish, clFinish(self.queue.raw()))?;
        log::trace!("dispatch of {}x{} grid finished", self.size, self.size);
        Ok(())
    }
}

impl MatrixMultiply for OpenClAccelerator {
    fn name(&self) -> &'static str {
        "opencl"
    }

    fn multiply(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        self.check_size(a)?;
        self.check_size(b)?;
        self.check_size(c)?;
        self.upload(SLOT_A, a)?;
        self.upload(SLOT_B, b)?;
        self.dispatch_multiply(SLOT_A, SLOT_B, SLOT_C)?;
        self.download(SLOT_C, c)
    }
}

impl Drop for OpenClAccelerator {
    fn drop(&mut self) {
        // fields are released right after this body, in declaration order
        transition(&self.state, ContextState::Released);
    }
}

fn transition(state: &Cell<ContextState>, next: ContextState) {
    let prev = state.replace(next);
    match next {
        ContextState::Iterating(n) if n > 0 => log::trace!("accelerator: {:?} -> {:?}", prev, next),
        _ => log::debug!("accelerator: {:?} -> {:?}", prev, next),
    }
}

fn set_arg<T>(kernel: &Kernel, index: cl_uint, value: &T) -> Result<()> {
    cl_check!(Stage::KernelArguments, clSetKernelArg(
        kernel.raw(),
        index,
        std::mem::size_of::<T>(),
        value as *const T as *const c_void
    ))
}

/// First GPU with double precision support, otherwise any such device
fn select_device() -> Result<Device> {
    let mut num_platforms: cl_uint = 0;
    cl_check!(Stage::PlatformDiscovery, clGetPlatformIDs(0, ptr::null_mut(), &mut num_platforms))?;
    if num_platforms == 0 {
        return Err(MatpowError::accelerator(Stage::PlatformDiscovery, CL_PLATFORM_NOT_FOUND_KHR));
    }
    let mut platforms = vec![ptr::null_mut(); num_platforms as usize];
    cl_check!(Stage::PlatformDiscovery, clGetPlatformIDs(num_platforms, platforms.as_mut_ptr(), ptr::null_mut()))?;

    for device_type in [CL_DEVICE_TYPE_GPU, CL_DEVICE_TYPE_ALL] {
        for &platform in &platforms {
            let mut num_devices: cl_uint = 0;
            let code = unsafe { clGetDeviceIDs(platform, device_type, 0, ptr::null_mut(), &mut num_devices) };
            if code != CL_SUCCESS || num_devices == 0 {
                continue;
            }
            let mut devices = vec![ptr::null_mut(); num_devices as usize];
            cl_check!(Stage::DeviceDiscovery, clGetDeviceIDs(
                platform,
                device_type,
                num_devices,
                devices.as_mut_ptr(),
                ptr::null_mut()
            ))?;

            for id in devices {
                let name = device_name(id)?;
                if !supports_fp64(id)? {
                    log::debug!("skipping {}: no double precision support", name);
                    continue;
                }
                return Ok(Device { id, name, platform_name: platform_name(platform)? });
            }
        }
    }

    Err(MatpowError::Accelerator {
        stage: Stage::DeviceDiscovery,
        code: CL_DEVICE_NOT_FOUND,
        detail: Some("no device with double precision support".to_string()),
    })
}

fn supports_fp64(device: cl_device_id) -> Result<bool> {
    let mut config: cl_device_fp_config = 0;
    cl_check!(Stage::DeviceDiscovery, clGetDeviceInfo(
        device,
        CL_DEVICE_DOUBLE_FP_CONFIG,
        std::mem::size_of::<cl_device_fp_config>(),
        &mut config as *mut _ as *mut c_void,
        ptr::null_mut()
    ))?;
    Ok(config != 0)
}

fn device_name(device: cl_device_id) -> Result<String> {
    let mut len = 0usize;
    cl_check!(Stage::DeviceDiscovery, clGetDeviceInfo(device, CL_DEVICE_NAME, 0, ptr::null_mut(), &mut len))?;
    let mut bytes = vec![0u8; len];
    cl_check!(Stage::DeviceDiscovery, clGetDeviceInfo(
        device,
        CL_DEVICE_NAME,
        len,
        bytes.as_mut_ptr() as *mut c_void,
        ptr::null_mut()
    ))?;
    Ok(info_bytes_to_string(&bytes))
}

fn platform_name(platform: cl_platform_id) -> Result<String> {
    let mut len = 0usize;
    cl_check!(Stage::PlatformDiscovery, clGetPlatformInfo(platform, CL_PLATFORM_NAME, 0, ptr::null_mut(), &mut len))?;
    let mut bytes = vec![0u8; len];
    cl_check!(Stage::PlatformDiscovery, clGetPlatformInfo(
        platform,
        CL_PLATFORM_NAME,
        len,
        bytes.as_mut_ptr() as *mut c_void,
        ptr::null_mut()
    ))?;
    Ok(info_bytes_to_string(&bytes))
}

fn build_program(context: &Context, device: cl_device_id) -> Result<Program> {
    let source = MATRIX_KERNELS.as_ptr() as *const std::ffi::c_char;
    let length = MATRIX_KERNELS.len();
    let program = Program::from_raw(cl_create!(
        Stage::ProgramBuild,
        clCreateProgramWithSource(context.raw(), 1, &source, &length)
    )?);

    if let Err(MatpowError::Accelerator { stage, code, .. }) = cl_check!(Stage::ProgramBuild, clBuildProgram(
        program.raw(),
        1,
        &device,
        ptr::null(),
        None,
        ptr::null_mut()
    )) {
        let build_log = read_build_log(&program, device);
        log::debug!("OpenCL build log:\n{}", build_log);
        return Err(MatpowError::Accelerator { stage, code, detail: Some(build_log) });
    }
    Ok(program)
}

fn read_build_log(program: &Program, device: cl_device_id) -> String {
    let mut len = 0usize;
    let code = unsafe {
        clGetProgramBuildInfo(program.raw(), device, CL_PROGRAM_BUILD_LOG, 0, ptr::null_mut(), &mut len)
    };
    if code != CL_SUCCESS || len == 0 {
        return String::from("<build log unavailable>");
    }
    let mut bytes = vec![0u8; len];
    let code = unsafe {
        clGetProgramBuildInfo(
            program.raw(),
            device,
            CL_PROGRAM_BUILD_LOG,
            len,
            bytes.as_mut_ptr() as *mut c_void,
            ptr::null_mut(),
        )
    };
    if code != CL_SUCCESS {
        return String::from("<build log unavailable>");
    }
    info_bytes_to_string(&bytes)
}

fn create_kernel(program: &Program, name: &str) -> Result<Kernel> {
    let name = to_c_string(name)?;
    Ok(Kernel::from_raw(cl_create!(
        Stage::KernelCreation,
        clCreateKernel(program.raw(), name.as_ptr())
    )?))
}

fn create_buffer(context: &Context, bytes: usize) -> Result<Buffer> {
    Ok(Buffer::from_raw(cl_create!(
        Stage::BufferAllocation,
        clCreateBuffer(context.raw(), CL_MEM_READ_WRITE, bytes, ptr::null_mut())
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected_before_touching_the_device() {
        assert!(matches!(OpenClAccelerator::new(0), Err(MatpowError::InvalidArgument(_))));
    }

    #[test]
    fn oversized_matrix_is_rejected_before_touching_the_device() {
        let too_big = i32::MAX as usize + 1;
        assert!(matches!(OpenClAccelerator::new(too_big), Err(MatpowError::InvalidArgument(_))));
    }

    #[test]
    fn transition_replaces_state() {
        let state = Cell::new(ContextState::Uninitialized);
        transition(&state, ContextState::DeviceBound);
        transition(&state, ContextState::Iterating(3));
        assert_eq!(state.get(), ContextState::Iterating(3));
    }
}
