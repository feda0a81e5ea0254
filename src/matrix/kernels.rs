//! OpenCL kernels for the accelerator

/// Entry point of [`MATRIX_KERNELS`] computing one output cell
pub const MULTIPLY_KERNEL_NAME: &str = "matrix_multiply";
/// Entry point of [`MATRIX_KERNELS`] writing the identity matrix
pub const IDENTITY_KERNEL_NAME: &str = "matrix_identity";

/// One work-item per output cell over a `size`×`size` grid.
///
/// Contraction into fma is disabled so each cell is summed exactly like the
/// host reference.
pub static MATRIX_KERNELS: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable
#pragma OPENCL FP_CONTRACT OFF

__kernel void matrix_multiply(
    __global const double* a,
    __global const double* b,
    __global double* c,
    const int size
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= size || col >= size) {
        return;
    }

    double sum = 0.0;
    for (int k = 0; k < size; ++k) {
        sum += a[row * size + k] * b[k * size + col];
    }
    c[row * size + col] = sum;
}

__kernel void matrix_identity(
    __global double* m,
    const int size
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= size || col >= size) {
        return;
    }
    m[row * size + col] = (row == col) ? 1.0 : 0.0;
}
"#;
