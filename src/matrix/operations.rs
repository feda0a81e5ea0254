//! Multiply primitive and result comparison

use super::types::Matrix;
use crate::error::Result;

/// `C = A × B` for equally sized square matrices.
///
/// Implementations differ only in how the work is executed; `c` is fully
/// overwritten and must not alias `a` or `b` (the borrow checker enforces it).
pub trait MatrixMultiply {
    /// Short name used in logs and reports
    fn name(&self) -> &'static str;

    fn multiply(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()>;
}

pub(crate) fn check_operands(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<()> {
    a.ensure_same_size(b)?;
    a.ensure_same_size(c)
}

/// Single-threaded reference: i, j, k loop order with an f64 running sum
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialMultiply;

impl MatrixMultiply for SequentialMultiply {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn multiply(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        check_operands(a, b, c)?;
        let size = a.size();
        let (a, b) = (a.as_slice(), b.as_slice());
        let c = c.as_mut_slice();

        for i in 0..size {
            for j in 0..size {
                let mut sum = 0.0f64;
                for k in 0..size {
                    sum += a[i * size + k] * b[k * size + j];
                }
                c[i * size + j] = sum;
            }
        }
        Ok(())
    }
}

/// Largest element-wise difference scaled by the magnitude of the reference
pub fn max_relative_diff(result: &[f64], reference: &[f64]) -> f64 {
    result
        .iter()
        .zip(reference)
        .map(|(&x, &r)| {
            if x == r || (x.is_nan() && r.is_nan()) {
                // overflow yields matching infinities and NaNs
                0.0
            } else {
                (x - r).abs() / r.abs().max(1.0)
            }
        })
        .fold(0.0f64, |acc, d| if d.is_nan() { f64::INFINITY } else { acc.max(d) })
}

/// Compares a result with the reference within a relative tolerance
pub fn compare_results(result: &Matrix, reference: &Matrix, tolerance: f64) -> bool {
    if result.size() != reference.size() {
        return false;
    }
    let max_diff = max_relative_diff(result.as_slice(), reference.as_slice());
    if max_diff > tolerance {
        log::warn!(
            "results diverge: max relative difference {:e} exceeds {:e}",
            max_diff, tolerance
        );
        false
    } else {
        log::debug!("results agree (max relative difference {:e})", max_diff);
        true
    }
}
