//! Matrix power by binary exponentiation
//!
//! The step sequence is computed once by [`schedule`] and replayed by every
//! execution strategy, on host buffers here and on device buffers in the
//! OpenCL accelerator, so all of them perform the same multiplications.

use super::operations::MatrixMultiply;
use super::types::Matrix;
use crate::error::Result;
use std::mem;

/// One multiply of the exponentiation loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// `result ← result × acc`
    Accumulate,
    /// `acc ← acc × acc`
    Square,
}

/// Steps of `base^power`, least significant bit first.
///
/// `acc` starts as `base` and `result` as the identity. The square after the
/// highest set bit would never be read and is left out, so `power` needs
/// `popcount + floor(log2)` multiplies and `0` needs none.
pub fn schedule(power: u32) -> Schedule {
    Schedule { remaining: power, pending_square: false }
}

#[derive(Debug, Clone)]
pub struct Schedule {
    remaining: u32,
    pending_square: bool,
}

impl Iterator for Schedule {
    type Item = Step;

    fn next(&mut self) -> Option<Step> {
        if self.pending_square {
            self.pending_square = false;
            return Some(Step::Square);
        }
        if self.remaining == 0 {
            return None;
        }
        let bit = self.remaining & 1 == 1;
        self.remaining >>= 1;
        if bit {
            self.pending_square = self.remaining > 0;
            Some(Step::Accumulate)
        } else {
            Some(Step::Square)
        }
    }
}

/// Computes `base^power` using `mul` for every product.
///
/// `base` is only borrowed; the returned matrix is new. Each multiply writes
/// into a scratch buffer that is then swapped in, so no product reads the
/// buffer it writes.
pub fn matrix_power<M>(mul: &M, base: &Matrix, power: u32) -> Result<Matrix>
where
    M: MatrixMultiply + ?Sized,
{
    let size = base.size();
    let mut result = Matrix::identity(size)?;
    if power == 0 {
        return Ok(result);
    }
    let mut acc = base.clone();
    let mut temp = Matrix::zeros(size)?;

    for step in schedule(power) {
        match step {
            Step::Accumulate => {
                mul.multiply(&result, &acc, &mut temp)?;
                mem::swap(&mut result, &mut temp);
            }
            Step::Square => {
                mul.multiply(&acc, &acc, &mut temp)?;
                mem::swap(&mut acc, &mut temp);
            }
        }
    }
    log::debug!("{}: computed power {} of a {}x{} matrix", mul.name(), power, size, size);
    Ok(result)
}
