//! Multi-core multiply on a fixed rayon pool

use super::operations::{check_operands, MatrixMultiply};
use super::types::Matrix;
use crate::error::{MatpowError, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Splits the (i, j) output cells across a dedicated worker pool.
///
/// Each cell is written by exactly one worker and computed with the same
/// k-ordered sum as [`SequentialMultiply`](super::SequentialMultiply).
/// `multiply` returns only after every cell is done.
pub struct ParallelMultiply {
    pool: ThreadPool,
}

impl ParallelMultiply {
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(MatpowError::invalid("thread count must be positive"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("matpow-worker-{}", i))
            .build()
            .map_err(|e| MatpowError::ThreadPool(e.to_string()))?;
        log::debug!("parallel multiply pool with {} workers", threads);
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl MatrixMultiply for ParallelMultiply {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn multiply(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        check_operands(a, b, c)?;
        let size = a.size();
        let (a, b) = (a.as_slice(), b.as_slice());

        self.pool.install(|| {
            c.as_mut_slice()
                .par_iter_mut()
                .with_min_len(size)
                .enumerate()
                .for_each(|(cell, out)| {
                    let (i, j) = (cell / size, cell % size);
                    let mut sum = 0.0f64;
                    for k in 0..size {
                        sum += a[i * size + k] * b[k * size + j];
                    }
                    *out = sum;
                });
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::SequentialMultiply;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pool_has_requested_workers() {
        assert_eq!(ParallelMultiply::new(3).unwrap().threads(), 3);
    }

    #[test]
    fn zero_workers_is_invalid() {
        assert!(matches!(ParallelMultiply::new(0), Err(MatpowError::InvalidArgument(_))));
    }

    #[test]
    fn matches_sequential_on_random_input() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = Matrix::random(37, &mut rng).unwrap();
        let b = Matrix::random(37, &mut rng).unwrap();
        let mut expected = Matrix::zeros(37).unwrap();
        let mut actual = Matrix::zeros(37).unwrap();

        SequentialMultiply.multiply(&a, &b, &mut expected).unwrap();
        ParallelMultiply::new(8).unwrap().multiply(&a, &b, &mut actual).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn single_cell_matrix() {
        let a = Matrix::from_vec(1, vec![3.0]).unwrap();
        let mut c = Matrix::zeros(1).unwrap();
        ParallelMultiply::new(4).unwrap().multiply(&a, &a, &mut c).unwrap();
        assert_eq!(c.as_slice(), &[9.0]);
    }
}
