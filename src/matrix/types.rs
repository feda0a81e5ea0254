//! Square matrix storage

use crate::error::{MatpowError, Result};
use rand::Rng;
use std::fmt;

/// Square matrix of doubles in row-major order: `(row, col)` lives at `row * size + col`
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    size: usize,
    data: Vec<f64>,
}

/// Number of elements of a `size`×`size` matrix
pub(crate) fn element_count(size: usize) -> Result<usize> {
    if size == 0 {
        return Err(MatpowError::invalid("matrix size must be positive"));
    }
    size.checked_mul(size)
        .ok_or_else(|| MatpowError::invalid(format!("matrix size {} overflows", size)))
}

fn alloc_filled(elements: usize, value: f64) -> Result<Vec<f64>> {
    let mut data = Vec::new();
    data.try_reserve_exact(elements)
        .map_err(|_| MatpowError::AllocationFailure { elements })?;
    data.resize(elements, value);
    Ok(data)
}

impl Matrix {
    /// All-zero matrix
    pub fn zeros(size: usize) -> Result<Self> {
        let data = alloc_filled(element_count(size)?, 0.0)?;
        Ok(Self { size, data })
    }

    pub fn identity(size: usize) -> Result<Self> {
        let mut m = Self::zeros(size)?;
        for i in 0..size {
            m.data[i * size + i] = 1.0;
        }
        Ok(m)
    }

    /// Matrix whose elements are integers drawn uniformly from `[0, 10)`, row by row.
    ///
    /// The generator belongs to the caller; seeding `StdRng` with the same value
    /// reproduces the same matrix.
    pub fn random<R: Rng>(size: usize, rng: &mut R) -> Result<Self> {
        let mut m = Self::zeros(size)?;
        for x in m.data.iter_mut() {
            *x = rng.gen_range(0..10u32) as f64;
        }
        Ok(m)
    }

    /// `randomize` selects between [`Matrix::random`] and [`Matrix::zeros`]
    pub fn allocate<R: Rng>(size: usize, randomize: Option<&mut R>) -> Result<Self> {
        match randomize {
            Some(rng) => Self::random(size, rng),
            None => Self::zeros(size),
        }
    }

    pub fn from_vec(size: usize, data: Vec<f64>) -> Result<Self> {
        let expected = element_count(size)?;
        if data.len() != expected {
            return Err(MatpowError::invalid(format!(
                "expected {} elements for a {}x{} matrix, got {}",
                expected, size, size, data.len()
            )));
        }
        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.size + col] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Checks that `other` has the same side length
    pub fn ensure_same_size(&self, other: &Matrix) -> Result<()> {
        if self.size != other.size {
            return Err(MatpowError::invalid(format!(
                "matrix size mismatch: {}x{} vs {}x{}",
                self.size, self.size, other.size, other.size
            )));
        }
        Ok(())
    }

    /// Top-left `n`×`n` corner, one row per line
    pub fn preview(&self, n: usize) -> String {
        let n = n.min(self.size);
        let mut out = String::new();
        for i in 0..n {
            for j in 0..n {
                out.push_str(&format!("{:.1} ", self.get(i, j)));
            }
            if n < self.size {
                out.push_str("...");
            }
            out.push('\n');
        }
        if n < self.size {
            out.push_str("...\n");
        }
        out
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.size {
            for j in 0..self.size {
                write!(f, "{} ", self.get(i, j))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
