#![cfg(feature = "opencl")]

use matpow::matrix::compare_results;
use matpow::opencl::ContextState;
use matpow::{matrix_power, Matrix, MatpowError, MatrixMultiply, OpenClAccelerator, SequentialMultiply, Stage};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Accelerator for `size`, or `None` when the machine has no usable device
fn accelerator(size: usize) -> Option<OpenClAccelerator> {
    match OpenClAccelerator::new(size) {
        Ok(acc) => Some(acc),
        Err(MatpowError::Accelerator { stage: Stage::PlatformDiscovery | Stage::DeviceDiscovery, .. }) => {
            eprintln!("no OpenCL device, skipping");
            None
        }
        Err(e) => panic!("accelerator setup failed: {}", e),
    }
}

#[test]
fn shear_matrix_to_the_fifth() {
    let Some(acc) = accelerator(2) else { return };
    let shear = Matrix::from_vec(2, vec![1.0, 1.0, 0.0, 1.0]).unwrap();
    let r = acc.power(&shear, 5).unwrap();
    assert_eq!(r.as_slice(), &[1.0, 5.0, 0.0, 1.0]);
    assert_eq!(acc.state(), ContextState::Drained);
}

#[test]
fn power_zero_and_one() {
    let Some(acc) = accelerator(5) else { return };
    let m = Matrix::random(5, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(acc.power(&m, 0).unwrap(), Matrix::identity(5).unwrap());
    assert_eq!(acc.power(&m, 1).unwrap(), m);
}

#[test]
fn matches_sequential_power() {
    let Some(acc) = accelerator(33) else { return };
    let m = Matrix::random(33, &mut StdRng::seed_from_u64(42)).unwrap();
    for p in [2, 3, 10, 100] {
        let expected = matrix_power(&SequentialMultiply, &m, p).unwrap();
        let actual = acc.power(&m, p).unwrap();
        assert!(compare_results(&actual, &expected, 1e-9), "power {}", p);
    }
}

#[test]
fn multiply_is_repeatable() {
    let Some(acc) = accelerator(9) else { return };
    let mut rng = StdRng::seed_from_u64(3);
    let a = Matrix::random(9, &mut rng).unwrap();
    let b = Matrix::random(9, &mut rng).unwrap();
    let mut first = Matrix::zeros(9).unwrap();
    let mut second = Matrix::zeros(9).unwrap();
    acc.multiply(&a, &b, &mut first).unwrap();
    acc.multiply(&a, &b, &mut second).unwrap();
    assert_eq!(first, second);

    let mut expected = Matrix::zeros(9).unwrap();
    SequentialMultiply.multiply(&a, &b, &mut expected).unwrap();
    assert!(compare_results(&first, &expected, 1e-9));
}

#[test]
fn wrong_size_is_rejected() {
    let Some(acc) = accelerator(4) else { return };
    let m = Matrix::identity(3).unwrap();
    assert!(matches!(acc.power(&m, 2), Err(MatpowError::InvalidArgument(_))));
}
