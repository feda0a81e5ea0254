use approx::assert_relative_eq;
use matpow::matrix::{max_relative_diff, schedule};
use matpow::{matrix_power, Matrix, MatrixMultiply, ParallelMultiply, SequentialMultiply};
use ndarray::Array2;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

const TOLERANCE: f64 = 1e-9;

fn variants() -> Vec<Box<dyn MatrixMultiply>> {
    vec![
        Box::new(SequentialMultiply),
        Box::new(ParallelMultiply::new(8).unwrap()),
        Box::new(ParallelMultiply::new(3).unwrap()),
    ]
}

fn to_array(m: &Matrix) -> Array2<f64> {
    Array2::from_shape_vec((m.size(), m.size()), m.as_slice().to_vec()).unwrap()
}

fn product(mul: &dyn MatrixMultiply, a: &Matrix, b: &Matrix) -> Matrix {
    let mut c = Matrix::zeros(a.size()).unwrap();
    mul.multiply(a, b, &mut c).unwrap();
    c
}

#[test]
fn shear_matrix_to_the_fifth() {
    let shear = Matrix::from_vec(2, vec![1.0, 1.0, 0.0, 1.0]).unwrap();
    for mul in variants() {
        let r = matrix_power(mul.as_ref(), &shear, 5).unwrap();
        assert_eq!(r.as_slice(), &[1.0, 5.0, 0.0, 1.0], "variant {}", mul.name());
    }
}

#[test]
fn identity_input_stays_identity() {
    let id = Matrix::identity(3).unwrap();
    for mul in variants() {
        for p in [0, 1, 2, 7, 64, 1000] {
            assert_eq!(matrix_power(mul.as_ref(), &id, p).unwrap(), id);
        }
    }
}

#[test]
fn multiply_matches_ndarray() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = Matrix::random(23, &mut rng).unwrap();
    let b = Matrix::random(23, &mut rng).unwrap();
    let expected = to_array(&a).dot(&to_array(&b));
    for mul in variants() {
        let c = product(mul.as_ref(), &a, &b);
        for (x, y) in c.as_slice().iter().zip(expected.iter()) {
            assert_relative_eq!(*x, *y, max_relative = TOLERANCE);
        }
    }
}

#[test]
fn multiply_is_repeatable_and_leaves_inputs_alone() {
    let mut rng = StdRng::seed_from_u64(1);
    let a = Matrix::random(17, &mut rng).unwrap();
    let b = Matrix::random(17, &mut rng).unwrap();
    let (a0, b0) = (a.clone(), b.clone());
    for mul in variants() {
        let first = product(mul.as_ref(), &a, &b);
        let second = product(mul.as_ref(), &a, &b);
        assert_eq!(first, second);
        assert_eq!(a, a0);
        assert_eq!(b, b0);
    }
}

#[test]
fn power_adds_exponents() {
    let mut rng = StdRng::seed_from_u64(42);
    let a = Matrix::random(3, &mut rng).unwrap();
    let mul = SequentialMultiply;
    let whole = matrix_power(&mul, &a, 5).unwrap();
    let split = product(&mul, &matrix_power(&mul, &a, 2).unwrap(), &matrix_power(&mul, &a, 3).unwrap());
    assert!(max_relative_diff(whole.as_slice(), split.as_slice()) <= TOLERANCE);
}

#[test]
fn default_benchmark_input_agrees_across_variants() {
    // 100x100 to the 100th overflows; both variants must overflow identically
    let mut rng = StdRng::seed_from_u64(42);
    let a = Matrix::random(100, &mut rng).unwrap();
    let seq = matrix_power(&SequentialMultiply, &a, 100).unwrap();
    let par = matrix_power(&ParallelMultiply::new(8).unwrap(), &a, 100).unwrap();
    assert_eq!(max_relative_diff(par.as_slice(), seq.as_slice()), 0.0);
}

#[test]
fn multiplies_per_power_are_logarithmic() {
    assert_eq!(schedule(100).count(), 9);
    assert!(schedule(1 << 20).count() <= 21);
}

fn small_matrix() -> impl Strategy<Value = Matrix> {
    (1usize..6).prop_flat_map(|n| {
        prop::collection::vec(-4i32..5, n * n)
            .prop_map(move |v| Matrix::from_vec(n, v.into_iter().map(f64::from).collect()).unwrap())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn power_zero_is_identity(m in small_matrix()) {
        let id = Matrix::identity(m.size()).unwrap();
        for mul in variants() {
            prop_assert_eq!(&matrix_power(mul.as_ref(), &m, 0).unwrap(), &id);
        }
    }

    #[test]
    fn power_one_is_input(m in small_matrix()) {
        for mul in variants() {
            prop_assert_eq!(&matrix_power(mul.as_ref(), &m, 1).unwrap(), &m);
        }
    }

    #[test]
    fn parallel_agrees_with_sequential(m in small_matrix(), p in 0u32..40, threads in 1usize..9) {
        let seq = matrix_power(&SequentialMultiply, &m, p).unwrap();
        let par = matrix_power(&ParallelMultiply::new(threads).unwrap(), &m, p).unwrap();
        prop_assert!(max_relative_diff(par.as_slice(), seq.as_slice()) <= TOLERANCE);
    }

    #[test]
    fn power_matches_repeated_multiplication(m in small_matrix(), p in 0u32..12) {
        let mut expected = Matrix::identity(m.size()).unwrap();
        for _ in 0..p {
            expected = product(&SequentialMultiply, &expected, &m);
        }
        let actual = matrix_power(&SequentialMultiply, &m, p).unwrap();
        prop_assert!(max_relative_diff(actual.as_slice(), expected.as_slice()) <= TOLERANCE);
    }

    #[test]
    fn exponents_add(m in small_matrix(), p in 0u32..6, q in 0u32..6) {
        let mul = SequentialMultiply;
        let whole = matrix_power(&mul, &m, p + q).unwrap();
        let split = product(&mul, &matrix_power(&mul, &m, p).unwrap(), &matrix_power(&mul, &m, q).unwrap());
        prop_assert!(max_relative_diff(whole.as_slice(), split.as_slice()) <= TOLERANCE);
    }
}
