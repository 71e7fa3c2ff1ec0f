// Tests for numeric helpers: reductions, softmax, cross-entropy, argmax and
// the relative-error comparison.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use rust_cnn_layers::matrix::{Dense, Matrix, Vector};
use rust_cnn_layers::utils::{
    argmax, argmax_v, cross_entropy_error, max_rows, nearly_equal, normalize_each_row, softmax,
    softmax_vec, sum, sum_cols, sum_rows, SimpleRng,
};
use rust_cnn_layers::NnError;

// ============================================================================
// Softmax Tests
// ============================================================================

mod softmax_tests {
    use super::*;

    #[test]
    fn test_rows_sum_to_one() {
        let mut rng = SimpleRng::new(5);
        let x = Dense::new(4, 6, rng.uniform_vec(24, -10.0, 10.0)).unwrap();
        let y = softmax(&x);
        for s in sum_rows(&y).as_slice() {
            assert_abs_diff_eq!(*s, 1.0, epsilon = 1e-9);
        }
        assert!(y.data().iter().all(|&p| p > 0.0 && p <= 1.0));
    }

    #[test]
    fn test_shift_invariance() {
        let x = Dense::new(2, 3, vec![1.0, 2.0, 3.0, -1.0, 0.0, 4.0]).unwrap();
        let mut shifted = x.clone();
        shifted.map_inplace(|v| v + 250.0);
        let a = softmax(&x);
        let b = softmax(&shifted);
        for (p, q) in a.data().iter().zip(b.data()) {
            assert_abs_diff_eq!(*p, *q, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_large_inputs_do_not_overflow() {
        let x = Dense::new(1, 2, vec![1000.0, 0.0]).unwrap();
        let y = softmax(&x);
        assert!(y.data().iter().all(|p| p.is_finite()));
        assert_relative_eq!(y.at(0, 0), 1.0);
    }

    #[test]
    fn test_softmax_vec_matches_matrix_form() {
        let v = Vector::new(vec![0.5, -0.25, 2.0]);
        let y = softmax_vec(&v);
        let m = softmax(&*v.t());
        for j in 0..3 {
            assert_abs_diff_eq!(y.at_vec(j), m.at(0, j), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_each_row() {
        let mut m = Dense::new(2, 2, vec![1.0, 3.0, 2.0, 2.0]).unwrap();
        normalize_each_row(&mut m);
        assert_eq!(m.data(), &[0.25, 0.75, 0.5, 0.5]);
    }
}

// ============================================================================
// Cross-Entropy Tests
// ============================================================================

mod cross_entropy_tests {
    use super::*;

    #[test]
    fn test_single_column_is_sum() {
        let y = Vector::new(vec![0.1, 0.05, 0.6, 0.0, 0.05, 0.1, 0.0, 0.1, 0.0, 0.0]);
        let mut t = Vector::zeros(10);
        t.set_vec(2, 1.0);
        let loss = cross_entropy_error(&y, &t).unwrap();
        assert_abs_diff_eq!(loss, -(0.6f64 + 1e-6).ln(), epsilon = 1e-12);
        assert_abs_diff_eq!(loss, 0.5108256, epsilon = 1e-5);
    }

    #[test]
    fn test_batch_is_mean_over_rows() {
        let y = Dense::new(2, 2, vec![0.5, 0.5, 0.25, 0.75]).unwrap();
        let t = Dense::new(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let expected = -((0.5f64 + 1e-6).ln() + (0.75f64 + 1e-6).ln()) / 2.0;
        assert_abs_diff_eq!(cross_entropy_error(&y, &t).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_probability_is_finite() {
        let y = Dense::new(1, 2, vec![0.0, 1.0]).unwrap();
        let t = Dense::new(1, 2, vec![1.0, 0.0]).unwrap();
        assert!(cross_entropy_error(&y, &t).unwrap().is_finite());
    }

    #[test]
    fn test_shape_mismatch() {
        let y = Dense::zeros(2, 3);
        let t = Dense::zeros(3, 2);
        assert!(matches!(
            cross_entropy_error(&y, &t),
            Err(NnError::ShapeMismatch { .. })
        ));
    }
}

// ============================================================================
// Reduction and Argmax Tests
// ============================================================================

mod reduction_tests {
    use super::*;

    #[test]
    fn test_row_and_column_sums() {
        let m = Dense::new(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(sum_rows(&m).as_slice(), &[6.0, 15.0]);
        assert_eq!(sum_cols(&m).as_slice(), &[5.0, 7.0, 9.0]);
        assert_eq!(max_rows(&m).as_slice(), &[3.0, 6.0]);
        assert_eq!(sum(m.data()), 21.0);
    }

    #[test]
    fn test_argmax_first_wins() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(argmax(&[-1.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_argmax_v() {
        assert_eq!(argmax_v(&Vector::new(vec![7.0])).unwrap(), 0);
        assert_eq!(argmax_v(&Vector::new(vec![0.1, 0.9, 0.9])).unwrap(), 1);
        assert!(matches!(
            argmax_v(&Vector::zeros(0)),
            Err(NnError::EmptyVector)
        ));
    }

    #[test]
    fn test_nearly_equal() {
        assert!(nearly_equal(0.0, 0.0));
        assert!(nearly_equal(1.0, 1.0005));
        assert!(!nearly_equal(1.0, 1.01));
        assert!(nearly_equal(-0.03502011, -0.03502013));
    }
}
