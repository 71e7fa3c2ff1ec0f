// Tests for the matrix abstraction and its lazy views: windows, zero padding,
// diagonal matrices, transposes and their compositions.

use rust_cnn_layers::matrix::{
    equal, mat_flatten, Dense, DiagMatrix, Matrix, SubMatrix, Vector, ZeroPadMatrix,
};
use rust_cnn_layers::tensor::{ImageShape, Images};
use rust_cnn_layers::NnError;

fn counting(rows: usize, cols: usize) -> Dense {
    Dense::new(rows, cols, (0..rows * cols).map(|i| i as f64 + 1.0).collect()).unwrap()
}

// ============================================================================
// SubMatrix / ZeroPadMatrix Composition Tests
// ============================================================================

mod composition_tests {
    use super::*;

    #[test]
    fn test_window_of_padding_matches_materialized_padding() {
        let m = counting(3, 4);
        for pad in 0..3 {
            let lazy = ZeroPadMatrix::new(&m, pad);
            let eager = Dense::from_matrix(&lazy);
            let (rows, cols) = eager.dims();
            assert_eq!((rows, cols), (3 + 2 * pad, 4 + 2 * pad));

            for i0 in 0..rows {
                for j0 in 0..cols {
                    for (h, w) in [(1, 1), (2, 2), (rows - i0, cols - j0)] {
                        if i0 + h > rows || j0 + w > cols {
                            continue;
                        }
                        let a = SubMatrix::new(&lazy, i0, j0, h, w).unwrap();
                        let b = SubMatrix::new(&eager, i0, j0, h, w).unwrap();
                        assert!(equal(&a, &b), "pad {} window ({}, {})", pad, i0, j0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_zero_padding_of_zero_is_identity() {
        let m = counting(2, 5);
        let padded = ZeroPadMatrix::new(&m, 0);
        assert_eq!(padded.dims(), m.dims());
        assert!(equal(&padded, &m));
    }

    #[test]
    fn test_padding_border_is_zero() {
        let m = counting(2, 2);
        let padded = ZeroPadMatrix::new(&m, 2);
        assert_eq!(padded.dims(), (6, 6));
        assert_eq!(padded.at(2, 2), 1.0);
        assert_eq!(padded.at(3, 3), 4.0);
        let border_sum: f64 = mat_flatten(&padded).iter().sum::<f64>() - 10.0;
        assert_eq!(border_sum, 0.0);
    }

    #[test]
    fn test_nested_windows() {
        let m = counting(5, 5);
        let outer = SubMatrix::new(&m, 1, 1, 4, 4).unwrap();
        let inner = SubMatrix::new(&outer, 1, 2, 2, 2).unwrap();
        // inner (0, 0) is parent (2, 3)
        assert_eq!(inner.at(0, 0), m.at(2, 3));
        assert_eq!(inner.at(1, 1), m.at(3, 4));
    }

    #[test]
    fn test_window_must_fit() {
        let m = counting(3, 3);
        assert!(matches!(
            SubMatrix::new(&m, 2, 0, 2, 1),
            Err(NnError::OutOfBounds { .. })
        ));
        assert!(SubMatrix::new(&m, 0, 0, 3, 3).is_ok());
        assert!(SubMatrix::new(&m, 3, 3, 0, 0).is_ok());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_window_access_out_of_range() {
        let m = counting(3, 3);
        let w = SubMatrix::new(&m, 1, 1, 2, 2).unwrap();
        w.at(2, 0);
    }
}

// ============================================================================
// Transpose Tests
// ============================================================================

mod transpose_tests {
    use super::*;

    #[test]
    fn test_double_transpose() {
        let m = counting(2, 3);
        let tt = m.t();
        let back = tt.t();
        assert!(equal(&*back, &m));
    }

    #[test]
    fn test_transpose_of_views() {
        let m = counting(3, 4);
        let padded = ZeroPadMatrix::new(&m, 1);
        let window = SubMatrix::new(&padded, 1, 0, 3, 4).unwrap();
        let wt = window.t();
        assert_eq!(wt.dims(), (4, 3));
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(window.at(i, j), wt.at(j, i));
            }
        }

        let pt = padded.t();
        assert_eq!(pt.dims(), (6, 5));
        assert_eq!(pt.at(2, 1), m.at(0, 1));
    }

    #[test]
    fn test_diag_is_symmetric() {
        let d = DiagMatrix::new(Vector::new(vec![1.0, 2.0, 3.0]));
        assert!(equal(&d, &*d.t()));
        assert_eq!(d.at(1, 1), 2.0);
        assert_eq!(d.at(0, 2), 0.0);
    }

    #[test]
    fn test_vector_transpose_is_row() {
        let v = Vector::new(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.dims(), (3, 1));
        assert_eq!(v.t().row(0), vec![1.0, 2.0, 3.0]);
    }
}

// ============================================================================
// Product and Plane Tests
// ============================================================================

mod product_tests {
    use super::*;

    #[test]
    fn test_product_with_diag_scales_rows() {
        let d = DiagMatrix::new(Vector::new(vec![2.0, 0.5]));
        let m = counting(2, 3);
        let p = Dense::product(&d, &m).unwrap();
        assert_eq!(p.row(0), vec![2.0, 4.0, 6.0]);
        assert_eq!(p.row(1), vec![2.0, 2.5, 3.0]);
    }

    #[test]
    fn test_product_shape_mismatch() {
        let a = counting(2, 3);
        let b = counting(2, 3);
        assert!(matches!(
            Dense::product(&a, &b),
            Err(NnError::ShapeMismatch { .. })
        ));
        assert!(Dense::product(&a, &*b.t()).is_ok());
    }

    #[test]
    fn test_plane_flatten_round_trip() {
        let shape = ImageShape::new(2, 3, 2, 2);
        let images = Images::new(shape, (0..shape.len()).map(|i| i as f64).collect()).unwrap();
        let mut rebuilt = Vec::new();
        for b in 0..2 {
            for c in 0..3 {
                rebuilt.extend(mat_flatten(&images.plane(b, c)));
            }
        }
        assert_eq!(rebuilt, images.data());
    }
}
