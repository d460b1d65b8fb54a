//! Unit tests for traffic-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, NodeId, StreetId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(AgentId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(AgentId(0) < AgentId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(StreetId::INVALID.0, u32::MAX);
    }

    #[test]
    fn street_encoding_roundtrip() {
        let n = 12;
        let id = StreetId::encode(NodeId(3), NodeId(7), n);
        assert_eq!(id, StreetId(3 * 12 + 7));
        assert_eq!(id.decode(n), (NodeId(3), NodeId(7)));
    }

    #[test]
    fn display() {
        assert_eq!(NodeId(7).to_string(), "NodeId(7)");
    }
}

#[cfg(test)]
mod matrix {
    use crate::{MatrixError, SparseMatrix};

    fn filled_3x3() -> SparseMatrix<i32> {
        // 3x3 with cells (0,0)=1, (0,2)=2, (1,1)=3, (2,0)=4
        let mut m = SparseMatrix::new(3, 3);
        m.insert(0, 0, 1).unwrap();
        m.insert(0, 2, 2).unwrap();
        m.insert(1, 1, 3).unwrap();
        m.insert(2, 0, 4).unwrap();
        m
    }

    #[test]
    fn insert_and_get() {
        let m = filled_3x3();
        assert_eq!(m.get(0, 0).unwrap(), 1);
        assert_eq!(m.get(0, 2).unwrap(), 2);
        assert_eq!(m.get(1, 0).unwrap(), 0); // absent cell reads as default
        assert_eq!(m.len(), 4);
        assert_eq!(m.max_len(), 9);
    }

    #[test]
    fn insert_duplicate_fails() {
        let mut m = filled_3x3();
        assert!(matches!(m.insert(0, 0, 9), Err(MatrixError::Duplicate { .. })));
        m.insert_or_assign(0, 0, 9).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), 9);
    }

    #[test]
    fn out_of_range_everywhere() {
        let mut m = filled_3x3();
        assert!(matches!(m.insert(3, 0, 1), Err(MatrixError::OutOfRange { .. })));
        assert!(matches!(m.get(0, 3), Err(MatrixError::OutOfRange { .. })));
        assert!(matches!(m.erase(5, 5), Err(MatrixError::OutOfRange { .. })));
        assert!(matches!(m.row(3, false), Err(MatrixError::OutOfRange { .. })));
    }

    #[test]
    fn erase_missing_cell_is_not_found() {
        let mut m = filled_3x3();
        assert!(matches!(m.erase(1, 0), Err(MatrixError::NotFound { .. })));
        m.erase(1, 1).unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 0);
    }

    #[test]
    fn erase_row_rekeys_survivors() {
        let mut m = filled_3x3();
        m.erase_row(0).unwrap();
        assert_eq!(m.rows(), 2);
        // old (1,1) and (2,0) shift up one row
        assert_eq!(m.get(0, 1).unwrap(), 3);
        assert_eq!(m.get(1, 0).unwrap(), 4);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn erase_column_rekeys_survivors() {
        let mut m = filled_3x3();
        m.erase_column(1).unwrap();
        assert_eq!(m.cols(), 2);
        assert_eq!(m.get(0, 0).unwrap(), 1);
        assert_eq!(m.get(0, 1).unwrap(), 2); // old (0,2) shifts left
        assert_eq!(m.get(2, 0).unwrap(), 4);
        assert_eq!(m.len(), 3); // (1,1) dropped with the column
    }

    #[test]
    fn empty_row_keeps_dimensions() {
        let mut m = filled_3x3();
        m.empty_row(0).unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.get(0, 0).unwrap(), 0);
        assert_eq!(m.get(1, 1).unwrap(), 3);
    }

    #[test]
    fn empty_column_keeps_dimensions() {
        let mut m = filled_3x3();
        m.empty_column(0).unwrap();
        assert_eq!(m.cols(), 3);
        assert_eq!(m.get(0, 0).unwrap(), 0);
        assert_eq!(m.get(2, 0).unwrap(), 0);
        assert_eq!(m.get(0, 2).unwrap(), 2);
    }

    #[test]
    fn row_and_col_views() {
        let m = filled_3x3();
        let row0 = m.row(0, false).unwrap();
        assert_eq!((row0.rows(), row0.cols()), (1, 3));
        assert_eq!(row0.get(0, 0).unwrap(), 1);
        assert_eq!(row0.get(0, 2).unwrap(), 2);

        let row0_keep = m.row(0, true).unwrap();
        assert_eq!((row0_keep.rows(), row0_keep.cols()), (3, 3));
        assert_eq!(row0_keep.get(0, 2).unwrap(), 2);
        assert_eq!(row0_keep.len(), 2);

        let col0 = m.col(0, false).unwrap();
        assert_eq!((col0.rows(), col0.cols()), (3, 1));
        assert_eq!(col0.get(0, 0).unwrap(), 1);
        assert_eq!(col0.get(2, 0).unwrap(), 4);
    }

    #[test]
    fn row_entries_ascending() {
        let m = filled_3x3();
        let cols: Vec<u32> = m.row_entries(0).unwrap().map(|(j, _)| j).collect();
        assert_eq!(cols, vec![0, 2]);
    }

    #[test]
    fn insert_and_expand_grows_square() {
        let mut m: SparseMatrix<i32> = SparseMatrix::new(2, 2);
        m.insert_and_expand(3, 1, 7);
        assert!(m.rows() >= 4 && m.cols() >= 2);
        assert_eq!(m.rows(), m.cols());
        assert_eq!(m.get(3, 1).unwrap(), 7);
    }

    #[test]
    fn insert_and_expand_column_vector() {
        let mut v: SparseMatrix<i32> = SparseMatrix::column(2);
        v.insert_and_expand(5, 0, 7);
        assert_eq!(v.cols(), 1);
        assert!(v.rows() >= 6);
        assert_eq!(v.get(5, 0).unwrap(), 7);
    }

    #[test]
    fn degree_strength_laplacian() {
        let m = filled_3x3();
        let degree = m.degree_vector().unwrap();
        assert_eq!(degree.get(0, 0).unwrap(), 2);
        assert_eq!(degree.get(1, 0).unwrap(), 1);
        assert_eq!(degree.get(2, 0).unwrap(), 1);

        let strength = m.strength_vector().unwrap();
        assert_eq!(strength.get(0, 0).unwrap(), 3.0); // 1 + 2
        assert_eq!(strength.get(2, 0).unwrap(), 4.0);

        let lap = m.laplacian().unwrap();
        assert_eq!(lap.get(0, 0).unwrap(), 2); // degree on the diagonal
        assert_eq!(lap.get(0, 2).unwrap(), -1);
        assert_eq!(lap.get(2, 0).unwrap(), -1);

        let rect: SparseMatrix<i32> = SparseMatrix::new(2, 3);
        assert!(matches!(rect.degree_vector(), Err(MatrixError::NotSquare { .. })));
    }

    #[test]
    fn norm_rows_l1_sums() {
        let m = filled_3x3();
        let norm = m.norm_rows();
        // populated rows sum to 1
        let row0: f64 = norm.row_entries(0).unwrap().map(|(_, v)| *v).sum();
        assert!((row0 - 1.0).abs() < 1e-12);
        let row2: f64 = norm.row_entries(2).unwrap().map(|(_, v)| *v).sum();
        assert!((row2 - 1.0).abs() < 1e-12);
        // a row with no cells stays empty
        let mut empty_rowed: SparseMatrix<i32> = SparseMatrix::new(2, 2);
        empty_rowed.insert(0, 0, 5).unwrap();
        let n = empty_rowed.norm_rows();
        let row1: f64 = n.row_entries(1).unwrap().map(|(_, v)| *v).sum();
        assert_eq!(row1, 0.0);
    }

    #[test]
    fn norm_cols_l1_sums() {
        let m = filled_3x3();
        let norm = m.norm_cols();
        // column 0 holds 1 and 4
        assert!((norm.get(0, 0).unwrap() - 0.2).abs() < 1e-12);
        assert!((norm.get(2, 0).unwrap() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn transpose_and_symmetrize() {
        let m = filled_3x3();
        let t = m.transpose();
        assert_eq!(t.get(2, 0).unwrap(), 2);
        assert_eq!(t.get(0, 2).unwrap(), 4);

        let mut s = filled_3x3();
        s.symmetrize().unwrap();
        assert_eq!(s.get(0, 2).unwrap(), 2 + 4);
        assert_eq!(s.get(2, 0).unwrap(), 4 + 2);
        assert_eq!(s.get(1, 1).unwrap(), 6);
    }

    #[test]
    fn add_sub_shape_checked() {
        let a = filled_3x3();
        let b = filled_3x3();
        let sum = a.try_add(&b).unwrap();
        assert_eq!(sum.get(0, 0).unwrap(), 2);
        let diff = a.try_sub(&b).unwrap();
        assert_eq!(diff.get(0, 0).unwrap(), 0);

        let rect: SparseMatrix<i32> = SparseMatrix::new(2, 3);
        assert!(matches!(
            a.try_add(&rect),
            Err(MatrixError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn reshape_drops_out_of_extent() {
        let mut m = filled_3x3();
        m.reshape(2, 3); // keeps linear keys < 6
        assert_eq!((m.rows(), m.cols()), (2, 3));
        assert_eq!(m.get(0, 0).unwrap(), 1);
        assert_eq!(m.get(1, 1).unwrap(), 3);
        assert_eq!(m.len(), 3); // (2,0) at linear 6 dropped
    }

    #[test]
    fn reshape_rekeys_with_old_column_count() {
        let mut m: SparseMatrix<i32> = SparseMatrix::new(2, 2);
        m.insert(1, 1, 9).unwrap(); // linear 3
        m.reshape(2, 3);
        // survivor recovered as (1,1) with the old width, re-encoded wide
        assert_eq!(m.get(1, 1).unwrap(), 9);
        assert_eq!(m.get_linear(4).unwrap(), 9);
    }

    #[test]
    fn reshape_twice_preserves_in_range_cells() {
        let mut m: SparseMatrix<i32> = SparseMatrix::new(4, 4);
        m.insert(1, 2, 5).unwrap();
        m.insert(0, 0, 1).unwrap();
        m.reshape(3, 3);
        m.reshape(4, 4);
        assert_eq!(m.get(0, 0).unwrap(), 1);
        assert_eq!(m.get(1, 2).unwrap(), 5);
    }

    #[test]
    fn clear_zeroes_dimensions() {
        let mut m = filled_3x3();
        m.clear();
        assert_eq!((m.rows(), m.cols()), (0, 0));
        assert!(m.is_empty());
    }

    #[test]
    fn iter_is_sorted() {
        let m = filled_3x3();
        let keys: Vec<u32> = m.iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = SimRng::new(12345);
        let mut r2 = SimRng::new(12345);
        for _ in 0..100 {
            let a: f64 = r1.random();
            let b: f64 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut r0 = SimRng::new(1);
        let mut r1 = SimRng::new(2);
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b);
    }

    #[test]
    fn gen_range_in_bounds() {
        let mut rng = SimRng::new(0);
        for _ in 0..1000 {
            let v = rng.gen_range(0.0f64..1.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = SimRng::new(0);
        let empty: [u32; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[7]).copied(), Some(7));
    }
}

#[cfg(test)]
mod measure {
    use crate::Measurement;

    #[test]
    fn empty_is_zero() {
        let m = Measurement::from_samples(std::iter::empty());
        assert_eq!(m.mean, 0.0);
        assert_eq!(m.std, 0.0);
    }

    #[test]
    fn constant_samples() {
        let m = Measurement::from_samples([3.0, 3.0, 3.0]);
        assert_eq!(m.mean, 3.0);
        assert!(m.std < 1e-12);
    }

    #[test]
    fn known_spread() {
        // mean 2, population variance 2/3
        let m = Measurement::from_samples([1.0, 2.0, 3.0]);
        assert!((m.mean - 2.0).abs() < 1e-12);
        assert!((m.std - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }
}
