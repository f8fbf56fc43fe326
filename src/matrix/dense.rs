//! Dense‐matrix helpers on top of Faer.
//!
//! Dense matrices only appear where a whole (small) matrix is replicated on
//! every rank: the coarsest level of a hierarchy and reference checks in tests.

use crate::core::traits::{MatVec, Shape};
use faer::Mat;

/// Construction of dense matrices from the storage formats used in this crate.
pub trait DenseMatrix: MatVec<Vec<f64>> + Shape {
    /// Construct from raw column-major storage.
    fn from_raw(nrows: usize, ncols: usize, data: Vec<f64>) -> Self;
    /// Construct from (row, col, value) triplets; duplicates are summed.
    fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Self;
}

impl DenseMatrix for Mat<f64> {
    fn from_raw(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        Mat::from_fn(nrows, ncols, |i, j| data[j * nrows + i])
    }

    fn from_triplets(nrows: usize, ncols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut a = Mat::<f64>::zeros(nrows, ncols);
        for &(i, j, v) in triplets {
            a[(i, j)] += v;
        }
        a
    }
}
