//! Core trait implementations for faer dense matrices, local CSR matrices,
//! plain vectors and the distributed types.
//!
//! # Features
//! - Matrix-vector multiplication for `faer` dense matrices, [`CsrMatrix`] and
//!   [`DistributedMatrix`] (collective).
//! - Inner product and norm for `Vec<T>`, with optional Rayon parallelism, and
//!   for [`DistributedVector`] (collective reduction over the communicator).
//!
//! # References
//! - [faer crate documentation](https://docs.rs/faer)
//! - [num-traits crate documentation](https://docs.rs/num-traits)

use crate::core::traits::{InnerProduct, MatVec, Shape};
use crate::matrix::{CsrMatrix, DistributedMatrix, DistributedVector, SparseMatrix};
use faer::Mat;
use num_traits::Float;

/// Computes `y = A * x` where `A` is a dense matrix.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

impl<T> Shape for Mat<T> {
    fn m(&self) -> usize {
        self.nrows()
    }
    fn n(&self) -> usize {
        self.ncols()
    }
}

impl MatVec<Vec<f64>> for CsrMatrix {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        self.spmv(x, y);
    }
}

impl Shape for CsrMatrix {
    fn m(&self) -> usize {
        self.nrows()
    }
    fn n(&self) -> usize {
        self.ncols()
    }
}

/// Collective `y = A * x`.
impl MatVec<DistributedVector> for DistributedMatrix {
    fn matvec(&self, x: &DistributedVector, y: &mut DistributedVector) {
        self.vmult(y, x);
    }
}

impl Shape for DistributedMatrix {
    fn m(&self) -> usize {
        DistributedMatrix::m(self)
    }
    fn n(&self) -> usize {
        DistributedMatrix::n(self)
    }
}

/// Inner product and norm for vectors, with optional Rayon parallelism.
impl<T: Float + From<f64> + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.par_iter()
                .zip(y.par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    fn norm(&self, x: &Vec<T>) -> T {
        self.dot(x, x).sqrt()
    }
}

/// Collective inner product and norm of distributed vectors.
#[derive(Clone, Copy, Debug, Default)]
pub struct DistributedInnerProduct;

impl InnerProduct<DistributedVector> for DistributedInnerProduct {
    type Scalar = f64;
    fn dot(&self, x: &DistributedVector, y: &DistributedVector) -> f64 {
        x.dot(y)
    }
    fn norm(&self, x: &DistributedVector) -> f64 {
        x.l2_norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;

    #[test]
    fn sparse_and_dense_products_agree() {
        let dense = Mat::from_fn(3, 3, |i, j| if i == j { 2.0 } else if i + 1 == j { -1.0 } else { 0.0 });
        let sparse = CsrMatrix::from_dense(&dense);
        let x = vec![1.0, 2.0, 3.0];
        let (mut y1, mut y2) = (vec![0.0; 3], vec![0.0; 3]);
        dense.matvec(&x, &mut y1);
        sparse.matvec(&x, &mut y2);
        assert_eq!(y1, y2);
        assert_eq!((sparse.m(), sparse.n()), (3, 3));
    }

    #[test]
    fn distributed_inner_product() {
        let comm = SerialComm::shared();
        let x = DistributedVector::from_global(vec![3.0, 4.0], comm);
        let ip = DistributedInnerProduct;
        assert_eq!(ip.dot(&x, &x), 25.0);
        assert_eq!(ip.norm(&x), 5.0);
    }
}
