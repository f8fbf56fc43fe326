//! Core linear-algebra traits for mgops.
//!
//! These are the small seams shared by the local kernels (faer dense
//! matrices, [`CsrMatrix`](crate::matrix::CsrMatrix)) and the distributed
//! types. Distributed implementations are collective.

/// Matrix–vector product: y ← A x.
pub trait MatVec<V> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Inner products & norms over vectors of type `V`.
pub trait InnerProduct<V> {
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}

/// Global shape of a matrix.
pub trait Shape {
    /// Number of rows.
    fn m(&self) -> usize;
    /// Number of columns.
    fn n(&self) -> usize;
}
