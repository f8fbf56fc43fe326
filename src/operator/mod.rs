//! Polymorphic operators consumed by a multigrid cycle driver.
//!
//! A cycle driver builds one [`DistributedMatrixOperator`] per level, one
//! [`SmootherOperator`] per non-coarsest level and one [`DirectOperator`] for
//! the coarsest level, then calls [`Operator::apply`] on them while cycling.
//!
//! Every method that touches distributed data is collective over the
//! communicator of the wrapped matrix.

use crate::error::MgError;
use crate::matrix::DistributedVector;
use std::any::Any;
use std::sync::Arc;

pub mod direct;
pub mod matrix;
pub mod smoother;

pub use direct::{CoarseSolver, DirectOperator};
pub use matrix::{DistributedMatrixOperator, LocalMatrixOperator};
pub use smoother::SmootherOperator;

/// A linear (or affine) map between distributed vectors.
pub trait Operator {
    /// Apply the operator. Matrix operators write y = A x; smoothers and
    /// coarse solvers read the right-hand side from `x` and update or
    /// overwrite the iterate `y`.
    fn apply(&self, x: &DistributedVector, y: &mut DistributedVector) -> Result<(), MgError>;

    /// New zero vector laid out like the operator's domain.
    fn build_domain_vector(&self) -> Result<DistributedVector, MgError>;

    /// New zero vector laid out like the operator's range.
    fn build_range_vector(&self) -> Result<DistributedVector, MgError>;
}

/// An operator backed by an explicit matrix, closed under transposition and
/// products with operators of the same kind.
pub trait MatrixOperator: Operator + Any {
    /// Operator wrapping the explicit transpose.
    fn transpose(&self) -> Result<Arc<dyn MatrixOperator>, MgError>;

    /// Operator wrapping the product `self * other`.
    ///
    /// `other` must be of the same kind as `self`; a different kind is a
    /// [`MgError::TypeMismatch`].
    fn multiply(&self, other: &dyn MatrixOperator) -> Result<Arc<dyn MatrixOperator>, MgError>;

    /// Name of the concrete kind, reported in type mismatches.
    fn kind(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}
