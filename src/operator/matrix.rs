//! Matrix operators.

use crate::error::MgError;
use crate::matrix::{CsrMatrix, DistributedMatrix, DistributedVector, SparseMatrix, SparsityPattern};
use crate::operator::{MatrixOperator, Operator};
use std::any::Any;
use std::sync::Arc;

/// Operator over an assembled distributed sparse matrix.
#[derive(Debug, Clone)]
pub struct DistributedMatrixOperator {
    matrix: Arc<DistributedMatrix>,
}

impl DistributedMatrixOperator {
    pub const KIND: &'static str = "DistributedMatrixOperator";

    pub fn new(matrix: Arc<DistributedMatrix>) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &Arc<DistributedMatrix> {
        &self.matrix
    }
}

impl From<DistributedMatrix> for DistributedMatrixOperator {
    fn from(matrix: DistributedMatrix) -> Self {
        Self::new(Arc::new(matrix))
    }
}

impl Operator for DistributedMatrixOperator {
    fn apply(&self, x: &DistributedVector, y: &mut DistributedVector) -> Result<(), MgError> {
        self.matrix.vmult(y, x);
        Ok(())
    }

    fn build_domain_vector(&self) -> Result<DistributedVector, MgError> {
        Ok(self.matrix.domain_vector())
    }

    fn build_range_vector(&self) -> Result<DistributedVector, MgError> {
        Ok(self.matrix.range_vector())
    }
}

impl MatrixOperator for DistributedMatrixOperator {
    fn transpose(&self) -> Result<Arc<dyn MatrixOperator>, MgError> {
        Ok(Arc::new(Self::from(self.matrix.transpose())))
    }

    fn multiply(&self, other: &dyn MatrixOperator) -> Result<Arc<dyn MatrixOperator>, MgError> {
        let other = other
            .as_any()
            .downcast_ref::<Self>()
            .ok_or(MgError::TypeMismatch { expected: Self::KIND, found: other.kind() })?;
        let product = self.matrix.mmult(&other.matrix)?;
        Ok(Arc::new(Self::from(product)))
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Minimal operator over a serial CSR matrix and its sparsity pattern.
///
/// Supports `apply` only, acting on the local values of the vectors.
#[derive(Debug, Clone)]
pub struct LocalMatrixOperator {
    matrix: Arc<CsrMatrix>,
    pattern: Arc<SparsityPattern>,
}

impl LocalMatrixOperator {
    pub const KIND: &'static str = "LocalMatrixOperator";

    /// Both handles are required and `pattern` must describe `matrix`.
    pub fn new(
        matrix: Option<Arc<CsrMatrix>>,
        pattern: Option<Arc<SparsityPattern>>,
    ) -> Result<Self, MgError> {
        let matrix = matrix.ok_or(MgError::PreconditionViolation("matrix handle is missing"))?;
        let pattern = pattern.ok_or(MgError::PreconditionViolation("sparsity pattern handle is missing"))?;
        if !matrix.has_pattern(&pattern) {
            return Err(MgError::PreconditionViolation(
                "sparsity pattern does not describe the matrix",
            ));
        }
        Ok(Self { matrix, pattern })
    }

    pub fn matrix(&self) -> &Arc<CsrMatrix> {
        &self.matrix
    }

    pub fn pattern(&self) -> &Arc<SparsityPattern> {
        &self.pattern
    }
}

impl Operator for LocalMatrixOperator {
    fn apply(&self, x: &DistributedVector, y: &mut DistributedVector) -> Result<(), MgError> {
        if x.local().len() != self.matrix.ncols() {
            return Err(MgError::DimensionMismatch { expected: self.matrix.ncols(), found: x.local().len() });
        }
        if y.local().len() != self.matrix.nrows() {
            return Err(MgError::DimensionMismatch { expected: self.matrix.nrows(), found: y.local().len() });
        }
        self.matrix.spmv(x.local(), y.local_mut());
        Ok(())
    }

    fn build_domain_vector(&self) -> Result<DistributedVector, MgError> {
        Err(MgError::CapabilityNotSupported("build_domain_vector on a local matrix operator"))
    }

    fn build_range_vector(&self) -> Result<DistributedVector, MgError> {
        Err(MgError::CapabilityNotSupported("build_range_vector on a local matrix operator"))
    }
}

impl MatrixOperator for LocalMatrixOperator {
    fn transpose(&self) -> Result<Arc<dyn MatrixOperator>, MgError> {
        Err(MgError::CapabilityNotSupported("transpose on a local matrix operator"))
    }

    fn multiply(&self, _other: &dyn MatrixOperator) -> Result<Arc<dyn MatrixOperator>, MgError> {
        Err(MgError::CapabilityNotSupported("multiply on a local matrix operator"))
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;

    fn sample() -> CsrMatrix {
        CsrMatrix::from_triplets(3, 2, &[(0, 0, 1.0), (1, 1, 2.0), (2, 0, -1.0), (2, 1, 3.0)]).unwrap()
    }

    #[test]
    fn transpose_swaps_layouts() {
        let op = DistributedMatrixOperator::from(DistributedMatrix::from_global(&sample(), SerialComm::shared()));
        let t = op.transpose().unwrap();
        assert_eq!(t.build_domain_vector().unwrap().size(), 3);
        assert_eq!(t.build_range_vector().unwrap().size(), 2);
    }

    #[test]
    fn local_operator_requires_both_handles() {
        let a = Arc::new(sample());
        let p = Arc::new(a.pattern());
        assert!(matches!(
            LocalMatrixOperator::new(None, Some(p.clone())),
            Err(MgError::PreconditionViolation(_))
        ));
        assert!(matches!(
            LocalMatrixOperator::new(Some(a.clone()), None),
            Err(MgError::PreconditionViolation(_))
        ));
        let other = Arc::new(SparsityPattern::from_rows(2, &[vec![0], vec![0], vec![1]]).unwrap());
        assert!(matches!(
            LocalMatrixOperator::new(Some(a.clone()), Some(other)),
            Err(MgError::PreconditionViolation(_))
        ));
        assert!(LocalMatrixOperator::new(Some(a), Some(p)).is_ok());
    }
}
