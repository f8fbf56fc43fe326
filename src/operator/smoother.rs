//! Relaxation as a smoothing operator.

use crate::config::{ParamTree, SmootherType};
use crate::error::MgError;
use crate::matrix::{DistributedMatrix, DistributedVector};
use crate::operator::Operator;
use crate::preconditioner::{relaxation, richardson_step, Relaxation};

/// One preconditioned Richardson step x ← x − M⁻¹(A x − b), where M is the
/// relaxation selected by `smoother.type`.
///
/// The matrix is borrowed and must outlive the smoother.
pub struct SmootherOperator<'a> {
    matrix: &'a DistributedMatrix,
    kind: SmootherType,
    relaxation: Relaxation,
}

impl<'a> SmootherOperator<'a> {
    /// Reads `smoother.type` (default "Symmetric Gauss-Seidel") and
    /// `smoother.omega` (default 1.0) and sets up the relaxation.
    pub fn new(matrix: &'a DistributedMatrix, prm: &ParamTree) -> Result<Self, MgError> {
        let kind: SmootherType = prm.get_str("smoother.type", SmootherType::DEFAULT_NAME).parse()?;
        let omega = prm.try_get::<f64>("smoother.omega")?.unwrap_or(1.0);
        log::debug!("smoother: {kind} (omega = {omega}) on {}x{} matrix", matrix.m(), matrix.n());
        let relaxation = relaxation(kind, omega, matrix)?;
        Ok(Self { matrix, kind, relaxation })
    }

    pub fn kind(&self) -> SmootherType {
        self.kind
    }

    pub fn matrix(&self) -> &'a DistributedMatrix {
        self.matrix
    }
}

impl Operator for SmootherOperator<'_> {
    /// `b` is the right-hand side, `x` the iterate updated in place.
    fn apply(&self, b: &DistributedVector, x: &mut DistributedVector) -> Result<(), MgError> {
        let mut r = self.matrix.range_vector();
        let mut t = self.matrix.range_vector();
        richardson_step(self.matrix, self.relaxation.as_ref(), b, x, &mut r, &mut t)
    }

    fn build_domain_vector(&self) -> Result<DistributedVector, MgError> {
        Err(MgError::CapabilityNotSupported("build_domain_vector on a smoother"))
    }

    fn build_range_vector(&self) -> Result<DistributedVector, MgError> {
        Err(MgError::CapabilityNotSupported("build_range_vector on a smoother"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CsrMatrix;
    use crate::parallel::SerialComm;

    #[test]
    fn default_is_symmetric_gauss_seidel() {
        let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (1, 1, 2.0)]).unwrap();
        let a = DistributedMatrix::from_global(&a, SerialComm::shared());
        let s = SmootherOperator::new(&a, &ParamTree::new()).unwrap();
        assert_eq!(s.kind(), SmootherType::SymmetricGaussSeidel);
        assert!(matches!(s.build_range_vector(), Err(MgError::CapabilityNotSupported(_))));
    }

    #[test]
    fn bad_omega_is_an_invalid_parameter() {
        let a = CsrMatrix::from_triplets(1, 1, &[(0, 0, 1.0)]).unwrap();
        let a = DistributedMatrix::from_global(&a, SerialComm::shared());
        let mut prm = ParamTree::new();
        prm.put("smoother.omega", "fast");
        assert!(matches!(SmootherOperator::new(&a, &prm), Err(MgError::InvalidParameter { .. })));
    }
}
