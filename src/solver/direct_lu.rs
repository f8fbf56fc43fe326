//! Direct coarse-level solver using Faer's LU factorization.
//!
//! The distributed matrix is gathered into a dense matrix replicated on every
//! rank and factorized once, with partial (row) pivoting, when the solver is built.
//! Each solve gathers the right-hand side, solves redundantly on all ranks and
//! keeps the owned part of the solution. This is only sensible for the small
//! matrices found on the coarsest level of a hierarchy.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs
//! - Golub & Van Loan, Matrix Computations

use crate::core::MatVec;
use crate::error::MgError;
use crate::matrix::{DistributedMatrix, DistributedVector};
use crate::utils::convergence::{Convergence, SolveStats};
use faer::linalg::solvers::{PartialPivLu, SolveCore};
use faer::{Conj, Mat, MatMut};

/// Relative residual accepted without a warning.
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

/// Factorize-then-solve solver bound to one matrix.
pub struct DirectSolver {
    dense: Mat<f64>,
    factor: PartialPivLu<f64>,
    control: Convergence<f64>,
}

impl DirectSolver {
    /// Collective: gathers and factorizes `a`.
    pub fn new(a: &DistributedMatrix) -> Result<Self, MgError> {
        if a.m() != a.n() {
            return Err(MgError::DimensionMismatch { expected: a.m(), found: a.n() });
        }
        let dense = a.to_dense();
        if (0..dense.nrows()).any(|i| (0..dense.ncols()).any(|j| !dense[(i, j)].is_finite())) {
            return Err(MgError::FactorError("matrix has non-finite entries".into()));
        }
        let factor = PartialPivLu::new(dense.as_ref());
        log::debug!("direct solver: factorized {}x{} matrix", a.m(), a.n());
        Ok(Self {
            dense,
            factor,
            control: Convergence { tol: DEFAULT_TOLERANCE, max_iters: 1 },
        })
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.control.tol = tol;
        self
    }

    /// Order of the factorized matrix.
    pub fn size(&self) -> usize {
        self.dense.nrows()
    }

    /// Collective: x = A⁻¹ b.
    ///
    /// A non-finite solution (singular matrix) is a `SolveError`; a residual
    /// above the tolerance is reported in the stats and logged.
    pub fn solve(&self, b: &DistributedVector, x: &mut DistributedVector) -> Result<SolveStats<f64>, MgError> {
        let rhs = b.gather();
        let n = self.size();
        if rhs.len() != n {
            return Err(MgError::DimensionMismatch { expected: n, found: rhs.len() });
        }
        if x.size() != n {
            return Err(MgError::DimensionMismatch { expected: n, found: x.size() });
        }
        let mut sol = rhs.clone();
        if n > 0 {
            let x_mat = MatMut::from_column_major_slice_mut(&mut sol, n, 1);
            self.factor.solve_in_place_with_conj(Conj::No, x_mat);
        }
        if sol.iter().any(|v| !v.is_finite()) {
            return Err(MgError::SolveError("direct solve produced a non-finite solution".into()));
        }

        let mut ax = vec![0.0; n];
        self.dense.matvec(&sol, &mut ax);
        let res = ax.iter().zip(&rhs).map(|(p, q)| (p - q) * (p - q)).sum::<f64>().sqrt();
        let bnorm = rhs.iter().map(|v| v * v).sum::<f64>().sqrt();
        let (_, stats) = self.control.check(res, bnorm, 1);
        if !stats.converged {
            log::warn!("direct solve residual {res:e} exceeds tolerance {:e}", self.control.tol);
        }

        let owned = *x.locally_owned_elements();
        x.local_mut().copy_from_slice(&sol[owned.begin()..owned.end()]);
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CsrMatrix;
    use crate::parallel::SerialComm;

    #[test]
    fn lu_solver_solves_nonsymmetric_system() {
        // 3x3 system: [[2,1,1],[1,3,2],[1,0,0]] x = [4,5,6]
        // True solution: [6,15,-23]
        let a = CsrMatrix::from_triplets(3, 3, &[
            (0, 0, 2.0), (0, 1, 1.0), (0, 2, 1.0),
            (1, 0, 1.0), (1, 1, 3.0), (1, 2, 2.0),
            (2, 0, 1.0),
        ]).unwrap();
        let a = DistributedMatrix::from_global(&a, SerialComm::shared());
        let solver = DirectSolver::new(&a).unwrap();
        let b = DistributedVector::from_global(vec![4.0, 5.0, 6.0], SerialComm::shared());
        let mut x = a.domain_vector();
        let stats = solver.solve(&b, &mut x).unwrap();
        let expected = [6.0, 15.0, -23.0];
        for (xi, ei) in x.local().iter().zip(expected.iter()) {
            assert!((xi - ei).abs() < 1e-10, "xi = {}, expected = {}", xi, ei);
        }
        assert!(stats.converged);
    }

    #[test]
    fn solves_laplacians_of_every_order() {
        for n in [16, 20, 50, 128, 200] {
            let mut t = Vec::new();
            for i in 0..n {
                t.push((i, i, 2.0));
                if i > 0 { t.push((i, i - 1, -1.0)); }
                if i + 1 < n { t.push((i, i + 1, -1.0)); }
            }
            let a = CsrMatrix::from_triplets(n, n, &t).unwrap();
            let a = DistributedMatrix::from_global(&a, SerialComm::shared());
            let solver = DirectSolver::new(&a).unwrap();
            let b = DistributedVector::from_global(vec![1.0; n], SerialComm::shared());
            let mut x = a.domain_vector();
            let stats = solver.solve(&b, &mut x).unwrap();
            assert!(stats.converged, "n = {n}, residual {}", stats.final_residual);
            // x_i = (i + 1)(n - i) / 2
            for (i, xi) in x.local().iter().enumerate() {
                let exact = ((i + 1) * (n - i)) as f64 / 2.0;
                assert!((xi - exact).abs() < 1e-8 * exact, "n = {n}, x[{i}] = {xi}, expected {exact}");
            }
        }
    }

    #[test]
    fn mismatched_solution_vector_is_rejected() {
        let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)]).unwrap();
        let a = DistributedMatrix::from_global(&a, SerialComm::shared());
        let solver = DirectSolver::new(&a).unwrap();
        let b = a.range_vector();
        let mut x = DistributedVector::from_global(vec![0.0; 3], SerialComm::shared());
        assert!(matches!(
            solver.solve(&b, &mut x),
            Err(MgError::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn rectangular_matrix_is_rejected() {
        let a = CsrMatrix::from_triplets(2, 3, &[(0, 0, 1.0), (1, 1, 1.0)]).unwrap();
        let a = DistributedMatrix::from_global(&a, SerialComm::shared());
        assert!(matches!(DirectSolver::new(&a), Err(MgError::DimensionMismatch { .. })));
    }
}
