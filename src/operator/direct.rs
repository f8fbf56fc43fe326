//! Coarsest-level operator: an exact direct solve or a nested AMG cycle.

use crate::config::{AmgParams, CoarseType, ParamTree};
use crate::error::MgError;
use crate::matrix::{DistributedMatrix, DistributedVector};
use crate::operator::Operator;
use crate::preconditioner::Amg;
use crate::solver::DirectSolver;

/// The active coarse-solve strategy.
pub enum CoarseSolver {
    Direct(DirectSolver),
    Amg(Amg),
}

/// Coarse-level solve behind the [`Operator`] interface.
///
/// The strategy is chosen from `coarse.type` at construction and never
/// changes. The shape and nonzero count of the input matrix are captured for
/// complexity reporting.
pub struct DirectOperator {
    solver: CoarseSolver,
    m: usize,
    n: usize,
    nnz: usize,
}

impl DirectOperator {
    /// Collective. Reads `coarse.type` (`""`/`"direct"` or `"ml"`); for
    /// `"ml"` the entries of the `coarse.params` subtree override the
    /// smoothed-aggregation defaults. Without a parameter tree the solve is
    /// direct.
    pub fn new(a: &DistributedMatrix, prm: Option<&ParamTree>) -> Result<Self, MgError> {
        let coarse_type: CoarseType = match prm {
            Some(prm) => prm.get_str("coarse.type", "").parse()?,
            None => CoarseType::Direct,
        };
        let (m, n, nnz) = (a.m(), a.n(), a.n_nonzero_elements());
        log::debug!("coarse solver: {coarse_type} on {m}x{n} matrix with {nnz} nonzeros");

        let solver = match coarse_type {
            CoarseType::Direct => CoarseSolver::Direct(DirectSolver::new(a)?),
            CoarseType::Ml => {
                let mut params = AmgParams::smoothed_aggregation();
                if let Some(child) = prm.and_then(|p| p.get_child_optional("coarse.params")) {
                    params.merge(&child)?;
                }
                CoarseSolver::Amg(Amg::new(a, params)?)
            }
        };
        Ok(Self { solver, m, n, nnz })
    }

    pub fn coarse_type(&self) -> CoarseType {
        match self.solver {
            CoarseSolver::Direct(_) => CoarseType::Direct,
            CoarseSolver::Amg(_) => CoarseType::Ml,
        }
    }

    pub fn solver(&self) -> &CoarseSolver {
        &self.solver
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn nnz(&self) -> usize {
        self.nnz
    }

    /// Collective: degrees of freedom over all levels.
    pub fn grid_complexity(&self) -> usize {
        match &self.solver {
            CoarseSolver::Direct(_) => self.m,
            CoarseSolver::Amg(amg) => {
                let comm = amg.level_matrix(0).get_mpi_communicator();
                (0..amg.n_levels())
                    .map(|l| comm.all_reduce_count(amg.level_local_length(l)))
                    .sum()
            }
        }
    }

    /// Collective: nonzeros over all levels.
    pub fn operator_complexity(&self) -> usize {
        match &self.solver {
            CoarseSolver::Direct(_) => self.nnz,
            CoarseSolver::Amg(amg) => {
                let (ratio, fine_nnz) = amg.complexities();
                (ratio * fine_nnz).round() as usize
            }
        }
    }
}

impl Operator for DirectOperator {
    /// `b` is the right-hand side, `x` is overwritten with the (approximate)
    /// solution.
    fn apply(&self, b: &DistributedVector, x: &mut DistributedVector) -> Result<(), MgError> {
        match &self.solver {
            CoarseSolver::Direct(solver) => {
                solver.solve(b, x)?;
            }
            CoarseSolver::Amg(amg) => amg.vmult(b, x)?,
        }
        Ok(())
    }

    fn build_domain_vector(&self) -> Result<DistributedVector, MgError> {
        Err(MgError::CapabilityNotSupported("build_domain_vector on a coarse solver"))
    }

    fn build_range_vector(&self) -> Result<DistributedVector, MgError> {
        Err(MgError::CapabilityNotSupported("build_range_vector on a coarse solver"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CsrMatrix;
    use crate::parallel::SerialComm;

    fn diag(n: usize) -> DistributedMatrix {
        let t: Vec<_> = (0..n).map(|i| (i, i, 1.0 + i as f64)).collect();
        DistributedMatrix::from_global(&CsrMatrix::from_triplets(n, n, &t).unwrap(), SerialComm::shared())
    }

    #[test]
    fn no_parameters_means_direct() {
        let op = DirectOperator::new(&diag(3), None).unwrap();
        assert_eq!(op.coarse_type(), CoarseType::Direct);
        assert_eq!((op.m(), op.n(), op.nnz()), (3, 3, 3));
        assert_eq!(op.grid_complexity(), 3);
        assert_eq!(op.operator_complexity(), 3);
    }

    #[test]
    fn coarse_type_is_case_insensitive() {
        let mut prm = ParamTree::new();
        prm.put("coarse.type", "ML");
        let op = DirectOperator::new(&diag(4), Some(&prm)).unwrap();
        assert_eq!(op.coarse_type(), CoarseType::Ml);
        prm.put("coarse.type", "Direct");
        let op = DirectOperator::new(&diag(4), Some(&prm)).unwrap();
        assert_eq!(op.coarse_type(), CoarseType::Direct);
    }
}
