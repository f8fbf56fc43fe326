use std::fmt;
use bitflags::bitflags;
use crate::preconditioner::Preconditioner;
use crate::matrix::{CsrMatrix, DistributedMatrix, DistributedVector, SparseMatrix};
use crate::error::MgError;

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MatSorType: u32 {
        const APPLY_LOWER     = 0b0001; // forward Gauss–Seidel
        const APPLY_UPPER     = 0b0010; // backward
        const SYMMETRIC_SWEEP = Self::APPLY_LOWER.bits() | Self::APPLY_UPPER.bits();
    }
}

/// Successive over-relaxation on the locally owned diagonal block.
///
/// - `APPLY_LOWER`: M = D/ω + L (Gauss–Seidel for ω = 1)
/// - `APPLY_UPPER`: M = D/ω + U
/// - `SYMMETRIC_SWEEP`: M = ω/(2−ω) (D/ω + L) D⁻¹ (D/ω + U) (symmetric
///   Gauss–Seidel for ω = 1)
///
/// With `its > 1` the preconditioner performs `its` stationary iterations
/// z ← z + M⁻¹(r − A z) from z = 0.
pub struct Sor {
    pub its: usize,
    pub sym: MatSorType,
    pub omega: f64,
    inv_diag: Vec<f64>,
    block: Option<CsrMatrix>,
}

impl Sor {
    pub fn new(omega: f64, its: usize, sym: MatSorType) -> Self {
        Self { its, sym, omega, inv_diag: Vec::new(), block: None }
    }
    pub fn set_omega(&mut self, omega: f64) { self.omega = omega; }
    pub fn omega(&self) -> f64 { self.omega }
    pub fn set_its(&mut self, its: usize) { self.its = its; }
    pub fn its(&self) -> usize { self.its }
    pub fn sym(&self) -> MatSorType { self.sym }

    /// One application of M⁻¹ to `r`, written to `z`.
    fn sweep(&self, a: &CsrMatrix, r: &[f64], z: &mut [f64]) {
        let n = r.len();
        let w = self.omega;
        let sym = self.sym.contains(MatSorType::SYMMETRIC_SWEEP);
        if self.sym.intersects(MatSorType::APPLY_LOWER) {
            // (D/ω + L) y = r
            for i in 0..n {
                let (cols, vals) = a.row(i);
                let sigma: f64 = cols.iter().zip(vals)
                    .take_while(|(j, _)| **j < i)
                    .map(|(&j, &v)| v * z[j])
                    .sum();
                z[i] = w * (r[i] - sigma) * self.inv_diag[i];
            }
        }
        if self.sym.intersects(MatSorType::APPLY_UPPER) {
            // right-hand side of the backward sweep: (2−ω)/ω · D y, or r alone
            let rhs: Vec<f64> = if sym {
                (0..n).map(|i| (2.0 - w) / w * z[i] / self.inv_diag[i]).collect()
            } else {
                r.to_vec()
            };
            // (D/ω + U) z = rhs
            for i in (0..n).rev() {
                let (cols, vals) = a.row(i);
                let sigma: f64 = cols.iter().zip(vals)
                    .filter(|(j, _)| **j > i)
                    .map(|(&j, &v)| v * z[j])
                    .sum();
                z[i] = w * (rhs[i] - sigma) * self.inv_diag[i];
            }
        }
    }
}

impl fmt::Display for Sor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SOR(omega={}, its={}, sym={:?})", self.omega, self.its, self.sym)
    }
}

impl Preconditioner<DistributedMatrix, DistributedVector> for Sor {
    fn setup(&mut self, a: &DistributedMatrix) -> Result<(), MgError> {
        let block = a.local_block()?;
        let first_row = a.locally_owned_range_indices().begin();
        self.inv_diag.clear();
        for (i, aii) in block.diagonal().into_iter().enumerate() {
            if aii == 0.0 {
                return Err(MgError::ZeroPivot(first_row + i));
            }
            self.inv_diag.push(1.0 / aii);
        }
        self.block = Some(block);
        Ok(())
    }

    fn apply(&self, r: &DistributedVector, z: &mut DistributedVector) -> Result<(), MgError> {
        let a = self
            .block
            .as_ref()
            .ok_or(MgError::PreconditionViolation("SOR applied before setup"))?;
        let r = r.local();
        let n = r.len();
        let z = z.local_mut();
        z.fill(0.0);
        let mut correction = vec![0.0; n];
        let mut residual = r.to_vec();
        for it in 0..self.its.max(1) {
            if it > 0 {
                // residual = r - A z
                a.spmv(z, &mut residual);
                for i in 0..n {
                    residual[i] = r[i] - residual[i];
                }
            }
            self.sweep(a, &residual, &mut correction);
            for i in 0..n {
                z[i] += correction[i];
            }
        }
        Ok(())
    }
}
