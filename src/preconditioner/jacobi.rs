// Jacobi preconditioner implementation

use crate::preconditioner::Preconditioner;
use crate::matrix::{DistributedMatrix, DistributedVector};
use crate::error::MgError;

/// Damped Jacobi preconditioner: M⁻¹ = ω D⁻¹
///
/// Rows with a zero diagonal are left untouched (their entry of z is zero).
pub struct Jacobi {
    omega: f64,
    pub(crate) inv_diag: Vec<f64>,
}

impl Jacobi {
    /// new with empty state; user must call `setup`.
    pub fn new(omega: f64) -> Self {
        Self { omega, inv_diag: Vec::new() }
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }
}

impl Default for Jacobi {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Preconditioner<DistributedMatrix, DistributedVector> for Jacobi {
    fn setup(&mut self, a: &DistributedMatrix) -> Result<(), MgError> {
        let block = a.local_block()?;
        self.inv_diag = block
            .diagonal()
            .into_iter()
            .map(|d| if d != 0.0 { self.omega / d } else { 0.0 })
            .collect();
        Ok(())
    }

    fn apply(&self, r: &DistributedVector, z: &mut DistributedVector) -> Result<(), MgError> {
        let r = r.local();
        let z = z.local_mut();
        for i in 0..r.len() {
            z[i] = self.inv_diag[i] * r[i];
        }
        Ok(())
    }
}
