//! Preconditioners and relaxation schemes.
//!
//! This module defines the Preconditioner trait and the processor-local
//! relaxations (Jacobi, SOR, ILU(0)) used as smoothers, plus the
//! smoothed-aggregation AMG hierarchy used as a coarse solver.

use crate::config::SmootherType;
use crate::error::MgError;
use crate::matrix::{DistributedMatrix, DistributedVector};

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), MgError>;
    /// Optionally: setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), MgError> { Ok(()) }
}

pub mod amg;
pub mod ilu;
pub mod jacobi;
pub mod sor;

pub use amg::Amg;
pub use ilu::Ilu0;
pub use jacobi::Jacobi;
pub use sor::{MatSorType, Sor};

/// A relaxation already set up for one distributed matrix.
pub type Relaxation = Box<dyn Preconditioner<DistributedMatrix, DistributedVector>>;

/// Build and set up the relaxation `kind` for `a`. `omega` is the damping
/// (Jacobi) or relaxation (SOR) factor and is ignored by ILU.
pub fn relaxation(kind: SmootherType, omega: f64, a: &DistributedMatrix) -> Result<Relaxation, MgError> {
    let mut pc: Relaxation = match kind {
        SmootherType::SymmetricGaussSeidel => Box::new(Sor::new(omega, 1, MatSorType::SYMMETRIC_SWEEP)),
        SmootherType::GaussSeidel => Box::new(Sor::new(omega, 1, MatSorType::APPLY_LOWER)),
        SmootherType::Jacobi => Box::new(Jacobi::new(omega)),
        SmootherType::Ilu => Box::new(Ilu0::new()),
    };
    pc.setup(a)?;
    Ok(pc)
}

/// One preconditioned Richardson step on A x = b:
/// r = A x − b, t = M⁻¹ r, x ← x − t.
///
/// `r` and `t` are range-layout scratch vectors.
pub fn richardson_step(
    a: &DistributedMatrix,
    pc: &dyn Preconditioner<DistributedMatrix, DistributedVector>,
    b: &DistributedVector,
    x: &mut DistributedVector,
    r: &mut DistributedVector,
    t: &mut DistributedVector,
) -> Result<(), MgError> {
    a.vmult(r, x);
    r.add(-1.0, b);
    pc.apply(r, t)?;
    x.add(-1.0, t);
    Ok(())
}
