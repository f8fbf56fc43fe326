//! Direct solver interfaces.

pub mod direct_lu;
pub use direct_lu::DirectSolver;
