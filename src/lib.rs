//! mgops: operator layer of a multigrid preconditioner over Faer
//!
//! This crate provides the polymorphic operators a multigrid cycle driver
//! works with: distributed matrix operators, relaxation smoothers and a
//! coarse-level operator that either factorizes the coarsest matrix or applies
//! a nested smoothed-aggregation AMG cycle. Strategies are chosen from a
//! hierarchical parameter tree, and the coarse operator reports the grid and
//! operator complexity of the hierarchy.
//!
//! Matrices and vectors are distributed over a [`parallel::Comm`]; use
//! [`parallel::SerialComm`] for a single process or enable the `mpi` feature.

pub mod parallel;

pub mod config;
pub mod core;
pub mod error;
pub mod matrix;
pub mod operator;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use crate::core::*;
pub use error::*;
pub use matrix::*;
pub use operator::*;
pub use preconditioner::*;
pub use solver::*;

// Re-export SolveStats at the crate root for convenience
pub use utils::convergence::SolveStats;
