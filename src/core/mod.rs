//! Core traits and their implementations for the matrix and vector types.

pub mod traits;
pub mod wrappers;

pub use traits::{InnerProduct, MatVec, Shape};
pub use wrappers::DistributedInnerProduct;
