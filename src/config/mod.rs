//! Configuration: the hierarchical parameter tree and the typed options read from it.

pub mod options;
pub mod params;

pub use options::{AmgParams, CoarseType, SmootherType};
pub use params::ParamTree;
