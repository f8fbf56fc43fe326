//! Matrix module: index sets, sparse, dense and distributed matrix types, and vectors.

pub mod dense;
pub use dense::DenseMatrix;
pub mod distributed;
pub use distributed::DistributedMatrix;
pub mod index_set;
pub use index_set::IndexSet;
pub mod sparse;
pub use sparse::{CsrMatrix, SparseMatrix, SparsityPattern};
pub mod vector;
pub use vector::DistributedVector;
