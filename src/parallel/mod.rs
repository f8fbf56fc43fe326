//! Communicator abstraction for distributed operators.
//!
//! Every distributed matrix and vector carries a shared handle to a [`Comm`].
//! All methods of the trait are collective: each rank of the communicator must
//! call them in the same order.

/// Collective operations needed by the operator layer.
pub trait Comm {
    /// Rank of the calling process.
    fn rank(&self) -> usize;
    /// Number of processes in the communicator.
    fn size(&self) -> usize;
    fn barrier(&self);
    /// Global sum of `x`.
    fn all_reduce(&self, x: f64) -> f64;
    /// Global maximum of `x`.
    fn all_reduce_max(&self, x: f64) -> f64;
    /// Global sum of a count.
    fn all_reduce_count(&self, x: usize) -> usize;
    /// Concatenation of every rank's `local` slice, in rank order.
    fn all_gather(&self, local: &[f64]) -> Vec<f64>;
    /// Same as [`Comm::all_gather`] for index data.
    fn all_gather_indices(&self, local: &[usize]) -> Vec<usize>;

    fn dot(&self, a: &[f64], b: &[f64]) -> f64 {
        let local = a.iter().zip(b).map(|(&x, &y)| x * y).sum::<f64>();
        self.all_reduce(local)
    }
}

pub mod serial_comm;
pub use serial_comm::SerialComm;

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
