//! MPI-based parallel communication module.
//!
//! This module provides an implementation of the `Comm` trait on top of the MPI world
//! communicator. It is only available when the `mpi` feature is enabled.
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")] {
//! use mgops::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().expect("MPI already initialized");
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! comm.barrier();
//! # }
//! ```

use mpi::collective::SystemOperation;
use mpi::datatype::PartitionMut;
use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use mpi::Count;

/// MPI communicator wrapper for distributed parallelism.
///
/// Keeps the universe alive for as long as the communicator exists; MPI is
/// finalized when the last `MpiComm` is dropped.
pub struct MpiComm {
    /// The MPI world communicator (all processes in the job).
    pub world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    pub rank: usize,
    /// The total number of processes in the communicator.
    pub size: usize,
    _universe: Universe,
}

impl MpiComm {
    /// Initializes MPI. Returns `None` if MPI was already initialized.
    pub fn new() -> Option<Self> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Some(MpiComm { world, rank, size, _universe: universe })
    }

    fn gather_counts(&self, local_len: usize) -> (Vec<Count>, Vec<Count>) {
        let mut counts = vec![0 as Count; self.size];
        self.world.all_gather_into(&(local_len as Count), &mut counts[..]);
        let displs = counts
            .iter()
            .scan(0 as Count, |acc, &c| {
                let d = *acc;
                *acc += c;
                Some(d)
            })
            .collect();
        (counts, displs)
    }
}

impl super::Comm for MpiComm {
    fn rank(&self) -> usize { self.rank }
    fn size(&self) -> usize { self.size }
    fn barrier(&self) { self.world.barrier(); }

    fn all_reduce(&self, x: f64) -> f64 {
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, SystemOperation::sum());
        y
    }

    fn all_reduce_max(&self, x: f64) -> f64 {
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, SystemOperation::max());
        y
    }

    fn all_reduce_count(&self, x: usize) -> usize {
        let local = x as u64;
        let mut global = 0u64;
        self.world.all_reduce_into(&local, &mut global, SystemOperation::sum());
        global as usize
    }

    fn all_gather(&self, local: &[f64]) -> Vec<f64> {
        let (counts, displs) = self.gather_counts(local.len());
        let total = counts.iter().map(|&c| c as usize).sum();
        let mut out = vec![0.0; total];
        {
            let mut partition = PartitionMut::new(&mut out[..], counts, &displs[..]);
            self.world.all_gather_varcount_into(local, &mut partition);
        }
        out
    }

    fn all_gather_indices(&self, local: &[usize]) -> Vec<usize> {
        let send: Vec<u64> = local.iter().map(|&i| i as u64).collect();
        let (counts, displs) = self.gather_counts(send.len());
        let total = counts.iter().map(|&c| c as usize).sum();
        let mut out = vec![0u64; total];
        {
            let mut partition = PartitionMut::new(&mut out[..], counts, &displs[..]);
            self.world.all_gather_varcount_into(&send[..], &mut partition);
        }
        out.into_iter().map(|i| i as usize).collect()
    }
}
