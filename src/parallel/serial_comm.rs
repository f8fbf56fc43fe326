// single-rank communication

use std::sync::Arc;

/// Communicator of a single process. Intra-rank parallelism, if any, comes
/// from the rayon kernels of the local matrices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl SerialComm {
    pub fn new() -> Self {
        SerialComm
    }

    /// Shared handle, the form stored by matrices and vectors.
    pub fn shared() -> Arc<dyn super::Comm> {
        Arc::new(SerialComm)
    }
}

impl super::Comm for SerialComm {
    fn rank(&self) -> usize { 0 }
    fn size(&self) -> usize { 1 }
    fn barrier(&self) {}
    fn all_reduce(&self, x: f64) -> f64 { x }
    fn all_reduce_max(&self, x: f64) -> f64 { x }
    fn all_reduce_count(&self, x: usize) -> usize { x }
    fn all_gather(&self, local: &[f64]) -> Vec<f64> {
        local.to_vec()
    }
    fn all_gather_indices(&self, local: &[usize]) -> Vec<usize> {
        local.to_vec()
    }
}
