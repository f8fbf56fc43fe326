//! Distributed vectors laid out on contiguous ownership ranges.

use crate::error::MgError;
use crate::matrix::index_set::IndexSet;
use crate::parallel::Comm;
use std::fmt;
use std::sync::Arc;

/// A vector whose entries `owned.begin()..owned.end()` live on this rank.
///
/// Vectors are normally obtained from `build_domain_vector` /
/// `build_range_vector` of a matrix operator, which fixes their layout.
#[derive(Clone)]
pub struct DistributedVector {
    values: Vec<f64>,
    owned: IndexSet,
    comm: Arc<dyn Comm>,
}

impl DistributedVector {
    /// Zero vector with the given layout.
    pub fn zeros(owned: IndexSet, comm: Arc<dyn Comm>) -> Self {
        Self { values: vec![0.0; owned.n_elements()], owned, comm }
    }

    /// Vector from this rank's entries.
    pub fn from_local(owned: IndexSet, comm: Arc<dyn Comm>, values: Vec<f64>) -> Result<Self, MgError> {
        if values.len() != owned.n_elements() {
            return Err(MgError::DimensionMismatch { expected: owned.n_elements(), found: values.len() });
        }
        Ok(Self { values, owned, comm })
    }

    /// Vector that owns every entry of `values` (single-rank layout).
    pub fn from_global(values: Vec<f64>, comm: Arc<dyn Comm>) -> Self {
        let owned = IndexSet::complete(values.len());
        Self { values, owned, comm }
    }

    /// Global length.
    pub fn size(&self) -> usize {
        self.owned.size()
    }

    pub fn locally_owned_elements(&self) -> &IndexSet {
        &self.owned
    }

    pub fn comm(&self) -> &Arc<dyn Comm> {
        &self.comm
    }

    pub fn local(&self) -> &[f64] {
        &self.values
    }

    pub fn local_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Collective: every entry of the vector on every rank.
    pub fn gather(&self) -> Vec<f64> {
        self.comm.all_gather(&self.values)
    }

    /// Sets every entry to zero.
    pub fn zero(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    /// `self += a * v`
    pub fn add(&mut self, a: f64, v: &DistributedVector) {
        self.check_layout(v);
        self.values.iter_mut().zip(&v.values).for_each(|(s, &x)| *s += a * x);
    }

    /// `self = s * self + a * v`
    pub fn sadd(&mut self, s: f64, a: f64, v: &DistributedVector) {
        self.check_layout(v);
        self.values.iter_mut().zip(&v.values).for_each(|(y, &x)| *y = s * *y + a * x);
    }

    pub fn scale(&mut self, s: f64) {
        self.values.iter_mut().for_each(|v| *v *= s);
    }

    /// Copies the entries of `v`, which must have the same layout.
    pub fn copy_from(&mut self, v: &DistributedVector) {
        self.check_layout(v);
        self.values.copy_from_slice(&v.values);
    }

    /// Collective inner product.
    pub fn dot(&self, v: &DistributedVector) -> f64 {
        self.check_layout(v);
        self.comm.dot(&self.values, &v.values)
    }

    /// Collective Euclidean norm.
    pub fn l2_norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    fn check_layout(&self, v: &DistributedVector) {
        assert_eq!(self.owned, v.owned, "vectors have different layouts");
    }
}

impl AsRef<[f64]> for DistributedVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl AsMut<[f64]> for DistributedVector {
    fn as_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }
}

impl fmt::Debug for DistributedVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedVector")
            .field("owned", &self.owned)
            .field("values", &self.values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;

    #[test]
    fn blas_like_updates() {
        let comm = SerialComm::shared();
        let mut x = DistributedVector::from_global(vec![1.0, 2.0, 3.0], comm.clone());
        let y = DistributedVector::from_global(vec![1.0, 1.0, 1.0], comm);
        x.add(-1.0, &y);
        assert_eq!(x.local(), &[0.0, 1.0, 2.0]);
        x.sadd(2.0, 1.0, &y);
        assert_eq!(x.local(), &[1.0, 3.0, 5.0]);
        assert_eq!(x.dot(&y), 9.0);
        assert!((y.l2_norm() - 3f64.sqrt()).abs() < 1e-15);
    }

    #[test]
    fn local_length_must_match_layout() {
        let comm = SerialComm::shared();
        let err = DistributedVector::from_local(IndexSet::complete(3), comm, vec![0.0; 2]).unwrap_err();
        assert!(matches!(err, MgError::DimensionMismatch { expected: 3, found: 2 }));
    }
}
