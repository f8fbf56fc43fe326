//! ILU(0) factorization with zero fill (Saad §10.3), on the locally owned
//! diagonal block.

use crate::preconditioner::Preconditioner;
use crate::matrix::{DistributedMatrix, DistributedVector};
use crate::error::MgError;

/// Incomplete LU factors sharing the sparsity pattern of A.
///
/// Each row stores the strictly lower part of L (unit diagonal implied)
/// followed by the upper part of U, in column order.
pub struct Ilu0 {
    cols: Vec<Vec<usize>>,
    vals: Vec<Vec<f64>>,
    diag: Vec<usize>,
}

impl Ilu0 {
    pub fn new() -> Self {
        Self { cols: Vec::new(), vals: Vec::new(), diag: Vec::new() }
    }
}

impl Default for Ilu0 {
    fn default() -> Self {
        Self::new()
    }
}

impl Preconditioner<DistributedMatrix, DistributedVector> for Ilu0 {
    fn setup(&mut self, a: &DistributedMatrix) -> Result<(), MgError> {
        let block = a.local_block()?;
        let first_row = a.locally_owned_range_indices().begin();
        let n = block.nrows();
        let mut cols = Vec::with_capacity(n);
        let mut vals = Vec::with_capacity(n);
        let mut diag = Vec::with_capacity(n);
        for i in 0..n {
            let (c, v) = block.row(i);
            let d = c.binary_search(&i).map_err(|_| MgError::ZeroPivot(first_row + i))?;
            cols.push(c.to_vec());
            vals.push(v.to_vec());
            diag.push(d);
        }

        // IKJ variant: eliminate row i with the already factored rows k < i
        let mut pos = vec![usize::MAX; n];
        for i in 0..n {
            for (p, &j) in cols[i].iter().enumerate() {
                pos[j] = p;
            }
            let (done, rest) = vals.split_at_mut(i);
            let row_i = &mut rest[0];
            for p in 0..diag[i] {
                let k = cols[i][p];
                let pivot = done[k][diag[k]];
                let factor = row_i[p] / pivot;
                row_i[p] = factor;
                for q in (diag[k] + 1)..cols[k].len() {
                    let j = cols[k][q];
                    if pos[j] != usize::MAX {
                        row_i[pos[j]] -= factor * done[k][q];
                    }
                }
            }
            if row_i[diag[i]] == 0.0 {
                return Err(MgError::ZeroPivot(first_row + i));
            }
            for &j in &cols[i] {
                pos[j] = usize::MAX;
            }
        }

        self.cols = cols;
        self.vals = vals;
        self.diag = diag;
        Ok(())
    }

    fn apply(&self, r: &DistributedVector, z: &mut DistributedVector) -> Result<(), MgError> {
        let n = self.cols.len();
        let r = r.local();
        let z = z.local_mut();
        // solve L y = r
        for i in 0..n {
            let mut s = r[i];
            for p in 0..self.diag[i] {
                s -= self.vals[i][p] * z[self.cols[i][p]];
            }
            z[i] = s;
        }
        // solve U z = y
        for i in (0..n).rev() {
            let d = self.diag[i];
            let mut s = z[i];
            for p in (d + 1)..self.cols[i].len() {
                s -= self.vals[i][p] * z[self.cols[i][p]];
            }
            z[i] = s / self.vals[i][d];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CsrMatrix;
    use crate::parallel::SerialComm;
    use crate::core::MatVec;

    #[test]
    fn exact_for_tridiagonal_matrices() {
        // no fill-in for a tridiagonal matrix, so ILU(0) = LU
        let n = 6;
        let mut t = Vec::new();
        for i in 0..n {
            t.push((i, i, 3.0));
            if i > 0 { t.push((i, i - 1, -1.0)); }
            if i + 1 < n { t.push((i, i + 1, -2.0)); }
        }
        let a = DistributedMatrix::from_global(&CsrMatrix::from_triplets(n, n, &t).unwrap(), SerialComm::shared());
        let mut ilu = Ilu0::new();
        ilu.setup(&a).unwrap();
        let mut b = a.range_vector();
        b.local_mut().iter_mut().enumerate().for_each(|(i, v)| *v = i as f64 + 1.0);
        let mut x = a.domain_vector();
        ilu.apply(&b, &mut x).unwrap();
        let mut ax = a.range_vector();
        a.matvec(&x, &mut ax);
        for i in 0..n {
            assert!((ax.local()[i] - b.local()[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_diagonal_is_rejected() {
        let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0)]).unwrap();
        let a = DistributedMatrix::from_global(&a, SerialComm::shared());
        assert!(matches!(Ilu0::new().setup(&a), Err(MgError::ZeroPivot(1))));
    }
}
