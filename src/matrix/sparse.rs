// SparseMatrix trait, sparsity patterns and the faer-backed CSR matrix

use crate::error::MgError;
use faer::sparse::{SparseRowMat, SymbolicSparseRowMat};
use faer::Mat;

/// A read‐only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A * x.  `x.len() == ncols()`, `y.len() == nrows()`.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

/// Compressed-row sparsity structure without values.
///
/// Column indices are sorted and unique within every row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl SparsityPattern {
    /// Build from raw row pointers and column indices.
    pub fn new(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
    ) -> Result<Self, MgError> {
        if row_ptr.len() != nrows + 1 {
            return Err(MgError::DimensionMismatch { expected: nrows + 1, found: row_ptr.len() });
        }
        if row_ptr[0] != 0 || row_ptr[nrows] != col_idx.len() {
            return Err(MgError::PreconditionViolation("row pointers do not match column indices"));
        }
        for i in 0..nrows {
            if row_ptr[i] > row_ptr[i + 1] {
                return Err(MgError::PreconditionViolation("row pointers must be non-decreasing"));
            }
            let row = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            if row.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MgError::PreconditionViolation("column indices must be sorted and unique"));
            }
            if row.last().is_some_and(|&j| j >= ncols) {
                return Err(MgError::PreconditionViolation("column index out of bounds"));
            }
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx })
    }

    /// Build from per-row column lists (unsorted, duplicates allowed).
    pub fn from_rows(ncols: usize, rows: &[Vec<usize>]) -> Result<Self, MgError> {
        let mut row_ptr = Vec::with_capacity(rows.len() + 1);
        let mut col_idx = Vec::new();
        row_ptr.push(0);
        for row in rows {
            let mut cols = row.clone();
            cols.sort_unstable();
            cols.dedup();
            col_idx.extend(cols);
            row_ptr.push(col_idx.len());
        }
        Self::new(rows.len(), ncols, row_ptr, col_idx)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn n_nonzero_elements(&self) -> usize {
        self.col_idx.len()
    }

    /// Column indices of row `i`.
    pub fn row(&self, i: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[i]..self.row_ptr[i + 1]]
    }
}

/// Local sparse matrix in compressed-row storage.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    inner: SparseRowMat<usize, f64>,
}

impl CsrMatrix {
    /// Build a CSR from raw row‐ptr, col‐idx, and values.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self, MgError> {
        let pattern = SparsityPattern::new(nrows, ncols, row_ptr, col_idx)?;
        Self::from_pattern(pattern, values)
    }

    /// Attach values to an existing sparsity pattern.
    pub fn from_pattern(pattern: SparsityPattern, values: Vec<f64>) -> Result<Self, MgError> {
        if values.len() != pattern.n_nonzero_elements() {
            return Err(MgError::DimensionMismatch {
                expected: pattern.n_nonzero_elements(),
                found: values.len(),
            });
        }
        let SparsityPattern { nrows, ncols, row_ptr, col_idx } = pattern;
        // `None`: the structure is compressed, no separate row_nnz
        let symbolic = SymbolicSparseRowMat::new_checked(nrows, ncols, row_ptr, None, col_idx);
        Ok(Self { inner: SparseRowMat::new(symbolic, values) })
    }

    /// Build from (row, col, value) triplets; duplicate entries are summed.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, MgError> {
        if triplets.iter().any(|&(i, j, _)| i >= nrows || j >= ncols) {
            return Err(MgError::PreconditionViolation("triplet index out of bounds"));
        }
        let mut sorted = triplets.to_vec();
        sorted.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        let mut row_ptr = vec![0; nrows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;
        for (i, j, v) in sorted {
            if last == Some((i, j)) {
                if let Some(acc) = values.last_mut() {
                    *acc += v;
                }
                continue;
            }
            col_idx.push(j);
            values.push(v);
            row_ptr[i + 1] += 1;
            last = Some((i, j));
        }
        for i in 0..nrows {
            row_ptr[i + 1] += row_ptr[i];
        }
        Self::from_csr(nrows, ncols, row_ptr, col_idx, values)
    }

    /// Sparse copy of a dense matrix, dropping exact zeros.
    pub fn from_dense(dense: &Mat<f64>) -> Self {
        let mut triplets = Vec::new();
        for i in 0..dense.nrows() {
            for j in 0..dense.ncols() {
                let v = dense[(i, j)];
                if v != 0.0 {
                    triplets.push((i, j, v));
                }
            }
        }
        // indices come from the matrix shape, so they are always in bounds
        match Self::from_triplets(dense.nrows(), dense.ncols(), &triplets) {
            Ok(m) => m,
            Err(_) => unreachable!("dense entries are in bounds"),
        }
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        (0..self.nrows()).map(|i| self.row(i).0.len()).sum()
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[f64]) {
        let a = self.inner.as_ref();
        (a.col_idx_of_row_raw(i), a.val_of_row(i))
    }

    /// Entry `(i, j)`, zero if it is not stored.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (cols, vals) = self.row(i);
        cols.binary_search(&j).map(|k| vals[k]).unwrap_or(0.0)
    }

    /// Main diagonal (length `min(nrows, ncols)`).
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.nrows().min(self.ncols())).map(|i| self.get(i, i)).collect()
    }

    /// Structure of this matrix.
    pub fn pattern(&self) -> SparsityPattern {
        let rows: Vec<Vec<usize>> = (0..self.nrows()).map(|i| self.row(i).0.to_vec()).collect();
        match SparsityPattern::from_rows(self.ncols(), &rows) {
            Ok(p) => p,
            Err(_) => unreachable!("stored structure is valid"),
        }
    }

    /// Does `pattern` describe exactly the stored structure?
    pub fn has_pattern(&self, pattern: &SparsityPattern) -> bool {
        pattern.nrows() == self.nrows()
            && pattern.ncols() == self.ncols()
            && (0..self.nrows()).all(|i| pattern.row(i) == self.row(i).0)
    }

    /// Triplets of all stored entries, optionally shifting row and column indices.
    pub fn triplets(&self, row_offset: usize, col_offset: usize) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::with_capacity(self.nnz());
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            out.extend(cols.iter().zip(vals).map(|(&j, &v)| (i + row_offset, j + col_offset, v)));
        }
        out
    }

    /// Explicit transpose.
    pub fn transpose(&self) -> Self {
        let swapped: Vec<_> = self.triplets(0, 0).into_iter().map(|(i, j, v)| (j, i, v)).collect();
        match Self::from_triplets(self.ncols(), self.nrows(), &swapped) {
            Ok(m) => m,
            Err(_) => unreachable!("transposed indices are in bounds"),
        }
    }

    /// Columns `[begin, end)` of every row, re-indexed from zero.
    pub fn column_block(&self, begin: usize, end: usize) -> Self {
        let mut triplets = Vec::new();
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                if j >= begin && j < end {
                    triplets.push((i, j - begin, v));
                }
            }
        }
        match Self::from_triplets(self.nrows(), end - begin, &triplets) {
            Ok(m) => m,
            Err(_) => unreachable!("block indices are in bounds"),
        }
    }

    /// Sparse product `self * b` (row-wise Gustavson accumulation).
    pub fn matmul(&self, b: &CsrMatrix) -> Result<Self, MgError> {
        if self.ncols() != b.nrows() {
            return Err(MgError::DimensionMismatch { expected: self.ncols(), found: b.nrows() });
        }
        let ncols = b.ncols();
        let mut acc = vec![0.0; ncols];
        let mut marker = vec![usize::MAX; ncols];
        let mut row_ptr = vec![0];
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        for i in 0..self.nrows() {
            let mut touched = Vec::new();
            let (a_cols, a_vals) = self.row(i);
            for (&k, &a_ik) in a_cols.iter().zip(a_vals) {
                let (b_cols, b_vals) = b.row(k);
                for (&j, &b_kj) in b_cols.iter().zip(b_vals) {
                    if marker[j] != i {
                        marker[j] = i;
                        acc[j] = 0.0;
                        touched.push(j);
                    }
                    acc[j] += a_ik * b_kj;
                }
            }
            touched.sort_unstable();
            for j in touched {
                col_idx.push(j);
                values.push(acc[j]);
            }
            row_ptr.push(col_idx.len());
        }
        Self::from_csr(self.nrows(), ncols, row_ptr, col_idx, values)
    }

    pub fn to_dense(&self) -> Mat<f64> {
        self.inner.to_dense()
    }

    /// Underlying faer matrix.
    pub fn as_faer(&self) -> &SparseRowMat<usize, f64> {
        &self.inner
    }
}

impl SparseMatrix<f64> for CsrMatrix {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
    fn spmv(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.ncols(), "Input vector x has incorrect length");
        assert_eq!(y.len(), self.nrows(), "Output vector y has incorrect length");
        let row_dot = |i: usize| {
            let (cols, vals) = self.row(i);
            cols.iter().zip(vals).map(|(&j, &v)| v * x[j]).sum::<f64>()
        };
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut().enumerate().for_each(|(i, yi)| *yi = row_dot(i));
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = row_dot(i);
            }
        }
    }
}

impl CsrMatrix {
    /// Number of rows (inherent shortcut for [`SparseMatrix::nrows`]).
    pub fn nrows(&self) -> usize {
        self.inner.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.inner.ncols()
    }
}
