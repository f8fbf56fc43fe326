//! Row-distributed sparse matrices.
//!
//! Each rank stores the rows it owns as a [`CsrMatrix`] with *global* column
//! indices. Rows and domain entries are partitioned into contiguous ranges in
//! rank order, so a gather of the owned pieces of a domain vector yields the
//! full vector in global order.
//!
//! Every method that touches more than the local rows is collective.

use crate::error::MgError;
use crate::matrix::index_set::IndexSet;
use crate::matrix::sparse::CsrMatrix;
use crate::matrix::vector::DistributedVector;
use crate::matrix::dense::DenseMatrix;
use crate::parallel::Comm;
use faer::Mat;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct DistributedMatrix {
    local: CsrMatrix,
    rows: IndexSet,
    cols: IndexSet,
    comm: Arc<dyn Comm>,
}

impl DistributedMatrix {
    /// Assemble from this rank's rows.
    ///
    /// `local` has one row per index of `rows` and `cols.size()` columns.
    pub fn new(
        local: CsrMatrix,
        rows: IndexSet,
        cols: IndexSet,
        comm: Arc<dyn Comm>,
    ) -> Result<Self, MgError> {
        if local.nrows() != rows.n_elements() {
            return Err(MgError::DimensionMismatch { expected: rows.n_elements(), found: local.nrows() });
        }
        if local.ncols() != cols.size() {
            return Err(MgError::DimensionMismatch { expected: cols.size(), found: local.ncols() });
        }
        Ok(Self { local, rows, cols, comm })
    }

    /// Distribute a matrix that every rank holds in full, using balanced
    /// block partitions of rows and columns.
    pub fn from_global(global: &CsrMatrix, comm: Arc<dyn Comm>) -> Self {
        let (rank, size) = (comm.rank(), comm.size());
        let rows = IndexSet::uniform(global.nrows(), rank, size);
        let cols = IndexSet::uniform(global.ncols(), rank, size);
        let triplets: Vec<_> = (rows.begin()..rows.end())
            .flat_map(|i| {
                let (c, v) = global.row(i);
                c.iter().zip(v).map(move |(&j, &x)| (i - rows.begin(), j, x)).collect::<Vec<_>>()
            })
            .collect();
        let local = match CsrMatrix::from_triplets(rows.n_elements(), global.ncols(), &triplets) {
            Ok(m) => m,
            Err(_) => unreachable!("rows of a valid matrix are in bounds"),
        };
        Self { local, rows, cols, comm }
    }

    /// Collective: assemble from local rows, deriving the row and domain
    /// ranges from each rank's counts. `n_local_cols` is the number of
    /// domain entries this rank owns.
    pub fn from_local_rows(
        local: CsrMatrix,
        n_local_cols: usize,
        comm: Arc<dyn Comm>,
    ) -> Result<Self, MgError> {
        let rows = IndexSet::from_local_count(comm.as_ref(), local.nrows());
        let cols = IndexSet::from_local_count(comm.as_ref(), n_local_cols);
        Self::new(local, rows, cols, comm)
    }

    /// Global number of rows.
    pub fn m(&self) -> usize {
        self.rows.size()
    }

    /// Global number of columns.
    pub fn n(&self) -> usize {
        self.cols.size()
    }

    /// Collective: global number of stored entries.
    pub fn n_nonzero_elements(&self) -> usize {
        self.comm.all_reduce_count(self.local.nnz())
    }

    pub fn locally_owned_range_indices(&self) -> &IndexSet {
        &self.rows
    }

    pub fn locally_owned_domain_indices(&self) -> &IndexSet {
        &self.cols
    }

    pub fn get_mpi_communicator(&self) -> &Arc<dyn Comm> {
        &self.comm
    }

    /// Owned rows, global column indices.
    pub fn local_matrix(&self) -> &CsrMatrix {
        &self.local
    }

    /// Zero vector laid out like `x` in `y = A x`.
    pub fn domain_vector(&self) -> DistributedVector {
        DistributedVector::zeros(self.cols, self.comm.clone())
    }

    /// Zero vector laid out like `y` in `y = A x`.
    pub fn range_vector(&self) -> DistributedVector {
        DistributedVector::zeros(self.rows, self.comm.clone())
    }

    /// Collective: `dst = A * src`.
    ///
    /// # Panics
    /// Panics if `src` is not laid out on the domain or `dst` on the range.
    pub fn vmult(&self, dst: &mut DistributedVector, src: &DistributedVector) {
        assert_eq!(src.locally_owned_elements(), &self.cols, "source vector is not a domain vector");
        assert_eq!(dst.locally_owned_elements(), &self.rows, "destination vector is not a range vector");
        let x = src.gather();
        crate::matrix::sparse::SparseMatrix::spmv(&self.local, &x, dst.local_mut());
    }

    /// Collective: every stored entry of the matrix, in global indices.
    pub fn gather_triplets(&self) -> Vec<(usize, usize, f64)> {
        let mine = self.local.triplets(self.rows.begin(), 0);
        let rows: Vec<usize> = mine.iter().map(|t| t.0).collect();
        let cols: Vec<usize> = mine.iter().map(|t| t.1).collect();
        let vals: Vec<f64> = mine.iter().map(|t| t.2).collect();
        let rows = self.comm.all_gather_indices(&rows);
        let cols = self.comm.all_gather_indices(&cols);
        let vals = self.comm.all_gather(&vals);
        rows.into_iter()
            .zip(cols)
            .zip(vals)
            .map(|((i, j), v)| (i, j, v))
            .collect()
    }

    /// Collective: the whole matrix, replicated on every rank.
    pub fn gather_global(&self) -> CsrMatrix {
        match CsrMatrix::from_triplets(self.m(), self.n(), &self.gather_triplets()) {
            Ok(m) => m,
            Err(_) => unreachable!("gathered entries are in bounds"),
        }
    }

    /// Collective: dense copy replicated on every rank.
    pub fn to_dense(&self) -> Mat<f64> {
        <Mat<f64> as DenseMatrix>::from_triplets(self.m(), self.n(), &self.gather_triplets())
    }

    /// Collective: explicit transpose. Rows of the result are distributed
    /// like the columns of `self` and vice versa.
    pub fn transpose(&self) -> Self {
        let (begin, end) = (self.cols.begin(), self.cols.end());
        let mine: Vec<_> = self
            .gather_triplets()
            .into_iter()
            .filter(|&(_, j, _)| j >= begin && j < end)
            .map(|(i, j, v)| (j - begin, i, v))
            .collect();
        let local = match CsrMatrix::from_triplets(self.cols.n_elements(), self.m(), &mine) {
            Ok(m) => m,
            Err(_) => unreachable!("transposed entries are in bounds"),
        };
        Self { local, rows: self.cols, cols: self.rows, comm: self.comm.clone() }
    }

    /// Collective: sparse product `self * b`. The result has the row layout
    /// of `self` and the domain layout of `b`.
    pub fn mmult(&self, b: &DistributedMatrix) -> Result<Self, MgError> {
        if self.n() != b.m() {
            return Err(MgError::DimensionMismatch { expected: self.n(), found: b.m() });
        }
        let b_global = b.gather_global();
        let local = self.local.matmul(&b_global)?;
        Ok(Self { local, rows: self.rows, cols: b.cols, comm: self.comm.clone() })
    }

    /// Diagonal block of the owned rows and owned columns, in local indices.
    /// Processor-local relaxations operate on this block.
    pub fn local_block(&self) -> Result<CsrMatrix, MgError> {
        if self.rows != IndexSet::new(self.n(), self.cols.begin(), self.cols.end()) {
            return Err(MgError::PreconditionViolation(
                "relaxation needs identical row and column ownership",
            ));
        }
        Ok(self.local.column_block(self.cols.begin(), self.cols.end()))
    }
}

impl fmt::Debug for DistributedMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributedMatrix")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("local_nnz", &self.local.nnz())
            .finish()
    }
}
