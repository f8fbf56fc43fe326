//! Contiguous ownership ranges of distributed rows, columns and vector entries.

use crate::parallel::Comm;

/// The half-open range `[begin, end)` of global indices owned by one rank,
/// out of `size` global indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSet {
    size: usize,
    begin: usize,
    end: usize,
}

impl IndexSet {
    /// Owned range `[begin, end)` of a global index space of length `size`.
    ///
    /// # Panics
    /// Panics if the range is not contained in `0..size`.
    pub fn new(size: usize, begin: usize, end: usize) -> Self {
        assert!(begin <= end && end <= size, "invalid index range {begin}..{end} of {size}");
        Self { size, begin, end }
    }

    /// All of `0..size`, the layout of a single-rank object.
    pub fn complete(size: usize) -> Self {
        Self::new(size, 0, size)
    }

    /// Balanced block partition: the first `size % nranks` ranks own one
    /// extra index.
    pub fn uniform(size: usize, rank: usize, nranks: usize) -> Self {
        let chunk = size / nranks;
        let extra = size % nranks;
        let begin = rank * chunk + rank.min(extra);
        let len = chunk + usize::from(rank < extra);
        Self::new(size, begin, begin + len)
    }

    /// Collective: ranges laid out in rank order from each rank's local count.
    pub fn from_local_count(comm: &dyn Comm, local: usize) -> Self {
        let counts = comm.all_gather_indices(&[local]);
        let begin: usize = counts[..comm.rank()].iter().sum();
        let size: usize = counts.iter().sum();
        Self::new(size, begin, begin + local)
    }

    /// Global size of the index space.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn begin(&self) -> usize {
        self.begin
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of locally owned indices.
    pub fn n_elements(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_element(&self, global: usize) -> bool {
        global >= self.begin && global < self.end
    }

    /// Position of an owned global index within the local range.
    pub fn index_within_set(&self, global: usize) -> Option<usize> {
        self.is_element(global).then(|| global - self.begin)
    }

    /// Global index of the `local`-th owned index.
    pub fn nth_index_in_set(&self, local: usize) -> usize {
        debug_assert!(local < self.n_elements());
        self.begin + local
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_partition_covers_everything_once() {
        let n = 10;
        let parts: Vec<IndexSet> = (0..3).map(|r| IndexSet::uniform(n, r, 3)).collect();
        assert_eq!(parts[0], IndexSet::new(10, 0, 4));
        assert_eq!(parts[1], IndexSet::new(10, 4, 7));
        assert_eq!(parts[2], IndexSet::new(10, 7, 10));
        assert_eq!(parts.iter().map(|p| p.n_elements()).sum::<usize>(), n);
    }

    #[test]
    fn local_global_translation() {
        let set = IndexSet::new(8, 3, 6);
        assert_eq!(set.index_within_set(4), Some(1));
        assert_eq!(set.index_within_set(6), None);
        assert_eq!(set.nth_index_in_set(2), 5);
    }
}
