//! Tests for the coarse-level operator: exact direct solves, nested AMG and
//! complexity reporting.

use approx::assert_abs_diff_eq;
use mgops::config::{CoarseType, ParamTree};
use mgops::error::MgError;
use mgops::matrix::{CsrMatrix, DistributedMatrix, DistributedVector};
use mgops::operator::{CoarseSolver, DirectOperator, Operator};
use mgops::parallel::{Comm, SerialComm};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 1D Laplacian (2, -1) of order n.
fn laplacian(n: usize) -> DistributedMatrix {
    let mut t = Vec::new();
    for i in 0..n {
        t.push((i, i, 2.0));
        if i > 0 { t.push((i, i - 1, -1.0)); }
        if i + 1 < n { t.push((i, i + 1, -1.0)); }
    }
    DistributedMatrix::from_global(&CsrMatrix::from_triplets(n, n, &t).unwrap(), SerialComm::shared())
}

/// Serial communicator that counts `all_reduce_count` calls.
#[derive(Default)]
struct CountingComm {
    inner: SerialComm,
    counts: AtomicUsize,
}

impl Comm for CountingComm {
    fn rank(&self) -> usize { self.inner.rank() }
    fn size(&self) -> usize { self.inner.size() }
    fn barrier(&self) { self.inner.barrier() }
    fn all_reduce(&self, x: f64) -> f64 { self.inner.all_reduce(x) }
    fn all_reduce_max(&self, x: f64) -> f64 { self.inner.all_reduce_max(x) }
    fn all_reduce_count(&self, x: usize) -> usize {
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.inner.all_reduce_count(x)
    }
    fn all_gather(&self, local: &[f64]) -> Vec<f64> { self.inner.all_gather(local) }
    fn all_gather_indices(&self, local: &[usize]) -> Vec<usize> { self.inner.all_gather_indices(local) }
}

fn residual_norm(a: &DistributedMatrix, b: &DistributedVector, x: &DistributedVector) -> f64 {
    let mut r = a.range_vector();
    a.vmult(&mut r, x);
    r.sadd(-1.0, 1.0, b);
    r.l2_norm()
}

/// Default configuration solves the 4x4 system exactly: x = [1, 1, 1, 1].
#[test]
fn direct_solves_small_system() {
    let a = laplacian(4);
    let op = DirectOperator::new(&a, Some(&ParamTree::new())).unwrap();
    assert_eq!(op.coarse_type(), CoarseType::Direct);
    let b = DistributedVector::from_global(vec![1.0, 0.0, 0.0, 1.0], SerialComm::shared());
    let mut x = a.domain_vector();
    op.apply(&b, &mut x).unwrap();
    for i in 0..4 {
        assert_abs_diff_eq!(x.local()[i], 1.0, epsilon = 1e-10);
    }
    assert!(residual_norm(&a, &b, &x) <= 1e-10);
}

/// The direct strategy reports the matrix size and nonzero count.
#[test]
fn direct_complexities() {
    let a = laplacian(30);
    let mut prm = ParamTree::new();
    prm.put("coarse.type", "direct");
    let op = DirectOperator::new(&a, Some(&prm)).unwrap();
    assert_eq!(op.grid_complexity(), a.m());
    assert_eq!(op.operator_complexity(), a.n_nonzero_elements());
    assert_eq!(op.nnz(), 88);
}

/// Direct solves stay exact well beyond toy sizes.
#[test]
fn direct_solves_large_laplacian() {
    for n in [16, 50, 200] {
        let a = laplacian(n);
        let op = DirectOperator::new(&a, None).unwrap();
        let b = DistributedVector::from_global(vec![1.0; n], SerialComm::shared());
        let mut x = a.domain_vector();
        op.apply(&b, &mut x).unwrap();
        assert!(x.local().iter().all(|v| v.is_finite()));
        let res = residual_norm(&a, &b, &x);
        assert!(res <= 1e-10 * b.l2_norm(), "n = {n}, residual {res:e}");
        // x_i = (i + 1)(n - i) / 2
        let mid = ((n / 2 + 1) * (n - n / 2)) as f64 / 2.0;
        assert_abs_diff_eq!(x.local()[n / 2], mid, epsilon = 1e-8 * mid);
    }
}

#[test]
fn unknown_coarse_type_is_rejected() {
    let mut prm = ParamTree::new();
    prm.put("coarse.type", "nonsense");
    let err = DirectOperator::new(&laplacian(4), Some(&prm)).err().unwrap();
    assert!(err.is_configuration_error());
    assert!(matches!(err, MgError::Configuration { what: "coarse solver", .. }));
}

/// The nested AMG builds a hierarchy whose complexities exceed the fine level.
#[test]
fn ml_builds_a_hierarchy() {
    let a = laplacian(500);
    let prm = ParamTree::from_json_str(r#"{ "coarse": { "type": "ml" } }"#).unwrap();
    let op = DirectOperator::new(&a, Some(&prm)).unwrap();
    assert_eq!(op.coarse_type(), CoarseType::Ml);
    assert!(op.grid_complexity() > a.m());
    assert!(op.operator_complexity() > a.n_nonzero_elements());
    assert!(op.operator_complexity() < 2 * a.n_nonzero_elements());
}

/// Grid and operator complexities are the sums of level sizes and nonzeros.
#[test]
fn ml_complexities_sum_over_levels() {
    let a = laplacian(500);
    let prm = ParamTree::from_json_str(r#"{ "coarse": { "type": "ml" } }"#).unwrap();
    let op = DirectOperator::new(&a, Some(&prm)).unwrap();
    let CoarseSolver::Amg(amg) = op.solver() else {
        panic!("expected an AMG coarse solver");
    };
    assert!(amg.n_levels() > 1);
    let rows: usize = (0..amg.n_levels()).map(|l| amg.level_matrix(l).m()).sum();
    let nnz: usize = (0..amg.n_levels()).map(|l| amg.level_matrix(l).n_nonzero_elements()).sum();
    assert_eq!(op.grid_complexity(), rows);
    assert_eq!(op.operator_complexity(), nnz);
}

/// Grid complexity issues one count reduction per level.
#[test]
fn grid_complexity_reduces_once_per_level() {
    let n = 300;
    let mut t = Vec::new();
    for i in 0..n {
        t.push((i, i, 2.0));
        if i > 0 { t.push((i, i - 1, -1.0)); }
        if i + 1 < n { t.push((i, i + 1, -1.0)); }
    }
    let counting = Arc::new(CountingComm::default());
    let comm: Arc<dyn Comm> = counting.clone();
    let a = DistributedMatrix::from_global(&CsrMatrix::from_triplets(n, n, &t).unwrap(), comm);
    let prm = ParamTree::from_json_str(r#"{ "coarse": { "type": "ml" } }"#).unwrap();
    let op = DirectOperator::new(&a, Some(&prm)).unwrap();
    let CoarseSolver::Amg(amg) = op.solver() else {
        panic!("expected an AMG coarse solver");
    };
    let before = counting.counts.load(Ordering::SeqCst);
    let gc = op.grid_complexity();
    let calls = counting.counts.load(Ordering::SeqCst) - before;
    assert_eq!(calls, amg.n_levels());
    assert!(gc > n);
}

/// One AMG application reduces the residual of the coarse problem.
#[test]
fn ml_apply_reduces_residual() {
    let a = laplacian(500);
    let prm = ParamTree::from_json_str(r#"{ "coarse": { "type": "ml" } }"#).unwrap();
    let op = DirectOperator::new(&a, Some(&prm)).unwrap();
    let b = DistributedVector::from_global(vec![1.0; 500], SerialComm::shared());
    let mut x = a.domain_vector();
    op.apply(&b, &mut x).unwrap();
    assert!(residual_norm(&a, &b, &x) < 0.5 * b.l2_norm());
}

/// `coarse.params` entries override the AMG defaults: a single level is an
/// exact solve with grid complexity m.
#[test]
fn ml_params_override_defaults() {
    let a = laplacian(200);
    let prm = ParamTree::from_json_str(
        r#"{ "coarse": { "type": "ML", "params": { "max levels": 1 } } }"#,
    )
    .unwrap();
    let op = DirectOperator::new(&a, Some(&prm)).unwrap();
    assert_eq!(op.grid_complexity(), a.m());
    assert_eq!(op.operator_complexity(), a.n_nonzero_elements());

    let b = DistributedVector::from_global(vec![1.0; 200], SerialComm::shared());
    let mut x = a.domain_vector();
    op.apply(&b, &mut x).unwrap();
    assert!(residual_norm(&a, &b, &x) <= 1e-8 * b.l2_norm());
}

/// Malformed AMG parameters abort construction.
#[test]
fn ml_rejects_bad_parameters() {
    let a = laplacian(20);
    let prm = ParamTree::from_json_str(
        r#"{ "coarse": { "type": "ml", "params": { "max levels": "many" } } }"#,
    )
    .unwrap();
    assert!(matches!(
        DirectOperator::new(&a, Some(&prm)),
        Err(MgError::InvalidParameter { .. })
    ));
}
