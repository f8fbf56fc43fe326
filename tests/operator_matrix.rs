//! Tests for the matrix operators: application against a dense reference,
//! transposition, products and the capability errors of the local variant.

use approx::assert_abs_diff_eq;
use faer::Mat;
use mgops::core::traits::MatVec;
use mgops::error::MgError;
use mgops::matrix::{CsrMatrix, DistributedMatrix, DistributedVector};
use mgops::operator::{DistributedMatrixOperator, LocalMatrixOperator, MatrixOperator, Operator};
use mgops::parallel::SerialComm;
use rand::Rng;
use std::sync::Arc;

/// Random sparse m x n matrix with roughly `density * m * n` entries.
fn random_sparse(m: usize, n: usize, density: f64) -> CsrMatrix {
    let mut rng = rand::thread_rng();
    let mut triplets = Vec::new();
    for i in 0..m {
        for j in 0..n {
            if rng.r#gen::<f64>() < density {
                triplets.push((i, j, rng.gen_range(-2.0..2.0)));
            }
        }
    }
    CsrMatrix::from_triplets(m, n, &triplets).unwrap()
}

fn random_vector(op: &dyn MatrixOperator) -> DistributedVector {
    let mut rng = rand::thread_rng();
    let mut x = op.build_domain_vector().unwrap();
    x.local_mut().iter_mut().for_each(|v| *v = rng.r#gen());
    x
}

fn operator(a: &CsrMatrix) -> DistributedMatrixOperator {
    DistributedMatrixOperator::from(DistributedMatrix::from_global(a, SerialComm::shared()))
}

/// apply() agrees with the dense matrix-vector product.
#[test]
fn apply_matches_dense_product() {
    let a = random_sparse(12, 9, 0.3);
    let dense: Mat<f64> = a.to_dense();
    let op = operator(&a);
    let x = random_vector(&op);
    let mut y = op.build_range_vector().unwrap();
    op.apply(&x, &mut y).unwrap();

    let mut y_ref = vec![0.0; 12];
    dense.matvec(&x.local().to_vec(), &mut y_ref);
    for i in 0..12 {
        assert_abs_diff_eq!(y.local()[i], y_ref[i], epsilon = 1e-12);
    }
}

/// Transposing twice gives back the same entries and sparsity.
#[test]
fn transpose_twice_is_identity() {
    let a = random_sparse(7, 10, 0.25);
    let op = operator(&a);
    let tt = op.transpose().unwrap().transpose().unwrap();
    let tt = tt.as_any().downcast_ref::<DistributedMatrixOperator>().unwrap();
    let back = tt.matrix().gather_global();
    assert!(back.has_pattern(&a.pattern()));
    for i in 0..7 {
        let (cols, vals) = a.row(i);
        for (&j, &v) in cols.iter().zip(vals) {
            assert_abs_diff_eq!(back.get(i, j), v, epsilon = 1e-15);
        }
    }
}

/// The transpose satisfies (Aᵀ y)·x = y·(A x).
#[test]
fn transpose_is_adjoint() {
    let a = random_sparse(6, 8, 0.4);
    let op = operator(&a);
    let t = op.transpose().unwrap();
    let x = random_vector(&op);
    let y = random_vector(t.as_ref());
    let mut ax = op.build_range_vector().unwrap();
    op.apply(&x, &mut ax).unwrap();
    let mut aty = t.build_range_vector().unwrap();
    t.apply(&y, &mut aty).unwrap();
    assert_abs_diff_eq!(ax.dot(&y), aty.dot(&x), epsilon = 1e-10);
}

/// multiply(A, B) applied to x equals A applied to B x.
#[test]
fn multiply_matches_composition() {
    let a = operator(&random_sparse(5, 7, 0.4));
    let b = operator(&random_sparse(7, 4, 0.4));
    let ab = a.multiply(&b).unwrap();

    let x = random_vector(&b);
    let mut bx = b.build_range_vector().unwrap();
    b.apply(&x, &mut bx).unwrap();
    let mut abx = a.build_range_vector().unwrap();
    a.apply(&bx, &mut abx).unwrap();

    let mut y = ab.build_range_vector().unwrap();
    ab.apply(&x, &mut y).unwrap();
    for i in 0..5 {
        assert_abs_diff_eq!(y.local()[i], abx.local()[i], epsilon = 1e-12);
    }
}

/// Products with incompatible inner dimensions are rejected.
#[test]
fn multiply_checks_dimensions() {
    let a = operator(&random_sparse(5, 7, 0.4));
    let b = operator(&random_sparse(6, 4, 0.4));
    assert!(matches!(a.multiply(&b), Err(MgError::DimensionMismatch { expected: 7, found: 6 })));
}

/// Multiplying by an operator of another kind is a type mismatch.
#[test]
fn multiply_with_foreign_kind_is_a_type_mismatch() {
    let a = random_sparse(4, 4, 0.5);
    let op = operator(&a);
    let local = LocalMatrixOperator::new(Some(Arc::new(a.clone())), Some(Arc::new(a.pattern()))).unwrap();
    match op.multiply(&local) {
        Err(MgError::TypeMismatch { expected, found }) => {
            assert_eq!(expected, DistributedMatrixOperator::KIND);
            assert_eq!(found, LocalMatrixOperator::KIND);
        }
        other => panic!("expected a type mismatch, got {:?}", other.map(|_| ())),
    }
}

/// The local operator applies but reports every other capability as missing.
#[test]
fn local_operator_supports_apply_only() {
    let a = CsrMatrix::from_triplets(2, 2, &[(0, 0, 2.0), (0, 1, 1.0), (1, 1, 3.0)]).unwrap();
    let local = LocalMatrixOperator::new(Some(Arc::new(a.clone())), Some(Arc::new(a.pattern()))).unwrap();
    let x = DistributedVector::from_global(vec![1.0, 2.0], SerialComm::shared());
    let mut y = DistributedVector::from_global(vec![0.0, 0.0], SerialComm::shared());
    local.apply(&x, &mut y).unwrap();
    assert_eq!(y.local(), &[4.0, 6.0]);

    assert!(matches!(local.transpose(), Err(MgError::CapabilityNotSupported(_))));
    assert!(matches!(local.multiply(&local), Err(MgError::CapabilityNotSupported(_))));
    assert!(matches!(local.build_domain_vector(), Err(MgError::CapabilityNotSupported(_))));
    assert!(matches!(local.build_range_vector(), Err(MgError::CapabilityNotSupported(_))));
}
