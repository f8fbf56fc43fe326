//! Smoothed-aggregation algebraic multigrid (Vaněk, Mandel & Brezina).
//!
//! Aggregates are formed independently on every rank from the strength graph
//! of the locally owned diagonal block, so no aggregate crosses a processor
//! boundary. The tentative prolongator maps each aggregate to one coarse
//! unknown and is smoothed by one damped Jacobi step. Coarse operators are the
//! Galerkin products Pᵀ A P. The coarsest level is solved directly.

use crate::config::AmgParams;
use crate::error::MgError;
use crate::matrix::{CsrMatrix, DistributedMatrix, DistributedVector, IndexSet};
use crate::preconditioner::{relaxation, richardson_step, Preconditioner, Relaxation};
use crate::solver::DirectSolver;

const UNAGGREGATED: usize = usize::MAX;

struct AmgLevel {
    a: DistributedMatrix,
    /// Transfers to the next coarser level; `None` on the coarsest level.
    transfer: Option<Transfer>,
}

struct Transfer {
    p: DistributedMatrix,
    r: DistributedMatrix,
    smoother: Relaxation,
}

/// Multilevel hierarchy applied as a V-cycle preconditioner.
pub struct Amg {
    levels: Vec<AmgLevel>,
    coarse: DirectSolver,
    params: AmgParams,
}

impl Amg {
    /// Collective: build the hierarchy for `a`.
    pub fn new(a: &DistributedMatrix, params: AmgParams) -> Result<Self, MgError> {
        if a.m() != a.n() {
            return Err(MgError::DimensionMismatch { expected: a.m(), found: a.n() });
        }
        let mut levels = Vec::new();
        let mut current = a.clone();
        while levels.len() + 1 < params.max_levels && current.m() > params.coarse_max_size {
            let p = prolongator(&current, &params)?;
            if p.n() == 0 || p.n() >= current.m() {
                log::debug!("amg: coarsening stalled at {} unknowns", current.m());
                break;
            }
            let r = p.transpose();
            let coarse = r.mmult(&current.mmult(&p)?)?;
            let smoother = relaxation(params.smoother, params.smoother_damping, &current)?;
            log::debug!("amg: level {} has {} unknowns, next {}", levels.len(), current.m(), coarse.m());
            levels.push(AmgLevel { a: current, transfer: Some(Transfer { p, r, smoother }) });
            current = coarse;
        }
        let coarse = DirectSolver::new(&current)?;
        levels.push(AmgLevel { a: current, transfer: None });

        let amg = Self { levels, coarse, params };
        let (ratio, _) = amg.complexities();
        log::info!(
            "amg: {} levels, {} coarsest unknowns, operator complexity {:.3}",
            amg.n_levels(),
            amg.level_matrix(amg.n_levels() - 1).m(),
            ratio
        );
        Ok(amg)
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn params(&self) -> &AmgParams {
        &self.params
    }

    /// Operator of level `l`, with level 0 the finest.
    pub fn level_matrix(&self, l: usize) -> &DistributedMatrix {
        &self.levels[l].a
    }

    /// Number of domain entries of level `l` owned by this rank.
    pub fn level_local_length(&self, l: usize) -> usize {
        self.levels[l].a.locally_owned_domain_indices().n_elements()
    }

    /// Collective: `(total nnz / fine nnz, fine nnz)` over all levels.
    pub fn complexities(&self) -> (f64, f64) {
        let nnz: Vec<usize> = self.levels.iter().map(|l| l.a.n_nonzero_elements()).collect();
        let fine = nnz[0] as f64;
        let total = nnz.iter().sum::<usize>() as f64;
        let ratio = if fine > 0.0 { total / fine } else { 1.0 };
        (ratio, fine)
    }

    /// Collective: x = M⁻¹ b with `cycle_applications` V-cycles from x = 0.
    pub fn vmult(&self, b: &DistributedVector, x: &mut DistributedVector) -> Result<(), MgError> {
        let a = &self.levels[0].a;
        x.zero();
        self.vcycle(0, b, x)?;
        if self.params.cycle_applications > 1 {
            let mut r = a.range_vector();
            let mut e = a.domain_vector();
            for _ in 1..self.params.cycle_applications {
                a.vmult(&mut r, x);
                r.sadd(-1.0, 1.0, b);
                e.zero();
                self.vcycle(0, &r, &mut e)?;
                x.add(1.0, &e);
            }
        }
        Ok(())
    }

    fn vcycle(&self, l: usize, b: &DistributedVector, x: &mut DistributedVector) -> Result<(), MgError> {
        let level = &self.levels[l];
        let Some(transfer) = &level.transfer else {
            self.coarse.solve(b, x)?;
            return Ok(());
        };
        let a = &level.a;
        let mut r = a.range_vector();
        let mut t = a.range_vector();
        for _ in 0..self.params.smoother_sweeps {
            richardson_step(a, transfer.smoother.as_ref(), b, x, &mut r, &mut t)?;
        }

        // restrict the residual b - A x
        a.vmult(&mut r, x);
        r.sadd(-1.0, 1.0, b);
        let mut bc = transfer.r.range_vector();
        transfer.r.vmult(&mut bc, &r);

        let mut xc = self.levels[l + 1].a.domain_vector();
        self.vcycle(l + 1, &bc, &mut xc)?;

        let mut correction = transfer.p.range_vector();
        transfer.p.vmult(&mut correction, &xc);
        x.add(1.0, &correction);

        for _ in 0..self.params.smoother_sweeps {
            richardson_step(a, transfer.smoother.as_ref(), b, x, &mut r, &mut t)?;
        }
        Ok(())
    }
}

impl Preconditioner<DistributedMatrix, DistributedVector> for Amg {
    fn setup(&mut self, a: &DistributedMatrix) -> Result<(), MgError> {
        *self = Amg::new(a, self.params.clone())?;
        Ok(())
    }

    fn apply(&self, r: &DistributedVector, z: &mut DistributedVector) -> Result<(), MgError> {
        self.vmult(r, z)
    }
}

/// Strongly connected off-diagonal neighbours of every row of `block`:
/// |a_ij| > θ √|a_ii a_jj|.
fn strength_graph(block: &CsrMatrix, theta: f64) -> Vec<Vec<usize>> {
    let diag = block.diagonal();
    (0..block.nrows())
        .map(|i| {
            let (cols, vals) = block.row(i);
            cols.iter()
                .zip(vals)
                .filter(|&(&j, &v)| j != i && v != 0.0 && v.abs() > theta * (diag[i] * diag[j]).abs().sqrt())
                .map(|(&j, _)| j)
                .collect()
        })
        .collect()
}

/// Three-phase greedy aggregation of a strength graph. Returns the aggregate
/// of every node and the number of aggregates.
fn aggregate(strong: &[Vec<usize>]) -> (Vec<usize>, usize) {
    let n = strong.len();
    let mut agg = vec![UNAGGREGATED; n];
    let mut count = 0;

    // 1: roots whose whole neighbourhood is free
    for i in 0..n {
        if agg[i] == UNAGGREGATED && strong[i].iter().all(|&j| agg[j] == UNAGGREGATED) {
            agg[i] = count;
            for &j in &strong[i] {
                agg[j] = count;
            }
            count += 1;
        }
    }

    // 2: attach leftovers to a neighbouring aggregate
    let phase1 = agg.clone();
    for i in 0..n {
        if agg[i] == UNAGGREGATED {
            if let Some(&j) = strong[i].iter().find(|&&j| phase1[j] != UNAGGREGATED) {
                agg[i] = phase1[j];
            }
        }
    }

    // 3: remaining nodes with their free neighbours
    for i in 0..n {
        if agg[i] == UNAGGREGATED {
            agg[i] = count;
            for &j in &strong[i] {
                if agg[j] == UNAGGREGATED {
                    agg[j] = count;
                }
            }
            count += 1;
        }
    }
    (agg, count)
}

/// Collective: smoothed prolongator P = (I − ω D⁻¹ A) P_tent for `a`.
fn prolongator(a: &DistributedMatrix, params: &AmgParams) -> Result<DistributedMatrix, MgError> {
    let comm = a.get_mpi_communicator().clone();
    let block = a.local_block()?;
    let (agg, n_agg) = aggregate(&strength_graph(&block, params.aggregation_threshold));
    let coarse = IndexSet::from_local_count(comm.as_ref(), n_agg);

    let mut sizes = vec![0usize; n_agg];
    for &g in &agg {
        sizes[g] += 1;
    }
    let tentative: Vec<_> = agg
        .iter()
        .enumerate()
        .map(|(i, &g)| (i, coarse.begin() + g, 1.0 / (sizes[g] as f64).sqrt()))
        .collect();
    let rows = *a.locally_owned_range_indices();
    let p_tent = DistributedMatrix::new(
        CsrMatrix::from_triplets(rows.n_elements(), coarse.size(), &tentative)?,
        rows,
        coarse,
        comm.clone(),
    )?;
    if params.prolongator_damping == 0.0 {
        return Ok(p_tent);
    }

    // ω = damping / ρ(D⁻¹A), ρ bounded by Gershgorin
    let diag = block.diagonal();
    let local = a.local_matrix();
    let local_rho = (0..local.nrows())
        .filter(|&i| diag[i] != 0.0)
        .map(|i| local.row(i).1.iter().map(|v| v.abs()).sum::<f64>() / diag[i].abs())
        .fold(0.0, f64::max);
    let rho = comm.all_reduce_max(local_rho);
    if rho == 0.0 {
        return Ok(p_tent);
    }
    let omega = params.prolongator_damping / rho;

    let ap = a.mmult(&p_tent)?;
    let mut smoothed = tentative;
    for (i, j, v) in ap.local_matrix().triplets(0, 0) {
        if diag[i] != 0.0 {
            smoothed.push((i, j, -omega * v / diag[i]));
        }
    }
    DistributedMatrix::new(
        CsrMatrix::from_triplets(rows.n_elements(), coarse.size(), &smoothed)?,
        rows,
        coarse,
        comm,
    )
}
