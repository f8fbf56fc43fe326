//! Typed options read from the parameter tree.
//!
//! Strategy names are normalized (lower-cased, trimmed) and parsed into closed
//! enumerations here, so the operators never branch on raw strings.

use crate::config::params::ParamTree;
use crate::error::MgError;
use std::fmt;
use std::str::FromStr;

/// Relaxation scheme of a smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmootherType {
    /// Symmetric successive over-relaxation (forward then backward sweep).
    SymmetricGaussSeidel,
    /// Successive over-relaxation, forward sweep.
    GaussSeidel,
    /// Point Jacobi.
    Jacobi,
    /// Incomplete LU with zero fill.
    Ilu,
}

impl SmootherType {
    pub const DEFAULT_NAME: &'static str = "Symmetric Gauss-Seidel";

    pub fn name(&self) -> &'static str {
        match self {
            SmootherType::SymmetricGaussSeidel => "symmetric gauss-seidel",
            SmootherType::GaussSeidel => "gauss-seidel",
            SmootherType::Jacobi => "jacobi",
            SmootherType::Ilu => "ilu",
        }
    }
}

impl FromStr for SmootherType {
    type Err = MgError;

    fn from_str(s: &str) -> Result<Self, MgError> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "symmetric gauss-seidel" => Ok(SmootherType::SymmetricGaussSeidel),
            "gauss-seidel" => Ok(SmootherType::GaussSeidel),
            "jacobi" => Ok(SmootherType::Jacobi),
            "ilu" => Ok(SmootherType::Ilu),
            _ => Err(MgError::Configuration { what: "smoother", name }),
        }
    }
}

impl fmt::Display for SmootherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strategy of the coarsest-level solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoarseType {
    /// Factorize and solve exactly (`""` or `"direct"`).
    Direct,
    /// Smoothed-aggregation AMG (`"ml"`).
    Ml,
}

impl FromStr for CoarseType {
    type Err = MgError;

    fn from_str(s: &str) -> Result<Self, MgError> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "" | "direct" => Ok(CoarseType::Direct),
            "ml" => Ok(CoarseType::Ml),
            _ => Err(MgError::Configuration { what: "coarse solver", name }),
        }
    }
}

impl fmt::Display for CoarseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoarseType::Direct => f.write_str("direct"),
            CoarseType::Ml => f.write_str("ml"),
        }
    }
}

/// Parameters of the smoothed-aggregation AMG coarse solver.
///
/// Keys of a `coarse.params` subtree use the same names as the fields'
/// documentation; unknown keys are kept in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct AmgParams {
    /// `max levels`: number of levels including the finest.
    pub max_levels: usize,
    /// `coarse: max size`: stop coarsening at or below this many unknowns.
    pub coarse_max_size: usize,
    /// `aggregation: threshold`: strength-of-connection drop tolerance θ.
    pub aggregation_threshold: f64,
    /// `aggregation: damping factor`: prolongator smoothing factor, 0 gives
    /// plain aggregation.
    pub prolongator_damping: f64,
    /// `smoother: type`
    pub smoother: SmootherType,
    /// `smoother: sweeps`: pre- and post-smoothing steps per level.
    pub smoother_sweeps: usize,
    /// `smoother: damping factor`
    pub smoother_damping: f64,
    /// `cycle applications`: V-cycles per preconditioner application.
    pub cycle_applications: usize,
    /// Entries with no meaning for this implementation.
    pub extra: Vec<(String, String)>,
}

impl AmgParams {
    /// Default parameter set for smoothed aggregation.
    pub fn smoothed_aggregation() -> Self {
        Self {
            max_levels: 10,
            coarse_max_size: 128,
            aggregation_threshold: 0.0,
            prolongator_damping: 4.0 / 3.0,
            smoother: SmootherType::SymmetricGaussSeidel,
            smoother_sweeps: 2,
            smoother_damping: 1.0,
            cycle_applications: 1,
            extra: Vec::new(),
        }
    }

    /// Overrides the defaults with every entry of `tree`.
    pub fn merge(&mut self, tree: &ParamTree) -> Result<(), MgError> {
        for (key, value) in tree.leaves() {
            let invalid = || MgError::InvalidParameter { key: key.clone(), value: value.clone() };
            match key.as_str() {
                "max levels" => self.max_levels = value.parse().map_err(|_| invalid())?,
                "coarse: max size" => self.coarse_max_size = value.parse().map_err(|_| invalid())?,
                "aggregation: threshold" => {
                    self.aggregation_threshold = value.parse().map_err(|_| invalid())?
                }
                "aggregation: damping factor" => {
                    self.prolongator_damping = value.parse().map_err(|_| invalid())?
                }
                "smoother: type" => self.smoother = value.parse()?,
                "smoother: sweeps" => self.smoother_sweeps = value.parse().map_err(|_| invalid())?,
                "smoother: damping factor" => {
                    self.smoother_damping = value.parse().map_err(|_| invalid())?
                }
                "cycle applications" => {
                    self.cycle_applications = value.parse().map_err(|_| invalid())?
                }
                _ => {
                    log::warn!("AMG parameter \"{key}\" is not used");
                    self.extra.push((key, value));
                }
            }
        }
        if self.max_levels == 0 {
            return Err(MgError::InvalidParameter { key: "max levels".into(), value: "0".into() });
        }
        if self.cycle_applications == 0 {
            return Err(MgError::InvalidParameter { key: "cycle applications".into(), value: "0".into() });
        }
        Ok(())
    }
}

impl Default for AmgParams {
    fn default() -> Self {
        Self::smoothed_aggregation()
    }
}
