use thiserror::Error;

// Unified error type for mgops

#[derive(Error, Debug)]
pub enum MgError {
    #[error("unknown {what} name: \"{name}\"")]
    Configuration { what: &'static str, name: String },
    #[error("invalid value \"{value}\" for parameter \"{key}\"")]
    InvalidParameter { key: String, value: String },
    #[error("operation not supported: {0}")]
    CapabilityNotSupported(&'static str),
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),
    #[error("operator kind mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("factorization error: {0}")]
    FactorError(String),
    #[error("solve error: {0}")]
    SolveError(String),
    #[error("zero pivot at row {0}")]
    ZeroPivot(usize),
    #[error("cannot read parameter file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed parameter file: {0}")]
    Json(#[from] serde_json::Error),
}

impl MgError {
    /// True for errors caused by the parameter tree rather than by the numerics.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MgError::Configuration { .. } | MgError::InvalidParameter { .. }
        )
    }
}
