use crate::parameter::ParameterError;
use num_dual::linalg::LinAlgError;
use thiserror::Error;

/// Errors of state construction and phase equilibrium solvers.
#[derive(Error, Debug)]
pub enum EosError {
    #[error("{0}")]
    Error(String),
    #[error("{0} did not converge within the maximum number of iterations")]
    NotConverged(String),
    #[error("{0} produced non-finite or out-of-range values")]
    IterationFailed(String),
    #[error("both phases converged to the same state")]
    TrivialSolution,
    #[error("equation of state has {0} components but {1} were given")]
    IncompatibleComponents(usize, usize),
    #[error("invalid {1} in {0}: {2}")]
    InvalidState(String, String, f64),
    #[error("undetermined state: {0}")]
    UndeterminedState(String),
    #[error("stability analysis found no phase split")]
    NoPhaseSplit,
    #[error(transparent)]
    ParameterError(#[from] ParameterError),
    #[error(transparent)]
    LinAlgError(#[from] LinAlgError),
}

/// Result type of the equation of state crate.
pub type EosResult<T> = Result<T, EosError>;
