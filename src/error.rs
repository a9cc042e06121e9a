use thiserror::Error;

use crate::solver::SolveStatus;

pub type Result<T> = std::result::Result<T, AdaptiveElasticNetError>;

#[derive(Error, Debug)]
pub enum AdaptiveElasticNetError {
    /// The penalty must be non-negative
    #[error("penalty must be non-negative, but is {0}")]
    InvalidPenalty(f32),
    /// The L1 ratio must be in unit range
    #[error("l1 ratio must be in range [0, 1], but is {0}")]
    InvalidL1Ratio(f32),
    /// The weight-sharpening exponent must be positive
    #[error("gamma must be positive, but is {0}")]
    InvalidGamma(f32),
    /// The adaptive-weight floor must be positive
    #[error("weight floor eps must be positive, but is {0}")]
    InvalidWeightEps(f32),
    /// Tolerances must be non-negative
    #[error("tolerance must be non-negative, but is {0}")]
    InvalidTolerance(f32),
    /// Fitting without an intercept is not supported
    #[error("fitting without an intercept is not supported")]
    InterceptRequired,
    /// The target vector does not pair up with the feature matrix
    #[error("the number of targets {0} does not match the number of samples {1}")]
    TargetShapeMismatch(usize, usize),
    /// The input contains NaN or infinite values
    #[error("the input must not contain non-finite values")]
    NonFiniteInput,
    /// The input has no samples or no features
    #[error("the input must contain at least one sample and one feature")]
    NotEnoughSamples,
    /// The preliminary elastic net fit used for the adaptive weights failed
    #[error("preliminary elastic net fit failed: {0}")]
    PreliminaryFit(#[from] linfa_elasticnet::ElasticNetError),
    /// Every fallback solver configuration failed as well
    #[error("solver finished with status \"{0}\" after exhausting all fallbacks")]
    SolverFailure(SolveStatus),
    /// The solution violates the non-negativity constraints beyond tolerance
    #[error("non-negativity constraint violated, variable {0} solved to {1}")]
    PositivityViolated(usize, f32),
    #[error(transparent)]
    BaseCrate(#[from] linfa::Error),
}
