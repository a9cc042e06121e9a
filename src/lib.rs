//! # Adaptive Elastic Net
//!
//! A linear regression model whose coefficients are regularized by a weighted
//! combination of an L1 penalty (sparsity) and an L2 penalty (stability). The
//! L1 weights are derived from a preliminary ordinary elastic net fit: the
//! smaller a feature's preliminary coefficient, the heavier its L1 penalty,
//! which is what gives the estimator its oracle variable-selection behaviour.
//!
//! The final coefficients are the solution of a convex optimization problem
//! handed to an external conic solver; this crate only assembles the problem
//! and post-processes the solution, it does not implement the numerical
//! optimizer itself.
//!
//! ## References
//!
//! * [Zou, Zhang, "On the adaptive elastic-net with a diverging number of parameters"](https://doi.org/10.1214/08-AOS625)
//! * [Zou, "The Adaptive Lasso and Its Oracle Properties"](https://doi.org/10.1198/016214506000000735)
//! * [Scikit-Learn User Guide on Elastic Net](https://scikit-learn.org/stable/modules/linear_model.html#elastic-net)

use linfa::{traits::PredictInplace, Float};
use ndarray::{Array1, ArrayBase, Data, Ix2};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

mod algorithm;
mod error;
mod hyperparams;
mod problem;
mod solver;
mod weights;

pub use algorithm::aenet_path;
pub use error::{AdaptiveElasticNetError, Result};
pub use hyperparams::{AdaptiveElasticNetParams, AdaptiveElasticNetValidParams};
pub use solver::{SolveStatus, Solver, SolverStats};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// Adaptive Elastic Net model
///
/// This struct contains the result of a fitted adaptive elastic net model:
/// the separating hyperplane, the intercept and the diagnostics of the convex
/// solve that produced them.
///
/// The duality gap is not computed by the external solver interface and is
/// always reported as NaN; the iteration count is 1 since the fit is a single
/// convex solve rather than a coordinate descent loop. The per-attempt
/// interior point iterations are available through
/// [solver_stats](Self::solver_stats).
#[derive(Debug, Clone)]
pub struct AdaptiveElasticNet<F> {
    hyperplane: Array1<F>,
    intercept: F,
    duality_gap: F,
    n_steps: u32,
    solver_stats: SolverStats,
}

impl<F: Float> AdaptiveElasticNet<F> {
    /// Create a default parameter set for construction of an adaptive
    /// elastic net model
    ///
    /// An intercept is always fitted; the penalty defaults to `1.0` and the
    /// L1/L2 balance to `0.5`.
    pub fn params() -> AdaptiveElasticNetParams<F> {
        AdaptiveElasticNetParams::new()
    }

    /// Get the fitted hyperplane
    pub fn hyperplane(&self) -> &Array1<F> {
        &self.hyperplane
    }

    /// Get the fitted intercept
    pub fn intercept(&self) -> F {
        self.intercept
    }

    /// Duality gap placeholder, always NaN
    pub fn duality_gap(&self) -> F {
        self.duality_gap
    }

    /// Number of fitting steps, always 1 for the single convex solve
    pub fn n_steps(&self) -> u32 {
        self.n_steps
    }

    /// Diagnostics of the solve attempt that produced this model
    pub fn solver_stats(&self) -> &SolverStats {
        &self.solver_stats
    }

    pub(crate) fn new(
        hyperplane: Array1<F>,
        intercept: F,
        solver_stats: SolverStats,
    ) -> AdaptiveElasticNet<F> {
        AdaptiveElasticNet {
            hyperplane,
            intercept,
            duality_gap: F::nan(),
            n_steps: 1,
            solver_stats,
        }
    }
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<F>>
    for AdaptiveElasticNet<F>
{
    /// Given an input matrix `X`, with shape `(n_samples, n_features)`,
    /// `predict` returns the target variable according to the adaptive
    /// elastic net learned from the training data distribution.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<F>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );

        *y = x.dot(&self.hyperplane) + self.intercept;
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<F> {
        Array1::zeros(x.nrows())
    }
}
