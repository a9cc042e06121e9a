#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use linfa::{Float, ParamGuard};

use crate::error::AdaptiveElasticNetError;
use crate::solver::Solver;

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
/// A verified hyper-parameter set ready for the estimation of an adaptive
/// elastic net regression model
///
/// See [`AdaptiveElasticNetParams`](crate::AdaptiveElasticNetParams) for more information.
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptiveElasticNetValidParams<F> {
    penalty: F,
    l1_ratio: F,
    gamma: F,
    with_intercept: bool,
    positive: bool,
    weight_eps: F,
    tolerance: F,
    positive_tolerance: F,
    solver: Solver,
}

impl<F: Float> AdaptiveElasticNetValidParams<F> {
    pub fn penalty(&self) -> F {
        self.penalty
    }

    pub fn l1_ratio(&self) -> F {
        self.l1_ratio
    }

    pub fn gamma(&self) -> F {
        self.gamma
    }

    pub fn with_intercept(&self) -> bool {
        self.with_intercept
    }

    pub fn positive(&self) -> bool {
        self.positive
    }

    pub fn weight_eps(&self) -> F {
        self.weight_eps
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn positive_tolerance(&self) -> F {
        self.positive_tolerance
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }
}

/// A hyper-parameter set for the adaptive elastic net
///
/// Configures and minimizes the following objective function:
/// ```ignore
/// 1 / (2 * n_samples) * ||y - Xw||^2_2
///     + penalty * l1_ratio * sum_j v_j * |w_j|
///     + penalty * (1 - l1_ratio) * ||w||^2_2
///
/// v_j = max(|b_j|, weight_eps)^(-gamma)
/// ```
/// where `b` are the coefficients of an ordinary elastic net fitted to the
/// same data. Features the preliminary fit finds unimportant receive a
/// heavier L1 penalty, which is what gives the procedure its oracle
/// variable-selection behaviour. The L2 term is deliberately left
/// unweighted.
///
/// The parameter set can be verified into a
/// [`AdaptiveElasticNetValidParams`](crate::AdaptiveElasticNetValidParams) by calling
/// [ParamGuard::check](Self::check). It is also possible to directly fit a
/// model with [Fit::fit](linfa::traits::Fit::fit) which implicitely verifies
/// the parameter set prior to the model estimation and forwards any error.
///
/// # Parameters
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :---| :--- |
/// | [penalty](Self::penalty) | `1.0` | Overall parameter penalty | `[0, inf)` |
/// | [l1_ratio](Self::l1_ratio) | `0.5` | Distribution of penalty to L1 and L2 regularizations | `[0.0, 1.0]` |
/// | [gamma](Self::gamma) | `1.0` | Sharpening exponent of the adaptive weights | `(0, inf)` |
/// | [with_intercept](Self::with_intercept) | `true` | Enable intercept, `false` is unsupported | `true` |
/// | [positive](Self::positive) | `false` | Force non-negative coefficients | `false`, `true` |
/// | [weight_eps](Self::weight_eps) | `1e-3` | Floor of the preliminary coefficients before inversion | `(0, inf)` |
/// | [tolerance](Self::tolerance) | `1e-5` | Coefficients below this are snapped to zero | `[0, inf)` |
/// | [positive_tolerance](Self::positive_tolerance) | `1e-8` | Accepted constraint violation of the solver | `[0, inf)` |
/// | [solver](Self::solver) | `Default` | Convex solver configuration | see [`Solver`] |
///
/// # Errors
///
/// The following errors can come from invalid hyper-parameters:
///
/// Returns [`InvalidPenalty`](AdaptiveElasticNetError::InvalidPenalty) if the
/// penalty is negative.
///
/// Returns [`InvalidL1Ratio`](AdaptiveElasticNetError::InvalidL1Ratio) if the
/// L1 ratio is not in unit range.
///
/// Returns [`InvalidGamma`](AdaptiveElasticNetError::InvalidGamma) if gamma
/// is not positive.
///
/// Returns [`InvalidWeightEps`](AdaptiveElasticNetError::InvalidWeightEps) if
/// the weight floor is not positive.
///
/// Returns [`InvalidTolerance`](AdaptiveElasticNetError::InvalidTolerance) if
/// one of the tolerances is negative.
///
/// Returns [`InterceptRequired`](AdaptiveElasticNetError::InterceptRequired)
/// if fitting without an intercept was requested.
///
/// # Example
///
/// ```rust
/// use linfa_adaptive_elasticnet::{AdaptiveElasticNet, AdaptiveElasticNetError};
/// use linfa::prelude::*;
/// use ndarray::array;
///
/// let ds = Dataset::new(
///     array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 1.0]],
///     array![3.0, 2.0, 5.0, 8.0],
/// );
///
/// let model = AdaptiveElasticNet::params()
///     .penalty(1e-3)
///     .fit(&ds)?;
///
/// println!("coefficients: {}", model.hyperplane());
/// # Ok::<(), AdaptiveElasticNetError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AdaptiveElasticNetParams<F>(AdaptiveElasticNetValidParams<F>);

impl<F: Float> Default for AdaptiveElasticNetParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configure and fit an adaptive elastic net model
impl<F: Float> AdaptiveElasticNetParams<F> {
    /// Create default adaptive elastic net hyper parameters
    ///
    /// An intercept is always fitted; disabling it is rejected by
    /// [check](ParamGuard::check).
    pub fn new() -> Self {
        Self(AdaptiveElasticNetValidParams {
            penalty: F::one(),
            l1_ratio: F::cast(0.5),
            gamma: F::one(),
            with_intercept: true,
            positive: false,
            weight_eps: F::cast(1e-3),
            tolerance: F::cast(1e-5),
            positive_tolerance: F::cast(1e-8),
            solver: Solver::Default,
        })
    }

    /// Set the overall parameter penalty, otherwise known as `alpha`.
    /// Use `l1_ratio` to configure how the penalty is distributed to the L1
    /// and L2 regularization.
    pub fn penalty(mut self, penalty: F) -> Self {
        self.0.penalty = penalty;
        self
    }

    /// Set the l1_ratio parameter. Controls how the penalty is distributed
    /// to L1 and L2 regularization. `1.0` is an adaptive Lasso, `0.0` a
    /// plain ridge penalization.
    ///
    /// Defaults to `0.5` if not set
    ///
    /// `l1_ratio` must be between `0.0` and `1.0`.
    pub fn l1_ratio(mut self, l1_ratio: F) -> Self {
        self.0.l1_ratio = l1_ratio;
        self
    }

    /// Set the sharpening exponent of the adaptive weights. Larger values
    /// penalize features with small preliminary coefficients harder.
    ///
    /// Defaults to `1.0` if not set; this choice keeps the ratio of L1 to L2
    /// penalty independent of the feature scales.
    pub fn gamma(mut self, gamma: F) -> Self {
        self.0.gamma = gamma;
        self
    }

    /// Configure the model to fit an intercept. Only `true` is supported;
    /// `false` is rejected when the parameters are verified.
    pub fn with_intercept(mut self, with_intercept: bool) -> Self {
        self.0.with_intercept = with_intercept;
        self
    }

    /// When set, force all coefficients (and the intercept) to be
    /// non-negative.
    ///
    /// Defaults to `false` if not set
    pub fn positive(mut self, positive: bool) -> Self {
        self.0.positive = positive;
        self
    }

    /// Set the floor applied to the absolute preliminary coefficients before
    /// they are inverted into adaptive weights. Prevents division by zero
    /// for features the preliminary fit zeroes out.
    ///
    /// Defaults to `1e-3` if not set
    pub fn weight_eps(mut self, weight_eps: F) -> Self {
        self.0.weight_eps = weight_eps;
        self
    }

    /// Set the threshold below which a solved coefficient is snapped to
    /// exactly zero.
    ///
    /// Defaults to `1e-5` if not set
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Set the accepted magnitude of non-negativity constraint violations in
    /// the solver output. Violations within this tolerance are clamped to
    /// zero, larger ones fail the fit.
    ///
    /// Defaults to `1e-8` if not set
    pub fn positive_tolerance(mut self, positive_tolerance: F) -> Self {
        self.0.positive_tolerance = positive_tolerance;
        self
    }

    /// Select the convex solver configuration used for the final
    /// optimization problem.
    ///
    /// Defaults to [`Solver::Default`] if not set
    pub fn solver(mut self, solver: Solver) -> Self {
        self.0.solver = solver;
        self
    }
}

impl<F: Float> ParamGuard for AdaptiveElasticNetParams<F> {
    type Checked = AdaptiveElasticNetValidParams<F>;
    type Error = AdaptiveElasticNetError;

    /// Validate the hyper parameters
    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.penalty.is_negative() {
            Err(AdaptiveElasticNetError::InvalidPenalty(
                self.0.penalty.to_f32().unwrap(),
            ))
        } else if !(F::zero()..=F::one()).contains(&self.0.l1_ratio) {
            Err(AdaptiveElasticNetError::InvalidL1Ratio(
                self.0.l1_ratio.to_f32().unwrap(),
            ))
        } else if self.0.gamma <= F::zero() {
            Err(AdaptiveElasticNetError::InvalidGamma(
                self.0.gamma.to_f32().unwrap(),
            ))
        } else if self.0.weight_eps <= F::zero() {
            Err(AdaptiveElasticNetError::InvalidWeightEps(
                self.0.weight_eps.to_f32().unwrap(),
            ))
        } else if self.0.tolerance.is_negative() {
            Err(AdaptiveElasticNetError::InvalidTolerance(
                self.0.tolerance.to_f32().unwrap(),
            ))
        } else if self.0.positive_tolerance.is_negative() {
            Err(AdaptiveElasticNetError::InvalidTolerance(
                self.0.positive_tolerance.to_f32().unwrap(),
            ))
        } else if !self.0.with_intercept {
            Err(AdaptiveElasticNetError::InterceptRequired)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdaptiveElasticNet;

    #[test]
    fn rejects_invalid_hyperparameters() {
        let checked = AdaptiveElasticNet::<f64>::params().penalty(-1.0).check();
        assert!(matches!(
            checked,
            Err(AdaptiveElasticNetError::InvalidPenalty(_))
        ));

        let checked = AdaptiveElasticNet::<f64>::params().l1_ratio(1.5).check();
        assert!(matches!(
            checked,
            Err(AdaptiveElasticNetError::InvalidL1Ratio(_))
        ));

        let checked = AdaptiveElasticNet::<f64>::params().gamma(0.0).check();
        assert!(matches!(
            checked,
            Err(AdaptiveElasticNetError::InvalidGamma(_))
        ));

        let checked = AdaptiveElasticNet::<f64>::params().weight_eps(0.0).check();
        assert!(matches!(
            checked,
            Err(AdaptiveElasticNetError::InvalidWeightEps(_))
        ));

        let checked = AdaptiveElasticNet::<f64>::params().tolerance(-1e-3).check();
        assert!(matches!(
            checked,
            Err(AdaptiveElasticNetError::InvalidTolerance(_))
        ));
    }

    #[test]
    fn rejects_disabled_intercept() {
        let checked = AdaptiveElasticNet::<f64>::params()
            .with_intercept(false)
            .check();
        assert!(matches!(
            checked,
            Err(AdaptiveElasticNetError::InterceptRequired)
        ));
    }

    #[test]
    fn default_parameters_are_valid() {
        let params = AdaptiveElasticNet::<f64>::params().check().unwrap();
        assert_eq!(params.solver(), Solver::Default);
        assert!(params.with_intercept());
        assert!(!params.positive());
    }
}
