use linfa::dataset::AsSingleTargets;
use linfa::prelude::Records;
use linfa::traits::Fit;
use linfa::{DatasetBase, Float};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};

use crate::error::{AdaptiveElasticNetError, Result};
use crate::hyperparams::AdaptiveElasticNetValidParams;
use crate::problem::build_problem;
use crate::solver::{solve_problem, SolvedProblem};
use crate::weights::adaptive_weights;
use crate::AdaptiveElasticNet;

impl<F, D, T> Fit<ArrayBase<D, Ix2>, T, AdaptiveElasticNetError>
    for AdaptiveElasticNetValidParams<F>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    type Object = AdaptiveElasticNet<F>;

    /// Fit an adaptive elastic net model given a feature matrix `x` and a
    /// target variable `y`.
    ///
    /// The feature matrix `x` must have shape `(n_samples, n_features)`,
    /// the target variable `y` must have shape `(n_samples)`.
    ///
    /// The adaptive weights are derived from a preliminary ordinary elastic
    /// net fit, the final coefficients come out of a single convex solve.
    /// Coefficients whose magnitude falls below the configured tolerance are
    /// snapped to exactly zero; with `positive` enabled, solutions violating
    /// non-negativity beyond `positive_tolerance` fail the fit, smaller
    /// violations are clamped to zero.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<AdaptiveElasticNet<F>> {
        let records = dataset.records();
        let targets = dataset.as_single_targets();
        validate(records, &targets)?;

        let weights = adaptive_weights(dataset, self.weight_eps(), self.gamma())?;

        // the external engine works in f64
        let x = records.mapv(|v| v.to_f64().unwrap());
        let y = targets.mapv(|v| v.to_f64().unwrap());
        let w = weights.mapv(|v| v.to_f64().unwrap());

        let problem = build_problem(
            x.view(),
            y.view(),
            w.view(),
            self.penalty().to_f64().unwrap(),
            self.l1_ratio().to_f64().unwrap(),
            self.positive(),
        );

        let solved = reject_unsolved(solve_problem(&problem, self.solver()))?;

        let mut beta = solved.beta;
        let tolerance = self.tolerance().to_f64().unwrap();
        for coef in beta[1..].iter_mut() {
            if coef.abs() < tolerance {
                *coef = 0.0;
            }
        }

        if self.positive() {
            enforce_positivity(&mut beta, self.positive_tolerance().to_f64().unwrap())?;
        }

        let intercept = F::cast(beta[0]);
        let hyperplane = beta[1..].iter().map(|&v| F::cast(v)).collect();
        Ok(AdaptiveElasticNet::new(hyperplane, intercept, solved.stats))
    }
}

/// A status that is still retryable after the whole fallback sequence means
/// no configuration produced a usable solution.
fn reject_unsolved(solved: SolvedProblem) -> Result<SolvedProblem> {
    if solved.stats.status.needs_retry() {
        return Err(AdaptiveElasticNetError::SolverFailure(solved.stats.status));
    }
    Ok(solved)
}

fn validate<F: Float, D: Data<Elem = F>>(
    records: &ArrayBase<D, Ix2>,
    targets: &ArrayView1<F>,
) -> Result<()> {
    if records.nsamples() == 0 || records.nfeatures() == 0 {
        return Err(AdaptiveElasticNetError::NotEnoughSamples);
    }
    if targets.len() != records.nsamples() {
        return Err(AdaptiveElasticNetError::TargetShapeMismatch(
            targets.len(),
            records.nsamples(),
        ));
    }
    if records.iter().any(|v| !v.is_finite()) || targets.iter().any(|v| !v.is_finite()) {
        return Err(AdaptiveElasticNetError::NonFiniteInput);
    }
    Ok(())
}

/// Check the solved variables `[intercept, coefficients...]` against the
/// non-negativity constraints and clamp solver noise to exactly zero.
///
/// Every variable is checked, but only the coefficients are clamped; a
/// violation beyond `positive_tol` fails the fit instead of being silently
/// truncated.
fn enforce_positivity(beta: &mut [f64], positive_tol: f64) -> Result<()> {
    if let Some((index, &value)) = beta.iter().enumerate().find(|&(_, &v)| v < -positive_tol) {
        return Err(AdaptiveElasticNetError::PositivityViolated(
            index,
            value as f32,
        ));
    }
    for coef in beta[1..].iter_mut() {
        if *coef < 0.0 {
            *coef = 0.0;
        }
    }
    Ok(())
}

/// Return adaptive elastic net regression results for multiple alphas
///
/// When `alphas` is `None`, a geometric grid of `n_alphas` values is derived
/// from the data, descending from the smallest alpha that drives every
/// coefficient to zero down to `alpha_max * eps`. Each alpha is fitted with a
/// fresh estimator carrying default hyperparameters; the fits are fully
/// independent of each other.
///
/// Returns `(alphas, coefficients, dual_gaps)` where `coefficients` has shape
/// `(n_features, n_alphas)` with one column per alpha, in grid order. The
/// dual gaps are not computed by the external solver interface and are
/// reported as NaN throughout.
pub fn aenet_path<F, D, T>(
    dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    l1_ratio: F,
    eps: F,
    n_alphas: usize,
    alphas: Option<Array1<F>>,
) -> Result<(Array1<F>, Array2<F>, Array1<F>)>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    let records = dataset.records();
    let targets = dataset.as_single_targets();
    validate(records, &targets)?;

    let alphas = match alphas {
        Some(alphas) => alphas,
        None => alpha_grid(&records.view(), &targets, l1_ratio, eps, n_alphas)?,
    };

    let sweep = DatasetBase::new(records.view(), targets.to_owned());
    let mut coefs = Array2::<F>::zeros((records.nfeatures(), alphas.len()));
    for (i, &alpha) in alphas.iter().enumerate() {
        let model = AdaptiveElasticNet::params().penalty(alpha).fit(&sweep)?;
        coefs.column_mut(i).assign(model.hyperplane());
    }

    let dual_gaps = Array1::from_elem(alphas.len(), F::nan());
    Ok((alphas, coefs, dual_gaps))
}

/// The standard alpha-grid heuristic: `n_alphas` geometrically spaced values
/// descending from `alpha_max = max_j |X_jᵀ y| / (n_samples * l1_ratio)`, the
/// smallest alpha at which an ordinary elastic net is entirely sparse, down
/// to `alpha_max * eps`.
fn alpha_grid<F: Float>(
    x: &ArrayView2<F>,
    y: &ArrayView1<F>,
    l1_ratio: F,
    eps: F,
    n_alphas: usize,
) -> Result<Array1<F>> {
    if l1_ratio <= F::zero() {
        return Err(AdaptiveElasticNetError::InvalidL1Ratio(
            l1_ratio.to_f32().unwrap(),
        ));
    }

    let n = F::cast(x.nrows());
    let xty = x.t().dot(y);
    let alpha_max = xty.fold(F::zero(), |max, v| max.max(v.abs())) / (n * l1_ratio);

    // targets orthogonal to every feature, nothing to regularize against
    if alpha_max <= F::epsilon() {
        return Ok(Array1::from_elem(n_alphas, F::epsilon()));
    }
    if n_alphas == 1 {
        return Ok(Array1::from_elem(1, alpha_max));
    }

    let step = F::cast(1.0 / (n_alphas - 1) as f64);
    Ok(Array1::from_shape_fn(n_alphas, |i| {
        alpha_max * eps.powf(F::cast(i as f64) * step)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AdaptiveElasticNetParams, SolveStatus, Solver, SolverStats};
    use approx::assert_abs_diff_eq;
    use linfa::prelude::*;
    use ndarray::{array, Array};
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    fn exact_linear_dataset() -> DatasetBase<Array2<f64>, Array1<f64>> {
        // y = 1 + 3 x1 + 2 x2, noise free
        let x = array![
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0]
        ];
        let y = array![4.0, 3.0, 6.0, 9.0, 8.0, 11.0];
        Dataset::new(x, y)
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<AdaptiveElasticNet<f64>>();
        has_autotraits::<AdaptiveElasticNetParams<f64>>();
        has_autotraits::<AdaptiveElasticNetValidParams<f64>>();
        has_autotraits::<AdaptiveElasticNetError>();
        has_autotraits::<Solver>();
        has_autotraits::<SolveStatus>();
    }

    #[test]
    fn recovers_exact_linear_relation() {
        let dataset = exact_linear_dataset();

        let model = AdaptiveElasticNet::params()
            .penalty(1e-6)
            .fit(&dataset)
            .unwrap();

        assert_abs_diff_eq!(model.hyperplane(), &array![3.0, 2.0], epsilon = 1e-2);
        assert_abs_diff_eq!(model.intercept(), 1.0, epsilon = 1e-2);

        let predictions = model.predict(dataset.records());
        assert_abs_diff_eq!(&predictions, dataset.targets(), epsilon = 1e-2);

        assert!(model.duality_gap().is_nan());
        assert_eq!(model.n_steps(), 1);
        assert!(model.solver_stats().status.is_optimal());
    }

    #[test]
    fn strong_penalty_zeroes_every_coefficient() {
        let dataset = exact_linear_dataset();

        let model = AdaptiveElasticNet::params()
            .penalty(1e3)
            .fit(&dataset)
            .unwrap();

        // exactly zero after the tolerance snap, not merely small
        assert!(model.hyperplane().iter().all(|&c| c == 0.0));
        // the unpenalized intercept falls back to roughly the target mean
        assert_abs_diff_eq!(model.intercept(), 41.0 / 6.0, epsilon = 0.5);
    }

    #[test]
    fn predictions_agree_with_the_affine_form() {
        let dataset = exact_linear_dataset();

        let model = AdaptiveElasticNet::params()
            .penalty(0.1)
            .fit(&dataset)
            .unwrap();

        let manual = dataset.records().dot(model.hyperplane()) + model.intercept();
        let predicted = model.predict(dataset.records());
        assert_abs_diff_eq!(&predicted, &manual, epsilon = 1e-12);
    }

    #[test]
    fn unsolved_status_after_fallbacks_is_a_hard_error() {
        let solved = SolvedProblem {
            beta: vec![0.0, 0.0],
            stats: SolverStats {
                status: SolveStatus::MaxIterations,
                iterations: 0,
                solve_time: 0.0,
                objective: 0.0,
                solver: Solver::Relaxed,
            },
        };

        let result = reject_unsolved(solved);
        assert!(matches!(
            result,
            Err(AdaptiveElasticNetError::SolverFailure(
                SolveStatus::MaxIterations
            ))
        ));
    }

    #[test]
    fn refitting_is_deterministic() {
        let dataset = exact_linear_dataset();

        let first = AdaptiveElasticNet::params()
            .penalty(0.1)
            .fit(&dataset)
            .unwrap();
        let second = AdaptiveElasticNet::params()
            .penalty(0.1)
            .fit(&dataset)
            .unwrap();

        assert_abs_diff_eq!(first.hyperplane(), second.hyperplane(), epsilon = 1e-6);
        assert_abs_diff_eq!(first.intercept(), second.intercept(), epsilon = 1e-6);
    }

    #[test]
    fn positive_fit_on_negated_targets_succeeds() {
        // ten features with positive ground-truth coefficients, then the
        // targets are negated so the unconstrained optimum is all-negative
        let mut rng = Xoshiro256Plus::seed_from_u64(0);
        let x = Array::random_using((40, 10), Uniform::new(-1.0, 1.0), &mut rng);
        let coef = Array::linspace(0.2, 2.0, 10);
        let y = x.dot(&coef) + 0.3;
        let dataset = Dataset::new(x, y.mapv(|v| -v));

        let model = AdaptiveElasticNet::params()
            .positive(true)
            .fit(&dataset)
            .unwrap();

        assert!(model.hyperplane().iter().all(|&c| c >= 0.0));

        // a zero row predicts exactly the intercept
        let prediction = model.predict(&Array2::<f64>::zeros((1, 10)));
        assert_eq!(prediction[0], model.intercept());
    }

    #[test]
    fn positivity_violations_beyond_tolerance_are_fatal() {
        let mut beta = vec![0.1, -1e-6, 0.5];
        let result = enforce_positivity(&mut beta, 1e-8);
        assert!(matches!(
            result,
            Err(AdaptiveElasticNetError::PositivityViolated(1, _))
        ));
    }

    #[test]
    fn positivity_noise_within_tolerance_is_clamped() {
        let mut beta = vec![0.1, -1e-10, 0.5];
        enforce_positivity(&mut beta, 1e-8).unwrap();
        assert_eq!(beta, vec![0.1, 0.0, 0.5]);
    }

    #[test]
    fn rejects_non_finite_input() {
        let x = array![[1.0, f64::NAN], [0.0, 1.0]];
        let y = array![1.0, 2.0];
        let dataset = Dataset::new(x, y);

        let result = AdaptiveElasticNet::params().fit(&dataset);
        assert!(matches!(
            result,
            Err(AdaptiveElasticNetError::NonFiniteInput)
        ));
    }

    #[test]
    fn rejects_mismatched_target_length() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0];
        let dataset = DatasetBase::new(x, y);

        let result = AdaptiveElasticNet::params().fit(&dataset);
        assert!(matches!(
            result,
            Err(AdaptiveElasticNetError::TargetShapeMismatch(2, 3))
        ));
    }

    #[test]
    fn path_has_matching_shapes_and_nan_gaps() {
        let x = array![
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0],
            [3.0, 1.0],
            [1.0, 3.0]
        ];
        let y: Array1<f64> = x.map_axis(ndarray::Axis(1), |row| 1.0 + 0.3 * row[0] - 0.2 * row[1]);
        let dataset = Dataset::new(x, y);

        let (alphas, coefs, dual_gaps) = aenet_path(&dataset, 0.5, 1e-3, 5, None).unwrap();

        assert_eq!(alphas.len(), 5);
        assert_eq!(coefs.dim(), (2, 5));
        assert_eq!(dual_gaps.len(), 5);
        assert!(dual_gaps.iter().all(|g| g.is_nan()));

        // grid order is preserved, largest alpha first
        assert!(alphas[0] > alphas[4]);
        // the largest alpha drives every coefficient to zero
        assert!(coefs.column(0).iter().all(|&c| c == 0.0));
    }

    #[test]
    fn path_accepts_an_explicit_grid() {
        let dataset = exact_linear_dataset();
        let grid = array![0.5, 0.1, 1.0];

        let (alphas, coefs, _) = aenet_path(&dataset, 0.5, 1e-3, 100, Some(grid)).unwrap();

        // the supplied grid is kept verbatim, not re-sorted
        assert_eq!(alphas, array![0.5, 0.1, 1.0]);
        assert_eq!(coefs.dim(), (2, 3));
    }

    #[test]
    fn alpha_grid_is_geometric_and_descending() {
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 2.0, 3.0];

        let grid = alpha_grid(&x.view(), &y.view(), 0.5, 1e-3, 4).unwrap();

        // alpha_max = max |X^T y| / (n * l1_ratio) = 5 / 1.5
        assert_abs_diff_eq!(grid[0], 5.0 / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(grid[3], 5.0 / 1.5 * 1e-3, epsilon = 1e-9);
        for i in 1..4 {
            assert!(grid[i] < grid[i - 1]);
        }
    }

    #[test]
    fn alpha_grid_requires_an_l1_component() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];

        let result = alpha_grid(&x.view(), &y.view(), 0.0, 1e-3, 10).unwrap_err();
        assert!(matches!(result, AdaptiveElasticNetError::InvalidL1Ratio(_)));
    }
}
