use linfa::dataset::AsSingleTargets;
use linfa::traits::Fit;
use linfa::{DatasetBase, Float};
use linfa_elasticnet::ElasticNet;
use ndarray::{Array1, ArrayBase, Data, Ix2};

use crate::error::Result;

/// Derive one adaptive L1 weight per feature from a preliminary fit.
///
/// An ordinary elastic net with default regularization is fitted to the data
/// and its coefficients `b_j` are turned into the per-feature multipliers
/// `w_j = max(|b_j|, eps)^(-gamma)`. The floor at `eps` keeps the weight of a
/// feature the preliminary fit drove to zero finite instead of infinite.
pub(crate) fn adaptive_weights<F, D, T>(
    dataset: &DatasetBase<ArrayBase<D, Ix2>, T>,
    eps: F,
    gamma: F,
) -> Result<Array1<F>>
where
    F: Float,
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = F>,
{
    let preliminary = DatasetBase::new(
        dataset.records().view(),
        dataset.as_single_targets().to_owned(),
    );
    let fitted = ElasticNet::params().fit(&preliminary)?;

    Ok(fitted.hyperplane().mapv(|b| b.abs().max(eps).powf(-gamma)))
}
