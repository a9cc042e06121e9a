use linfa::prelude::*;
use linfa_adaptive_elasticnet::{aenet_path, AdaptiveElasticNet};

fn main() {
    // load Diabetes dataset
    let (train, valid) = linfa_datasets::diabetes().split_with_ratio(0.90);

    let model = AdaptiveElasticNet::params()
        .penalty(0.5)
        .gamma(1.0)
        .fit(&train)
        .unwrap();

    println!("hyperplane:  {}", model.hyperplane());
    println!("intercept:  {}", model.intercept());
    println!("solver stats: {:?}", model.solver_stats());

    // validate
    let y_est = model.predict(&valid);
    println!("predicted variance: {}", valid.r2(&y_est).unwrap());

    // sweep a small regularization path
    let (alphas, coefs, _) = aenet_path(&train, 0.5, 1e-3, 5, None).unwrap();
    for (i, alpha) in alphas.iter().enumerate() {
        let nonzero = coefs.column(i).iter().filter(|&&c| c != 0.0).count();
        println!("alpha {:10.4}: {} nonzero coefficients", alpha, nonzero);
    }
}
