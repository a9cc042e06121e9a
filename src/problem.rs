use clarabel::algebra::CscMatrix;
use clarabel::solver::SupportedConeT;
use ndarray::{s, Array2, ArrayView1, ArrayView2};

/// A quadratic program in the conic form expected by the engine,
///
/// ```ignore
/// minimize    1/2 zᵀ P z + qᵀ z
/// subject to  A z + s = b,  s in the nonnegative cone
/// ```
///
/// with the stacked variable `z = [intercept, coefficients, |coefficient| bounds]`.
pub(crate) struct QuadProblem {
    /// Upper triangle of the quadratic cost `P`
    pub quadratic: CscMatrix<f64>,
    /// Linear cost `q`
    pub linear: Vec<f64>,
    /// Constraint matrix `A`
    pub constraints: CscMatrix<f64>,
    /// Constraint offsets `b`
    pub bounds: Vec<f64>,
    pub cones: Vec<SupportedConeT<f64>>,
    pub n_features: usize,
}

/// Assemble the adaptive elastic net objective
///
/// ```ignore
/// 1 / (2 * n_samples) * ||y - (b0 + X c)||^2
///     + penalty * l1_ratio * sum_j w_j |c_j|
///     + penalty * (1 - l1_ratio) * sum_j c_j^2
/// ```
///
/// as a quadratic program. The weighted absolute values are expressed through
/// auxiliary variables `t_j >= |c_j|`; the block is omitted entirely when the
/// L1 term vanishes. With `positive` set, one non-negativity constraint is
/// added per model variable, the intercept included.
pub(crate) fn build_problem(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    l1_weights: ArrayView1<f64>,
    penalty: f64,
    l1_ratio: f64,
    positive: bool,
) -> QuadProblem {
    let n_samples = x.nrows();
    let n_features = x.ncols();
    let n = n_samples as f64;

    let l1 = penalty * l1_ratio;
    let l2 = penalty * (1.0 - l1_ratio);
    let has_l1 = l1 > 0.0;

    // model variables: leading intercept, then one coefficient per feature
    let n_model = 1 + n_features;
    let n_vars = n_model + if has_l1 { n_features } else { 0 };

    // design matrix with the intercept column of ones prepended
    let mut design = Array2::<f64>::ones((n_samples, n_model));
    design.slice_mut(s![.., 1..]).assign(&x);

    // 1/(2n) ||y - H z||^2 = 1/2 zᵀ (HᵀH / n) z - (Hᵀy / n)ᵀ z + const
    let gram = design.t().dot(&design) / n;
    let mut quadratic = Array2::<f64>::zeros((n_vars, n_vars));
    quadratic.slice_mut(s![..n_model, ..n_model]).assign(&gram);
    for j in 0..n_features {
        // 1/2 zᵀ P z convention doubles the L2 coefficient on the diagonal
        quadratic[[1 + j, 1 + j]] += 2.0 * l2;
    }

    let design_t_y = design.t().dot(&y) / n;
    let mut linear = vec![0.0; n_vars];
    for i in 0..n_model {
        linear[i] = -design_t_y[i];
    }
    if has_l1 {
        for j in 0..n_features {
            linear[n_model + j] = l1 * l1_weights[j];
        }
    }

    // inequality rows, each encoded so that s = b - A z >= 0
    let mut rows: Vec<Vec<(usize, f64)>> = Vec::new();
    if has_l1 {
        for j in 0..n_features {
            // t_j - c_j >= 0
            rows.push(vec![(1 + j, 1.0), (n_model + j, -1.0)]);
            // t_j + c_j >= 0
            rows.push(vec![(1 + j, -1.0), (n_model + j, -1.0)]);
        }
    }
    if positive {
        for i in 0..n_model {
            rows.push(vec![(i, -1.0)]);
        }
    }

    let n_rows = rows.len();
    let cones = if n_rows > 0 {
        vec![SupportedConeT::NonnegativeConeT(n_rows)]
    } else {
        Vec::new()
    };

    QuadProblem {
        quadratic: csc_upper_triangle(&quadratic),
        linear,
        constraints: csc_from_rows(n_rows, n_vars, &rows),
        bounds: vec![0.0; n_rows],
        cones,
        n_features,
    }
}

/// Compress the upper triangle of a dense symmetric matrix to CSC
fn csc_upper_triangle(dense: &Array2<f64>) -> CscMatrix<f64> {
    let n = dense.nrows();
    let mut colptr = Vec::with_capacity(n + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for j in 0..n {
        for i in 0..=j {
            let v = dense[[i, j]];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(n, n, colptr, rowval, nzval)
}

/// Compress a sparse row list to CSC
fn csc_from_rows(n_rows: usize, n_cols: usize, rows: &[Vec<(usize, f64)>]) -> CscMatrix<f64> {
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_cols];
    for (i, row) in rows.iter().enumerate() {
        for &(j, v) in row {
            columns[j].push((i, v));
        }
    }

    let mut colptr = Vec::with_capacity(n_cols + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();

    colptr.push(0);
    for column in &columns {
        for &(i, v) in column {
            rowval.push(i);
            nzval.push(v);
        }
        colptr.push(rowval.len());
    }
    CscMatrix::new(n_rows, n_cols, colptr, rowval, nzval)
}
