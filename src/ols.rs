use crate::curve::DeclineCurve;
use crate::types::{CleanedPoint, DeclineKind, FittedModel};
use linfa::dataset::Dataset;
use linfa::traits::Fit;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

/// Fit the exponential baseline by least squares of `ln(rate)` on `t`.
///
/// `slope = Σ(t-t̄)(lnq-lnq̄) / Σ(t-t̄)²`, `Di = -slope`, `qi = exp(intercept)`.
/// When all points share one `t` the slope is taken as zero.
///
/// # Arguments
/// * `points` - Fit-window points (rates strictly positive)
///
/// # Returns
/// Exponential `FittedModel` with its SSE over `points`
pub fn fit_exponential(points: &[CleanedPoint]) -> FittedModel {
    let n = points.len();
    let t = Array1::from_iter(points.iter().map(|p| p.t as f64));
    let ln_q = Array1::from_iter(points.iter().map(|p| p.rate.ln()));

    let t_mean = t.mean().unwrap_or(0.0);
    let ln_mean = ln_q.mean().unwrap_or(0.0);
    let sxx: f64 = t.iter().map(|&v| (v - t_mean).powi(2)).sum();

    let (slope, intercept) = if sxx > 0.0 {
        let records = Array2::from_shape_fn((n, 1), |(i, _)| t[i]);
        let dataset = Dataset::new(records, ln_q);
        match LinearRegression::new().with_intercept(true).fit(&dataset) {
            Ok(fitted) => (fitted.params()[0], fitted.intercept()),
            Err(e) => {
                tracing::warn!(error = ?e, "log-linear regression failed; using zero slope");
                (0.0, ln_mean)
            }
        }
    } else {
        (0.0, ln_mean)
    };

    let qi = intercept.exp();
    let di = if slope == 0.0 { 0.0 } else { -slope };
    let sse = sum_squared_errors(&DeclineCurve::Exponential { qi, di }, points);

    FittedModel {
        kind: DeclineKind::Exponential,
        qi,
        di,
        b: 0.0,
        sse,
    }
}

/// Sum of squared residuals of `curve` against the observed rates.
pub fn sum_squared_errors(curve: &DeclineCurve, points: &[CleanedPoint]) -> f64 {
    points
        .iter()
        .map(|p| (p.rate - curve.rate(p.t as f64)).powi(2))
        .sum()
}

/// Compute RMSE and R² metrics from a known SSE.
///
/// # Arguments
/// * `y_actual` - Observed rates
/// * `sse` - Sum of squared residuals of the fitted curve
///
/// # Returns
/// Tuple of (RMSE, R²) fit quality metrics
pub(crate) fn compute_metrics(y_actual: &Array1<f64>, sse: f64) -> (f64, f64) {
    let n = y_actual.len() as f64;
    let rmse = (sse / n).sqrt();

    let y_mean = y_actual.mean().unwrap_or(0.0);
    let ss_tot: f64 = y_actual.iter().map(|&v| (v - y_mean).powi(2)).sum();
    let r2 = 1.0 - sse / ss_tot.max(1e-12);

    (rmse, r2)
}

/// Augment a design matrix and target for ridge regression via the Tikhonov method.
///
/// Implements min ||[X; sqrt(λ)I]β - [y; 0]||², equivalent to min ||Xβ - y||² + λ||β||².
fn augment_for_ridge(
    x_raw: &Array2<f64>,
    y: &Array1<f64>,
    lambda: f64,
) -> (Array2<f64>, Array1<f64>) {
    if lambda <= 0.0 {
        return (x_raw.clone(), y.clone());
    }

    let (n, p) = x_raw.dim();
    let sqrt_l = lambda.sqrt();

    let mut x_aug = Array2::<f64>::zeros((n + p, p));
    x_aug.slice_mut(ndarray::s![0..n, ..]).assign(x_raw);
    for j in 0..p {
        x_aug[[n + j, j]] = sqrt_l;
    }

    let mut y_aug = Array1::<f64>::zeros(n + p);
    y_aug.slice_mut(ndarray::s![0..n]).assign(y);

    (x_aug, y_aug)
}

/// Solve one damped Gauss-Newton step `min ||Jδ - r||² + λ||δ||²`.
///
/// Returns `None` if the linear solve fails or yields non-finite values.
pub(crate) fn damped_step(
    jacobian: &Array2<f64>,
    residual: &Array1<f64>,
    lambda: f64,
) -> Option<Array1<f64>> {
    let (x_aug, y_aug) = augment_for_ridge(jacobian, residual, lambda);
    let dataset = Dataset::new(x_aug, y_aug);
    let fitted = LinearRegression::new()
        .with_intercept(false)
        .fit(&dataset)
        .map_err(|e| tracing::debug!(error = ?e, lambda, "damped step solve failed"))
        .ok()?;
    let step = fitted.params().to_owned();
    step.iter().all(|v| v.is_finite()).then_some(step)
}
