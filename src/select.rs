use std::cmp::Ordering;

use crate::curve::DeclineCurve;
use crate::defaults::{
    DEFAULT_LM_LAMBDA, DEFAULT_LM_MAX_ITER, DEFAULT_LM_TOL, GRID_EPS, HARMONIC_B_THRESHOLD,
    HYPERBOLIC_B_FLOOR, LM_LAMBDA_MAX, MAX_B_CANDIDATES,
};
use crate::ols::{damped_step, fit_exponential, sum_squared_errors};
use crate::types::{CleanedPoint, DeclineKind, FitConfig, FitMethod, FittedModel, ModelChoice};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Choose the best decline model for the fit window.
///
/// The exponential baseline is always fitted. Unless exponential is requested, an
/// anchored grid search over `b` runs as well and replaces the baseline only with a
/// strictly lower SSE. With `FitMethod::Precise` the winner is then refined jointly.
/// A forced model finally overrides the label while keeping the winning numbers.
///
/// Returns the fitted model and the selection notes.
pub fn select_model(points: &[CleanedPoint], config: &FitConfig) -> (FittedModel, Vec<String>) {
    let mut notes = Vec::new();
    let baseline = fit_exponential(points);

    let mut best = baseline;
    if config.decline_model != ModelChoice::Exponential {
        let grid = if config.decline_model == ModelChoice::Harmonic {
            vec![1.0]
        } else {
            b_grid(config.b_min, config.b_max, config.b_step)
        };

        match grid_search(points, &grid) {
            Some(candidate) if beats(&candidate, &baseline) => best = candidate,
            Some(candidate) => {
                tracing::debug!(
                    candidate_sse = candidate.sse,
                    baseline_sse = baseline.sse,
                    "exponential baseline kept over grid winner"
                );
            }
            None => notes.push(
                "No hyperbolic or harmonic candidate could be anchored; using the exponential fit."
                    .to_string(),
            ),
        }
    }

    if config.fit_method == FitMethod::Precise {
        let (refined, note) = refine(points, &best, config);
        best = refined;
        notes.push(note);
    }

    notes.push(format!(
        "Best fit: {} (qi={:.4}, Di={:.6}/day, b={:.3}, SSE={:.6e}).",
        best.kind, best.qi, best.di, best.b, best.sse
    ));

    if let Some(forced) = config.decline_model.forced_kind() {
        if forced != best.kind {
            notes.push(format!(
                "Model label forced to {forced}; parameters of the {} fit were kept.",
                best.kind
            ));
            best.kind = forced;
        }
    }

    tracing::debug!(
        model = %best.kind,
        qi = best.qi,
        di = best.di,
        b = best.b,
        sse = best.sse,
        "model selected"
    );
    (best, notes)
}

fn beats(candidate: &FittedModel, baseline: &FittedModel) -> bool {
    candidate.sse < baseline.sse || !baseline.sse.is_finite()
}

/// Number of exponents `b_grid` yields for these bounds.
///
/// Returns `None` for an unusable step or when the grid would exceed
/// `MAX_B_CANDIDATES`.
pub fn b_candidate_count(b_min: f64, b_max: f64, b_step: f64) -> Option<usize> {
    if b_step.is_nan() || b_step <= 0.0 || !(b_max >= b_min) {
        return None;
    }
    let span = (b_max - b_min) / b_step + GRID_EPS;
    if !(span.is_finite() && span < MAX_B_CANDIDATES as f64) {
        return None;
    }
    Some(span.floor() as usize + 1)
}

/// Candidate exponents `b_min + i·b_step` up to and including `b_max`.
///
/// Empty when `b_candidate_count` rejects the bounds.
pub fn b_grid(b_min: f64, b_max: f64, b_step: f64) -> Vec<f64> {
    let Some(count) = b_candidate_count(b_min, b_max, b_step) else {
        return Vec::new();
    };
    (0..count).map(|i| b_min + b_step * i as f64).collect()
}

/// Lowest-SSE anchored candidate over `grid`; ties go to the earlier (smaller) `b`.
pub fn grid_search(points: &[CleanedPoint], grid: &[f64]) -> Option<FittedModel> {
    let best = lowest_sse(
        grid.par_iter()
            .enumerate()
            .filter_map(|(idx, &b)| anchored_candidate(points, b).map(|m| (idx, m))),
    );

    tracing::debug!(
        candidates = grid.len(),
        best_b = ?best.map(|(_, m)| m.b),
        "anchored grid search finished"
    );
    best.map(|(_, m)| m)
}

/// Lowest-SSE `(grid index, model)` pair, ties resolved to the lower index
/// whatever order the pairs arrive in.
fn lowest_sse<I>(candidates: I) -> Option<(usize, FittedModel)>
where
    I: ParallelIterator<Item = (usize, FittedModel)>,
{
    candidates.min_by(|a, b| a.1.sse.total_cmp(&b.1.sse).then(a.0.cmp(&b.0)))
}

/// Fit for one exponent with `qi` pinned to the first point and `Di` solved so the
/// curve passes through the last point.
///
/// Returns `None` when the candidate cannot be anchored or produces a non-positive
/// or non-finite decline or SSE.
pub fn anchored_candidate(points: &[CleanedPoint], b: f64) -> Option<FittedModel> {
    let first = points.first()?;
    let last = points.last()?;
    let t2 = last.t as f64;
    if t2 == 0.0 {
        return None;
    }

    let qi = first.rate;
    let ratio = qi / last.rate;
    let (kind, di, b) = if b >= HARMONIC_B_THRESHOLD {
        (DeclineKind::Harmonic, (ratio - 1.0) / t2, 1.0)
    } else if b > HYPERBOLIC_B_FLOOR {
        (DeclineKind::Hyperbolic, (ratio.powf(b) - 1.0) / (b * t2), b)
    } else {
        return None;
    };
    if !(di.is_finite() && di > 0.0) {
        return None;
    }

    let mut model = FittedModel {
        kind,
        qi,
        di,
        b,
        sse: 0.0,
    };
    model.sse = sum_squared_errors(&model.curve(), points);
    model.sse.is_finite().then_some(model)
}

/// Parameterization used by the joint refinement: `[ln qi, ln Di]` plus `b` when free.
struct Refinement<'a> {
    points: &'a [CleanedPoint],
    kind: DeclineKind,
    b_fixed: f64,
    b_bounds: Option<(f64, f64)>,
}

impl Refinement<'_> {
    fn curve(&self, theta: &Array1<f64>) -> DeclineCurve {
        let qi = theta[0].exp();
        let di = theta[1].exp();
        match self.kind {
            DeclineKind::Exponential => DeclineCurve::Exponential { qi, di },
            DeclineKind::Harmonic => DeclineCurve::Harmonic { qi, di },
            DeclineKind::Hyperbolic => DeclineCurve::Hyperbolic {
                qi,
                di,
                b: if self.b_bounds.is_some() {
                    theta[2]
                } else {
                    self.b_fixed
                },
            },
        }
    }

    fn clamp(&self, theta: &mut Array1<f64>) {
        if let Some((lo, hi)) = self.b_bounds {
            theta[2] = theta[2].clamp(lo, hi);
        }
    }

    fn sse(&self, theta: &Array1<f64>) -> f64 {
        sum_squared_errors(&self.curve(theta), self.points)
    }

    /// Residuals `y - f(θ)` and the forward-difference Jacobian of `f`.
    fn linearize(&self, theta: &Array1<f64>) -> (Array1<f64>, Array2<f64>) {
        let n = self.points.len();
        let p = theta.len();
        let base = self.curve(theta);
        let fitted: Vec<f64> = self.points.iter().map(|pt| base.rate(pt.t as f64)).collect();
        let residual = Array1::from_iter(
            self.points
                .iter()
                .zip(fitted.iter())
                .map(|(pt, f)| pt.rate - f),
        );

        let mut jacobian = Array2::<f64>::zeros((n, p));
        for j in 0..p {
            let h = 1e-7 * (1.0 + theta[j].abs());
            let mut shifted = theta.clone();
            shifted[j] += h;
            let curve = self.curve(&shifted);
            for (i, pt) in self.points.iter().enumerate() {
                jacobian[[i, j]] = (curve.rate(pt.t as f64) - fitted[i]) / h;
            }
        }
        (residual, jacobian)
    }
}

/// Levenberg-Marquardt refinement of `start` within its own model family.
///
/// Steps are only accepted when they lower the SSE, so the result never fits worse
/// than `start`. Returns the refined model and a note describing the outcome.
fn refine(
    points: &[CleanedPoint],
    start: &FittedModel,
    config: &FitConfig,
) -> (FittedModel, String) {
    if !(start.qi > 0.0 && start.di > 0.0) {
        return (
            *start,
            "Precise fit skipped: the selected model is not declining.".to_string(),
        );
    }

    let lo = config.b_min.max(HYPERBOLIC_B_FLOOR);
    let hi = config.b_max.min(HARMONIC_B_THRESHOLD);
    let b_bounds = (start.kind == DeclineKind::Hyperbolic && lo < hi).then_some((lo, hi));
    let problem = Refinement {
        points,
        kind: start.kind,
        b_fixed: start.b,
        b_bounds,
    };

    let mut theta = match b_bounds {
        Some(_) => Array1::from_vec(vec![start.qi.ln(), start.di.ln(), start.b]),
        None => Array1::from_vec(vec![start.qi.ln(), start.di.ln()]),
    };
    problem.clamp(&mut theta);
    let mut sse = problem.sse(&theta);

    let mut lambda = DEFAULT_LM_LAMBDA;
    let mut accepted = 0usize;
    for _ in 0..DEFAULT_LM_MAX_ITER {
        if sse == 0.0 {
            break;
        }
        let (residual, jacobian) = problem.linearize(&theta);
        let Some(delta) = damped_step(&jacobian, &residual, lambda) else {
            break;
        };
        let mut trial = &theta + &delta;
        problem.clamp(&mut trial);
        let trial_sse = problem.sse(&trial);

        match trial_sse.partial_cmp(&sse) {
            Some(Ordering::Less) => {
                let improvement = (sse - trial_sse) / sse;
                theta = trial;
                sse = trial_sse;
                accepted += 1;
                lambda = (lambda / 10.0).max(1e-15);
                if improvement < DEFAULT_LM_TOL {
                    break;
                }
            }
            _ => {
                lambda *= 10.0;
                if lambda > LM_LAMBDA_MAX {
                    break;
                }
            }
        }
    }

    if accepted == 0 || !(sse < start.sse) {
        return (
            *start,
            "Precise fit found no improvement over the anchored fit.".to_string(),
        );
    }

    let curve = problem.curve(&theta);
    let refined = FittedModel {
        kind: start.kind,
        qi: curve.qi(),
        di: curve.di(),
        b: curve.b(),
        sse,
    };
    let note = format!(
        "Precise fit refined the {} model in {accepted} steps (SSE {:.6e} -> {:.6e}).",
        start.kind, start.sse, refined.sse
    );
    (refined, note)
}
