//! Fit statistics, economic-limit crossing and estimated ultimate recovery.
//!
//! Economic-limit time and EUR are measured from the first point of the fit
//! window (`t_initial`), not from the series epoch.

use chrono::{Days, NaiveDate};
use ndarray::Array1;

use crate::ols::compute_metrics;
use crate::types::{CleanedPoint, EconLimit, FitQuality, FittedModel};

/// R² and RMSE of the fitted model over the fit window.
pub fn fit_quality(model: &FittedModel, points: &[CleanedPoint]) -> FitQuality {
    let rates = Array1::from_iter(points.iter().map(|p| p.rate));
    let (rmse, r_squared) = compute_metrics(&rates, model.sse);
    FitQuality {
        r_squared,
        rmse,
        n_points: points.len(),
    }
}

/// Time until the fitted curve reaches `limit_rate`, and the volume produced until then.
///
/// `epoch` is the date of `t = 0`; it is only used to date the crossing.
/// Returns the result and the notes describing degenerate outcomes.
pub fn economic_limit(
    model: &FittedModel,
    points: &[CleanedPoint],
    epoch: NaiveDate,
    limit_rate: f64,
) -> (EconLimit, Vec<String>) {
    let mut notes = Vec::new();
    let curve = model.curve();
    let t_initial = points.first().map_or(0.0, |p| p.t as f64);

    let t_econ_days = if model.di > 0.0 {
        let t = curve.time_to_rate(limit_rate) - t_initial;
        if t.is_nan() {
            f64::INFINITY
        } else {
            t.max(0.0)
        }
    } else if curve.rate(t_initial) > limit_rate {
        tracing::warn!(di = model.di, "fitted decline is not positive");
        notes.push(
            "Fitted decline rate is not positive; production never reaches the economic limit."
                .to_string(),
        );
        f64::INFINITY
    } else {
        0.0
    };

    let eur_at_econ_limit = if t_econ_days.is_finite() {
        if t_econ_days == 0.0 {
            notes.push(
                "Economic limit already reached at the start of the fit window.".to_string(),
            );
            0.0
        } else {
            curve.cumulative(t_initial, t_initial + t_econ_days)
        }
    } else {
        if model.di > 0.0 {
            notes.push("Economic limit is never reached; EUR is unbounded.".to_string());
        }
        f64::INFINITY
    };

    let econ_limit_date = t_econ_days
        .is_finite()
        .then(|| (t_initial + t_econ_days).round())
        .and_then(|days| epoch.checked_add_days(Days::new(days as u64)));

    tracing::debug!(t_econ_days, eur = eur_at_econ_limit, "economic limit evaluated");
    (
        EconLimit {
            t_econ_days,
            eur_at_econ_limit,
            econ_limit_date,
        },
        notes,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeclineKind;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
    }

    fn window(start: i64, end: i64, model: &FittedModel) -> Vec<CleanedPoint> {
        (start..=end)
            .step_by(7)
            .map(|t| CleanedPoint {
                date: epoch() + Days::new(t as u64),
                t,
                rate: model.rate(t as f64),
            })
            .collect()
    }

    fn model(kind: DeclineKind, di: f64, b: f64) -> FittedModel {
        FittedModel {
            kind,
            qi: 500.0,
            di,
            b,
            sse: 0.0,
        }
    }

    fn simpson(m: &FittedModel, t0: f64, t1: f64) -> f64 {
        let n = 20_000;
        let h = (t1 - t0) / n as f64;
        let mut acc = m.rate(t0) + m.rate(t1);
        for i in 1..n {
            acc += if i % 2 == 1 { 4.0 } else { 2.0 } * m.rate(t0 + h * i as f64);
        }
        acc * h / 3.0
    }

    #[test]
    fn test_exponential_econ_limit_and_eur() {
        let m = model(DeclineKind::Exponential, 0.005, 0.0);
        let pts = window(0, 357, &m);
        let (econ, notes) = economic_limit(&m, &pts, epoch(), 50.0);
        assert!(notes.is_empty());
        assert_relative_eq!(econ.t_econ_days, 10f64.ln() / 0.005, max_relative = 1e-12);
        let expected = (500.0 / 0.005) * (1.0 - (-0.005 * econ.t_econ_days).exp());
        assert_relative_eq!(econ.eur_at_econ_limit, expected, max_relative = 1e-12);
        assert_relative_eq!(econ.eur_at_econ_limit, 90_000.0, max_relative = 1e-9);
        assert_eq!(econ.econ_limit_date, Some(epoch() + Days::new(461)));
    }

    #[test]
    fn test_econ_measured_from_window_start() {
        let m = model(DeclineKind::Exponential, 0.005, 0.0);
        let pts = window(70, 357, &m);
        let (econ, _) = economic_limit(&m, &pts, epoch(), 50.0);
        assert_relative_eq!(econ.t_econ_days, 10f64.ln() / 0.005 - 70.0, max_relative = 1e-12);
        let t1 = 70.0;
        let t2 = t1 + econ.t_econ_days;
        let closed = (500.0 / 0.005) * ((-0.005 * t1).exp() - (-0.005 * t2).exp());
        assert_relative_eq!(econ.eur_at_econ_limit, closed, max_relative = 1e-12);
        assert_relative_eq!(econ.eur_at_econ_limit, simpson(&m, t1, t2), max_relative = 1e-9);
        // Date stays anchored to the series epoch.
        assert_eq!(econ.econ_limit_date, Some(epoch() + Days::new(461)));
    }

    #[test]
    fn test_hyperbolic_and_harmonic_eur_match_integration() {
        for m in [
            model(DeclineKind::Hyperbolic, 0.01, 0.5),
            model(DeclineKind::Harmonic, 0.01, 1.0),
            model(DeclineKind::Hyperbolic, 0.01, 1.0),
        ] {
            let pts = window(14, 200, &m);
            let (econ, _) = economic_limit(&m, &pts, epoch(), 40.0);
            assert!(econ.t_econ_days > 0.0 && econ.t_econ_days.is_finite());
            assert_relative_eq!(m.rate(14.0 + econ.t_econ_days), 40.0, max_relative = 1e-9);
            let numeric = simpson(&m, 14.0, 14.0 + econ.t_econ_days);
            assert!(econ.eur_at_econ_limit > 0.0);
            assert_relative_eq!(econ.eur_at_econ_limit, numeric, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_limit_already_reached() {
        let m = model(DeclineKind::Harmonic, 0.01, 1.0);
        let pts = window(0, 100, &m);
        let (econ, notes) = economic_limit(&m, &pts, epoch(), 800.0);
        assert_eq!(econ.t_econ_days, 0.0);
        assert_eq!(econ.eur_at_econ_limit, 0.0);
        assert_eq!(econ.econ_limit_date, Some(epoch()));
        assert!(notes[0].contains("already reached"));
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        let m = model(DeclineKind::Hyperbolic, 0.01, 0.5);
        let pts = window(0, 100, &m);
        let (econ, notes) = economic_limit(&m, &pts, epoch(), 0.0);
        assert_eq!(econ.t_econ_days, f64::INFINITY);
        assert_eq!(econ.eur_at_econ_limit, f64::INFINITY);
        assert_eq!(econ.econ_limit_date, None);
        assert!(notes[0].contains("unbounded"));
    }

    #[test]
    fn test_non_declining_fit() {
        let m = model(DeclineKind::Exponential, -0.001, 0.0);
        let pts = window(0, 100, &m);
        let (econ, notes) = economic_limit(&m, &pts, epoch(), 50.0);
        assert_eq!(econ.t_econ_days, f64::INFINITY);
        assert_eq!(econ.eur_at_econ_limit, f64::INFINITY);
        assert!(notes[0].contains("not positive"));
    }

    #[test]
    fn test_fit_quality() {
        let m = FittedModel {
            sse: 0.0,
            ..model(DeclineKind::Exponential, 0.005, 0.0)
        };
        let pts = window(0, 140, &m);
        let q = fit_quality(&m, &pts);
        assert_eq!(q.n_points, pts.len());
        assert_eq!(q.rmse, 0.0);
        assert_relative_eq!(q.r_squared, 1.0);

        let noisy = FittedModel { sse: 84.0, ..m };
        let q = fit_quality(&noisy, &pts);
        assert_relative_eq!(q.rmse, (84.0 / pts.len() as f64).sqrt());
        assert!(q.r_squared < 1.0);
    }

    proptest! {
        #[test]
        fn econ_time_monotone_in_limit(
            qi in 50.0_f64..5000.0,
            di in 1e-4_f64..0.05,
            b in 0.0_f64..1.5,
            low in 0.5_f64..40.0,
            bump in 0.0_f64..40.0,
        ) {
            let kind = if b < 0.01 { DeclineKind::Exponential } else { DeclineKind::Hyperbolic };
            let m = FittedModel { kind, qi, di, b, sse: 0.0 };
            let pts = window(0, 60, &m);
            let (lo, _) = economic_limit(&m, &pts, epoch(), low);
            let (hi, _) = economic_limit(&m, &pts, epoch(), low + bump);
            prop_assert!(hi.t_econ_days <= lo.t_econ_days);
            prop_assert!(hi.eur_at_econ_limit <= lo.eur_at_econ_limit * (1.0 + 1e-12));
        }
    }
}
