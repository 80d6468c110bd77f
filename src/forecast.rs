use chrono::Days;

use crate::defaults::MAX_FORECAST_DAYS;
use crate::types::{CleanedPoint, DatedSeries, FittedModel};

/// Observed series for display, unaffected by the fit window.
pub fn history_series(points: &[CleanedPoint]) -> DatedSeries {
    DatedSeries {
        dates: points.iter().map(|p| p.date).collect(),
        rates: points.iter().map(|p| p.rate).collect(),
    }
}

/// Extrapolate `model` for day offsets `0..=forecast_days` from the last observed point.
///
/// Offset 0 is the last historical date itself, so history and forecast share a point.
/// Rates are evaluated at absolute time since the epoch and never go below zero.
/// The horizon is capped at `MAX_FORECAST_DAYS`.
pub fn generate_forecast(
    model: &FittedModel,
    last: &CleanedPoint,
    forecast_days: u32,
) -> DatedSeries {
    let curve = model.curve();
    let forecast_days = forecast_days.min(MAX_FORECAST_DAYS);
    let capacity = forecast_days as usize + 1;
    let mut out = DatedSeries {
        dates: Vec::with_capacity(capacity),
        rates: Vec::with_capacity(capacity),
    };

    for offset in 0..=u64::from(forecast_days) {
        let Some(date) = last.date.checked_add_days(Days::new(offset)) else {
            break;
        };
        let t = (last.t as f64) + offset as f64;
        out.dates.push(date);
        out.rates.push(curve.rate(t).max(0.0));
    }

    out
}
