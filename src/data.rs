use chrono::NaiveDate;

use crate::dates::normalize_date;
use crate::defaults::{MIN_FIT_POINTS, MIN_VALID_POINTS};
use crate::types::{CleanedPoint, DcaError, ProductionRecord};

/// Filter, sort and epoch-anchor raw production records.
///
/// A record is kept when its date parses and its rate is finite and strictly positive.
/// The earliest kept date becomes `t = 0`; every other point gets its whole-day offset.
///
/// # Errors
/// Returns `DcaError::InsufficientData` if fewer than five records survive.
pub fn clean_records(records: &[ProductionRecord]) -> Result<Vec<CleanedPoint>, DcaError> {
    let mut valid: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter(|rec| rec.rate.is_finite() && rec.rate > 0.0)
        .filter_map(|rec| normalize_date(&rec.time).map(|date| (date, rec.rate)))
        .collect();

    tracing::debug!(
        kept = valid.len(),
        dropped = records.len() - valid.len(),
        "cleaned production records"
    );

    if valid.len() < MIN_VALID_POINTS {
        return Err(DcaError::InsufficientData {
            valid: valid.len(),
            required: MIN_VALID_POINTS,
        });
    }

    // Stable so same-day records keep their input order.
    valid.sort_by_key(|&(date, _)| date);
    let epoch = valid[0].0;

    Ok(valid
        .into_iter()
        .map(|(date, rate)| CleanedPoint {
            date,
            t: (date - epoch).num_days(),
            rate,
        })
        .collect())
}

/// Restrict the cleaned series to the inclusive `[start, end]` fit window.
///
/// Returns the subset and the notes describing which bounds were applied.
///
/// # Errors
/// Returns `DcaError::InsufficientFitWindow` if fewer than three points fall inside.
pub fn select_fit_window(
    points: &[CleanedPoint],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(Vec<CleanedPoint>, Vec<String>), DcaError> {
    let fit: Vec<CleanedPoint> = points
        .iter()
        .filter(|p| start.map_or(true, |s| p.date >= s))
        .filter(|p| end.map_or(true, |e| p.date <= e))
        .copied()
        .collect();

    if fit.len() < MIN_FIT_POINTS {
        return Err(DcaError::InsufficientFitWindow {
            count: fit.len(),
            required: MIN_FIT_POINTS,
        });
    }

    let mut notes = Vec::new();
    let bounds = match (start, end) {
        (Some(s), Some(e)) => Some(format!("from {s} to {e}")),
        (Some(s), None) => Some(format!("from {s}")),
        (None, Some(e)) => Some(format!("through {e}")),
        (None, None) => None,
    };
    if let Some(bounds) = bounds {
        notes.push(format!(
            "Fit window applied {bounds}: {} of {} points used for parameter estimation.",
            fit.len(),
            points.len()
        ));
    }

    Ok((fit, notes))
}
