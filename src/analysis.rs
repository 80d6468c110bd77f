use crate::data::{clean_records, select_fit_window};
use crate::econ::{economic_limit, fit_quality};
use crate::forecast::{generate_forecast, history_series};
use crate::select::select_model;
use crate::types::{AnalysisResult, DcaError, FitConfig, ForecastSeries, ProductionRecord};

/// Run a full decline-curve analysis on one well.
///
/// Cleans the records, applies the optional fit window, selects and fits the decline
/// model, then derives fit statistics, the economic limit, EUR and the forecast.
/// The call is pure: identical inputs give identical results, and concurrent calls
/// share nothing.
///
/// # Errors
/// * `DcaError::InvalidConfig` if `config` fails validation
/// * `DcaError::InsufficientData` if fewer than five records are valid
/// * `DcaError::InsufficientFitWindow` if fewer than three records fall in the window
///
/// # Example
/// ```
/// use arps_dca::{analyze, DeclineKind, FitConfig, ProductionRecord};
/// use chrono::{Days, NaiveDate};
///
/// let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
/// let records: Vec<ProductionRecord> = (0..12u64)
///     .map(|i| {
///         let t = 30 * i;
///         ProductionRecord::new(start + Days::new(t), 400.0 * (-0.004 * t as f64).exp())
///     })
///     .collect();
///
/// let result = analyze(&FitConfig::default(), &records).unwrap();
/// assert_eq!(result.model.kind, DeclineKind::Exponential);
/// assert!(result.quality.r_squared > 0.999);
/// ```
pub fn analyze(
    config: &FitConfig,
    records: &[ProductionRecord],
) -> Result<AnalysisResult, DcaError> {
    config.validate()?;
    let mut notes = reserved_option_notes(config);

    let cleaned = clean_records(records)?;
    let (fit_data, window_notes) =
        select_fit_window(&cleaned, config.fit_start_date, config.fit_end_date)?;
    notes.extend(window_notes);

    let (model, selection_notes) = select_model(&fit_data, config);
    notes.extend(selection_notes);

    let quality = fit_quality(&model, &fit_data);
    let epoch = cleaned[0].date;
    let (econ, econ_notes) = economic_limit(&model, &fit_data, epoch, config.econ_limit_rate);
    notes.extend(econ_notes);

    let last = cleaned[cleaned.len() - 1];
    let series = ForecastSeries {
        history: history_series(&cleaned),
        forecast: generate_forecast(&model, &last, config.forecast_days),
    };

    tracing::debug!(
        model = %model.kind,
        r_squared = quality.r_squared,
        t_econ_days = econ.t_econ_days,
        "decline analysis complete"
    );

    Ok(AnalysisResult {
        model,
        quality,
        econ,
        series,
        notes,
    })
}

fn reserved_option_notes(config: &FitConfig) -> Vec<String> {
    config
        .reserved
        .set_fields()
        .into_iter()
        .map(|field| {
            tracing::warn!(field, "reserved option has no effect");
            format!("Option '{field}' is reserved and was ignored.")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeclineKind, ModelChoice, ReservedOptions};
    use chrono::{Days, NaiveDate};

    fn weekly(n: u64, rate: impl Fn(f64) -> f64) -> Vec<ProductionRecord> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let t = 7 * i;
                ProductionRecord::new(start + Days::new(t), rate(t as f64))
            })
            .collect()
    }

    #[test]
    fn test_invalid_config_short_circuits() {
        let cfg = FitConfig {
            b_step: -1.0,
            ..Default::default()
        };
        let err = analyze(&cfg, &[]).unwrap_err();
        assert!(matches!(err, DcaError::InvalidConfig(_)));
        assert!(!err.is_data_error());
    }

    #[test]
    fn test_oversized_grid_rejected_before_fitting() {
        let records = weekly(10, |t| 300.0 * (-0.01 * t).exp());
        let cfg = FitConfig {
            b_step: 1e-300,
            ..Default::default()
        };
        let err = analyze(&cfg, &records).unwrap_err();
        assert!(matches!(err, DcaError::InvalidConfig(_)));
        assert!(err.to_string().contains("candidates"));
    }

    #[test]
    fn test_data_errors_surface() {
        let records = weekly(4, |t| 100.0 - t);
        let err = analyze(&FitConfig::default(), &records).unwrap_err();
        assert!(err.is_data_error());
        assert_eq!(
            err.to_string(),
            "insufficient data: 4 valid records after cleaning, at least 5 required"
        );

        let records = weekly(10, |t| 100.0 - t);
        let cfg = FitConfig {
            fit_start_date: NaiveDate::from_ymd_opt(2022, 2, 20),
            ..Default::default()
        };
        let err = analyze(&cfg, &records).unwrap_err();
        assert!(matches!(err, DcaError::InsufficientFitWindow { count: 2, .. }));
    }

    #[test]
    fn test_reserved_options_noted_not_applied() {
        let records = weekly(20, |t| 300.0 * (-0.01 * t).exp());
        let plain = analyze(&FitConfig::default(), &records).unwrap();
        let cfg = FitConfig {
            reserved: ReservedOptions {
                outlier_method: Some("iqr".to_string()),
                allow_segmentation: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let with_reserved = analyze(&cfg, &records).unwrap();
        assert_eq!(with_reserved.model, plain.model);
        assert_eq!(with_reserved.series, plain.series);
        assert!(with_reserved.notes[0].contains("outlier_method"));
        assert!(with_reserved.notes[1].contains("allow_segmentation"));
    }

    #[test]
    fn test_window_keeps_full_history() {
        let records = weekly(30, |t| 300.0 * (-0.01 * t).exp());
        let cfg = FitConfig {
            fit_start_date: NaiveDate::from_ymd_opt(2022, 3, 1),
            ..Default::default()
        };
        let result = analyze(&cfg, &records).unwrap();
        assert_eq!(result.series.history.dates.len(), 30);
        assert_eq!(result.quality.n_points, 21);
        assert!(result.notes.iter().any(|n| n.starts_with("Fit window applied")));
    }

    #[test]
    fn test_forced_model_label() {
        let records = weekly(30, |t| 300.0 * (-0.01 * t).exp());
        let cfg = FitConfig {
            decline_model: ModelChoice::Harmonic,
            ..Default::default()
        };
        let result = analyze(&cfg, &records).unwrap();
        assert_eq!(result.model.kind, DeclineKind::Harmonic);
    }
}
