//! # arps_dca
//!
//! Decline-curve analysis for well production using the Arps family of models.
//!
//! Given `(date, rate)` records this crate:
//!
//! * **Cleans** the series: parses ISO and `MM/DD/YYYY` dates, drops non-positive or
//!   non-finite rates, sorts, and anchors `t = 0` at the earliest record
//! * **Fits** an exponential baseline by log-linear least squares, then searches the
//!   hyperbolic exponent `b` on a grid with `qi` pinned to the first point and `Di`
//!   solved through the last point; the lower SSE wins
//! * **Forecasts** the fitted curve from the last observed date
//! * **Evaluates** R², RMSE, the time to the economic limit, and EUR
//!
//! ## Example
//!
//! ```
//! use arps_dca::{analyze, DeclineKind, FitConfig, ModelChoice, ProductionRecord};
//!
//! // Monthly rates from a hyperbolic decline, with mixed date formats.
//! let dates = [
//!     "2023-01-01", "02/01/2023", "2023-03-01", "04/01/2023", "2023-05-01",
//!     "06/01/2023", "2023-07-01", "08/01/2023", "2023-09-01", "10/01/2023",
//! ];
//! let records: Vec<ProductionRecord> = dates
//!     .iter()
//!     .zip([1000.0, 780.0, 640.0, 541.0, 466.0, 409.0, 364.0, 327.0, 297.0, 271.0])
//!     .map(|(&d, q)| ProductionRecord::new(d, q))
//!     .collect();
//!
//! let config = FitConfig {
//!     decline_model: ModelChoice::Auto,
//!     b_step: 0.1,
//!     econ_limit_rate: 20.0,
//!     forecast_days: 365,
//!     ..Default::default()
//! };
//! let result = analyze(&config, &records).unwrap();
//!
//! assert_eq!(result.model.kind, DeclineKind::Hyperbolic);
//! assert_eq!(result.series.forecast.dates[0], *result.series.history.dates.last().unwrap());
//! println!(
//!     "qi={:.1} Di={:.5} b={:.2} R²={:.4} EUR={:.0}",
//!     result.model.qi, result.model.di, result.model.b,
//!     result.quality.r_squared, result.econ.eur_at_econ_limit
//! );
//! ```

// Module declarations
mod analysis;
pub mod curve;
pub mod data;
pub mod dates;
mod defaults;
pub mod econ;
pub mod forecast;
mod ols;
pub mod select;
mod types;

// Re-export public types
pub use curve::DeclineCurve;
pub use types::{
    AnalysisResult, CleanedPoint, DatedSeries, DcaError, DeclineKind, EconLimit, FitConfig,
    FitMethod, FitQuality, FittedModel, ForecastSeries, ModelChoice, ProductionRecord, RawTime,
    ReservedOptions,
};

// Re-export main public functions
pub use analysis::analyze;
pub use ols::fit_exponential;
pub use select::select_model;
