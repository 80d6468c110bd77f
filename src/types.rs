use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::curve::DeclineCurve;
use crate::defaults::{
    DEFAULT_B_MAX, DEFAULT_B_MIN, DEFAULT_B_STEP, DEFAULT_ECON_LIMIT_RATE, DEFAULT_FORECAST_DAYS,
    MAX_B_CANDIDATES, MAX_FORECAST_DAYS,
};
use crate::select::b_candidate_count;

/// Raw time value of a production record, as delivered by the ingestion layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTime {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl From<NaiveDate> for RawTime {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<NaiveDateTime> for RawTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<&str> for RawTime {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RawTime {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// One `(time, rate)` observation before cleaning.
///
/// # Example
/// ```
/// use arps_dca::ProductionRecord;
/// let rec = ProductionRecord::new("03/15/2023", 412.5);
/// assert_eq!(rec.rate, 412.5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub time: RawTime,
    pub rate: f64,
}

impl ProductionRecord {
    pub fn new(time: impl Into<RawTime>, rate: f64) -> Self {
        Self {
            time: time.into(),
            rate,
        }
    }
}

/// A validated observation anchored to the series epoch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CleanedPoint {
    pub date: NaiveDate,
    /// Whole days since the earliest valid record.
    pub t: i64,
    pub rate: f64,
}

/// Decline model requested by the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelChoice {
    #[default]
    Auto,
    Exponential,
    Hyperbolic,
    Harmonic,
}

impl FromStr for ModelChoice {
    type Err = DcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "exponential" => Ok(Self::Exponential),
            "hyperbolic" => Ok(Self::Hyperbolic),
            "harmonic" => Ok(Self::Harmonic),
            other => Err(DcaError::InvalidConfig(format!(
                "unknown decline model '{other}'"
            ))),
        }
    }
}

/// How the hyperbolic/harmonic parameters are estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMethod {
    /// `qi` pinned to the first fit point, `Di` solved through the last one.
    #[default]
    Anchored,
    /// Anchored fit followed by a joint Levenberg-Marquardt refinement.
    Precise,
}

/// Options accepted for compatibility that do not change any result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservedOptions {
    pub outlier_method: Option<String>,
    pub outlier_window_days: Option<u32>,
    pub smooth_window_days: Option<u32>,
    pub allow_segmentation: bool,
}

impl ReservedOptions {
    /// Names of the options the caller actually set.
    pub fn set_fields(&self) -> Vec<&'static str> {
        let mut set = Vec::new();
        if self.outlier_method.is_some() {
            set.push("outlier_method");
        }
        if self.outlier_window_days.is_some() {
            set.push("outlier_window_days");
        }
        if self.smooth_window_days.is_some() {
            set.push("smooth_window_days");
        }
        if self.allow_segmentation {
            set.push("allow_segmentation");
        }
        set
    }
}

/// Analysis configuration.
///
/// # Example
/// ```
/// use arps_dca::{FitConfig, ModelChoice};
/// let cfg = FitConfig {
///     decline_model: ModelChoice::Hyperbolic,
///     b_max: 0.9,
///     b_step: 0.1,
///     econ_limit_rate: 25.0,
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub decline_model: ModelChoice,
    pub b_min: f64,
    pub b_max: f64,
    pub b_step: f64,
    /// Rate below which production is uneconomic (same units as the input rates).
    pub econ_limit_rate: f64,
    /// Forecast horizon in days, counted from the last historical date.
    pub forecast_days: u32,
    /// Inclusive lower bound of the parameter-estimation window.
    pub fit_start_date: Option<NaiveDate>,
    /// Inclusive upper bound of the parameter-estimation window.
    pub fit_end_date: Option<NaiveDate>,
    pub fit_method: FitMethod,
    #[serde(flatten)]
    pub reserved: ReservedOptions,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            decline_model: ModelChoice::Auto,
            b_min: DEFAULT_B_MIN,
            b_max: DEFAULT_B_MAX,
            b_step: DEFAULT_B_STEP,
            econ_limit_rate: DEFAULT_ECON_LIMIT_RATE,
            forecast_days: DEFAULT_FORECAST_DAYS,
            fit_start_date: None,
            fit_end_date: None,
            fit_method: FitMethod::Anchored,
            reserved: ReservedOptions::default(),
        }
    }
}

impl FitConfig {
    /// Reject configurations the fitter cannot work with.
    pub fn validate(&self) -> Result<(), DcaError> {
        if !self.b_min.is_finite() || !self.b_max.is_finite() {
            return Err(DcaError::InvalidConfig(
                "b_min and b_max must be finite".to_string(),
            ));
        }
        if self.b_min < 0.0 {
            return Err(DcaError::InvalidConfig(format!(
                "b_min must be >= 0 (got {})",
                self.b_min
            )));
        }
        if self.b_min > self.b_max {
            return Err(DcaError::InvalidConfig(format!(
                "b_min {} exceeds b_max {}",
                self.b_min, self.b_max
            )));
        }
        if !(self.b_step.is_finite() && self.b_step > 0.0) {
            return Err(DcaError::InvalidConfig(format!(
                "b_step must be positive and finite (got {})",
                self.b_step
            )));
        }
        if b_candidate_count(self.b_min, self.b_max, self.b_step).is_none() {
            return Err(DcaError::InvalidConfig(format!(
                "b grid from {} to {} in steps of {} exceeds {MAX_B_CANDIDATES} candidates",
                self.b_min, self.b_max, self.b_step
            )));
        }
        if self.forecast_days > MAX_FORECAST_DAYS {
            return Err(DcaError::InvalidConfig(format!(
                "forecast_days must be <= {MAX_FORECAST_DAYS} (got {})",
                self.forecast_days
            )));
        }
        if self.econ_limit_rate.is_nan() || self.econ_limit_rate < 0.0 {
            return Err(DcaError::InvalidConfig(format!(
                "econ_limit_rate must be >= 0 (got {})",
                self.econ_limit_rate
            )));
        }
        if let (Some(start), Some(end)) = (self.fit_start_date, self.fit_end_date) {
            if start > end {
                return Err(DcaError::InvalidConfig(format!(
                    "fit_start_date {start} is after fit_end_date {end}"
                )));
            }
        }
        Ok(())
    }
}

/// Arps family of a fitted model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclineKind {
    Exponential,
    Hyperbolic,
    Harmonic,
}

impl fmt::Display for DeclineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclineKind::Exponential => write!(f, "exponential"),
            DeclineKind::Hyperbolic => write!(f, "hyperbolic"),
            DeclineKind::Harmonic => write!(f, "harmonic"),
        }
    }
}

impl ModelChoice {
    /// The label to force onto the result, or `None` for automatic selection.
    pub fn forced_kind(self) -> Option<DeclineKind> {
        match self {
            ModelChoice::Auto => None,
            ModelChoice::Exponential => Some(DeclineKind::Exponential),
            ModelChoice::Hyperbolic => Some(DeclineKind::Hyperbolic),
            ModelChoice::Harmonic => Some(DeclineKind::Harmonic),
        }
    }
}

/// Best-fit decline parameters.
///
/// `kind` is the reported label; when a model is forced it may differ from the
/// family that produced `(qi, di, b)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FittedModel {
    pub kind: DeclineKind,
    /// Rate at `t = 0` of the series epoch.
    pub qi: f64,
    /// Nominal decline per day.
    pub di: f64,
    /// Hyperbolic exponent (0 for exponential, 1 for harmonic).
    pub b: f64,
    /// Sum of squared residuals over the fit window.
    pub sse: f64,
}

impl FittedModel {
    /// The rate curve described by the reported label and the fitted numbers.
    pub fn curve(&self) -> DeclineCurve {
        match self.kind {
            DeclineKind::Exponential => DeclineCurve::Exponential {
                qi: self.qi,
                di: self.di,
            },
            DeclineKind::Hyperbolic => DeclineCurve::Hyperbolic {
                qi: self.qi,
                di: self.di,
                b: self.b,
            },
            DeclineKind::Harmonic => DeclineCurve::Harmonic {
                qi: self.qi,
                di: self.di,
            },
        }
    }

    /// Fitted rate at `t` days since the epoch.
    pub fn rate(&self, t: f64) -> f64 {
        self.curve().rate(t)
    }
}

/// Goodness of fit over the fit window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FitQuality {
    pub r_squared: f64,
    pub rmse: f64,
    pub n_points: usize,
}

/// Economic-limit crossing and recovery up to it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EconLimit {
    /// Days from the first fit point until the curve reaches the limit; `+inf` if never.
    pub t_econ_days: f64,
    /// Cumulative production from the first fit point to the limit; `+inf` if unbounded.
    pub eur_at_econ_limit: f64,
    pub econ_limit_date: Option<NaiveDate>,
}

/// Parallel date/rate arrays.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DatedSeries {
    pub dates: Vec<NaiveDate>,
    pub rates: Vec<f64>,
}

/// Observed history plus the forecast stitched at the last historical date.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
    pub history: DatedSeries,
    pub forecast: DatedSeries,
}

/// Everything a single `analyze` call produces.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub model: FittedModel,
    pub quality: FitQuality,
    pub econ: EconLimit,
    pub series: ForecastSeries,
    /// Human-readable diagnostics in pipeline order.
    pub notes: Vec<String>,
}

/// Library error type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DcaError {
    #[error("insufficient data: {valid} valid records after cleaning, at least {required} required")]
    InsufficientData { valid: usize, required: usize },
    #[error("insufficient data in fit window: {count} records, at least {required} required")]
    InsufficientFitWindow { count: usize, required: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DcaError {
    /// True for the data-validity failures (too few records overall or in the window).
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            DcaError::InsufficientData { .. } | DcaError::InsufficientFitWindow { .. }
        )
    }
}
