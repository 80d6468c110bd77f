//! Default constants for cleaning, fitting and forecasting.

/// Minimum number of valid records after cleaning.
pub const MIN_VALID_POINTS: usize = 5;
/// Minimum number of records inside a requested fit window.
pub const MIN_FIT_POINTS: usize = 3;

pub const DEFAULT_B_MIN: f64 = 0.0;
pub const DEFAULT_B_MAX: f64 = 1.0;
pub const DEFAULT_B_STEP: f64 = 0.05;
pub const DEFAULT_ECON_LIMIT_RATE: f64 = 1.0;
pub const DEFAULT_FORECAST_DAYS: u32 = 3650;

/// Largest exponent grid a configuration may request.
pub const MAX_B_CANDIDATES: usize = 100_000;
/// Longest forecast horizon, in days (one century).
pub const MAX_FORECAST_DAYS: u32 = 36_525;

/// Grid candidates at or below this exponent have no anchored `Di` and are skipped.
pub const HYPERBOLIC_B_FLOOR: f64 = 0.01;
/// Grid candidates at or above this exponent are treated as harmonic.
pub const HARMONIC_B_THRESHOLD: f64 = 0.99;
/// Exponent tolerance for the exponential (b -> 0) and harmonic (b -> 1) limits.
pub const B_LIMIT_EPS: f64 = 1e-9;
/// Slack added before flooring the grid size so `b_max` survives rounding.
pub const GRID_EPS: f64 = 1e-9;

pub const DEFAULT_LM_MAX_ITER: usize = 200;
pub const DEFAULT_LM_TOL: f64 = 1e-12;
pub const DEFAULT_LM_LAMBDA: f64 = 1e-3;
pub const LM_LAMBDA_MAX: f64 = 1e12;
