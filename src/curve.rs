//! Arps decline curves as a closed tagged variant.
//!
//! All times are in days since the series epoch. The hyperbolic variant falls back
//! to its exponential (`b -> 0`) and harmonic (`b -> 1`) limits so every operation
//! stays finite for degenerate exponents.

use serde::Serialize;

use crate::defaults::B_LIMIT_EPS;
use crate::types::DeclineKind;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum DeclineCurve {
    Exponential { qi: f64, di: f64 },
    Hyperbolic { qi: f64, di: f64, b: f64 },
    Harmonic { qi: f64, di: f64 },
}

/// Regime the curve actually evaluates in once degenerate exponents are resolved.
enum Regime {
    Exponential,
    Harmonic,
    Hyperbolic(f64),
}

impl DeclineCurve {
    pub fn kind(&self) -> DeclineKind {
        match self {
            DeclineCurve::Exponential { .. } => DeclineKind::Exponential,
            DeclineCurve::Hyperbolic { .. } => DeclineKind::Hyperbolic,
            DeclineCurve::Harmonic { .. } => DeclineKind::Harmonic,
        }
    }

    pub fn qi(&self) -> f64 {
        match *self {
            DeclineCurve::Exponential { qi, .. }
            | DeclineCurve::Hyperbolic { qi, .. }
            | DeclineCurve::Harmonic { qi, .. } => qi,
        }
    }

    pub fn di(&self) -> f64 {
        match *self {
            DeclineCurve::Exponential { di, .. }
            | DeclineCurve::Hyperbolic { di, .. }
            | DeclineCurve::Harmonic { di, .. } => di,
        }
    }

    /// Hyperbolic exponent: 0 for exponential, 1 for harmonic.
    pub fn b(&self) -> f64 {
        match *self {
            DeclineCurve::Exponential { .. } => 0.0,
            DeclineCurve::Hyperbolic { b, .. } => b,
            DeclineCurve::Harmonic { .. } => 1.0,
        }
    }

    fn regime(&self) -> Regime {
        match *self {
            DeclineCurve::Exponential { .. } => Regime::Exponential,
            DeclineCurve::Harmonic { .. } => Regime::Harmonic,
            DeclineCurve::Hyperbolic { b, .. } if b.abs() < B_LIMIT_EPS => Regime::Exponential,
            DeclineCurve::Hyperbolic { b, .. } if (b - 1.0).abs() < B_LIMIT_EPS => {
                Regime::Harmonic
            }
            DeclineCurve::Hyperbolic { b, .. } => Regime::Hyperbolic(b),
        }
    }

    /// Rate at `t` days.
    ///
    /// # Example
    /// ```
    /// use arps_dca::DeclineCurve;
    /// let curve = DeclineCurve::Harmonic { qi: 100.0, di: 0.01 };
    /// assert!((curve.rate(100.0) - 50.0).abs() < 1e-12);
    /// ```
    pub fn rate(&self, t: f64) -> f64 {
        let (qi, di) = (self.qi(), self.di());
        match self.regime() {
            Regime::Exponential => qi * (-di * t).exp(),
            Regime::Harmonic => qi / (1.0 + di * t),
            Regime::Hyperbolic(b) => qi / (1.0 + b * di * t).powf(1.0 / b),
        }
    }

    /// Time at which the curve reaches `rate`, by inverting the decline equation.
    ///
    /// A zero target yields `+inf`. The result is not clamped, so a target above
    /// `qi` gives a negative time.
    pub fn time_to_rate(&self, rate: f64) -> f64 {
        let (qi, di) = (self.qi(), self.di());
        let ratio = qi / rate;
        match self.regime() {
            Regime::Exponential => ratio.ln() / di,
            Regime::Harmonic => (ratio - 1.0) / di,
            Regime::Hyperbolic(b) => (ratio.powf(b) - 1.0) / (b * di),
        }
    }

    /// Cumulative production between `t0` and `t1` (closed-form integral of `rate`).
    pub fn cumulative(&self, t0: f64, t1: f64) -> f64 {
        let (qi, di) = (self.qi(), self.di());
        match self.regime() {
            Regime::Exponential => (qi / di) * ((-di * t0).exp() - (-di * t1).exp()),
            Regime::Harmonic => (qi / di) * ((di * t1).ln_1p() - (di * t0).ln_1p()),
            Regime::Hyperbolic(b) => {
                let exponent = 1.0 - 1.0 / b;
                (qi / (di * (1.0 - b)))
                    * ((1.0 + b * di * t0).powf(exponent) - (1.0 + b * di * t1).powf(exponent))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn simpson(curve: &DeclineCurve, t0: f64, t1: f64, n: usize) -> f64 {
        let n = if n % 2 == 0 { n } else { n + 1 };
        let h = (t1 - t0) / n as f64;
        let mut acc = curve.rate(t0) + curve.rate(t1);
        for i in 1..n {
            let w = if i % 2 == 1 { 4.0 } else { 2.0 };
            acc += w * curve.rate(t0 + h * i as f64);
        }
        acc * h / 3.0
    }

    #[test]
    fn test_rate_at_origin_is_qi() {
        for curve in [
            DeclineCurve::Exponential { qi: 500.0, di: 0.004 },
            DeclineCurve::Hyperbolic {
                qi: 500.0,
                di: 0.004,
                b: 0.5,
            },
            DeclineCurve::Harmonic { qi: 500.0, di: 0.004 },
        ] {
            assert_relative_eq!(curve.rate(0.0), 500.0);
        }
    }

    #[test]
    fn test_hyperbolic_limits() {
        let exp = DeclineCurve::Exponential { qi: 300.0, di: 0.01 };
        let near_zero = DeclineCurve::Hyperbolic {
            qi: 300.0,
            di: 0.01,
            b: 0.0,
        };
        assert_relative_eq!(near_zero.rate(120.0), exp.rate(120.0));
        assert_relative_eq!(near_zero.cumulative(0.0, 120.0), exp.cumulative(0.0, 120.0));

        let harm = DeclineCurve::Harmonic { qi: 300.0, di: 0.01 };
        let unit = DeclineCurve::Hyperbolic {
            qi: 300.0,
            di: 0.01,
            b: 1.0,
        };
        assert_relative_eq!(unit.rate(250.0), harm.rate(250.0));
        assert_relative_eq!(unit.cumulative(10.0, 250.0), harm.cumulative(10.0, 250.0));
        assert!(unit.time_to_rate(10.0).is_finite());

        // Close to, but not at, the limits the general formula stays continuous.
        let almost = DeclineCurve::Hyperbolic {
            qi: 300.0,
            di: 0.01,
            b: 1.0 - 1e-6,
        };
        assert_relative_eq!(
            almost.cumulative(0.0, 400.0),
            harm.cumulative(0.0, 400.0),
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_time_to_rate_inverts_rate() {
        for curve in [
            DeclineCurve::Exponential { qi: 800.0, di: 0.002 },
            DeclineCurve::Hyperbolic {
                qi: 800.0,
                di: 0.002,
                b: 0.7,
            },
            DeclineCurve::Harmonic { qi: 800.0, di: 0.002 },
        ] {
            let t = curve.time_to_rate(120.0);
            assert!(t > 0.0);
            assert_relative_eq!(curve.rate(t), 120.0, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_time_to_zero_rate_is_infinite() {
        let curve = DeclineCurve::Hyperbolic {
            qi: 100.0,
            di: 0.01,
            b: 0.4,
        };
        assert_eq!(curve.time_to_rate(0.0), f64::INFINITY);
    }

    #[test]
    fn test_cumulative_matches_simpson() {
        for curve in [
            DeclineCurve::Exponential { qi: 500.0, di: 0.005 },
            DeclineCurve::Hyperbolic {
                qi: 500.0,
                di: 0.005,
                b: 0.3,
            },
            DeclineCurve::Hyperbolic {
                qi: 500.0,
                di: 0.005,
                b: 1.4,
            },
            DeclineCurve::Harmonic { qi: 500.0, di: 0.005 },
        ] {
            let closed = curve.cumulative(30.0, 900.0);
            let numeric = simpson(&curve, 30.0, 900.0, 4000);
            assert_relative_eq!(closed, numeric, max_relative = 1e-8);
        }
    }
}
