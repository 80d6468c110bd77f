//! Compare the anchored and precise fits on a noisy hyperbolic well.

use arps_dca::{analyze, DeclineCurve, FitConfig, FitMethod, ProductionRecord};
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() {
    tracing_subscriber::fmt().init();

    let start = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
    let truth = DeclineCurve::Hyperbolic {
        qi: 1500.0,
        di: 0.01,
        b: 0.55,
    };
    let mut rng = StdRng::seed_from_u64(42);
    let records: Vec<ProductionRecord> = (0..36u64)
        .map(|month| {
            let t = 30 * month;
            let noise = 1.0 + rng.gen_range(-0.04..0.04);
            ProductionRecord::new(start + Days::new(t), truth.rate(t as f64) * noise)
        })
        .collect();

    for method in [FitMethod::Anchored, FitMethod::Precise] {
        let config = FitConfig {
            b_step: 0.02,
            econ_limit_rate: 30.0,
            forecast_days: 5 * 365,
            fit_method: method,
            ..Default::default()
        };
        let result = analyze(&config, &records).unwrap();
        let m = &result.model;
        println!(
            "{method:?}: {} qi={:.1} Di={:.5} b={:.3} SSE={:.1} R2={:.4} EUR={:.0}",
            m.kind,
            m.qi,
            m.di,
            m.b,
            m.sse,
            result.quality.r_squared,
            result.econ.eur_at_econ_limit
        );
    }
}
