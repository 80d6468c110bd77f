//! Fit a year of weekly exponential production and print the decline summary.
//!
//! Run with: RUST_LOG=arps_dca=debug cargo run --example auto_fit

use arps_dca::{analyze, DeclineCurve, FitConfig, ModelChoice, ProductionRecord};
use chrono::{Days, NaiveDate};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
    let truth = DeclineCurve::Exponential { qi: 500.0, di: 0.005 };
    let records: Vec<ProductionRecord> = (0..52u64)
        .map(|week| {
            let t = 7 * week;
            ProductionRecord::new(start + Days::new(t), truth.rate(t as f64))
        })
        .collect();

    let config = FitConfig {
        decline_model: ModelChoice::Auto,
        b_min: 0.0,
        b_max: 1.8,
        b_step: 0.2,
        econ_limit_rate: 50.0,
        ..Default::default()
    };

    let result = analyze(&config, &records).unwrap();
    let m = &result.model;
    println!("Model: {}  qi={:.2}  Di={:.6}/day  b={:.2}", m.kind, m.qi, m.di, m.b);
    println!("R2={:.6}  RMSE={:.4}", result.quality.r_squared, result.quality.rmse);
    println!(
        "Economic limit after {:.1} days ({:?}), EUR={:.0}",
        result.econ.t_econ_days, result.econ.econ_limit_date, result.econ.eur_at_econ_limit
    );
    for note in &result.notes {
        println!("note: {note}");
    }
}
