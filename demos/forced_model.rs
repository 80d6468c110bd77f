//! Show how forcing a model label changes the reported curve but not the fitted numbers.

use arps_dca::{analyze, FitConfig, ModelChoice, ProductionRecord};

fn main() {
    let records: Vec<ProductionRecord> = [
        ("01/01/2023", 1000.0),
        ("02/01/2023", 780.0),
        ("03/01/2023", 640.0),
        ("04/01/2023", 541.0),
        ("05/01/2023", 466.0),
        ("06/01/2023", 409.0),
        ("07/01/2023", 364.0),
        ("08/01/2023", 327.0),
    ]
    .into_iter()
    .map(|(date, rate)| ProductionRecord::new(date, rate))
    .collect();

    for choice in [
        ModelChoice::Auto,
        ModelChoice::Exponential,
        ModelChoice::Hyperbolic,
        ModelChoice::Harmonic,
    ] {
        let config = FitConfig {
            decline_model: choice,
            b_step: 0.1,
            econ_limit_rate: 25.0,
            ..Default::default()
        };
        match analyze(&config, &records) {
            Ok(result) => println!(
                "{choice:?}: label={} qi={:.1} Di={:.5} b={:.2} SSE={:.2} t_econ={:.0}d",
                result.model.kind,
                result.model.qi,
                result.model.di,
                result.model.b,
                result.model.sse,
                result.econ.t_econ_days
            ),
            Err(e) => println!("{choice:?}: {e}"),
        }
    }
}
