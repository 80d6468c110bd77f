//! Load a configuration and production records from JSON, print the result as JSON.

use arps_dca::{analyze, FitConfig, ProductionRecord};

const CONFIG: &str = r#"{
    "decline_model": "AUTO",
    "b_min": 0.1,
    "b_max": 1.0,
    "b_step": 0.05,
    "econ_limit_rate": 15.0,
    "forecast_days": 30,
    "fit_start_date": "2021-02-01",
    "smooth_window_days": 14
}"#;

const RECORDS: &str = r#"[
    {"time": "2021-01-01", "rate": 520.0},
    {"time": "2021-02-01", "rate": 455.0},
    {"time": "03/01/2021", "rate": 410.0},
    {"time": "2021-04-01", "rate": 371.0},
    {"time": "5/1/21", "rate": 340.0},
    {"time": "2021-06-01", "rate": 312.0},
    {"time": "2021-07-01", "rate": 0.0},
    {"time": "2021-08-01", "rate": 268.0}
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let config: FitConfig = serde_json::from_str(CONFIG)?;
    let records: Vec<ProductionRecord> = serde_json::from_str(RECORDS)?;
    let result = analyze(&config, &records)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
