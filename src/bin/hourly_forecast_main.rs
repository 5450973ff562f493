// Non-interactive forecast: FORECAST_DETECTOR, FORECAST_DAY and FORECAST_MODEL pick the series.
use std::process::ExitCode;

use traffic_predictor::config::DashboardConfig;
use traffic_predictor::error::Result;
use traffic_predictor::flow_analyzer::{hourly_forecast, DetectorEncoder, ModelRegistry};
use traffic_predictor::global_variables::DETECTOR_ENCODER_FILE;
use traffic_predictor::monitoring::forecast_chart::draw_hourly_forecast;

fn run() -> Result<()> {
    let config = DashboardConfig::from_env()?;
    let encoder = DetectorEncoder::load(&config.model_dir.join(DETECTOR_ENCODER_FILE))?;
    let mut registry = ModelRegistry::from_dir(config.model_dir.clone());

    let target = config.forecast_target(
        encoder.list_known_detectors().first().map(String::as_str),
    )?;

    let reports = hourly_forecast(
        &encoder,
        &mut registry,
        &config.thresholds,
        target.model,
        target.day,
        &target.detector_id,
    )?;
    for report in &reports {
        println!(
            "{:>2}:00 flow={:>6} occupancy={:>8} status={}",
            report.input.hour(),
            report.displayed_flow(),
            report.displayed_occupancy(),
            report.status
        );
    }
    draw_hourly_forecast(&reports, &config.chart_file)?;
    println!("Chart saved to {}", config.chart_file.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Forecast failed: {}", e);
            eprintln!("Forecast error: {}", e);
            ExitCode::FAILURE
        }
    }
}
