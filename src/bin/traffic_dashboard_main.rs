use std::io::{stdin, stdout};
use std::process::ExitCode;

use traffic_predictor::config::DashboardConfig;
use traffic_predictor::monitoring::traffic_monitoring_system::Dashboard;

fn main() -> ExitCode {
    env_logger::init();

    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Starting traffic dashboard (models in {})...", config.model_dir.display());
    let mut dashboard = match Dashboard::start(config) {
        Ok(dashboard) => dashboard,
        Err(e) => {
            log::error!("Startup failed: {}", e);
            eprintln!("Model files not found or unusable: {}", e);
            eprintln!("Export the trained models into the model directory and try again.");
            return ExitCode::FAILURE;
        }
    };

    let stdin = stdin();
    if let Err(e) = dashboard.run_cli(&mut stdin.lock(), &mut stdout()) {
        eprintln!("Dashboard error: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
