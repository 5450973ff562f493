// Artifact locations
pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DETECTOR_ENCODER_FILE: &str = "label_encoder_detid.json";
pub const FLOW_ARTIFACT_SUFFIX: &str = "_flow.json";
pub const OCCUPANCY_ARTIFACT_SUFFIX: &str = "_occ.json";

// Dashboard output files
pub const DEFAULT_HISTORY_FILE: &str = "prediction_history.csv";
pub const DEFAULT_CHART_FILE: &str = "hourly_forecast.png";

// Environment overrides
pub const ENV_CONFIG_PATH: &str = "TRAFFIC_CONFIG";
pub const ENV_MODEL_DIR: &str = "MODEL_DIR";
pub const ENV_FORECAST_DAY: &str = "FORECAST_DAY";
pub const ENV_FORECAST_MODEL: &str = "FORECAST_MODEL";
pub const ENV_FORECAST_DETECTOR: &str = "FORECAST_DETECTOR";

// Status thresholds (occupancy in percent, flow in vehicles).
// Picked from exploratory analysis; tune them through the config file.
pub const FREE_FLOW_MAX_OCCUPANCY: f64 = 5.0;
pub const CONGESTED_MAX_OCCUPANCY: f64 = 15.0;
pub const GRIDLOCK_MAX_FLOW: f64 = 100.0;
pub const GRIDLOCK_MIN_OCCUPANCY: f64 = 20.0;

pub const HOURS_PER_DAY: u8 = 24;
