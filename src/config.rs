// src/config.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PredictorAppError, Result};
use crate::flow_analyzer::status_classifier::StatusThresholds;
use crate::global_variables::{
    DEFAULT_CHART_FILE, DEFAULT_HISTORY_FILE, DEFAULT_MODEL_DIR, ENV_CONFIG_PATH,
    ENV_FORECAST_DAY, ENV_FORECAST_DETECTOR, ENV_FORECAST_MODEL, ENV_MODEL_DIR,
};
use crate::shared_data::{DayOfWeek, ModelSelection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the encoder and model artifacts.
    pub model_dir: PathBuf,
    /// CSV file that successful predictions are appended to.
    pub history_file: PathBuf,
    /// PNG written by the hourly forecast.
    pub chart_file: PathBuf,
    /// Load every model pair at startup instead of on first use.
    pub preload_models: bool,
    pub thresholds: StatusThresholds,
    pub default_model: ModelSelection,
    pub default_day: DayOfWeek,
    pub default_hour: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            history_file: PathBuf::from(DEFAULT_HISTORY_FILE),
            chart_file: PathBuf::from(DEFAULT_CHART_FILE),
            preload_models: false,
            thresholds: StatusThresholds::default(),
            default_model: ModelSelection::ExtraTrees,
            default_day: DayOfWeek::Monday,
            default_hour: 12,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PredictorAppError::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let config: DashboardConfig =
            serde_json::from_str(&text).map_err(|e| PredictorAppError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        if config.default_hour > 23 {
            return Err(PredictorAppError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: format!("default_hour {} is outside 0-23", config.default_hour),
            });
        }
        Ok(config)
    }

    /// `TRAFFIC_CONFIG` names the config file (defaults otherwise); `MODEL_DIR` overrides the model directory.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => {
                log::info!("Reading dashboard config from {}", path);
                Self::load(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        if let Ok(dir) = std::env::var(ENV_MODEL_DIR) {
            config.model_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

/// The series drawn by the non-interactive forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTarget {
    pub day: DayOfWeek,
    pub model: ModelSelection,
    pub detector_id: String,
}

impl DashboardConfig {
    /// `FORECAST_DAY`, `FORECAST_MODEL` and `FORECAST_DETECTOR` override the configured defaults.
    /// Without an override the detector is `first_detector`.
    pub fn forecast_target(&self, first_detector: Option<&str>) -> Result<ForecastTarget> {
        self.forecast_target_from(first_detector, |key| std::env::var(key).ok())
    }

    fn forecast_target_from(
        &self,
        first_detector: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ForecastTarget> {
        let day = match lookup(ENV_FORECAST_DAY) {
            Some(s) => s.parse::<DayOfWeek>()?,
            None => self.default_day,
        };
        let model = match lookup(ENV_FORECAST_MODEL) {
            Some(s) => s.parse::<ModelSelection>()?,
            None => self.default_model,
        };
        let detector_id = lookup(ENV_FORECAST_DETECTOR)
            .or_else(|| first_detector.map(str::to_string))
            .unwrap_or_default();
        Ok(ForecastTarget {
            day,
            model,
            detector_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "model_dir": "/srv/models", "default_model": "LightGBM", "thresholds": {{ "gridlock_min_occupancy": 25.0 }} }}"#
        )
        .unwrap();
        let config = DashboardConfig::load(file.path()).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("/srv/models"));
        assert_eq!(config.default_model, ModelSelection::LightGBM);
        assert_eq!(config.thresholds.gridlock_min_occupancy, 25.0);
        assert_eq!(config.thresholds.gridlock_max_flow, 100.0);
        assert_eq!(config.history_file, PathBuf::from(DEFAULT_HISTORY_FILE));
        assert!(!config.preload_models);
    }

    #[test]
    fn out_of_range_default_hour_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "default_hour": 30 }}"#).unwrap();
        assert!(DashboardConfig::load(file.path()).is_err());
    }

    #[test]
    fn forecast_target_reads_the_forecast_variables() {
        let config = DashboardConfig::default();
        let vars: HashMap<&str, String> = HashMap::from([
            (ENV_FORECAST_DAY, "sat".to_string()),
            (ENV_FORECAST_MODEL, "xgboost".to_string()),
            (ENV_FORECAST_DETECTOR, "RDM-12".to_string()),
        ]);
        let target = config
            .forecast_target_from(Some("RDM-01"), |key| vars.get(key).cloned())
            .unwrap();
        assert_eq!(target.day, DayOfWeek::Saturday);
        assert_eq!(target.model, ModelSelection::XGBoost);
        assert_eq!(target.detector_id, "RDM-12");
    }

    #[test]
    fn forecast_target_falls_back_to_config_and_first_detector() {
        let config = DashboardConfig {
            default_day: DayOfWeek::Thursday,
            default_model: ModelSelection::PolynomialReg,
            ..DashboardConfig::default()
        };
        let target = config.forecast_target_from(Some("RDM-01"), |_| None).unwrap();
        assert_eq!(
            target,
            ForecastTarget {
                day: DayOfWeek::Thursday,
                model: ModelSelection::PolynomialReg,
                detector_id: "RDM-01".to_string(),
            }
        );

        let bad_day = |key: &str| (key == ENV_FORECAST_DAY).then(|| "Caturday".to_string());
        assert!(config.forecast_target_from(None, bad_day).is_err());
    }
}
