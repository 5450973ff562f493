pub mod categorical_encoder;
pub mod model_registry;
pub mod predictive_model;
pub mod status_classifier;
pub mod traffic_analyzer;

// Re-export the pieces the binaries use
pub use categorical_encoder::{day_to_code, DetectorEncoder};
pub use model_registry::{JsonModelLoader, ModelLoader, ModelRegistry};
pub use predictive_model::{ModelPair, Predictor};
pub use status_classifier::{classify, status_rules, StatusThresholds};
pub use traffic_analyzer::{
    clip_non_negative, hourly_forecast, predict_with_pair, run_prediction, PredictionReport,
};
