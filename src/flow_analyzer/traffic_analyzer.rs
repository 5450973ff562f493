// traffic_analyzer.rs

use crate::error::{PredictorAppError, Result};
use crate::flow_analyzer::categorical_encoder::DetectorEncoder;
use crate::flow_analyzer::model_registry::ModelRegistry;
use crate::flow_analyzer::predictive_model::{ModelPair, Predictor};
use crate::flow_analyzer::status_classifier::StatusThresholds;
use crate::global_variables::HOURS_PER_DAY;
use crate::shared_data::{
    DayOfWeek, FeatureVector, ModelSelection, PredictionInput, PredictionOutput, StatusColor,
    TrafficStatus,
};

/// Negative predictions (including -0.0) become exactly +0.0; there is no upper clip.
pub fn clip_non_negative(value: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else {
        value
    }
}

pub fn clipped_output(raw_flow: f64, raw_occupancy: f64) -> PredictionOutput {
    PredictionOutput {
        flow: clip_non_negative(raw_flow),
        occupancy: clip_non_negative(raw_occupancy),
    }
}

/// Everything the dashboard shows for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    pub model: ModelSelection,
    pub input: PredictionInput,
    pub output: PredictionOutput,
    pub status: TrafficStatus,
}

impl PredictionReport {
    /// Whole vehicles, truncated.
    pub fn displayed_flow(&self) -> String {
        format!("{}", self.output.flow.trunc() as u64)
    }

    pub fn displayed_occupancy(&self) -> String {
        format!("{:.2}%", self.output.occupancy)
    }

    pub fn color(&self) -> StatusColor {
        self.status.color()
    }

    pub fn interpretation(&self) -> String {
        format!(
            "On {} at {}:00 at detector {}, the {} model predicts a road occupancy of {:.1}%.",
            self.input.day,
            self.input.hour(),
            self.input.detector_id,
            self.model,
            self.output.occupancy
        )
    }
}

fn invoke(predictor: &dyn Predictor, features: &FeatureVector) -> Result<f64> {
    let value = predictor.predict(features)?;
    if !value.is_finite() {
        return Err(PredictorAppError::PredictorFailed {
            model: predictor.name().to_string(),
            reason: format!("non-finite output {}", value),
        });
    }
    Ok(value)
}

/// Encode, predict with both regressors, clip, classify.
pub fn predict_with_pair(
    encoder: &DetectorEncoder,
    pair: &ModelPair,
    thresholds: &StatusThresholds,
    model: ModelSelection,
    input: &PredictionInput,
) -> Result<PredictionReport> {
    let features = encoder.encode(input).inspect_err(|e| {
        log::warn!("Rejected prediction request: {}", e);
    })?;

    let raw_flow = invoke(&*pair.flow, &features)?;
    let raw_occupancy = invoke(&*pair.occupancy, &features)?;
    let output = clipped_output(raw_flow, raw_occupancy);
    let status = thresholds.classify_output(&output);

    log::info!(
        "[Prediction] {} {} {}:00 {}: flow = {:.2} (raw {:.2}), occupancy = {:.2} (raw {:.2}), status = {}",
        model,
        input.day,
        input.hour(),
        input.detector_id,
        output.flow,
        raw_flow,
        output.occupancy,
        raw_occupancy,
        status
    );

    Ok(PredictionReport {
        model,
        input: input.clone(),
        output,
        status,
    })
}

/// Same as [`predict_with_pair`], resolving the pair through the registry.
pub fn run_prediction(
    encoder: &DetectorEncoder,
    registry: &mut ModelRegistry,
    thresholds: &StatusThresholds,
    model: ModelSelection,
    input: &PredictionInput,
) -> Result<PredictionReport> {
    // Unknown detectors are rejected before any artifact is touched.
    encoder.detector_to_code(&input.detector_id)?;
    let pair = registry.get_or_load(model)?;
    predict_with_pair(encoder, &pair, thresholds, model, input)
}

/// One report per hour of the given day.
pub fn hourly_forecast(
    encoder: &DetectorEncoder,
    registry: &mut ModelRegistry,
    thresholds: &StatusThresholds,
    model: ModelSelection,
    day: DayOfWeek,
    detector_id: &str,
) -> Result<Vec<PredictionReport>> {
    encoder.detector_to_code(detector_id)?;
    let pair = registry.get_or_load(model)?;
    (0..HOURS_PER_DAY)
        .map(|hour| {
            let input = PredictionInput::new(day, hour, detector_id)?;
            predict_with_pair(encoder, &pair, thresholds, model, &input)
        })
        .collect()
}
