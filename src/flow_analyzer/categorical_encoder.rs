// categorical_encoder.rs

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{PredictorAppError, Result};
use crate::shared_data::{DayOfWeek, FeatureVector, PredictionInput};

/// Monday = 0 ... Sunday = 6.
pub fn day_to_code(day: DayOfWeek) -> u8 {
    match day {
        DayOfWeek::Monday => 0,
        DayOfWeek::Tuesday => 1,
        DayOfWeek::Wednesday => 2,
        DayOfWeek::Thursday => 3,
        DayOfWeek::Friday => 4,
        DayOfWeek::Saturday => 5,
        DayOfWeek::Sunday => 6,
    }
}

#[derive(Deserialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

/// Detector ids seen during training, in the order their codes were assigned.
#[derive(Debug, Clone)]
pub struct DetectorEncoder {
    classes: Vec<String>,
    codes: HashMap<String, u32>,
}

impl DetectorEncoder {
    /// Builds the table from an ordered list; code = position. Duplicates are rejected.
    pub fn from_classes(classes: Vec<String>) -> std::result::Result<Self, String> {
        if classes.is_empty() {
            return Err("detector enumeration is empty".to_string());
        }
        let mut codes = HashMap::with_capacity(classes.len());
        for (index, class) in classes.iter().enumerate() {
            let code = u32::try_from(index).map_err(|_| "too many detectors".to_string())?;
            if codes.insert(class.clone(), code).is_some() {
                return Err(format!("duplicate detector id '{}'", class));
            }
        }
        Ok(Self { classes, codes })
    }

    /// Loads `{"classes": [...]}` exported from the training-time label encoder.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PredictorAppError::ResourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: EncoderArtifact =
            serde_json::from_str(&text).map_err(|e| PredictorAppError::InvalidArtifact {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let encoder = Self::from_classes(artifact.classes).map_err(|reason| {
            PredictorAppError::InvalidArtifact {
                path: path.to_path_buf(),
                reason,
            }
        })?;
        log::info!(
            "Loaded detector encoder from {} ({} detectors)",
            path.display(),
            encoder.classes.len()
        );
        Ok(encoder)
    }

    pub fn detector_to_code(&self, detector_id: &str) -> Result<u32> {
        self.codes
            .get(detector_id)
            .copied()
            .ok_or_else(|| PredictorAppError::UnknownDetector(detector_id.to_string()))
    }

    pub fn code_to_detector(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(String::as_str)
    }

    pub fn list_known_detectors(&self) -> &[String] {
        &self.classes
    }

    /// Shapes a request into the regressors' feature columns.
    pub fn encode(&self, input: &PredictionInput) -> Result<FeatureVector> {
        Ok(FeatureVector {
            hour: input.hour(),
            day_of_week: day_to_code(input.day),
            detid_code: self.detector_to_code(&input.detector_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_encoder() -> DetectorEncoder {
        DetectorEncoder::from_classes(vec![
            "RDM-01".to_string(),
            "RDM-07".to_string(),
            "RDM-12".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn days_encode_in_calendar_order() {
        let codes: Vec<u8> = DayOfWeek::ALL.iter().map(|d| day_to_code(*d)).collect();
        assert_eq!(codes, vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn every_known_detector_round_trips() {
        let encoder = sample_encoder();
        for id in encoder.list_known_detectors() {
            let code = encoder.detector_to_code(id).unwrap();
            assert_eq!(encoder.code_to_detector(code), Some(id.as_str()));
        }
    }

    #[test]
    fn unknown_detector_is_an_error_not_a_default() {
        let encoder = sample_encoder();
        let err = encoder.detector_to_code("RDM-99").unwrap_err();
        assert!(matches!(err, PredictorAppError::UnknownDetector(ref id) if id == "RDM-99"));
        assert_eq!(encoder.code_to_detector(3), None);
    }

    #[test]
    fn listing_is_stable() {
        let encoder = sample_encoder();
        assert_eq!(encoder.list_known_detectors(), encoder.list_known_detectors());
        assert_eq!(encoder.list_known_detectors()[2], "RDM-12");
    }

    #[test]
    fn duplicates_and_empty_lists_are_rejected() {
        assert!(DetectorEncoder::from_classes(vec![]).is_err());
        assert!(DetectorEncoder::from_classes(vec!["A".into(), "A".into()]).is_err());
    }

    #[test]
    fn encode_builds_feature_columns() {
        let encoder = sample_encoder();
        let input = PredictionInput::new(DayOfWeek::Wednesday, 8, "RDM-12").unwrap();
        let features = encoder.encode(&input).unwrap();
        assert_eq!(features.as_array(), [8.0, 2.0, 2.0]);
    }

    #[test]
    fn load_reads_exported_classes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes": ["B-2", "A-1"]}}"#).unwrap();
        let encoder = DetectorEncoder::load(file.path()).unwrap();
        assert_eq!(encoder.detector_to_code("B-2").unwrap(), 0);
        assert_eq!(encoder.detector_to_code("A-1").unwrap(), 1);
    }

    #[test]
    fn load_rejects_an_empty_enumeration() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classes": []}}"#).unwrap();
        let err = DetectorEncoder::load(file.path()).unwrap_err();
        assert!(matches!(err, PredictorAppError::InvalidArtifact { .. }));
    }

    #[test]
    fn load_reports_missing_file_as_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DetectorEncoder::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, PredictorAppError::ResourceUnavailable { .. }));
        assert!(err.is_resource_error());
    }
}
