// src/shared_data.rs

use crate::error::PredictorAppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Day of the week, encoded Monday = 0 ... Sunday = 6 for the regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = PredictorAppError;

    /// Accepts full names, three-letter abbreviations or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if let Ok(code) = wanted.parse::<usize>() {
            return DayOfWeek::ALL
                .get(code)
                .copied()
                .ok_or_else(|| PredictorAppError::InvalidInput(format!("day code {} out of range", code)));
        }
        DayOfWeek::ALL
            .iter()
            .copied()
            .find(|day| {
                let name = day.name().to_ascii_lowercase();
                name == wanted || (wanted.len() == 3 && name.starts_with(&wanted))
            })
            .ok_or_else(|| PredictorAppError::InvalidInput(format!("unknown day '{}'", s.trim())))
    }
}

/// Which pair of pretrained regressors (flow, occupancy) to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSelection {
    ExtraTrees,
    XGBoost,
    LightGBM,
    PolynomialReg,
}

impl ModelSelection {
    pub const ALL: [ModelSelection; 4] = [
        ModelSelection::ExtraTrees,
        ModelSelection::XGBoost,
        ModelSelection::LightGBM,
        ModelSelection::PolynomialReg,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelSelection::ExtraTrees => "Extra Trees",
            ModelSelection::XGBoost => "XGBoost",
            ModelSelection::LightGBM => "LightGBM",
            ModelSelection::PolynomialReg => "Polynomial Reg",
        }
    }

    /// File stem of the exported artifacts: the display name without spaces.
    pub fn artifact_stem(&self) -> String {
        self.display_name().replace(' ', "")
    }

    pub fn description(&self) -> &'static str {
        match self {
            ModelSelection::ExtraTrees => "Randomised tree ensemble: stable and accurate.",
            ModelSelection::XGBoost | ModelSelection::LightGBM => {
                "Gradient boosting: fast, learns from the errors of previous trees."
            }
            ModelSelection::PolynomialReg => "Polynomial regression: good for simple wave-like patterns.",
        }
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelSelection {
    type Err = PredictorAppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        ModelSelection::ALL
            .iter()
            .copied()
            .find(|m| m.artifact_stem().to_ascii_lowercase() == wanted)
            .ok_or_else(|| PredictorAppError::InvalidInput(format!("unknown model '{}'", s.trim())))
    }
}

/// What the user asked for: when and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionInput {
    pub day: DayOfWeek,
    hour: u8,
    pub detector_id: String,
}

impl PredictionInput {
    pub fn new(day: DayOfWeek, hour: u8, detector_id: impl Into<String>) -> Result<Self, PredictorAppError> {
        if hour > 23 {
            return Err(PredictorAppError::InvalidInput(format!(
                "hour must be within 0-23, got {}",
                hour
            )));
        }
        Ok(Self {
            day,
            hour,
            detector_id: detector_id.into(),
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }
}

/// Encoded model input. Column order is the training order: hour, day_of_week, detid_code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub hour: u8,
    pub day_of_week: u8,
    pub detid_code: u32,
}

impl FeatureVector {
    pub const WIDTH: usize = 3;

    pub fn as_array(&self) -> [f64; Self::WIDTH] {
        [
            f64::from(self.hour),
            f64::from(self.day_of_week),
            f64::from(self.detid_code),
        ]
    }
}

/// Predicted readings after clipping; both values are >= 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutput {
    /// Vehicles passing the detector.
    pub flow: f64,
    /// Percentage of time the segment is occupied. Not clipped above 100.
    pub occupancy: f64,
}

/// Display colour attached to every status tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusColor {
    Green,
    Orange,
    Red,
    Black,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusColor::Green => "green",
            StatusColor::Orange => "orange",
            StatusColor::Red => "red",
            StatusColor::Black => "black",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Road status derived from a prediction, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficStatus {
    FreeFlow,
    Congested,
    Jammed,
    GridlockTotal,
}

impl TrafficStatus {
    pub const ALL: [TrafficStatus; 4] = [
        TrafficStatus::FreeFlow,
        TrafficStatus::Congested,
        TrafficStatus::Jammed,
        TrafficStatus::GridlockTotal,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TrafficStatus::FreeFlow => "FREE FLOW",
            TrafficStatus::Congested => "CONGESTED",
            TrafficStatus::Jammed => "JAMMED",
            TrafficStatus::GridlockTotal => "TOTAL GRIDLOCK",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            TrafficStatus::FreeFlow => StatusColor::Green,
            TrafficStatus::Congested => StatusColor::Orange,
            TrafficStatus::Jammed => StatusColor::Red,
            TrafficStatus::GridlockTotal => StatusColor::Black,
        }
    }

    /// 0 for free flow up to 3 for gridlock.
    pub fn severity(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for TrafficStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
