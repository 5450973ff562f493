// status_classifier.rs

use serde::{Deserialize, Serialize};

use crate::global_variables::{
    CONGESTED_MAX_OCCUPANCY, FREE_FLOW_MAX_OCCUPANCY, GRIDLOCK_MAX_FLOW, GRIDLOCK_MIN_OCCUPANCY,
};
use crate::shared_data::{PredictionOutput, TrafficStatus};

/// Cut-off values for deriving a road status from a (flow, occupancy) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    /// Occupancy strictly below this is free flow.
    pub free_flow_max_occupancy: f64,
    /// Occupancy up to and including this is congested; above it is jammed.
    pub congested_max_occupancy: f64,
    /// Gridlock needs flow strictly below this...
    pub gridlock_max_flow: f64,
    /// ...and occupancy strictly above this.
    pub gridlock_min_occupancy: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            free_flow_max_occupancy: FREE_FLOW_MAX_OCCUPANCY,
            congested_max_occupancy: CONGESTED_MAX_OCCUPANCY,
            gridlock_max_flow: GRIDLOCK_MAX_FLOW,
            gridlock_min_occupancy: GRIDLOCK_MIN_OCCUPANCY,
        }
    }
}

impl StatusThresholds {
    /// Occupancy decides the base tier; low flow with high occupancy overrides it to gridlock.
    pub fn classify(&self, flow: f64, occupancy: f64) -> TrafficStatus {
        let base = if occupancy < self.free_flow_max_occupancy {
            TrafficStatus::FreeFlow
        } else if occupancy <= self.congested_max_occupancy {
            TrafficStatus::Congested
        } else {
            TrafficStatus::Jammed
        };

        if flow < self.gridlock_max_flow && occupancy > self.gridlock_min_occupancy {
            TrafficStatus::GridlockTotal
        } else {
            base
        }
    }

    pub fn classify_output(&self, output: &PredictionOutput) -> TrafficStatus {
        self.classify(output.flow, output.occupancy)
    }
}

/// Classifies with the default thresholds.
pub fn classify(flow: f64, occupancy: f64) -> TrafficStatus {
    StatusThresholds::default().classify(flow, occupancy)
}

/// Human-readable rule list, in evaluation order.
pub fn status_rules(thresholds: &StatusThresholds) -> Vec<String> {
    vec![
        format!(
            "Occupancy < {}%: {} ({})",
            thresholds.free_flow_max_occupancy,
            TrafficStatus::FreeFlow.label(),
            TrafficStatus::FreeFlow.color()
        ),
        format!(
            "Occupancy {}-{}%: {} ({})",
            thresholds.free_flow_max_occupancy,
            thresholds.congested_max_occupancy,
            TrafficStatus::Congested.label(),
            TrafficStatus::Congested.color()
        ),
        format!(
            "Occupancy > {}%: {} ({})",
            thresholds.congested_max_occupancy,
            TrafficStatus::Jammed.label(),
            TrafficStatus::Jammed.color()
        ),
        format!(
            "Flow < {} vehicles and occupancy > {}%: {} ({}), overrides the above",
            thresholds.gridlock_max_flow,
            thresholds.gridlock_min_occupancy,
            TrafficStatus::GridlockTotal.label(),
            TrafficStatus::GridlockTotal.color()
        ),
    ]
}
