// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the predictor, grouped the way the dashboard reacts to them.
#[derive(Debug, Error)]
pub enum PredictorAppError {
    /// A required artifact (encoder or model) could not be read.
    #[error("resource unavailable: {}: {source}", .path.display())]
    ResourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact was found but its contents are unusable.
    #[error("invalid artifact {}: {reason}", .path.display())]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("unknown detector id '{0}'")]
    UnknownDetector(String),

    #[error("predictor '{model}' failed: {reason}")]
    PredictorFailed { model: String, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("history log error: {0}")]
    History(#[from] csv::Error),

    #[error("chart error: {0}")]
    Chart(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PredictorAppError {
    /// Startup-class failures: nothing can be predicted until the artifacts are fixed.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            PredictorAppError::ResourceUnavailable { .. } | PredictorAppError::InvalidArtifact { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, PredictorAppError>;
