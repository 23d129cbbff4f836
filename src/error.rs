//! Error types for RehabSense

use crate::types::Modality;
use thiserror::Error;

/// Errors that can occur while loading models, training, or running predictions
#[derive(Debug, Error)]
pub enum RehabError {
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    #[error("Model artifact for {modality} is incompatible: {reason}")]
    ModelMismatch { modality: Modality, reason: String },

    #[error("Missing required feature '{feature}' for {modality}")]
    MissingFeature { modality: Modality, feature: String },

    #[error("Feature '{feature}' for {modality} must be a number")]
    InvalidFeature { modality: Modality, feature: String },

    #[error("Classifier for {modality} returned class {index}, label table has {size} entries")]
    ClassIndexOutOfRange {
        modality: Modality,
        index: usize,
        size: usize,
    },

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse report: {0}")]
    ParseError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Data generation error: {0}")]
    GenerationError(String),

    #[error("Unknown modality: {0}")]
    UnknownModality(String),
}
