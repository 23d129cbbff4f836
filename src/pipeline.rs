//! Pipeline orchestration
//!
//! This module provides the public API for RehabSense.
//! It orchestrates the full path from report JSON to predictions,
//! recommendation bundles and the summary message.

use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::RehabError;
use crate::inference::ModelContext;
use crate::recommendations::{recommend_all, summary_message};
use crate::schema::{PatientRecord, PatientReport, ReadingAdapter};
use crate::types::{PredictionSet, Reading, RecommendationSet};

/// Everything derived from one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportAnalysis {
    pub predictions: PredictionSet,
    pub recommendations: RecommendationSet,
    pub summary: String,
}

/// Predictions for one historical report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub report_id: String,
    pub predictions: PredictionSet,
}

/// Analyze one report JSON object with the models in `models_dir`.
///
/// Loads all six model artifacts on every call; use [`RehabProcessor`] to
/// load them once and serve many reports.
///
/// # Example
/// ```ignore
/// let json = analyze_report(Path::new("models"), r#"{"heartbeat": {...}}"#)?;
/// ```
pub fn analyze_report(models_dir: &Path, report_json: &str) -> Result<String, RehabError> {
    let processor = RehabProcessor::load(models_dir)?;
    let analysis = processor.analyze_json(report_json)?;
    Ok(serde_json::to_string(&analysis)?)
}

/// Holds the six trained models and serves analyses against them.
///
/// Models are loaded once at construction and never mutated, so a processor
/// can serve any number of independent reports.
#[derive(Debug, Clone)]
pub struct RehabProcessor {
    models: ModelContext,
}

impl RehabProcessor {
    /// Load every model artifact from `models_dir`
    pub fn load(models_dir: impl AsRef<Path>) -> Result<Self, RehabError> {
        let models = ModelContext::load(models_dir.as_ref())?;
        Ok(Self::from_context(models))
    }

    pub fn from_context(models: ModelContext) -> Self {
        Self { models }
    }

    pub fn models(&self) -> &ModelContext {
        &self.models
    }

    /// Predict every present modality
    pub fn predict(&self, reading: &Reading) -> Result<PredictionSet, RehabError> {
        let predictions = self.models.predict_all(reading)?;
        log::debug!("Predicted {} modalities", predictions.len());
        Ok(predictions)
    }

    /// Predictions, recommendation bundles and summary for one reading
    pub fn analyze(&self, reading: &Reading) -> Result<ReportAnalysis, RehabError> {
        let predictions = self.predict(reading)?;
        let recommendations = recommend_all(&predictions);
        let summary = summary_message(&predictions);
        Ok(ReportAnalysis {
            predictions,
            recommendations,
            summary,
        })
    }

    /// Analyze a report given as a JSON string
    pub fn analyze_json(&self, report_json: &str) -> Result<ReportAnalysis, RehabError> {
        let reading = ReadingAdapter::parse(report_json)?;
        self.analyze(&reading)
    }

    /// Analyze a stored patient report
    pub fn analyze_report(&self, report: &PatientReport) -> Result<ReportAnalysis, RehabError> {
        let reading = ReadingAdapter::from_report(report)?;
        self.analyze(&reading)
    }

    /// Run predictions for every report of a patient, in stored order.
    /// The first failing report aborts the whole history.
    pub fn history(&self, record: &PatientRecord) -> Result<Vec<HistoryEntry>, RehabError> {
        record
            .reports
            .iter()
            .map(|report| {
                let reading = ReadingAdapter::from_report(report)?;
                Ok(HistoryEntry {
                    date: report.date,
                    report_id: report.report_id.clone(),
                    predictions: self.predict(&reading)?,
                })
            })
            .collect()
    }
}
