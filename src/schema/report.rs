//! Patient record schema
//!
//! A patient record is a flat JSON document holding demographics and a list of
//! dated reports. Each report carries one object per measured modality, keyed
//! by modality name, with the modality's feature values (and, for synthetic
//! data, the generating class label).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::types::Modality;

/// A patient and their report history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub name: String,
    pub age: u32,
    /// "M" or "F"
    pub gender: String,
    #[serde(default)]
    pub reports: Vec<PatientReport>,
}

impl PatientRecord {
    /// Find a report by id
    pub fn report(&self, report_id: &str) -> Option<&PatientReport> {
        self.reports.iter().find(|r| r.report_id == report_id)
    }

    /// Validate structural constraints on the record
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.patient_id.trim().is_empty() {
            return Err(ValidationError::EmptyPatientId);
        }

        let mut seen = HashSet::new();
        let mut previous: Option<NaiveDate> = None;
        for report in &self.reports {
            if !seen.insert(report.report_id.as_str()) {
                return Err(ValidationError::DuplicateReportId(report.report_id.clone()));
            }
            if let Some(prev) = previous {
                if report.date < prev {
                    return Err(ValidationError::OutOfOrder(report.report_id.clone()));
                }
            }
            previous = Some(report.date);
        }

        Ok(())
    }
}

/// One dated report with per-modality measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientReport {
    pub report_id: String,
    /// Report date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Modality objects keyed by modality name; unknown keys are retained
    #[serde(flatten)]
    pub measurements: Map<String, Value>,
}

impl PatientReport {
    pub fn new(report_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            report_id: report_id.into(),
            date,
            measurements: Map::new(),
        }
    }

    /// Raw measurement object for a modality, if present
    pub fn measurement(&self, modality: Modality) -> Option<&Value> {
        self.measurements.get(modality.as_str())
    }

    pub fn set_measurement(&mut self, modality: Modality, value: Value) {
        self.measurements.insert(modality.as_str().to_string(), value);
    }
}

/// Patient record validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Patient id must not be empty")]
    EmptyPatientId,

    #[error("Duplicate report id: {0}")]
    DuplicateReportId(String),

    #[error("Report {0} is dated before the preceding report")]
    OutOfOrder(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record_json() -> &'static str {
        r#"{
            "patient_id": "A",
            "name": "Patient A",
            "age": 52,
            "gender": "F",
            "reports": [
                {
                    "report_id": "A_R001",
                    "date": "2026-01-05",
                    "heartbeat": {"heart_rate": 74.2, "rr_interval_variance": 0.051, "label": 0},
                    "glucose": {"age": 40, "bmi": 24.1, "meal_timing": 1, "activity_level": 2, "glucose_range": 1}
                },
                {
                    "report_id": "A_R002",
                    "date": "2026-01-12",
                    "posture": {"head_tilt": 3.0, "shoulder_alignment": -1.5, "spine_angle": 88.0, "label": 0}
                }
            ]
        }"#
    }

    #[test]
    fn test_parse_record() {
        let record: PatientRecord = serde_json::from_str(sample_record_json()).unwrap();

        assert_eq!(record.patient_id, "A");
        assert_eq!(record.reports.len(), 2);
        assert_eq!(
            record.reports[0].date,
            NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
        );
        assert!(record.reports[0].measurement(Modality::Heartbeat).is_some());
        assert!(record.reports[0].measurement(Modality::Posture).is_none());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_report_round_trip_keeps_flat_shape() {
        let record: PatientRecord = serde_json::from_str(sample_record_json()).unwrap();
        let value = serde_json::to_value(&record.reports[1]).unwrap();

        assert_eq!(value["report_id"], "A_R002");
        assert_eq!(value["date"], "2026-01-12");
        assert_eq!(value["posture"]["spine_angle"], 88.0);
    }

    #[test]
    fn test_lookup_report() {
        let record: PatientRecord = serde_json::from_str(sample_record_json()).unwrap();
        assert!(record.report("A_R002").is_some());
        assert!(record.report("A_R999").is_none());
    }

    #[test]
    fn test_validate_duplicate_ids() {
        let mut record: PatientRecord = serde_json::from_str(sample_record_json()).unwrap();
        record.reports[1].report_id = "A_R001".to_string();

        assert_eq!(
            record.validate(),
            Err(ValidationError::DuplicateReportId("A_R001".to_string()))
        );
    }

    #[test]
    fn test_validate_out_of_order() {
        let mut record: PatientRecord = serde_json::from_str(sample_record_json()).unwrap();
        record.reports.reverse();

        assert_eq!(
            record.validate(),
            Err(ValidationError::OutOfOrder("A_R001".to_string()))
        );
    }
}
