//! Adapter for converting report JSON into typed readings
//!
//! Report objects are keyed by modality name. Only the six known modality keys
//! are read; any other key (report ids, dates, vendor extras) is ignored, as
//! are extra keys inside a modality object such as the synthetic `label`.

use serde_json::{Map, Value};

use crate::error::RehabError;
use crate::schema::report::PatientReport;
use crate::types::{
    BreathingFeatures, EmotionFeatures, GlucoseFeatures, HeartbeatFeatures, ModalityFeatures,
    PostureFeatures, Reading, SpeechFeatures,
};

/// Adapter for converting report JSON to a [`Reading`]
pub struct ReadingAdapter;

impl ReadingAdapter {
    /// Parse a JSON string containing one report object
    pub fn parse(json: &str) -> Result<Reading, RehabError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Convert a stored patient report
    pub fn from_report(report: &PatientReport) -> Result<Reading, RehabError> {
        Self::from_object(&report.measurements)
    }

    /// Convert an already-parsed JSON value
    pub fn from_value(value: &Value) -> Result<Reading, RehabError> {
        match value {
            Value::Object(obj) => Self::from_object(obj),
            other => Err(RehabError::ParseError(format!(
                "Report must be a JSON object, got {}",
                json_type_name(other)
            ))),
        }
    }

    /// Convert a JSON object keyed by modality name
    ///
    /// A present modality missing any of its features, or carrying a
    /// non-numeric feature, fails the whole reading.
    pub fn from_object(obj: &Map<String, Value>) -> Result<Reading, RehabError> {
        Ok(Reading {
            heartbeat: extract::<HeartbeatFeatures>(obj)?,
            glucose: extract::<GlucoseFeatures>(obj)?,
            breathing: extract::<BreathingFeatures>(obj)?,
            speech: extract::<SpeechFeatures>(obj)?,
            emotion: extract::<EmotionFeatures>(obj)?,
            posture: extract::<PostureFeatures>(obj)?,
        })
    }
}

fn extract<F: ModalityFeatures>(obj: &Map<String, Value>) -> Result<Option<F>, RehabError> {
    let modality = F::MODALITY;
    let section = match obj.get(modality.as_str()) {
        None => return Ok(None),
        Some(Value::Object(section)) => section,
        Some(other) => {
            return Err(RehabError::ParseError(format!(
                "'{}' must be an object, got {}",
                modality,
                json_type_name(other)
            )))
        }
    };

    let mut values = Vec::with_capacity(F::FEATURE_NAMES.len());
    for name in F::FEATURE_NAMES {
        let value = section.get(*name).ok_or_else(|| RehabError::MissingFeature {
            modality,
            feature: name.to_string(),
        })?;
        let number = value
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| RehabError::InvalidFeature {
                modality,
                feature: name.to_string(),
            })?;
        values.push(number);
    }

    Ok(Some(F::from_values(&values)))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Modality;
    use pretty_assertions::assert_eq;

    fn sample_report_json() -> &'static str {
        r#"{
            "report_id": "B_R003",
            "date": "2026-02-02",
            "heartbeat": {"heart_rate": 96.5, "rr_interval_variance": 0.081, "label": 2},
            "glucose": {"age": 61, "bmi": 29.4, "meal_timing": 1, "activity_level": 0, "glucose_range": 2},
            "breathing": {"breathing_rate": 21.0, "breath_depth": 0.35, "rest_vs_exercise": 0, "label": 1},
            "speech": {"speech_rate": 120.0, "pause_frequency": 0.25, "pitch_variability": 0.2, "label": 1},
            "emotion": {"text_sentiment": 0.3, "voice_emotion": 0.25, "facial_emotion": 0.4, "label": 2},
            "posture": {"head_tilt": 12.0, "shoulder_alignment": -6.0, "spine_angle": 104.0, "label": 1},
            "sleep": {"hours": 6}
        }"#
    }

    #[test]
    fn test_parse_full_report() {
        let reading = ReadingAdapter::parse(sample_report_json()).unwrap();

        assert_eq!(reading.modalities(), Modality::ALL.to_vec());
        let glucose = reading.glucose.unwrap();
        assert_eq!(glucose.age, 61.0);
        assert_eq!(glucose.meal_timing, 1.0);
        assert_eq!(reading.posture.unwrap().spine_angle, 104.0);
    }

    #[test]
    fn test_absent_modalities_are_skipped() {
        let reading =
            ReadingAdapter::parse(r#"{"posture": {"head_tilt": 0, "shoulder_alignment": 0, "spine_angle": 90}}"#)
                .unwrap();

        assert_eq!(reading.modalities(), vec![Modality::Posture]);
        assert!(reading.heartbeat.is_none());
    }

    #[test]
    fn test_empty_object_yields_empty_reading() {
        let reading = ReadingAdapter::parse("{}").unwrap();
        assert!(reading.modalities().is_empty());
    }

    #[test]
    fn test_missing_feature_names_the_key() {
        let err = ReadingAdapter::parse(r#"{"heartbeat": {"heart_rate": 72}}"#).unwrap_err();

        match err {
            RehabError::MissingFeature { modality, feature } => {
                assert_eq!(modality, Modality::Heartbeat);
                assert_eq!(feature, "rr_interval_variance");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_numeric_feature_is_rejected() {
        let err = ReadingAdapter::parse(
            r#"{"emotion": {"text_sentiment": "good", "voice_emotion": 0.5, "facial_emotion": 0.5}}"#,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            RehabError::InvalidFeature { modality: Modality::Emotion, ref feature } if feature == "text_sentiment"
        ));
    }

    #[test]
    fn test_non_object_inputs_are_rejected() {
        assert!(matches!(
            ReadingAdapter::parse("[1, 2]"),
            Err(RehabError::ParseError(_))
        ));
        assert!(matches!(
            ReadingAdapter::parse(r#"{"speech": 140}"#),
            Err(RehabError::ParseError(_))
        ));
        assert!(matches!(
            ReadingAdapter::parse("not json"),
            Err(RehabError::JsonError(_))
        ));
    }

    #[test]
    fn test_from_stored_report() {
        let report: PatientReport = serde_json::from_str(sample_report_json()).unwrap();
        let reading = ReadingAdapter::from_report(&report).unwrap();

        assert_eq!(reading.heartbeat.unwrap().heart_rate, 96.5);
        assert_eq!(reading.modalities().len(), 6);
    }
}
