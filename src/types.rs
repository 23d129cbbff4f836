//! Core types for the RehabSense pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: per-modality readings, classifier labels, prediction results, and
//! recommendation bundles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::RehabError;

/// Measured health dimension, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Heartbeat,
    Glucose,
    Breathing,
    Speech,
    Emotion,
    Posture,
}

impl Modality {
    /// All modalities in canonical order
    pub const ALL: [Modality; 6] = [
        Modality::Heartbeat,
        Modality::Glucose,
        Modality::Breathing,
        Modality::Speech,
        Modality::Emotion,
        Modality::Posture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Heartbeat => "heartbeat",
            Modality::Glucose => "glucose",
            Modality::Breathing => "breathing",
            Modality::Speech => "speech",
            Modality::Emotion => "emotion",
            Modality::Posture => "posture",
        }
    }

    /// Ordered feature names the modality's classifier expects
    pub fn feature_names(&self) -> &'static [&'static str] {
        match self {
            Modality::Heartbeat => HeartbeatFeatures::FEATURE_NAMES,
            Modality::Glucose => GlucoseFeatures::FEATURE_NAMES,
            Modality::Breathing => BreathingFeatures::FEATURE_NAMES,
            Modality::Speech => SpeechFeatures::FEATURE_NAMES,
            Modality::Emotion => EmotionFeatures::FEATURE_NAMES,
            Modality::Posture => PostureFeatures::FEATURE_NAMES,
        }
    }

    /// Ordered label table for the modality's classifier output
    pub fn label_table(&self) -> Vec<&'static str> {
        match self {
            Modality::Heartbeat => label_strings::<HeartbeatStatus>(),
            Modality::Glucose => label_strings::<GlucoseRange>(),
            Modality::Breathing => label_strings::<BreathingStatus>(),
            Modality::Speech => label_strings::<SpeechPattern>(),
            Modality::Emotion => label_strings::<EmotionalState>(),
            Modality::Posture => label_strings::<PostureType>(),
        }
    }

    /// Key holding the class label in synthetic report records
    pub fn label_key(&self) -> &'static str {
        match self {
            Modality::Glucose => "glucose_range",
            _ => "label",
        }
    }

    /// File name of the persisted classifier artifact
    pub fn model_file_name(&self) -> String {
        format!("{}_model.json", self.as_str())
    }

    /// File name of the synthetic training dataset
    pub fn training_file_name(&self) -> String {
        format!("{}_train.json", self.as_str())
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = RehabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Modality::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| RehabError::UnknownModality(s.to_string()))
    }
}

// ============================================================================
// Labels
// ============================================================================

/// A closed set of classifier labels backed by a fixed, ordered label table
pub trait ClassLabel: Copy + Sized + 'static {
    /// Label table; a variant's position is its class index
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    fn parse_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.as_str() == label)
    }
}

fn label_strings<L: ClassLabel>() -> Vec<&'static str> {
    L::ALL.iter().map(|l| l.as_str()).collect()
}

/// Heartbeat rhythm classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeartbeatStatus {
    Normal,
    Bradycardia,
    Tachycardia,
    Irregular,
}

impl ClassLabel for HeartbeatStatus {
    const ALL: &'static [Self] = &[
        HeartbeatStatus::Normal,
        HeartbeatStatus::Bradycardia,
        HeartbeatStatus::Tachycardia,
        HeartbeatStatus::Irregular,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            HeartbeatStatus::Normal => "Normal",
            HeartbeatStatus::Bradycardia => "Bradycardia",
            HeartbeatStatus::Tachycardia => "Tachycardia",
            HeartbeatStatus::Irregular => "Irregular",
        }
    }
}

/// Estimated blood glucose range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GlucoseRange {
    Low,
    Normal,
    High,
}

impl ClassLabel for GlucoseRange {
    const ALL: &'static [Self] = &[GlucoseRange::Low, GlucoseRange::Normal, GlucoseRange::High];

    fn as_str(&self) -> &'static str {
        match self {
            GlucoseRange::Low => "Low",
            GlucoseRange::Normal => "Normal",
            GlucoseRange::High => "High",
        }
    }
}

/// Breathing pattern classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreathingStatus {
    Normal,
    #[serde(rename = "Shallow Breathing")]
    ShallowBreathing,
    Irregular,
    #[serde(rename = "Apnea Risk")]
    ApneaRisk,
}

impl ClassLabel for BreathingStatus {
    const ALL: &'static [Self] = &[
        BreathingStatus::Normal,
        BreathingStatus::ShallowBreathing,
        BreathingStatus::Irregular,
        BreathingStatus::ApneaRisk,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            BreathingStatus::Normal => "Normal",
            BreathingStatus::ShallowBreathing => "Shallow Breathing",
            BreathingStatus::Irregular => "Irregular",
            BreathingStatus::ApneaRisk => "Apnea Risk",
        }
    }
}

/// Speech pattern classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechPattern {
    #[serde(rename = "Normal Speech")]
    NormalSpeech,
    #[serde(rename = "Slurred/Slow")]
    SlurredSlow,
    #[serde(rename = "Stressed Speech")]
    StressedSpeech,
}

impl ClassLabel for SpeechPattern {
    const ALL: &'static [Self] = &[
        SpeechPattern::NormalSpeech,
        SpeechPattern::SlurredSlow,
        SpeechPattern::StressedSpeech,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            SpeechPattern::NormalSpeech => "Normal Speech",
            SpeechPattern::SlurredSlow => "Slurred/Slow",
            SpeechPattern::StressedSpeech => "Stressed Speech",
        }
    }
}

/// Emotional state classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionalState {
    Happy,
    Neutral,
    Stressed,
    Sad,
}

impl ClassLabel for EmotionalState {
    const ALL: &'static [Self] = &[
        EmotionalState::Happy,
        EmotionalState::Neutral,
        EmotionalState::Stressed,
        EmotionalState::Sad,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            EmotionalState::Happy => "Happy",
            EmotionalState::Neutral => "Neutral",
            EmotionalState::Stressed => "Stressed",
            EmotionalState::Sad => "Sad",
        }
    }
}

/// Posture classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostureType {
    #[serde(rename = "Good Posture")]
    GoodPosture,
    #[serde(rename = "Forward Head Posture")]
    ForwardHeadPosture,
    #[serde(rename = "Slouched Sitting")]
    SlouchedSitting,
}

impl ClassLabel for PostureType {
    const ALL: &'static [Self] = &[
        PostureType::GoodPosture,
        PostureType::ForwardHeadPosture,
        PostureType::SlouchedSitting,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PostureType::GoodPosture => "Good Posture",
            PostureType::ForwardHeadPosture => "Forward Head Posture",
            PostureType::SlouchedSitting => "Slouched Sitting",
        }
    }
}

// ============================================================================
// Readings
// ============================================================================

/// Fixed, ordered feature set for one modality
pub trait ModalityFeatures: Sized {
    const MODALITY: Modality;
    const FEATURE_NAMES: &'static [&'static str];

    /// Build from values ordered as `FEATURE_NAMES`
    fn from_values(values: &[f64]) -> Self;

    /// Classifier input vector, ordered as `FEATURE_NAMES`
    fn to_vector(&self) -> Vec<f64>;
}

/// ECG-derived heartbeat features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatFeatures {
    /// Heart rate (bpm)
    pub heart_rate: f64,
    /// Variance of RR intervals (s²)
    pub rr_interval_variance: f64,
}

impl ModalityFeatures for HeartbeatFeatures {
    const MODALITY: Modality = Modality::Heartbeat;
    const FEATURE_NAMES: &'static [&'static str] = &["heart_rate", "rr_interval_variance"];

    fn from_values(values: &[f64]) -> Self {
        Self {
            heart_rate: values[0],
            rr_interval_variance: values[1],
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        vec![self.heart_rate, self.rr_interval_variance]
    }
}

/// Blood glucose estimation inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlucoseFeatures {
    /// Age in years
    pub age: f64,
    /// Body mass index
    pub bmi: f64,
    /// 0: fasting, 1: post-meal, 2: pre-meal, 3: random
    pub meal_timing: f64,
    /// 0: low, 1: moderate, 2: high
    pub activity_level: f64,
}

impl ModalityFeatures for GlucoseFeatures {
    const MODALITY: Modality = Modality::Glucose;
    const FEATURE_NAMES: &'static [&'static str] = &["age", "bmi", "meal_timing", "activity_level"];

    fn from_values(values: &[f64]) -> Self {
        Self {
            age: values[0],
            bmi: values[1],
            meal_timing: values[2],
            activity_level: values[3],
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        vec![self.age, self.bmi, self.meal_timing, self.activity_level]
    }
}

/// Breathing pattern features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathingFeatures {
    /// Breaths per minute
    pub breathing_rate: f64,
    /// Relative breath depth (0-1)
    pub breath_depth: f64,
    /// 0: rest, 1: exercise
    pub rest_vs_exercise: f64,
}

impl ModalityFeatures for BreathingFeatures {
    const MODALITY: Modality = Modality::Breathing;
    const FEATURE_NAMES: &'static [&'static str] =
        &["breathing_rate", "breath_depth", "rest_vs_exercise"];

    fn from_values(values: &[f64]) -> Self {
        Self {
            breathing_rate: values[0],
            breath_depth: values[1],
            rest_vs_exercise: values[2],
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        vec![self.breathing_rate, self.breath_depth, self.rest_vs_exercise]
    }
}

/// Speech pattern features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechFeatures {
    /// Words per minute
    pub speech_rate: f64,
    pub pause_frequency: f64,
    pub pitch_variability: f64,
}

impl ModalityFeatures for SpeechFeatures {
    const MODALITY: Modality = Modality::Speech;
    const FEATURE_NAMES: &'static [&'static str] =
        &["speech_rate", "pause_frequency", "pitch_variability"];

    fn from_values(values: &[f64]) -> Self {
        Self {
            speech_rate: values[0],
            pause_frequency: values[1],
            pitch_variability: values[2],
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        vec![self.speech_rate, self.pause_frequency, self.pitch_variability]
    }
}

/// Multi-channel emotion features, each in 0-1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionFeatures {
    pub text_sentiment: f64,
    pub voice_emotion: f64,
    pub facial_emotion: f64,
}

impl ModalityFeatures for EmotionFeatures {
    const MODALITY: Modality = Modality::Emotion;
    const FEATURE_NAMES: &'static [&'static str] =
        &["text_sentiment", "voice_emotion", "facial_emotion"];

    fn from_values(values: &[f64]) -> Self {
        Self {
            text_sentiment: values[0],
            voice_emotion: values[1],
            facial_emotion: values[2],
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        vec![self.text_sentiment, self.voice_emotion, self.facial_emotion]
    }
}

/// Posture keypoint angles (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureFeatures {
    pub head_tilt: f64,
    pub shoulder_alignment: f64,
    pub spine_angle: f64,
}

impl ModalityFeatures for PostureFeatures {
    const MODALITY: Modality = Modality::Posture;
    const FEATURE_NAMES: &'static [&'static str] =
        &["head_tilt", "shoulder_alignment", "spine_angle"];

    fn from_values(values: &[f64]) -> Self {
        Self {
            head_tilt: values[0],
            shoulder_alignment: values[1],
            spine_angle: values[2],
        }
    }

    fn to_vector(&self) -> Vec<f64> {
        vec![self.head_tilt, self.shoulder_alignment, self.spine_angle]
    }
}

/// One report's raw per-modality features. Absent modalities are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat: Option<HeartbeatFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glucose: Option<GlucoseFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breathing: Option<BreathingFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<SpeechFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posture: Option<PostureFeatures>,
}

impl Reading {
    /// Modalities present in this reading, in canonical order
    pub fn modalities(&self) -> Vec<Modality> {
        Modality::ALL
            .iter()
            .copied()
            .filter(|m| match m {
                Modality::Heartbeat => self.heartbeat.is_some(),
                Modality::Glucose => self.glucose.is_some(),
                Modality::Breathing => self.breathing.is_some(),
                Modality::Speech => self.speech.is_some(),
                Modality::Emotion => self.emotion.is_some(),
                Modality::Posture => self.posture.is_some(),
            })
            .collect()
    }
}

// ============================================================================
// Predictions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartbeatPrediction {
    pub status: HeartbeatStatus,
    pub prediction: usize,
    pub confidence: f64,
    pub heart_rate: f64,
    pub rr_variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlucosePrediction {
    pub range: GlucoseRange,
    pub prediction: usize,
    pub confidence: f64,
    pub age: f64,
    pub bmi: f64,
    pub meal_timing: f64,
    pub activity_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreathingPrediction {
    pub status: BreathingStatus,
    pub prediction: usize,
    pub confidence: f64,
    pub breathing_rate: f64,
    pub breath_depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeechPrediction {
    pub pattern: SpeechPattern,
    pub prediction: usize,
    pub confidence: f64,
    pub speech_rate: f64,
    pub pause_frequency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionPrediction {
    pub state: EmotionalState,
    pub prediction: usize,
    pub confidence: f64,
    pub text_sentiment: f64,
    pub voice_emotion: f64,
    pub facial_emotion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PosturePrediction {
    pub posture: PostureType,
    pub prediction: usize,
    /// Wellness score (0-100), computed independently of the classifier
    pub score: f64,
    pub confidence: f64,
    pub head_tilt: f64,
    pub shoulder_alignment: f64,
    pub spine_angle: f64,
}

/// Per-modality prediction result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionResult {
    Heartbeat(HeartbeatPrediction),
    Glucose(GlucosePrediction),
    Breathing(BreathingPrediction),
    Speech(SpeechPrediction),
    Emotion(EmotionPrediction),
    Posture(PosturePrediction),
}

impl PredictionResult {
    pub fn modality(&self) -> Modality {
        match self {
            PredictionResult::Heartbeat(_) => Modality::Heartbeat,
            PredictionResult::Glucose(_) => Modality::Glucose,
            PredictionResult::Breathing(_) => Modality::Breathing,
            PredictionResult::Speech(_) => Modality::Speech,
            PredictionResult::Emotion(_) => Modality::Emotion,
            PredictionResult::Posture(_) => Modality::Posture,
        }
    }

    /// Human-readable predicted label
    pub fn label(&self) -> &'static str {
        match self {
            PredictionResult::Heartbeat(p) => p.status.as_str(),
            PredictionResult::Glucose(p) => p.range.as_str(),
            PredictionResult::Breathing(p) => p.status.as_str(),
            PredictionResult::Speech(p) => p.pattern.as_str(),
            PredictionResult::Emotion(p) => p.state.as_str(),
            PredictionResult::Posture(p) => p.posture.as_str(),
        }
    }

    pub fn class_index(&self) -> usize {
        match self {
            PredictionResult::Heartbeat(p) => p.prediction,
            PredictionResult::Glucose(p) => p.prediction,
            PredictionResult::Breathing(p) => p.prediction,
            PredictionResult::Speech(p) => p.prediction,
            PredictionResult::Emotion(p) => p.prediction,
            PredictionResult::Posture(p) => p.prediction,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            PredictionResult::Heartbeat(p) => p.confidence,
            PredictionResult::Glucose(p) => p.confidence,
            PredictionResult::Breathing(p) => p.confidence,
            PredictionResult::Speech(p) => p.confidence,
            PredictionResult::Emotion(p) => p.confidence,
            PredictionResult::Posture(p) => p.confidence,
        }
    }
}

/// Prediction results keyed by modality, covering only the modalities present
/// in the source reading
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PredictionSet {
    results: BTreeMap<Modality, PredictionResult>,
}

impl PredictionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result: PredictionResult) {
        self.results.insert(result.modality(), result);
    }

    pub fn get(&self, modality: Modality) -> Option<&PredictionResult> {
        self.results.get(&modality)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn modalities(&self) -> Vec<Modality> {
        self.results.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PredictionResult> {
        self.results.values()
    }
}

impl FromIterator<PredictionResult> for PredictionSet {
    fn from_iter<I: IntoIterator<Item = PredictionResult>>(iter: I) -> Self {
        let mut set = PredictionSet::new();
        for result in iter {
            set.insert(result);
        }
        set
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Static recommendation content selected for one modality's outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationBundle {
    pub title: String,
    pub status: String,
    pub exercises: Vec<String>,
    pub lifestyle: Vec<String>,
    pub tips: Vec<String>,
}

impl RecommendationBundle {
    /// Bundle with no content, used when a label has no matching entry
    pub fn empty(title: &str, status: String) -> Self {
        Self {
            title: title.to_string(),
            status,
            exercises: Vec::new(),
            lifestyle: Vec::new(),
            tips: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty() && self.lifestyle.is_empty() && self.tips.is_empty()
    }
}

/// Recommendation bundles keyed by modality
pub type RecommendationSet = BTreeMap<Modality, RecommendationBundle>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_label_tables_canonical_order() {
        assert_eq!(
            Modality::Heartbeat.label_table(),
            vec!["Normal", "Bradycardia", "Tachycardia", "Irregular"]
        );
        assert_eq!(Modality::Glucose.label_table(), vec!["Low", "Normal", "High"]);
        assert_eq!(
            Modality::Breathing.label_table(),
            vec!["Normal", "Shallow Breathing", "Irregular", "Apnea Risk"]
        );
        assert_eq!(
            Modality::Speech.label_table(),
            vec!["Normal Speech", "Slurred/Slow", "Stressed Speech"]
        );
        assert_eq!(
            Modality::Emotion.label_table(),
            vec!["Happy", "Neutral", "Stressed", "Sad"]
        );
        assert_eq!(
            Modality::Posture.label_table(),
            vec!["Good Posture", "Forward Head Posture", "Slouched Sitting"]
        );
    }

    #[test]
    fn test_label_index_round_trip() {
        for (i, label) in BreathingStatus::ALL.iter().enumerate() {
            assert_eq!(BreathingStatus::from_index(i), Some(*label));
            assert_eq!(BreathingStatus::parse_label(label.as_str()), Some(*label));
        }
        assert_eq!(BreathingStatus::from_index(4), None);
        assert_eq!(BreathingStatus::parse_label("Shallow"), None);
    }

    #[test]
    fn test_label_serializes_as_display_string() {
        let json = serde_json::to_string(&PostureType::SlouchedSitting).unwrap();
        assert_eq!(json, "\"Slouched Sitting\"");

        let parsed: SpeechPattern = serde_json::from_str("\"Slurred/Slow\"").unwrap();
        assert_eq!(parsed, SpeechPattern::SlurredSlow);
    }

    #[test]
    fn test_modality_parse() {
        assert_eq!("posture".parse::<Modality>().unwrap(), Modality::Posture);
        assert!(matches!(
            "sleep".parse::<Modality>(),
            Err(RehabError::UnknownModality(_))
        ));
    }

    #[test]
    fn test_prediction_set_serializes_as_map() {
        let set: PredictionSet = vec![PredictionResult::Heartbeat(HeartbeatPrediction {
            status: HeartbeatStatus::Tachycardia,
            prediction: 2,
            confidence: 0.6,
            heart_rate: 110.0,
            rr_variance: 0.07,
        })]
        .into_iter()
        .collect();

        let value = serde_json::to_value(&set).unwrap();
        assert_eq!(value["heartbeat"]["status"], "Tachycardia");
        assert_eq!(value["heartbeat"]["prediction"], 2);
        assert_eq!(value["heartbeat"]["rr_variance"], 0.07);
        assert!(value.get("glucose").is_none());
    }

    #[test]
    fn test_reading_modalities_in_canonical_order() {
        let reading = Reading {
            posture: Some(PostureFeatures {
                head_tilt: 0.0,
                shoulder_alignment: 0.0,
                spine_angle: 90.0,
            }),
            heartbeat: Some(HeartbeatFeatures {
                heart_rate: 72.0,
                rr_interval_variance: 0.05,
            }),
            ..Default::default()
        };

        assert_eq!(
            reading.modalities(),
            vec![Modality::Heartbeat, Modality::Posture]
        );
    }
}
