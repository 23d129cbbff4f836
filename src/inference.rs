//! Per-modality prediction and aggregation
//!
//! Each predictor assembles its modality's feature vector, runs the trained
//! classifier, maps the class index through the modality's label table, and
//! echoes the inputs beside the categorical output. The aggregator runs every
//! predictor whose modality is present in a [`Reading`].

use std::path::Path;

use crate::classifier::{Classifier, ModelArtifact};
use crate::error::RehabError;
use crate::types::{
    BreathingFeatures, BreathingPrediction, BreathingStatus, ClassLabel, EmotionFeatures,
    EmotionPrediction, EmotionalState, GlucoseFeatures, GlucosePrediction, GlucoseRange,
    HeartbeatFeatures, HeartbeatPrediction, HeartbeatStatus, Modality, ModalityFeatures,
    PostureFeatures, PosturePrediction, PostureType, PredictionResult, PredictionSet, Reading,
    SpeechFeatures, SpeechPattern, SpeechPrediction,
};

/// Confidence reported when a classifier has no probability output, and for
/// every breathing, speech, emotion and posture prediction. A fixed value, not
/// a calibrated estimate.
pub const FALLBACK_CONFIDENCE: f64 = 0.85;

/// The six trained classifiers, loaded once and read-only afterwards
#[derive(Debug, Clone)]
pub struct ModelContext {
    heartbeat: ModelArtifact,
    glucose: ModelArtifact,
    breathing: ModelArtifact,
    speech: ModelArtifact,
    emotion: ModelArtifact,
    posture: ModelArtifact,
}

impl ModelContext {
    /// Load `{modality}_model.json` for every modality from `models_dir`
    ///
    /// Fails on the first missing or incompatible artifact.
    pub fn load(models_dir: &Path) -> Result<Self, RehabError> {
        let mut artifacts = Vec::with_capacity(Modality::ALL.len());
        for modality in Modality::ALL {
            let path = models_dir.join(modality.model_file_name());
            let artifact = ModelArtifact::load(&path)?;
            log::info!(
                "Loaded {} model ({}) from {}",
                modality,
                artifact.classifier.name(),
                path.display()
            );
            artifacts.push(artifact);
        }
        Self::from_artifacts(artifacts)
    }

    /// Build from in-memory artifacts; each modality must appear exactly once
    pub fn from_artifacts(artifacts: Vec<ModelArtifact>) -> Result<Self, RehabError> {
        let mut slots: [Option<ModelArtifact>; 6] = Default::default();
        for artifact in artifacts {
            let modality = artifact.modality;
            artifact.validate(modality)?;
            let slot = &mut slots[slot_index(modality)];
            if slot.is_some() {
                return Err(RehabError::ModelMismatch {
                    modality,
                    reason: "more than one artifact supplied".to_string(),
                });
            }
            *slot = Some(artifact);
        }

        let [heartbeat, glucose, breathing, speech, emotion, posture] = slots;
        let take = |slot: Option<ModelArtifact>, modality: Modality| {
            slot.ok_or_else(|| RehabError::ModelNotFound(modality.model_file_name()))
        };
        Ok(Self {
            heartbeat: take(heartbeat, Modality::Heartbeat)?,
            glucose: take(glucose, Modality::Glucose)?,
            breathing: take(breathing, Modality::Breathing)?,
            speech: take(speech, Modality::Speech)?,
            emotion: take(emotion, Modality::Emotion)?,
            posture: take(posture, Modality::Posture)?,
        })
    }

    pub fn artifact(&self, modality: Modality) -> &ModelArtifact {
        match modality {
            Modality::Heartbeat => &self.heartbeat,
            Modality::Glucose => &self.glucose,
            Modality::Breathing => &self.breathing,
            Modality::Speech => &self.speech,
            Modality::Emotion => &self.emotion,
            Modality::Posture => &self.posture,
        }
    }

    /// Run every predictor whose modality is present in `reading`
    pub fn predict_all(&self, reading: &Reading) -> Result<PredictionSet, RehabError> {
        let mut set = PredictionSet::new();
        if let Some(f) = &reading.heartbeat {
            set.insert(PredictionResult::Heartbeat(predict_heartbeat(&self.heartbeat, f)?));
        }
        if let Some(f) = &reading.glucose {
            set.insert(PredictionResult::Glucose(predict_glucose(&self.glucose, f)?));
        }
        if let Some(f) = &reading.breathing {
            set.insert(PredictionResult::Breathing(predict_breathing(&self.breathing, f)?));
        }
        if let Some(f) = &reading.speech {
            set.insert(PredictionResult::Speech(predict_speech(&self.speech, f)?));
        }
        if let Some(f) = &reading.emotion {
            set.insert(PredictionResult::Emotion(predict_emotion(&self.emotion, f)?));
        }
        if let Some(f) = &reading.posture {
            set.insert(PredictionResult::Posture(predict_posture(&self.posture, f)?));
        }
        Ok(set)
    }
}

fn slot_index(modality: Modality) -> usize {
    match modality {
        Modality::Heartbeat => 0,
        Modality::Glucose => 1,
        Modality::Breathing => 2,
        Modality::Speech => 3,
        Modality::Emotion => 4,
        Modality::Posture => 5,
    }
}

/// Aggregate predictions for one reading
pub fn predict_all(models: &ModelContext, reading: &Reading) -> Result<PredictionSet, RehabError> {
    models.predict_all(reading)
}

pub fn predict_heartbeat<C: Classifier + ?Sized>(
    model: &C,
    features: &HeartbeatFeatures,
) -> Result<HeartbeatPrediction, RehabError> {
    let x = features.to_vector();
    let (status, prediction) = classify::<HeartbeatStatus, C>(model, &x)?;
    Ok(HeartbeatPrediction {
        status,
        prediction,
        confidence: probability_confidence(model, &x, prediction),
        heart_rate: features.heart_rate,
        rr_variance: features.rr_interval_variance,
    })
}

pub fn predict_glucose<C: Classifier + ?Sized>(
    model: &C,
    features: &GlucoseFeatures,
) -> Result<GlucosePrediction, RehabError> {
    let x = features.to_vector();
    let (range, prediction) = classify::<GlucoseRange, C>(model, &x)?;
    Ok(GlucosePrediction {
        range,
        prediction,
        confidence: probability_confidence(model, &x, prediction),
        age: features.age,
        bmi: features.bmi,
        meal_timing: features.meal_timing,
        activity_level: features.activity_level,
    })
}

pub fn predict_breathing<C: Classifier + ?Sized>(
    model: &C,
    features: &BreathingFeatures,
) -> Result<BreathingPrediction, RehabError> {
    let (status, prediction) = classify::<BreathingStatus, C>(model, &features.to_vector())?;
    Ok(BreathingPrediction {
        status,
        prediction,
        confidence: FALLBACK_CONFIDENCE,
        breathing_rate: features.breathing_rate,
        breath_depth: features.breath_depth,
    })
}

pub fn predict_speech<C: Classifier + ?Sized>(
    model: &C,
    features: &SpeechFeatures,
) -> Result<SpeechPrediction, RehabError> {
    let (pattern, prediction) = classify::<SpeechPattern, C>(model, &features.to_vector())?;
    Ok(SpeechPrediction {
        pattern,
        prediction,
        confidence: FALLBACK_CONFIDENCE,
        speech_rate: features.speech_rate,
        pause_frequency: features.pause_frequency,
    })
}

pub fn predict_emotion<C: Classifier + ?Sized>(
    model: &C,
    features: &EmotionFeatures,
) -> Result<EmotionPrediction, RehabError> {
    let (state, prediction) = classify::<EmotionalState, C>(model, &features.to_vector())?;
    Ok(EmotionPrediction {
        state,
        prediction,
        confidence: FALLBACK_CONFIDENCE,
        text_sentiment: features.text_sentiment,
        voice_emotion: features.voice_emotion,
        facial_emotion: features.facial_emotion,
    })
}

pub fn predict_posture<C: Classifier + ?Sized>(
    model: &C,
    features: &PostureFeatures,
) -> Result<PosturePrediction, RehabError> {
    let (posture, prediction) = classify::<PostureType, C>(model, &features.to_vector())?;
    Ok(PosturePrediction {
        posture,
        prediction,
        score: posture_score(
            features.head_tilt,
            features.shoulder_alignment,
            features.spine_angle,
        ),
        confidence: FALLBACK_CONFIDENCE,
        head_tilt: features.head_tilt,
        shoulder_alignment: features.shoulder_alignment,
        spine_angle: features.spine_angle,
    })
}

/// Posture wellness score in `[0, 100]`; 100 is upright (0°, 0°, 90°)
///
/// Deviations are normalized by 30°, 20° and 30° respectively and averaged.
pub fn posture_score(head_tilt: f64, shoulder_alignment: f64, spine_angle: f64) -> f64 {
    let head_dev = head_tilt.abs() / 30.0;
    let shoulder_dev = shoulder_alignment.abs() / 20.0;
    let spine_dev = (spine_angle - 90.0).abs() / 30.0;
    let avg_dev = (head_dev + shoulder_dev + spine_dev) / 3.0;
    (100.0 - avg_dev * 100.0).max(0.0)
}

fn classify<L, C>(model: &C, x: &[f64]) -> Result<(L, usize), RehabError>
where
    L: ClassLabel + LabelModality,
    C: Classifier + ?Sized,
{
    let index = model.predict(x);
    let label = L::from_index(index).ok_or(RehabError::ClassIndexOutOfRange {
        modality: L::MODALITY,
        index,
        size: L::ALL.len(),
    })?;
    log::debug!("{} -> {} ({})", L::MODALITY, label.as_str(), index);
    Ok((label, index))
}

/// Probability mass of the predicted class, or the fallback constant
fn probability_confidence<C: Classifier + ?Sized>(model: &C, x: &[f64], index: usize) -> f64 {
    match model.predict_proba(x).and_then(|p| p.get(index).copied()) {
        Some(p) if p.is_finite() => p.clamp(0.0, 1.0),
        _ => FALLBACK_CONFIDENCE,
    }
}

/// Modality a label enum belongs to
trait LabelModality {
    const MODALITY: Modality;
}

impl LabelModality for HeartbeatStatus {
    const MODALITY: Modality = HeartbeatFeatures::MODALITY;
}

impl LabelModality for GlucoseRange {
    const MODALITY: Modality = GlucoseFeatures::MODALITY;
}

impl LabelModality for BreathingStatus {
    const MODALITY: Modality = BreathingFeatures::MODALITY;
}

impl LabelModality for SpeechPattern {
    const MODALITY: Modality = SpeechFeatures::MODALITY;
}

impl LabelModality for EmotionalState {
    const MODALITY: Modality = EmotionFeatures::MODALITY;
}

impl LabelModality for PostureType {
    const MODALITY: Modality = PostureFeatures::MODALITY;
}

/// Constant-output models shared by tests across the crate
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::classifier::{ClassifierKind, DecisionTree};

    /// One artifact per modality, each always predicting the given class
    pub(crate) fn constant_artifacts(classes: [usize; 6]) -> Vec<ModelArtifact> {
        Modality::ALL
            .iter()
            .zip(classes)
            .map(|(&modality, class)| {
                let n = modality.label_table().len();
                ModelArtifact::new(
                    modality,
                    None,
                    ClassifierKind::DecisionTree(DecisionTree::constant(n, class)),
                )
            })
            .collect()
    }

    pub(crate) fn constant_context(classes: [usize; 6]) -> ModelContext {
        ModelContext::from_artifacts(constant_artifacts(classes)).unwrap()
    }

    /// Write constant artifacts into a fresh temp directory and return it
    pub(crate) fn write_constant_models(classes: [usize; 6]) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("rehab-models-{}", uuid::Uuid::new_v4()));
        for artifact in constant_artifacts(classes) {
            artifact
                .save(&dir.join(artifact.modality.model_file_name()))
                .unwrap();
        }
        dir
    }
}
