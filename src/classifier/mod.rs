//! Classifiers and persisted model artifacts
//!
//! Each modality is served by one small trained classifier. A classifier maps
//! a fixed-length feature vector to a class index and may expose a
//! class-probability vector. Trained classifiers are persisted as JSON
//! [`ModelArtifact`]s, optionally preceded by a [`StandardScaler`].

mod boosting;
mod forest;
mod knn;
mod logistic;
mod scaler;
mod svm;
mod tree;

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use knn::{KNearestNeighbors, KnnParams};
pub use logistic::{LogisticParams, LogisticRegression};
pub use scaler::StandardScaler;
pub use svm::{KernelSvm, SvmParams};
pub use tree::{ClassWeight, DecisionTree, TreeParams};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::error::RehabError;
use crate::types::Modality;

/// Decision function over a fixed-length feature vector
pub trait Classifier {
    /// Number of classes the classifier can emit
    fn n_classes(&self) -> usize;

    /// Predicted class index
    fn predict(&self, x: &[f64]) -> usize;

    /// Class-probability vector, if the classifier exposes one
    fn predict_proba(&self, _x: &[f64]) -> Option<Vec<f64>> {
        None
    }
}

/// Trained classifier, tagged by algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierKind {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    Svm(KernelSvm),
    LogisticRegression(LogisticRegression),
    KNearestNeighbors(KNearestNeighbors),
    DecisionTree(DecisionTree),
}

impl ClassifierKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClassifierKind::RandomForest(_) => "random_forest",
            ClassifierKind::GradientBoosting(_) => "gradient_boosting",
            ClassifierKind::Svm(_) => "svm",
            ClassifierKind::LogisticRegression(_) => "logistic_regression",
            ClassifierKind::KNearestNeighbors(_) => "k_nearest_neighbors",
            ClassifierKind::DecisionTree(_) => "decision_tree",
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ClassifierKind::RandomForest(c) => c,
            ClassifierKind::GradientBoosting(c) => c,
            ClassifierKind::Svm(c) => c,
            ClassifierKind::LogisticRegression(c) => c,
            ClassifierKind::KNearestNeighbors(c) => c,
            ClassifierKind::DecisionTree(c) => c,
        }
    }
}

impl Classifier for ClassifierKind {
    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }

    fn predict(&self, x: &[f64]) -> usize {
        self.inner().predict(x)
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        self.inner().predict_proba(x)
    }
}

/// A serialized trained classifier for one modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub artifact_id: Uuid,
    pub modality: Modality,
    /// Input feature order the classifier was trained on
    pub feature_names: Vec<String>,
    /// Output label table; a class index points into this list
    pub class_labels: Vec<String>,
    pub trained_at: DateTime<Utc>,
    /// Held-out accuracy measured at training time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Standardization applied before the classifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    pub classifier: ClassifierKind,
}

impl ModelArtifact {
    /// Wrap a trained classifier with the modality's feature and label tables
    pub fn new(modality: Modality, scaler: Option<StandardScaler>, classifier: ClassifierKind) -> Self {
        Self {
            artifact_id: Uuid::new_v4(),
            modality,
            feature_names: modality.feature_names().iter().map(|s| s.to_string()).collect(),
            class_labels: modality.label_table().iter().map(|s| s.to_string()).collect(),
            trained_at: Utc::now(),
            accuracy: None,
            scaler,
            classifier,
        }
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Load an artifact from a JSON file
    pub fn load(path: &Path) -> Result<Self, RehabError> {
        if !path.exists() {
            return Err(RehabError::ModelNotFound(path.display().to_string()));
        }
        let json = fs::read_to_string(path)?;
        let artifact = serde_json::from_str(&json)?;
        Ok(artifact)
    }

    /// Write the artifact as JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), RehabError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check that the artifact serves the given modality's feature and label tables
    pub fn validate(&self, modality: Modality) -> Result<(), RehabError> {
        let mismatch = |reason: String| RehabError::ModelMismatch { modality, reason };

        if self.modality != modality {
            return Err(mismatch(format!("artifact was trained for {}", self.modality)));
        }

        let expected_features = modality.feature_names();
        if self.feature_names.len() != expected_features.len()
            || self
                .feature_names
                .iter()
                .zip(expected_features)
                .any(|(actual, expected)| actual != expected)
        {
            return Err(mismatch(format!(
                "expected features {:?}, artifact has {:?}",
                expected_features, self.feature_names
            )));
        }

        let expected_labels = modality.label_table();
        if self.class_labels != expected_labels {
            return Err(mismatch(format!(
                "expected labels {:?}, artifact has {:?}",
                expected_labels, self.class_labels
            )));
        }

        if self.classifier.n_classes() != expected_labels.len() {
            return Err(mismatch(format!(
                "classifier emits {} classes, label table has {}",
                self.classifier.n_classes(),
                expected_labels.len()
            )));
        }

        if let Some(scaler) = &self.scaler {
            if scaler.n_features() != expected_features.len() {
                return Err(mismatch(format!(
                    "scaler expects {} features, modality has {}",
                    scaler.n_features(),
                    expected_features.len()
                )));
            }
        }

        Ok(())
    }

    fn prepare(&self, x: &[f64]) -> Vec<f64> {
        match &self.scaler {
            Some(scaler) => scaler.transform(x),
            None => x.to_vec(),
        }
    }
}

impl Classifier for ModelArtifact {
    fn n_classes(&self) -> usize {
        self.classifier.n_classes()
    }

    fn predict(&self, x: &[f64]) -> usize {
        self.classifier.predict(&self.prepare(x))
    }

    fn predict_proba(&self, x: &[f64]) -> Option<Vec<f64>> {
        self.classifier.predict_proba(&self.prepare(x))
    }
}

/// Index of the largest value; the first one wins ties
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

/// Numerically stable softmax
pub(crate) fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.iter().map(|e| e / total).collect()
}

/// Per-class sample counts
pub(crate) fn class_counts(y: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &label in y {
        counts[label] += 1;
    }
    counts
}

/// Check a training set's shape before fitting
pub(crate) fn check_training_set(
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
) -> Result<usize, RehabError> {
    if x.is_empty() {
        return Err(RehabError::TrainingError("training set is empty".to_string()));
    }
    if x.len() != y.len() {
        return Err(RehabError::TrainingError(format!(
            "{} samples but {} labels",
            x.len(),
            y.len()
        )));
    }
    let n_features = x[0].len();
    if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
        return Err(RehabError::TrainingError(
            "samples must share a non-zero feature count".to_string(),
        ));
    }
    if let Some(bad) = y.iter().find(|&&label| label >= n_classes) {
        return Err(RehabError::TrainingError(format!(
            "label {} outside 0..{}",
            bad, n_classes
        )));
    }
    Ok(n_features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn constant_artifact(modality: Modality, class: usize) -> ModelArtifact {
        let n = modality.label_table().len();
        ModelArtifact::new(
            modality,
            None,
            ClassifierKind::DecisionTree(DecisionTree::constant(n, class)),
        )
    }

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[0.2, 0.5, 0.5, 0.1]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        let total: f64 = p.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_artifact_tables_follow_modality() {
        let artifact = constant_artifact(Modality::Glucose, 1);

        assert_eq!(
            artifact.feature_names,
            vec!["age", "bmi", "meal_timing", "activity_level"]
        );
        assert_eq!(artifact.class_labels, vec!["Low", "Normal", "High"]);
        assert!(artifact.validate(Modality::Glucose).is_ok());
    }

    #[test]
    fn test_validate_rejects_wrong_modality() {
        let artifact = constant_artifact(Modality::Speech, 0);
        assert!(matches!(
            artifact.validate(Modality::Posture),
            Err(RehabError::ModelMismatch { modality: Modality::Posture, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_class_count_mismatch() {
        let artifact = ModelArtifact::new(
            Modality::Heartbeat,
            None,
            ClassifierKind::DecisionTree(DecisionTree::constant(3, 0)),
        );
        assert!(matches!(
            artifact.validate(Modality::Heartbeat),
            Err(RehabError::ModelMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_renamed_feature() {
        let mut artifact = constant_artifact(Modality::Heartbeat, 0);
        artifact.feature_names[1] = "rr_variance".to_string();
        assert!(matches!(
            artifact.validate(Modality::Heartbeat),
            Err(RehabError::ModelMismatch { .. })
        ));
    }

    #[test]
    fn test_artifact_json_round_trip() {
        let artifact = constant_artifact(Modality::Posture, 2).with_accuracy(0.5);
        let json = serde_json::to_string(&artifact).unwrap();
        let restored: ModelArtifact = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, artifact);
        assert_eq!(restored.predict(&[0.0, 0.0, 90.0]), 2);
        assert!(json.contains("\"kind\":\"decision_tree\""));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join(format!("rehab-missing-{}.json", Uuid::new_v4()));
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(RehabError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_check_training_set() {
        let x = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        assert_eq!(check_training_set(&x, &[0, 1], 2).unwrap(), 2);
        assert!(check_training_set(&x, &[0], 2).is_err());
        assert!(check_training_set(&x, &[0, 2], 2).is_err());
        assert!(check_training_set(&[], &[], 2).is_err());
    }
}
