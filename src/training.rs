//! Classifier training and evaluation
//!
//! Each modality has a fixed algorithm and hyper-parameter set. Training holds
//! out a stratified test split, fits on the rest, reports accuracy plus
//! per-class precision, recall and F1, and persists the fitted model as a
//! [`ModelArtifact`].

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::classifier::{
    BoostingParams, ClassWeight, Classifier, ClassifierKind, DecisionTree, ForestParams,
    GradientBoosting, KNearestNeighbors, KernelSvm, KnnParams, LogisticParams,
    LogisticRegression, ModelArtifact, RandomForest, StandardScaler, SvmParams, TreeParams,
};
use crate::error::RehabError;
use crate::store::PatientStore;
use crate::synthetic::{Dataset, DEFAULT_SEED};
use crate::types::Modality;

/// Default held-out fraction
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Split and seed settings
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub seed: u64,
    /// Fraction of each class held out for evaluation
    pub test_size: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            test_size: DEFAULT_TEST_SIZE,
        }
    }
}

/// Held-out metrics for one class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Held-out evaluation of one trained model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub classes: Vec<ClassMetrics>,
}

/// Outcome of training one modality
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub modality: Modality,
    pub algorithm: String,
    pub n_train: usize,
    pub n_test: usize,
    pub evaluation: Evaluation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,
}

/// Split sample indices into (train, test), preserving class proportions.
///
/// Every class with at least two samples keeps one in each side.
pub fn stratified_split(
    labels: &[usize],
    n_classes: usize,
    test_size: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, Vec<usize>) {
    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &label) in labels.iter().enumerate() {
        if let Some(bucket) = by_class.get_mut(label) {
            bucket.push(i);
        }
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for mut bucket in by_class {
        bucket.shuffle(rng);
        let count = bucket.len();
        let mut n_test = (count as f64 * test_size).round() as usize;
        if count >= 2 {
            n_test = n_test.clamp(1, count - 1);
        } else {
            n_test = 0;
        }
        test.extend_from_slice(&bucket[..n_test]);
        train.extend_from_slice(&bucket[n_test..]);
    }

    train.shuffle(rng);
    test.shuffle(rng);
    (train, test)
}

/// Fit the modality's classifier (with its preprocessing) on a training set
pub fn fit_classifier(
    modality: Modality,
    x: &[Vec<f64>],
    y: &[usize],
    rng: &mut StdRng,
) -> Result<ModelArtifact, RehabError> {
    let n_classes = modality.label_table().len();

    let (scaler, classifier) = match modality {
        Modality::Heartbeat => {
            let params = ForestParams {
                n_trees: 100,
                max_depth: Some(10),
                class_weight: ClassWeight::Balanced,
                ..Default::default()
            };
            (
                None,
                ClassifierKind::RandomForest(RandomForest::fit(x, y, n_classes, &params, rng)?),
            )
        }
        Modality::Glucose => {
            let params = BoostingParams {
                n_stages: 100,
                max_depth: 5,
                learning_rate: 0.1,
                ..Default::default()
            };
            (
                None,
                ClassifierKind::GradientBoosting(GradientBoosting::fit(x, y, n_classes, &params)?),
            )
        }
        Modality::Breathing => {
            let scaler = StandardScaler::fit(x);
            let scaled = scaler.transform_all(x);
            let svm = KernelSvm::fit(&scaled, y, n_classes, &SvmParams::default(), rng)?;
            (Some(scaler), ClassifierKind::Svm(svm))
        }
        Modality::Speech => {
            let scaler = StandardScaler::fit(x);
            let scaled = scaler.transform_all(x);
            let params = LogisticParams {
                c: 1.0,
                max_iter: 1000,
                ..Default::default()
            };
            let model = LogisticRegression::fit(&scaled, y, n_classes, &params)?;
            if model.n_iter() >= params.max_iter {
                log::warn!("Logistic regression for {} hit the iteration cap", modality);
            }
            (Some(scaler), ClassifierKind::LogisticRegression(model))
        }
        Modality::Emotion => {
            let scaler = StandardScaler::fit(x);
            let scaled = scaler.transform_all(x);
            let knn = KNearestNeighbors::fit(&scaled, y, n_classes, &KnnParams { k: 7 })?;
            (Some(scaler), ClassifierKind::KNearestNeighbors(knn))
        }
        Modality::Posture => {
            let params = TreeParams {
                max_depth: Some(8),
                min_samples_split: 10,
                min_samples_leaf: 5,
                max_features: None,
                class_weight: ClassWeight::Balanced,
            };
            (
                None,
                ClassifierKind::DecisionTree(DecisionTree::fit(x, y, n_classes, &params, rng)?),
            )
        }
    };

    Ok(ModelArtifact::new(modality, scaler, classifier))
}

/// Accuracy and per-class precision/recall/F1 on a labelled set
pub fn evaluate<C: Classifier + ?Sized>(
    model: &C,
    x: &[Vec<f64>],
    y: &[usize],
    labels: &[&str],
) -> Evaluation {
    let n_classes = labels.len();
    let mut true_pos = vec![0usize; n_classes];
    let mut predicted = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];
    let mut correct = 0;

    for (row, &actual) in x.iter().zip(y) {
        let guess = model.predict(row);
        if guess == actual {
            correct += 1;
        }
        if let Some(p) = predicted.get_mut(guess) {
            *p += 1;
        }
        if let Some(s) = support.get_mut(actual) {
            *s += 1;
            if guess == actual {
                true_pos[actual] += 1;
            }
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let classes = labels
        .iter()
        .enumerate()
        .map(|(k, label)| {
            let precision = ratio(true_pos[k], predicted[k]);
            let recall = ratio(true_pos[k], support[k]);
            let f1_score = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics {
                label: label.to_string(),
                precision,
                recall,
                f1_score,
                support: support[k],
            }
        })
        .collect();

    Evaluation {
        accuracy: ratio(correct, y.len()),
        classes,
    }
}

/// Split, fit and evaluate one modality's dataset
pub fn train_modality(
    dataset: &Dataset,
    config: &TrainingConfig,
) -> Result<(ModelArtifact, TrainingReport), RehabError> {
    let modality = dataset.modality;
    check_dataset(dataset)?;

    let labels = modality.label_table();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train_idx, test_idx) =
        stratified_split(&dataset.labels, labels.len(), config.test_size, &mut rng);

    let gather = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<usize>) {
        idx.iter()
            .map(|&i| (dataset.samples[i].clone(), dataset.labels[i]))
            .unzip()
    };
    let (x_train, y_train) = gather(&train_idx);
    let (x_test, y_test) = gather(&test_idx);

    log::info!(
        "Training {} on {} samples ({} held out)",
        modality,
        x_train.len(),
        x_test.len()
    );
    let artifact = fit_classifier(modality, &x_train, &y_train, &mut rng)?;
    let evaluation = evaluate(&artifact, &x_test, &y_test, &labels);
    log::info!(
        "{} {}: accuracy {:.4}",
        modality,
        artifact.classifier.name(),
        evaluation.accuracy
    );

    let report = TrainingReport {
        modality,
        algorithm: artifact.classifier.name().to_string(),
        n_train: x_train.len(),
        n_test: x_test.len(),
        evaluation,
        artifact_path: None,
    };
    let artifact = artifact.with_accuracy(report.evaluation.accuracy);
    Ok((artifact, report))
}

/// Train every modality from the store's datasets and write artifacts to `models_dir`
pub fn train_all(
    store: &PatientStore,
    models_dir: &Path,
    config: &TrainingConfig,
) -> Result<Vec<TrainingReport>, RehabError> {
    let mut reports = Vec::with_capacity(Modality::ALL.len());
    for modality in Modality::ALL {
        let dataset = store.load_dataset(modality)?;
        let (artifact, mut report) = train_modality(&dataset, config)?;
        let path = models_dir.join(modality.model_file_name());
        artifact.save(&path)?;
        log::info!("Saved {} model to {}", modality, path.display());
        report.artifact_path = Some(path);
        reports.push(report);
    }
    Ok(reports)
}

fn check_dataset(dataset: &Dataset) -> Result<(), RehabError> {
    let modality = dataset.modality;
    let expected = modality.feature_names();
    if dataset.feature_names.len() != expected.len()
        || dataset
            .feature_names
            .iter()
            .zip(expected)
            .any(|(actual, expected)| actual != expected)
    {
        return Err(RehabError::TrainingError(format!(
            "{} dataset has features {:?}, expected {:?}",
            modality, dataset.feature_names, expected
        )));
    }
    if dataset.is_empty() {
        return Err(RehabError::TrainingError(format!(
            "{} dataset is empty",
            modality
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{ModelContext, FALLBACK_CONFIDENCE};
    use crate::schema::ReadingAdapter;
    use crate::synthetic::SyntheticGenerator;
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value};

    /// Class is encoded in the first feature's band; the rest are constant
    fn separable_dataset(modality: Modality, per_class: usize) -> Dataset {
        let n_classes = modality.label_table().len();
        let names = modality.feature_names();
        let mut samples = Vec::new();
        let mut labels = Vec::new();
        for class in 0..n_classes {
            for i in 0..per_class {
                let row = (0..names.len())
                    .map(|f| {
                        if f == 0 {
                            class as f64 * 10.0 + (i % 5) as f64 * 0.5
                        } else {
                            f as f64
                        }
                    })
                    .collect();
                samples.push(row);
                labels.push(class);
            }
        }
        Dataset {
            modality,
            feature_names: names.iter().map(|s| s.to_string()).collect(),
            samples,
            labels,
        }
    }

    #[test]
    fn test_stratified_split_preserves_classes() {
        let labels: Vec<usize> = (0..100).map(|i| if i < 80 { 0 } else { 1 }).collect();
        let mut rng = StdRng::seed_from_u64(42);
        let (train, test) = stratified_split(&labels, 2, 0.2, &mut rng);

        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 4);

        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_keeps_rare_class_in_train() {
        let labels = vec![0, 0, 0, 0, 0, 1, 1, 2];
        let mut rng = StdRng::seed_from_u64(1);
        let (train, test) = stratified_split(&labels, 3, 0.2, &mut rng);

        assert!(train.iter().any(|&i| labels[i] == 1));
        assert!(test.iter().any(|&i| labels[i] == 1));
        assert!(train.iter().any(|&i| labels[i] == 2));
        assert!(!test.iter().any(|&i| labels[i] == 2));
    }

    #[test]
    fn test_evaluate_metrics() {
        let model = DecisionTree::constant(2, 1);
        let x = vec![vec![0.0]; 4];
        let y = vec![0, 1, 1, 1];
        let eval = evaluate(&model, &x, &y, &["a", "b"]);

        assert_eq!(eval.accuracy, 0.75);
        assert_eq!(eval.classes[0].recall, 0.0);
        assert_eq!(eval.classes[0].f1_score, 0.0);
        assert_eq!(eval.classes[1].precision, 0.75);
        assert_eq!(eval.classes[1].recall, 1.0);
        assert_eq!(eval.classes[1].support, 3);
    }

    #[test]
    fn test_every_modality_learns_separable_data() {
        for modality in Modality::ALL {
            let dataset = separable_dataset(modality, 30);
            let (artifact, report) = train_modality(&dataset, &TrainingConfig::default()).unwrap();

            assert!(artifact.validate(modality).is_ok());
            assert_eq!(report.n_train + report.n_test, dataset.len());
            assert!(
                report.evaluation.accuracy > 0.6,
                "{} accuracy {}",
                modality,
                report.evaluation.accuracy
            );
            assert_eq!(artifact.accuracy, Some(report.evaluation.accuracy));
        }
    }

    #[test]
    fn test_algorithm_per_modality() {
        let dataset = separable_dataset(Modality::Breathing, 10);
        let (artifact, report) = train_modality(&dataset, &TrainingConfig::default()).unwrap();

        assert_eq!(report.algorithm, "svm");
        assert!(artifact.scaler.is_some());
        assert!(artifact.predict_proba(&dataset.samples[0]).is_none());
    }

    #[test]
    fn test_artifact_round_trip_predicts_identically() {
        let dataset = separable_dataset(Modality::Glucose, 15);
        let (artifact, _) = train_modality(&dataset, &TrainingConfig::default()).unwrap();
        let restored: ModelArtifact =
            serde_json::from_str(&serde_json::to_string(&artifact).unwrap()).unwrap();

        for row in &dataset.samples {
            assert_eq!(restored.predict(row), artifact.predict(row));
        }
    }

    #[test]
    fn test_rejects_mislabelled_features() {
        let mut dataset = separable_dataset(Modality::Emotion, 5);
        dataset.feature_names.reverse();
        assert!(matches!(
            train_modality(&dataset, &TrainingConfig::default()),
            Err(RehabError::TrainingError(_))
        ));
    }

    #[test]
    fn test_train_all_writes_artifacts() {
        let root = std::env::temp_dir().join(format!("rehab-train-{}", uuid::Uuid::new_v4()));
        let store = PatientStore::new(root.join("data"));
        for modality in Modality::ALL {
            store.save_dataset(&separable_dataset(modality, 8)).unwrap();
        }

        let models_dir = root.join("models");
        let reports = train_all(&store, &models_dir, &TrainingConfig::default()).unwrap();

        assert_eq!(reports.len(), 6);
        for modality in Modality::ALL {
            let artifact = ModelArtifact::load(&models_dir.join(modality.model_file_name())).unwrap();
            assert!(artifact.validate(modality).is_ok());
        }
        std::fs::remove_dir_all(root).ok();
    }

    /// Report object holding row `i` of every dataset, with each value scaled
    fn report_from_rows(datasets: &[Dataset], i: usize, scale: f64) -> Value {
        let mut report = Map::new();
        for dataset in datasets {
            let section: Map<String, Value> = dataset
                .feature_names
                .iter()
                .zip(&dataset.samples[i])
                .map(|(name, value)| (name.clone(), Value::from(value * scale)))
                .collect();
            report.insert(dataset.modality.to_string(), Value::Object(section));
        }
        Value::Object(report)
    }

    #[test]
    fn test_trained_models_keep_prediction_invariants() {
        let datasets = SyntheticGenerator::new(11).training_sets(120).unwrap();
        let artifacts = datasets
            .iter()
            .map(|dataset| train_modality(dataset, &TrainingConfig::default()).map(|(a, _)| a))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let models = ModelContext::from_artifacts(artifacts).unwrap();

        for i in (0..120).step_by(7) {
            for scale in [1.0, -1.0, 0.0, 1e6] {
                let report = report_from_rows(&datasets, i, scale);
                let reading = ReadingAdapter::from_value(&report).unwrap();
                let set = models.predict_all(&reading).unwrap();
                assert_eq!(set.len(), 6);

                for modality in Modality::ALL {
                    let result = set.get(modality).unwrap();
                    let labels = modality.label_table();
                    assert!(result.class_index() < labels.len());
                    assert_eq!(result.label(), labels[result.class_index()]);

                    let confidence = result.confidence();
                    assert!((0.0..=1.0).contains(&confidence), "{} {}", modality, confidence);
                    if !matches!(modality, Modality::Heartbeat | Modality::Glucose) {
                        assert_eq!(confidence, FALLBACK_CONFIDENCE);
                    }
                }
                assert_eq!(models.predict_all(&reading).unwrap(), set);
            }
        }
    }
}
