//! Synthetic training data and demo patient generation
//!
//! Feature columns are drawn independently of the class label, from clipped
//! Gaussian or uniform distributions per modality. "Improving" trajectories
//! draw the first half of the rows from a worse label mix (and, for
//! heartbeat, worse vitals) than the second half.

use chrono::{Duration, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use statrs::distribution::Normal;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RehabError;
use crate::schema::{PatientRecord, PatientReport};
use crate::store::PatientStore;
use crate::types::Modality;

/// Default RNG seed
pub const DEFAULT_SEED: u64 = 42;

/// Default number of rows per training dataset
pub const DEFAULT_TRAINING_SAMPLES: usize = 2000;

/// Generation settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Rows per modality training dataset
    pub n_samples: usize,
    /// Reports in the improving demo patient's history
    pub improving_reports: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            n_samples: DEFAULT_TRAINING_SAMPLES,
            improving_reports: 12,
        }
    }
}

/// Shape of a patient's label distribution over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    /// Stationary, mostly healthy
    Normal,
    /// Worse in the first half, recovering in the second
    Improving,
}

/// Labelled feature rows for one modality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub modality: Modality,
    pub feature_names: Vec<String>,
    /// Row-major samples ordered as `feature_names`
    pub samples: Vec<Vec<f64>>,
    /// Class index per sample
    pub labels: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Load a dataset from a JSON file
    pub fn load(path: &Path) -> Result<Self, RehabError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Per-class row counts
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.modality.label_table().len()];
        for &label in &self.labels {
            if let Some(c) = counts.get_mut(label) {
                *c += 1;
            }
        }
        counts
    }

    /// Measurement object for row `i`, as stored in patient reports
    fn measurement(&self, i: usize) -> Value {
        let mut obj = Map::new();
        for (name, value) in self.feature_names.iter().zip(&self.samples[i]) {
            obj.insert(name.clone(), Value::from(*value));
        }
        obj.insert(
            self.modality.label_key().to_string(),
            Value::from(self.labels[i]),
        );
        Value::Object(obj)
    }
}

/// A discrete draw: values with matching weights
struct Choice {
    values: &'static [usize],
    weights: &'static [f64],
}

/// Label plan for one modality: stationary mix, then early/late improving mixes
struct LabelPlan {
    steady: Choice,
    early: Choice,
    late: Choice,
}

const HEARTBEAT_LABELS: LabelPlan = LabelPlan {
    steady: Choice { values: &[0, 1, 2, 3], weights: &[0.8, 0.1, 0.05, 0.05] },
    early: Choice { values: &[1, 2, 3], weights: &[0.4, 0.4, 0.2] },
    late: Choice { values: &[0, 1], weights: &[0.7, 0.3] },
};

const GLUCOSE_LABELS: LabelPlan = LabelPlan {
    steady: Choice { values: &[0, 1, 2], weights: &[0.15, 0.7, 0.15] },
    early: Choice { values: &[0, 1, 2], weights: &[0.2, 0.3, 0.5] },
    late: Choice { values: &[0, 1, 2], weights: &[0.1, 0.7, 0.2] },
};

const BREATHING_LABELS: LabelPlan = LabelPlan {
    steady: Choice { values: &[0, 1, 2, 3], weights: &[0.7, 0.15, 0.1, 0.05] },
    early: Choice { values: &[0, 1, 2, 3], weights: &[0.4, 0.3, 0.2, 0.1] },
    late: Choice { values: &[0, 1], weights: &[0.8, 0.2] },
};

const SPEECH_LABELS: LabelPlan = LabelPlan {
    steady: Choice { values: &[0, 1, 2], weights: &[0.75, 0.15, 0.1] },
    early: Choice { values: &[0, 1, 2], weights: &[0.3, 0.5, 0.2] },
    late: Choice { values: &[0, 1], weights: &[0.8, 0.2] },
};

const EMOTION_LABELS: LabelPlan = LabelPlan {
    steady: Choice { values: &[0, 1, 2, 3], weights: &[0.4, 0.35, 0.15, 0.1] },
    early: Choice { values: &[0, 1, 2, 3], weights: &[0.2, 0.2, 0.4, 0.2] },
    late: Choice { values: &[0, 1, 2], weights: &[0.5, 0.4, 0.1] },
};

const POSTURE_LABELS: LabelPlan = LabelPlan {
    steady: Choice { values: &[0, 1, 2], weights: &[0.6, 0.25, 0.15] },
    early: Choice { values: &[0, 1, 2], weights: &[0.3, 0.4, 0.3] },
    late: Choice { values: &[0, 1], weights: &[0.7, 0.3] },
};

/// Seeded generator for datasets and patient profiles
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `n` labelled rows for one modality
    pub fn dataset(
        &mut self,
        modality: Modality,
        n: usize,
        trajectory: Trajectory,
    ) -> Result<Dataset, RehabError> {
        let half = n / 2;
        let columns: Vec<Vec<f64>> = match modality {
            Modality::Heartbeat => {
                let (heart_rate, rr_variance) = match trajectory {
                    Trajectory::Normal => (
                        self.gaussian(75.0, 8.0, n)?,
                        self.gaussian(0.05, 0.01, n)?,
                    ),
                    Trajectory::Improving => (
                        self.gaussian_halves((95.0, 10.0), (78.0, 8.0), n)?,
                        self.gaussian_halves((0.08, 0.02), (0.05, 0.01), n)?,
                    ),
                };
                vec![clip(heart_rate, 40.0, 180.0), clip(rr_variance, 0.01, 0.15)]
            }
            Modality::Glucose => vec![
                self.uniform_int(25, 75, n),
                clip(self.gaussian(25.0, 4.0, n)?, 18.0, 40.0),
                self.uniform_int(0, 4, n),
                self.uniform_int(0, 3, n),
            ],
            Modality::Breathing => vec![
                clip(self.gaussian(16.0, 3.0, n)?, 8.0, 30.0),
                clip(self.gaussian(0.5, 0.1, n)?, 0.2, 1.0),
                self.choose(&Choice { values: &[0, 1], weights: &[0.7, 0.3] }, n)?
                    .into_iter()
                    .map(|v| v as f64)
                    .collect(),
            ],
            Modality::Speech => vec![
                clip(self.gaussian(150.0, 20.0, n)?, 80.0, 220.0),
                clip(self.gaussian(0.15, 0.05, n)?, 0.05, 0.4),
                clip(self.gaussian(0.3, 0.1, n)?, 0.1, 0.6),
            ],
            Modality::Emotion => vec![
                clip(self.gaussian(0.5, 0.2, n)?, 0.0, 1.0),
                clip(self.gaussian(0.5, 0.2, n)?, 0.0, 1.0),
                clip(self.gaussian(0.5, 0.2, n)?, 0.0, 1.0),
            ],
            Modality::Posture => vec![
                clip(self.gaussian(0.0, 10.0, n)?, -30.0, 30.0),
                clip(self.gaussian(0.0, 8.0, n)?, -20.0, 20.0),
                clip(self.gaussian(90.0, 15.0, n)?, 60.0, 120.0),
            ],
        };

        let plan = label_plan(modality);
        let labels = match trajectory {
            Trajectory::Normal => self.choose(&plan.steady, n)?,
            Trajectory::Improving => {
                let mut labels = self.choose(&plan.early, half)?;
                labels.extend(self.choose(&plan.late, n - half)?);
                labels
            }
        };

        let samples = (0..n)
            .map(|i| columns.iter().map(|column| column[i]).collect())
            .collect();

        Ok(Dataset {
            modality,
            feature_names: modality
                .feature_names()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            samples,
            labels,
        })
    }

    /// One stationary training dataset per modality, in canonical order
    pub fn training_sets(&mut self, n: usize) -> Result<Vec<Dataset>, RehabError> {
        Modality::ALL
            .iter()
            .map(|&modality| self.dataset(modality, n, Trajectory::Normal))
            .collect()
    }

    /// A patient with `n_reports` weekly reports, the last one a week before `today`
    pub fn patient(
        &mut self,
        patient_id: &str,
        trajectory: Trajectory,
        n_reports: usize,
        today: NaiveDate,
    ) -> Result<PatientRecord, RehabError> {
        let age = self.rng.gen_range(30..70);
        let gender = if self.rng.gen_bool(0.5) { "M" } else { "F" };

        let datasets: Vec<Dataset> = Modality::ALL
            .iter()
            .map(|&modality| self.dataset(modality, n_reports, trajectory))
            .collect::<Result<_, _>>()?;

        let start = today - Duration::days(7 * n_reports as i64);
        let reports = (0..n_reports)
            .map(|i| {
                let date = start + Duration::days(7 * i as i64);
                let mut report = PatientReport::new(format!("{}_R{:03}", patient_id, i + 1), date);
                for dataset in &datasets {
                    report.set_measurement(dataset.modality, dataset.measurement(i));
                }
                report
            })
            .collect();

        Ok(PatientRecord {
            patient_id: patient_id.to_string(),
            name: format!("Patient {}", patient_id),
            age,
            gender: gender.to_string(),
            reports,
        })
    }

    fn gaussian(&mut self, mean: f64, std_dev: f64, n: usize) -> Result<Vec<f64>, RehabError> {
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| RehabError::GenerationError(format!("N({mean}, {std_dev}): {e}")))?;
        Ok((0..n).map(|_| normal.sample(&mut self.rng)).collect())
    }

    fn gaussian_halves(
        &mut self,
        early: (f64, f64),
        late: (f64, f64),
        n: usize,
    ) -> Result<Vec<f64>, RehabError> {
        let half = n / 2;
        let mut values = self.gaussian(early.0, early.1, half)?;
        values.extend(self.gaussian(late.0, late.1, n - half)?);
        Ok(values)
    }

    /// Integers uniform in `[low, high)`, as floats
    fn uniform_int(&mut self, low: i64, high: i64, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.rng.gen_range(low..high) as f64).collect()
    }

    fn choose(&mut self, choice: &Choice, n: usize) -> Result<Vec<usize>, RehabError> {
        let index = WeightedIndex::new(choice.weights)
            .map_err(|e| RehabError::GenerationError(e.to_string()))?;
        Ok((0..n)
            .map(|_| choice.values[index.sample(&mut self.rng)])
            .collect())
    }
}

fn label_plan(modality: Modality) -> &'static LabelPlan {
    match modality {
        Modality::Heartbeat => &HEARTBEAT_LABELS,
        Modality::Glucose => &GLUCOSE_LABELS,
        Modality::Breathing => &BREATHING_LABELS,
        Modality::Speech => &SPEECH_LABELS,
        Modality::Emotion => &EMOTION_LABELS,
        Modality::Posture => &POSTURE_LABELS,
    }
}

fn clip(values: Vec<f64>, low: f64, high: f64) -> Vec<f64> {
    values.into_iter().map(|v| v.clamp(low, high)).collect()
}

/// Files written by [`generate_demo_data`]
#[derive(Debug, Clone, Serialize)]
pub struct GenerationSummary {
    pub seed: u64,
    pub datasets: Vec<PathBuf>,
    pub patients: Vec<PathBuf>,
}

/// Write the six training datasets plus demo patients A (one report, stable)
/// and B (improving history) into the store
pub fn generate_demo_data(
    store: &PatientStore,
    config: &GeneratorConfig,
    today: NaiveDate,
) -> Result<GenerationSummary, RehabError> {
    let mut generator = SyntheticGenerator::new(config.seed);

    let mut datasets = Vec::new();
    for dataset in generator.training_sets(config.n_samples)? {
        let path = store.save_dataset(&dataset)?;
        log::info!(
            "Wrote {} {} rows to {}",
            dataset.len(),
            dataset.modality,
            path.display()
        );
        datasets.push(path);
    }

    let profiles = [
        ("A", Trajectory::Normal, 1),
        ("B", Trajectory::Improving, config.improving_reports),
    ];
    let mut patients = Vec::new();
    for (id, trajectory, n_reports) in profiles {
        let record = generator.patient(id, trajectory, n_reports, today)?;
        let path = store.save(&record)?;
        log::info!(
            "Wrote patient {} ({} reports) to {}",
            id,
            record.reports.len(),
            path.display()
        );
        patients.push(path);
    }

    Ok(GenerationSummary {
        seed: config.seed,
        datasets,
        patients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReadingAdapter;
    use pretty_assertions::assert_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    #[test]
    fn test_dataset_shape_and_ranges() {
        let mut generator = SyntheticGenerator::new(DEFAULT_SEED);
        let dataset = generator
            .dataset(Modality::Posture, 300, Trajectory::Normal)
            .unwrap();

        assert_eq!(dataset.len(), 300);
        assert_eq!(dataset.labels.len(), 300);
        assert_eq!(
            dataset.feature_names,
            vec!["head_tilt", "shoulder_alignment", "spine_angle"]
        );
        for row in &dataset.samples {
            assert!((-30.0..=30.0).contains(&row[0]));
            assert!((-20.0..=20.0).contains(&row[1]));
            assert!((60.0..=120.0).contains(&row[2]));
        }
        assert!(dataset.labels.iter().all(|&l| l < 3));
    }

    #[test]
    fn test_glucose_discrete_columns() {
        let mut generator = SyntheticGenerator::new(3);
        let dataset = generator
            .dataset(Modality::Glucose, 200, Trajectory::Normal)
            .unwrap();

        for row in &dataset.samples {
            assert!(row[0] >= 25.0 && row[0] < 75.0 && row[0].fract() == 0.0);
            assert!((18.0..=40.0).contains(&row[1]));
            assert!([0.0, 1.0, 2.0, 3.0].contains(&row[2]));
            assert!([0.0, 1.0, 2.0].contains(&row[3]));
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = SyntheticGenerator::new(7)
            .dataset(Modality::Speech, 50, Trajectory::Normal)
            .unwrap();
        let b = SyntheticGenerator::new(7)
            .dataset(Modality::Speech, 50, Trajectory::Normal)
            .unwrap();
        let c = SyntheticGenerator::new(8)
            .dataset(Modality::Speech, 50, Trajectory::Normal)
            .unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_improving_heartbeat_never_normal_early() {
        let mut generator = SyntheticGenerator::new(DEFAULT_SEED);
        let dataset = generator
            .dataset(Modality::Heartbeat, 40, Trajectory::Improving)
            .unwrap();

        assert!(dataset.labels[..20].iter().all(|&l| l != 0));
        assert!(dataset.labels[20..].iter().all(|&l| l <= 1));
    }

    #[test]
    fn test_normal_mix_is_mostly_healthy() {
        let mut generator = SyntheticGenerator::new(DEFAULT_SEED);
        let dataset = generator
            .dataset(Modality::Heartbeat, 2000, Trajectory::Normal)
            .unwrap();
        let counts = dataset.class_counts();

        assert_eq!(counts.iter().sum::<usize>(), 2000);
        assert!(counts[0] > 1400 && counts[0] < 1800);
    }

    #[test]
    fn test_patient_profile() {
        let mut generator = SyntheticGenerator::new(DEFAULT_SEED);
        let record = generator
            .patient("B", Trajectory::Improving, 12, today())
            .unwrap();

        assert_eq!(record.name, "Patient B");
        assert!(record.age >= 30 && record.age < 70);
        assert!(record.gender == "M" || record.gender == "F");
        assert_eq!(record.reports.len(), 12);
        assert_eq!(record.reports[0].report_id, "B_R001");
        assert_eq!(record.reports[11].report_id, "B_R012");
        assert_eq!(
            record.reports[0].date,
            NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
        );
        assert_eq!(
            record.reports[11].date,
            NaiveDate::from_ymd_opt(2026, 5, 25).unwrap()
        );
        assert!(record.validate().is_ok());

        // reports carry every modality plus the generating label
        let report = &record.reports[0];
        let glucose = report.measurement(Modality::Glucose).unwrap();
        assert!(glucose.get("glucose_range").is_some());
        let reading = ReadingAdapter::from_report(report).unwrap();
        assert_eq!(reading.modalities().len(), 6);
    }

    #[test]
    fn test_generate_demo_data_writes_files() {
        let store = PatientStore::new(
            std::env::temp_dir().join(format!("rehab-gen-{}", uuid::Uuid::new_v4())),
        );
        let config = GeneratorConfig {
            n_samples: 40,
            ..Default::default()
        };
        let summary = generate_demo_data(&store, &config, today()).unwrap();

        assert_eq!(summary.datasets.len(), 6);
        assert_eq!(summary.patients.len(), 2);
        assert_eq!(store.load_dataset(Modality::Emotion).unwrap().len(), 40);
        assert_eq!(store.load("A").unwrap().unwrap().reports.len(), 1);
        assert_eq!(store.load("B").unwrap().unwrap().reports.len(), 12);
        fs::remove_dir_all(store.data_dir()).ok();
    }
}
