//! Flat-file patient and dataset store
//!
//! Layout under the data directory:
//!
//! ```text
//! data/
//!   patients/patient_{id}.json
//!   training/{modality}_train.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RehabError;
use crate::schema::PatientRecord;
use crate::synthetic::Dataset;
use crate::types::Modality;

/// Default data directory, relative to the working directory
pub const DEFAULT_DATA_DIR: &str = "data";

/// Patient records and training datasets stored as JSON files
#[derive(Debug, Clone)]
pub struct PatientStore {
    data_dir: PathBuf,
}

impl Default for PatientStore {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

impl PatientStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn patient_path(&self, patient_id: &str) -> PathBuf {
        self.data_dir
            .join("patients")
            .join(format!("patient_{}.json", patient_id))
    }

    pub fn training_path(&self, modality: Modality) -> PathBuf {
        self.data_dir
            .join("training")
            .join(modality.training_file_name())
    }

    /// Load a patient record. An absent file is `Ok(None)`.
    pub fn load(&self, patient_id: &str) -> Result<Option<PatientRecord>, RehabError> {
        check_patient_id(patient_id)?;
        let path = self.patient_path(patient_id);
        if !path.exists() {
            log::debug!("No patient record at {}", path.display());
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        let record: PatientRecord = serde_json::from_str(&json)?;
        if let Err(e) = record.validate() {
            log::warn!("Patient record {} failed validation: {}", path.display(), e);
        }
        Ok(Some(record))
    }

    /// Write a patient record, replacing any existing file
    pub fn save(&self, record: &PatientRecord) -> Result<PathBuf, RehabError> {
        check_patient_id(&record.patient_id)?;
        let path = self.patient_path(&record.patient_id);
        write_json(&path, record)?;
        Ok(path)
    }

    /// Ids of all stored patients, sorted
    pub fn patient_ids(&self) -> Result<Vec<String>, RehabError> {
        let dir = self.data_dir.join("patients");
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(id) = name
                .strip_prefix("patient_")
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub fn load_dataset(&self, modality: Modality) -> Result<Dataset, RehabError> {
        let path = self.training_path(modality);
        if !path.exists() {
            return Err(RehabError::TrainingError(format!(
                "Training dataset not found: {}",
                path.display()
            )));
        }
        let dataset = Dataset::load(&path)?;
        if dataset.modality != modality {
            return Err(RehabError::TrainingError(format!(
                "{} holds {} data",
                path.display(),
                dataset.modality
            )));
        }
        Ok(dataset)
    }

    pub fn save_dataset(&self, dataset: &Dataset) -> Result<PathBuf, RehabError> {
        let path = self.training_path(dataset.modality);
        write_json(&path, dataset)?;
        Ok(path)
    }
}

fn check_patient_id(patient_id: &str) -> Result<(), RehabError> {
    let valid = !patient_id.is_empty()
        && patient_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RehabError::ParseError(format!(
            "Invalid patient id: {:?}",
            patient_id
        )))
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), RehabError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PatientReport;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn temp_store() -> PatientStore {
        PatientStore::new(std::env::temp_dir().join(format!("rehab-store-{}", uuid::Uuid::new_v4())))
    }

    fn sample_record(id: &str) -> PatientRecord {
        PatientRecord {
            patient_id: id.to_string(),
            name: format!("Patient {}", id),
            age: 44,
            gender: "M".to_string(),
            reports: vec![PatientReport::new(
                format!("{}_R001", id),
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            )],
        }
    }

    #[test]
    fn test_paths() {
        let store = PatientStore::new("/tmp/rehab");
        assert_eq!(
            store.patient_path("B"),
            PathBuf::from("/tmp/rehab/patients/patient_B.json")
        );
        assert_eq!(
            store.training_path(Modality::Glucose),
            PathBuf::from("/tmp/rehab/training/glucose_train.json")
        );
    }

    #[test]
    fn test_save_and_load() {
        let store = temp_store();
        let record = sample_record("A");

        store.save(&record).unwrap();
        let loaded = store.load("A").unwrap();

        assert_eq!(loaded, Some(record));
        assert_eq!(store.patient_ids().unwrap(), vec!["A".to_string()]);
        fs::remove_dir_all(store.data_dir()).ok();
    }

    #[test]
    fn test_missing_patient_is_none() {
        let store = temp_store();
        assert_eq!(store.load("Z").unwrap(), None);
        assert!(store.patient_ids().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let store = temp_store();
        assert!(matches!(
            store.load("../etc/passwd"),
            Err(RehabError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_dataset() {
        let store = temp_store();
        assert!(matches!(
            store.load_dataset(Modality::Speech),
            Err(RehabError::TrainingError(_))
        ));
    }
}
