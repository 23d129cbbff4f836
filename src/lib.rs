//! RehabSense - Inference and recommendation engine for rehabilitation monitoring
//!
//! RehabSense runs six independent per-modality classifiers over a patient
//! report and composes the results: report JSON → typed reading → per-modality
//! predictions → recommendation bundles → summary message.
//!
//! ## Modules
//!
//! - **Inference**: trained classifiers, predictors and the aggregator
//! - **Recommendations**: static bundles per predicted label and the summary composer
//! - **Training**: synthetic data generation, model fitting and evaluation
//! - **Portal**: session-scoped access to stored patient records

pub mod classifier;
pub mod error;
pub mod inference;
pub mod pipeline;
pub mod portal;
pub mod recommendations;
pub mod schema;
pub mod store;
pub mod synthetic;
pub mod training;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::RehabError;
pub use inference::{predict_all, ModelContext};
pub use pipeline::{analyze_report, RehabProcessor, ReportAnalysis};
pub use recommendations::{recommend, recommend_all, recommend_raw, summary_message};
pub use types::{Modality, PredictionResult, PredictionSet, Reading, RecommendationBundle};

// Schema exports
pub use schema::{PatientRecord, PatientReport, ReadingAdapter};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default model artifact directory, relative to the working directory
pub const DEFAULT_MODELS_DIR: &str = "models";
