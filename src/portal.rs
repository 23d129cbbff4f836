//! Session-scoped patient portal
//!
//! Every operation returns an [`ApiResponse`]: `{"success": true, ...}` with the
//! operation's payload flattened in, or `{"success": false, "message": ...}`.
//! Failures are reported in the response, never as `Err`.

use serde::Serialize;
use serde_json::Value;

use crate::error::RehabError;
use crate::pipeline::{HistoryEntry, RehabProcessor, ReportAnalysis};
use crate::schema::{PatientRecord, PatientReport, ReadingAdapter};
use crate::store::PatientStore;

/// Patient ids accepted at login
pub const ALLOWED_PATIENTS: [&str; 2] = ["A", "B"];

const INVALID_LOGIN: &str = "Invalid patient ID. Use A or B.";
const NOT_LOGGED_IN: &str = "Not logged in";
const NO_REPORT_DATA: &str = "No report data provided";
const PATIENT_NOT_FOUND: &str = "Patient not found";
const REPORT_NOT_FOUND: &str = "Report not found";

/// Uniform response envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> Result<String, RehabError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Demographics shown after login
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientSummary {
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub total_reports: usize,
}

impl From<&PatientRecord> for PatientSummary {
    fn from(record: &PatientRecord) -> Self {
        Self {
            id: record.patient_id.clone(),
            name: record.name.clone(),
            age: record.age,
            gender: record.gender.clone(),
            total_reports: record.reports.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginData {
    pub patient: PatientSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportsData {
    pub reports: Vec<PatientReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryData {
    pub history: Vec<HistoryEntry>,
}

/// One stored report with its full analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub patient: PatientSummary,
    pub report: PatientReport,
    #[serde(flatten)]
    pub analysis: ReportAnalysis,
}

/// Empty payload for responses that carry only `success`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Empty {}

/// The logged-in patient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSession {
    pub patient_id: String,
}

/// Portal over a patient store and a loaded processor, holding at most one
/// session at a time
pub struct Portal {
    store: PatientStore,
    processor: RehabProcessor,
    session: Option<PortalSession>,
}

impl Portal {
    pub fn new(store: PatientStore, processor: RehabProcessor) -> Self {
        Self {
            store,
            processor,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&PortalSession> {
        self.session.as_ref()
    }

    /// Log in as patient `A` or `B` (case-insensitive).
    ///
    /// The session is only opened when the patient's record exists.
    pub fn login(&mut self, patient_id: &str) -> ApiResponse<LoginData> {
        let patient_id = patient_id.trim().to_uppercase();
        if !ALLOWED_PATIENTS.contains(&patient_id.as_str()) {
            return ApiResponse::fail(INVALID_LOGIN);
        }

        match self.store.load(&patient_id) {
            Ok(Some(record)) => {
                log::info!("Patient {} logged in", patient_id);
                self.session = Some(PortalSession { patient_id });
                ApiResponse::ok(LoginData {
                    patient: PatientSummary::from(&record),
                })
            }
            Ok(None) => ApiResponse::fail(INVALID_LOGIN),
            Err(e) => {
                log::warn!("Failed to load patient {}: {}", patient_id, e);
                ApiResponse::fail(INVALID_LOGIN)
            }
        }
    }

    pub fn logout(&mut self) -> ApiResponse<Empty> {
        self.session = None;
        ApiResponse::ok(Empty {})
    }

    /// Logged-in patient's demographics
    pub fn dashboard(&self) -> ApiResponse<LoginData> {
        match self.current_patient() {
            Ok(record) => ApiResponse::ok(LoginData {
                patient: PatientSummary::from(&record),
            }),
            Err(message) => ApiResponse::fail(message),
        }
    }

    /// Analyze an ad-hoc report for the logged-in patient
    pub fn predict(&self, report_data: &Value) -> ApiResponse<ReportAnalysis> {
        if self.session.is_none() {
            return ApiResponse::fail(NOT_LOGGED_IN);
        }
        if is_blank(report_data) {
            return ApiResponse::fail(NO_REPORT_DATA);
        }

        let analysis = ReadingAdapter::from_value(report_data)
            .and_then(|reading| self.processor.analyze(&reading));
        match analysis {
            Ok(analysis) => ApiResponse::ok(analysis),
            Err(e) => ApiResponse::fail(e.to_string()),
        }
    }

    /// Stored reports of the logged-in patient, unanalyzed
    pub fn reports(&self) -> ApiResponse<ReportsData> {
        match self.current_patient() {
            Ok(record) => ApiResponse::ok(ReportsData {
                reports: record.reports,
            }),
            Err(message) => ApiResponse::fail(message),
        }
    }

    /// Predictions for every stored report of the logged-in patient
    pub fn history(&self) -> ApiResponse<HistoryData> {
        let record = match self.current_patient() {
            Ok(record) => record,
            Err(message) => return ApiResponse::fail(message),
        };
        match self.processor.history(&record) {
            Ok(history) => ApiResponse::ok(HistoryData { history }),
            Err(e) => ApiResponse::fail(e.to_string()),
        }
    }

    /// Full analysis of one stored report
    pub fn view_report(&self, report_id: &str) -> ApiResponse<ReportView> {
        let record = match self.current_patient() {
            Ok(record) => record,
            Err(message) => return ApiResponse::fail(message),
        };
        let Some(report) = record.report(report_id) else {
            return ApiResponse::fail(REPORT_NOT_FOUND);
        };

        match self.processor.analyze_report(report) {
            Ok(analysis) => ApiResponse::ok(ReportView {
                patient: PatientSummary::from(&record),
                report: report.clone(),
                analysis,
            }),
            Err(e) => ApiResponse::fail(e.to_string()),
        }
    }

    fn current_patient(&self) -> Result<PatientRecord, String> {
        let session = self.session.as_ref().ok_or_else(|| NOT_LOGGED_IN.to_string())?;
        match self.store.load(&session.patient_id) {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(PATIENT_NOT_FOUND.to_string()),
            Err(e) => {
                log::warn!("Failed to load patient {}: {}", session.patient_id, e);
                Err(PATIENT_NOT_FOUND.to_string())
            }
        }
    }
}

/// Null, false, zero, or an empty object, array or string
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
