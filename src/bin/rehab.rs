//! RehabSense CLI - Command-line interface for the RehabSense engine
//!
//! Commands:
//! - generate: Write synthetic training datasets and demo patients
//! - train: Train the six modality models
//! - predict: Analyze report JSON (batch mode)
//! - history: Predictions across a stored patient's reports
//! - report: Full analysis of one stored report
//! - recommend: Look up the recommendation bundle for a label
//! - doctor: Diagnose models, data and configuration
//! - schema: Print input/output schema information

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rehab_sense::pipeline::{RehabProcessor, ReportAnalysis};
use rehab_sense::portal::{ApiResponse, Portal};
use rehab_sense::recommendations::recommend_raw;
use rehab_sense::schema::ReadingAdapter;
use rehab_sense::store::{PatientStore, DEFAULT_DATA_DIR};
use rehab_sense::synthetic::{
    generate_demo_data, GeneratorConfig, DEFAULT_SEED, DEFAULT_TRAINING_SAMPLES,
};
use rehab_sense::training::{train_all, TrainingConfig, DEFAULT_TEST_SIZE};
use rehab_sense::types::Modality;
use rehab_sense::{RehabError, DEFAULT_MODELS_DIR, ENGINE_VERSION};

/// RehabSense - Inference and recommendations for rehabilitation monitoring
#[derive(Parser)]
#[command(name = "rehab")]
#[command(author = "RehabSense Contributors")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Predict patient state and recommend rehabilitation activities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write synthetic training datasets and demo patients A and B
    Generate {
        /// Data directory
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Rows per training dataset
        #[arg(long, default_value_t = DEFAULT_TRAINING_SAMPLES)]
        samples: usize,

        /// Reports in patient B's history
        #[arg(long, default_value = "12")]
        reports: usize,

        /// Date of the most recent week (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Train the six modality models from the generated datasets
    Train {
        /// Data directory holding training/
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        /// Directory to write model artifacts into
        #[arg(long, default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,

        /// Random seed for splitting and fitting
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Held-out fraction per class
        #[arg(long, default_value_t = DEFAULT_TEST_SIZE)]
        test_size: f64,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Analyze report JSON (batch mode)
    Predict {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Model artifact directory
        #[arg(long, default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,
    },

    /// Predictions for every stored report of a patient
    History {
        /// Patient id (A or B)
        #[arg(short, long)]
        patient: String,

        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        #[arg(long, default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Predictions, recommendations and summary for one stored report
    Report {
        /// Patient id (A or B)
        #[arg(short, long)]
        patient: String,

        /// Report id, e.g. B_R003
        #[arg(short, long)]
        report_id: String,

        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        #[arg(long, default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Print the recommendation bundle for a modality label
    Recommend {
        /// Modality (heartbeat, glucose, breathing, speech, emotion, posture)
        modality: String,

        /// Predicted label, e.g. "Shallow Breathing"
        label: String,

        /// Posture score to embed in the status
        #[arg(long)]
        score: Option<f64>,
    },

    /// Diagnose models, data and configuration
    Doctor {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,

        #[arg(long, default_value = DEFAULT_MODELS_DIR)]
        models_dir: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one report per line)
    Ndjson,
    /// A single report object or a JSON array of reports
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Report input (modality feature objects)
    Input,
    /// Analysis output (predictions, recommendations, summary)
    Output,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RehabCliError> {
    match cli.command {
        Commands::Generate {
            data_dir,
            seed,
            samples,
            reports,
            today,
        } => cmd_generate(&data_dir, seed, samples, reports, today),

        Commands::Train {
            data_dir,
            models_dir,
            seed,
            test_size,
            output_format,
        } => cmd_train(&data_dir, &models_dir, seed, test_size, output_format),

        Commands::Predict {
            input,
            output,
            input_format,
            output_format,
            models_dir,
        } => cmd_predict(&input, &output, input_format, output_format, &models_dir),

        Commands::History {
            patient,
            data_dir,
            models_dir,
            output_format,
        } => cmd_history(&patient, &data_dir, &models_dir, output_format),

        Commands::Report {
            patient,
            report_id,
            data_dir,
            models_dir,
            output_format,
        } => cmd_report(&patient, &report_id, &data_dir, &models_dir, output_format),

        Commands::Recommend {
            modality,
            label,
            score,
        } => cmd_recommend(&modality, &label, score),

        Commands::Doctor {
            data_dir,
            models_dir,
            json,
        } => cmd_doctor(&data_dir, &models_dir, json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_generate(
    data_dir: &Path,
    seed: u64,
    samples: usize,
    reports: usize,
    today: Option<NaiveDate>,
) -> Result<(), RehabCliError> {
    let store = PatientStore::new(data_dir);
    let config = GeneratorConfig {
        seed,
        n_samples: samples,
        improving_reports: reports,
    };
    let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());

    let summary = generate_demo_data(&store, &config, today)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_train(
    data_dir: &Path,
    models_dir: &Path,
    seed: u64,
    test_size: f64,
    output_format: OutputFormat,
) -> Result<(), RehabCliError> {
    let store = PatientStore::new(data_dir);
    let config = TrainingConfig { seed, test_size };

    let reports = train_all(&store, models_dir, &config)?;
    print!("{}", format_output(&reports, &output_format)?);
    Ok(())
}

fn cmd_predict(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    models_dir: &Path,
) -> Result<(), RehabCliError> {
    let input_data = read_input(input)?;

    let reports: Vec<Value> = match input_format {
        InputFormat::Ndjson => input_data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect::<Result<_, _>>()?,
        InputFormat::Json => match serde_json::from_str(&input_data)? {
            Value::Array(items) => items,
            single => vec![single],
        },
    };

    if reports.is_empty() {
        return Err(RehabCliError::NoReports);
    }

    let processor = RehabProcessor::load(models_dir)?;
    let analyses = reports
        .iter()
        .map(|report| {
            let reading = ReadingAdapter::from_value(report)?;
            processor.analyze(&reading)
        })
        .collect::<Result<Vec<ReportAnalysis>, RehabError>>()?;

    let output_data = format_output(&analyses, &output_format)?;
    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_history(
    patient: &str,
    data_dir: &Path,
    models_dir: &Path,
    output_format: OutputFormat,
) -> Result<(), RehabCliError> {
    let portal = open_portal(patient, data_dir, models_dir)?;
    let history = into_result(portal.history())?;
    print!("{}", format_output(&history.history, &output_format)?);
    Ok(())
}

fn cmd_report(
    patient: &str,
    report_id: &str,
    data_dir: &Path,
    models_dir: &Path,
    output_format: OutputFormat,
) -> Result<(), RehabCliError> {
    let portal = open_portal(patient, data_dir, models_dir)?;
    let view = into_result(portal.view_report(report_id))?;
    print!("{}", format_output(&[view], &output_format)?);
    Ok(())
}

fn cmd_recommend(modality: &str, label: &str, score: Option<f64>) -> Result<(), RehabCliError> {
    let modality: Modality = modality.parse()?;
    let bundle = recommend_raw(modality, label, score);
    println!("{}", serde_json::to_string_pretty(&bundle)?);
    Ok(())
}

fn cmd_doctor(data_dir: &Path, models_dir: &Path, json: bool) -> Result<(), RehabCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("RehabSense version {}", ENGINE_VERSION),
    });

    // Model artifacts: required for every prediction command
    for modality in Modality::ALL {
        let path = models_dir.join(modality.model_file_name());
        let check = match rehab_sense::classifier::ModelArtifact::load(&path)
            .and_then(|artifact| artifact.validate(modality).map(|()| artifact))
        {
            Ok(artifact) => DoctorCheck {
                name: format!("model.{}", modality),
                status: CheckStatus::Ok,
                message: match artifact.accuracy {
                    Some(accuracy) => format!(
                        "{} (held-out accuracy {:.3})",
                        artifact.classifier.name(),
                        accuracy
                    ),
                    None => artifact.classifier.name().to_string(),
                },
            },
            Err(e) => DoctorCheck {
                name: format!("model.{}", modality),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    // Training data: only needed to retrain
    let store = PatientStore::new(data_dir);
    for modality in Modality::ALL {
        let check = match store.load_dataset(modality) {
            Ok(dataset) => DoctorCheck {
                name: format!("dataset.{}", modality),
                status: CheckStatus::Ok,
                message: format!("{} rows", dataset.len()),
            },
            Err(e) => DoctorCheck {
                name: format!("dataset.{}", modality),
                status: CheckStatus::Warning,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    let stored = match store.patient_ids() {
        Ok(ids) if ids.is_empty() => DoctorCheck {
            name: "patients".to_string(),
            status: CheckStatus::Warning,
            message: "No patient records stored; run `rehab generate`".to_string(),
        },
        Ok(ids) => DoctorCheck {
            name: "patients".to_string(),
            status: CheckStatus::Ok,
            message: format!("Stored patients: {}", ids.join(", ")),
        },
        Err(e) => DoctorCheck {
            name: "patients".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    };
    checks.push(stored);

    for patient_id in rehab_sense::portal::ALLOWED_PATIENTS {
        let check = match store.load(patient_id) {
            Ok(Some(record)) => DoctorCheck {
                name: format!("patient.{}", patient_id),
                status: CheckStatus::Ok,
                message: format!("{} reports", record.reports.len()),
            },
            Ok(None) => DoctorCheck {
                name: format!("patient.{}", patient_id),
                status: CheckStatus::Warning,
                message: "Patient record does not exist".to_string(),
            },
            Err(e) => DoctorCheck {
                name: format!("patient.{}", patient_id),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (predict -i - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        version: ENGINE_VERSION.to_string(),
        data_dir: data_dir.display().to_string(),
        models_dir: models_dir.display().to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("RehabSense Doctor Report");
        println!("========================");
        println!("Version:    {}", report.version);
        println!("Data dir:   {}", report.data_dir);
        println!("Models dir: {}", report.models_dir);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(RehabCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), RehabCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: one JSON object per report, keyed by modality");
                println!();
                println!("Every modality is optional; a present modality needs all of its features.");
                println!("Other keys (report_id, date, label, ...) are ignored.");
                println!();
                for modality in Modality::ALL {
                    println!("- {}: {}", modality, modality.feature_names().join(", "));
                }
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: one analysis per report");
                println!();
                println!("- predictions: per present modality, the label, class index,");
                println!("  confidence and echoed inputs");
                println!("- recommendations: per present modality,");
                println!("  {{ title, status, exercises, lifestyle, tips }}");
                println!("- summary: one sentence on strengths and focus areas");
                println!();
                println!("Labels:");
                for modality in Modality::ALL {
                    println!("- {}: {}", modality, modality.label_table().join(", "));
                }
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, RehabCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn open_portal(patient: &str, data_dir: &Path, models_dir: &Path) -> Result<Portal, RehabCliError> {
    let processor = RehabProcessor::load(models_dir)?;
    let mut portal = Portal::new(PatientStore::new(data_dir), processor);
    into_result(portal.login(patient))?;
    Ok(portal)
}

fn into_result<T>(response: ApiResponse<T>) -> Result<T, RehabCliError> {
    match response.data {
        Some(data) if response.success => Ok(data),
        _ => Err(RehabCliError::Portal(
            response.message.unwrap_or_else(|| "Request failed".to_string()),
        )),
    }
}

fn format_output<T: Serialize>(items: &[T], format: &OutputFormat) -> Result<String, RehabCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for item in items {
                lines.push(serde_json::to_string(item)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(items)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(items)? + "\n"),
    }
}

fn get_input_json_schema() -> String {
    let properties: serde_json::Map<String, Value> = Modality::ALL
        .iter()
        .map(|modality| {
            let features: serde_json::Map<String, Value> = modality
                .feature_names()
                .iter()
                .map(|name| (name.to_string(), serde_json::json!({ "type": "number" })))
                .collect();
            (
                modality.to_string(),
                serde_json::json!({
                    "type": "object",
                    "required": modality.feature_names(),
                    "properties": features
                }),
            )
        })
        .collect();

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "rehab.report",
        "description": "RehabSense per-report modality features",
        "type": "object",
        "properties": properties
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    let labels: serde_json::Map<String, Value> = Modality::ALL
        .iter()
        .map(|modality| (modality.to_string(), serde_json::json!(modality.label_table())))
        .collect();

    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "rehab.analysis",
        "description": "RehabSense report analysis",
        "type": "object",
        "required": ["predictions", "recommendations", "summary"],
        "properties": {
            "predictions": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["prediction", "confidence"],
                    "properties": {
                        "prediction": { "type": "integer", "minimum": 0 },
                        "confidence": { "type": "number", "minimum": 0, "maximum": 1 }
                    }
                }
            },
            "recommendations": {
                "type": "object",
                "additionalProperties": {
                    "type": "object",
                    "required": ["title", "status", "exercises", "lifestyle", "tips"],
                    "properties": {
                        "title": { "type": "string" },
                        "status": { "type": "string" },
                        "exercises": { "type": "array", "items": { "type": "string" } },
                        "lifestyle": { "type": "array", "items": { "type": "string" } },
                        "tips": { "type": "array", "items": { "type": "string" } }
                    }
                }
            },
            "summary": { "type": "string" }
        },
        "x-labels": labels
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum RehabCliError {
    Io(io::Error),
    Engine(RehabError),
    Json(serde_json::Error),
    Portal(String),
    NoReports,
    DoctorFailed,
}

impl From<io::Error> for RehabCliError {
    fn from(e: io::Error) -> Self {
        RehabCliError::Io(e)
    }
}

impl From<RehabError> for RehabCliError {
    fn from(e: RehabError) -> Self {
        RehabCliError::Engine(e)
    }
}

impl From<serde_json::Error> for RehabCliError {
    fn from(e: serde_json::Error) -> Self {
        RehabCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RehabCliError> for CliError {
    fn from(e: RehabCliError) -> Self {
        match e {
            RehabCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RehabCliError::Engine(e) => {
                let (code, hint) = match &e {
                    RehabError::ModelNotFound(_) | RehabError::ModelMismatch { .. } => (
                        "MODEL_ERROR",
                        "Run 'rehab generate' and 'rehab train' first",
                    ),
                    RehabError::MissingFeature { .. } | RehabError::InvalidFeature { .. } => (
                        "FEATURE_ERROR",
                        "Run 'rehab schema input' for the required features",
                    ),
                    RehabError::TrainingError(_) => {
                        ("TRAINING_ERROR", "Run 'rehab generate' to create training data")
                    }
                    RehabError::UnknownModality(_) => (
                        "UNKNOWN_MODALITY",
                        "Use heartbeat, glucose, breathing, speech, emotion or posture",
                    ),
                    _ => ("ENGINE_ERROR", "Run 'rehab doctor' to check the setup"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            RehabCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RehabCliError::Portal(message) => CliError {
                code: "PORTAL_ERROR".to_string(),
                message,
                hint: Some("Check the patient and report ids".to_string()),
            },
            RehabCliError::NoReports => CliError {
                code: "NO_REPORTS".to_string(),
                message: "No reports found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            RehabCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    data_dir: String,
    models_dir: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
