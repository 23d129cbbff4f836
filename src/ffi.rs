//! FFI bindings for RehabSense
//!
//! This module provides C-compatible functions for calling RehabSense from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `rehab_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

use crate::inference::posture_score;
use crate::pipeline::{analyze_report, RehabProcessor};
use crate::recommendations::recommend_raw;
use crate::schema::PatientRecord;
use crate::types::Modality;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read a required string argument, recording an error naming it when invalid
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze one report JSON object and return the analysis JSON.
///
/// Loads the six models from `models_dir` on every call.
///
/// # Safety
/// - `models_dir` and `report_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `rehab_free_string`.
/// - Returns NULL on error; call `rehab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rehab_analyze_report(
    models_dir: *const c_char,
    report_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(dir) = required_arg(models_dir, "models_dir") else {
        return ptr::null_mut();
    };
    let Some(json) = required_arg(report_json, "report JSON") else {
        return ptr::null_mut();
    };

    match analyze_report(Path::new(&dir), &json) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Recommendation bundle JSON for a modality and label.
///
/// A non-finite `score` means no posture score. Unknown labels yield a bundle
/// with empty lists.
///
/// # Safety
/// - `modality` and `label` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `rehab_free_string`.
/// - Returns NULL on error; call `rehab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rehab_recommend(
    modality: *const c_char,
    label: *const c_char,
    score: f64,
) -> *mut c_char {
    clear_last_error();

    let Some(modality) = required_arg(modality, "modality") else {
        return ptr::null_mut();
    };
    let Some(label) = required_arg(label, "label") else {
        return ptr::null_mut();
    };

    let modality: Modality = match modality.parse() {
        Ok(m) => m,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    let score = score.is_finite().then_some(score);

    match serde_json::to_string(&recommend_raw(modality, &label, score)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Posture wellness score (0-100).
#[no_mangle]
pub extern "C" fn rehab_posture_score(
    head_tilt: f64,
    shoulder_alignment: f64,
    spine_angle: f64,
) -> f64 {
    posture_score(head_tilt, shoulder_alignment, spine_angle)
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a RehabProcessor
pub struct RehabProcessorHandle {
    processor: RehabProcessor,
}

/// Load the six models from `models_dir` into a new processor.
///
/// # Safety
/// - `models_dir` must be a valid null-terminated C string.
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `rehab_processor_free`.
/// - Returns NULL on error; call `rehab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rehab_processor_new(
    models_dir: *const c_char,
) -> *mut RehabProcessorHandle {
    clear_last_error();

    let Some(dir) = required_arg(models_dir, "models_dir") else {
        return ptr::null_mut();
    };

    match RehabProcessor::load(&dir) {
        Ok(processor) => Box::into_raw(Box::new(RehabProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `rehab_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rehab_processor_free(processor: *mut RehabProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Analyze one report JSON object with a loaded processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `rehab_processor_new`.
/// - `report_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `rehab_free_string`.
/// - Returns NULL on error; call `rehab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rehab_processor_analyze(
    processor: *const RehabProcessorHandle,
    report_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(json) = required_arg(report_json, "report JSON") else {
        return ptr::null_mut();
    };

    let result = handle
        .processor
        .analyze_json(&json)
        .and_then(|analysis| Ok(serde_json::to_string(&analysis)?));
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Predictions for every report of a patient record, as a JSON array.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `rehab_processor_new`.
/// - `record_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `rehab_free_string`.
/// - Returns NULL on error; call `rehab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rehab_processor_history(
    processor: *const RehabProcessorHandle,
    record_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(json) = required_arg(record_json, "record JSON") else {
        return ptr::null_mut();
    };

    let result = serde_json::from_str::<PatientRecord>(&json)
        .map_err(Into::into)
        .and_then(|record| handle.processor.history(&record))
        .and_then(|history| Ok(serde_json::to_string(&history)?));
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by RehabSense functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a RehabSense function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rehab_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next RehabSense function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn rehab_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the RehabSense library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn rehab_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
