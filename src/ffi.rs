//! FFI bindings for Growth Insights
//!
//! This module provides C-compatible functions for calling the engine from the
//! mobile shell. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `insights_free_string`.
//! Instants are RFC 3339 strings; the caller always supplies "now".

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{DateTime, NaiveDate, Utc};

use crate::age::compute_age;
use crate::percentile::PercentileScorer;
use crate::pipeline::{snapshot_to_insights, InsightsProcessor};
use crate::types::MetricType;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Read a required string argument, recording an error when it is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {} string pointer", name));
    }
    value
}

/// Read a required RFC 3339 instant argument
unsafe fn required_instant(ptr: *const c_char, name: &str) -> Option<DateTime<Utc>> {
    let raw = required_arg(ptr, name)?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(instant) => Some(instant.with_timezone(&Utc)),
        Err(e) => {
            set_last_error(&format!("Invalid {} '{}': {}", name, raw, e));
            None
        }
    }
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Convert a JSON result into a C string, recording the error on failure
fn json_result_to_cstr<E: std::fmt::Display>(result: Result<String, E>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Build an insights report from a baby.snapshot.v1 JSON document.
///
/// # Safety
/// - `snapshot_json` and `now` must be valid null-terminated C strings.
/// - `now` is an RFC 3339 instant; `utc_offset_minutes` is the caller's offset.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_snapshot_to_report(
    snapshot_json: *const c_char,
    now: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(snapshot_json, "snapshot JSON") else {
        return ptr::null_mut();
    };
    let Some(now) = required_instant(now, "now") else {
        return ptr::null_mut();
    };

    json_result_to_cstr(snapshot_to_insights(&json, now, utc_offset_minutes))
}

/// Compute the age breakdown for a birth date.
///
/// # Safety
/// - `birth_date` (`YYYY-MM-DD`) and `now` (RFC 3339) must be valid C strings.
/// - Returns a newly allocated JSON string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_compute_age(
    birth_date: *const c_char,
    now: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(birth_raw) = required_arg(birth_date, "birth date") else {
        return ptr::null_mut();
    };
    let birth = match NaiveDate::parse_from_str(&birth_raw, "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            set_last_error(&format!("Invalid birth date '{}': {}", birth_raw, e));
            return ptr::null_mut();
        }
    };
    let Some(now) = required_instant(now, "now") else {
        return ptr::null_mut();
    };

    json_result_to_cstr(serde_json::to_string(&compute_age(birth, now)))
}

/// Score one metric against the default reference curve.
///
/// # Safety
/// - `metric` must be a valid C string: `weight`, `height` or `bmi`.
/// - Returns a newly allocated JSON string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_score(
    metric: *const c_char,
    value: f64,
    age_months: u32,
) -> *mut c_char {
    clear_last_error();

    let Some(metric_raw) = required_arg(metric, "metric") else {
        return ptr::null_mut();
    };
    let metric: MetricType = match metric_raw.parse() {
        Ok(metric) => metric,
        Err(e) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
    };

    let result = PercentileScorer::default()
        .score(metric, value, age_months)
        .map_err(|e| e.to_string())
        .and_then(|score| serde_json::to_string(&score).map_err(|e| e.to_string()));
    json_result_to_cstr(result)
}

// ============================================================================
// Configurable Processor API
// ============================================================================

/// Opaque handle to an InsightsProcessor
pub struct InsightsProcessorHandle {
    processor: InsightsProcessor,
}

/// Create a processor with the default curve and settings.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `insights_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_new() -> *mut InsightsProcessorHandle {
    clear_last_error();

    let handle = Box::new(InsightsProcessorHandle {
        processor: InsightsProcessor::new(),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insights_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_free(processor: *mut InsightsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Replace the processor's settings from a JSON config.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insights_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error; call `insights_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_load_config(
    processor: *mut InsightsProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json) = required_arg(json, "config JSON") else {
        return -1;
    };

    match handle.processor.load_config(&json) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Replace the processor's reference curve with a tabulated curve.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insights_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error; call `insights_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_load_curve(
    processor: *mut InsightsProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json) = required_arg(json, "curve JSON") else {
        return -1;
    };

    match handle.processor.load_curve(&json) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Build an insights report with a configured processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `insights_processor_new`.
/// - `snapshot_json` and `now` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_processor_report(
    processor: *mut InsightsProcessorHandle,
    snapshot_json: *const c_char,
    now: *const c_char,
    utc_offset_minutes: i32,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let Some(json) = required_arg(snapshot_json, "snapshot JSON") else {
        return ptr::null_mut();
    };
    let Some(now) = required_instant(now, "now") else {
        return ptr::null_mut();
    };

    json_result_to_cstr(handle.processor.process_json(&json, now, utc_offset_minutes))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by insights functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an insights function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insights_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next insights call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn insights_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn insights_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
