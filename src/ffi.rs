//! FFI interface for C/C++ interop
//!
//! Provides C-compatible functions for running a schema against HTML.
//! Schemas, options and results are passed as JSON; hook names resolve
//! against the built-in hooks only.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Deserialize;
use serde_json::Value;

use crate::extractor::{Extractor, ExtractorOptions};
use crate::hooks::HookRegistry;

/// Request accepted by [`extract_with_schema`].
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaRequest {
    /// Schema in its JSON form (string, array or object)
    pub schema: Value,
    #[serde(default)]
    pub options: ExtractorOptions,
}

/// Result struct returned to C/C++
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON array of extracted values (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Run a JSON schema against HTML.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized SchemaRequest (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_with_schema(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    let request_str = if request_json.is_null() {
        return make_error_result("Request JSON is null");
    } else {
        match CStr::from_ptr(request_json).to_str() {
            Ok(s) => s,
            Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
        }
    };

    let request: SchemaRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => return make_error_result(&format!("Failed to parse request JSON: {}", e)),
    };

    let SchemaRequest { schema, options } = request;
    let hooks = HookRegistry::new();
    let extractor = match Extractor::from_value_with_options(&schema, &hooks, options) {
        Ok(e) => e,
        Err(e) => return make_error_result(&format!("Invalid schema: {}", e)),
    };

    let values = match extractor.parse(&html) {
        Ok(v) => v,
        Err(e) => return make_error_result(&format!("Extraction failed: {}", e)),
    };

    match serde_json::to_string(&values) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free an ExtractionResultFFI returned by extract_with_schema
///
/// # Safety
/// - `result` must have been returned by `extract_with_schema`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(str::to_string)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

// Helper to create error result
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(html: &str, request: &str) -> (Option<String>, Option<String>) {
        let request = CString::new(request).unwrap();
        unsafe {
            let html_ptr = html.as_ptr() as *const c_char;
            let result = extract_with_schema(html_ptr, html.len(), request.as_ptr());
            let json = (!result.json_ptr.is_null())
                .then(|| CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned());
            let error = (!result.error_ptr.is_null())
                .then(|| CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned());
            free_extraction_result(result);
            (json, error)
        }
    }

    #[test]
    fn test_extract_with_schema() {
        let html = r#"
        <ul>
            <li><a href="/home">Home</a></li>
            <li><a href="/about">About</a></li>
        </ul>
        "#;
        let request = json!({
            "schema": {
                "$rule": "li",
                "label": {"$rule": "a", "$sanitizer": "text"},
                "href": {"$rule": "a", "$sanitizer": "attr:href"}
            }
        });

        let (json, error) = call(html, &request.to_string());
        assert!(error.is_none());
        let values: Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(
            values,
            json!([
                {"label": "Home", "href": "/home"},
                {"label": "About", "href": "/about"}
            ])
        );
    }

    #[test]
    fn test_options_are_forwarded() {
        let request = json!({
            "schema": "b",
            "options": {"document": {"mode": "fragment"}}
        });
        let (json, _) = call("<b>x</b>", &request.to_string());
        assert_eq!(json.as_deref(), Some(r#"["x"]"#));
    }

    #[test]
    fn test_errors_are_reported() {
        let (json, error) = call("<p></p>", r#"{"schema": 1}"#);
        assert!(json.is_none());
        assert!(error.unwrap().starts_with("Invalid schema"));

        let (_, error) = call("<p></p>", "not json");
        assert!(error.unwrap().starts_with("Failed to parse request JSON"));

        let (_, error) = call("<p></p>", r#"{"schema": {"$sanitizer": "nope"}}"#);
        assert!(error.unwrap().contains("nope"));
    }

    #[test]
    fn test_null_request() {
        unsafe {
            let result = extract_with_schema(ptr::null(), 0, ptr::null());
            assert!(result.json_ptr.is_null());
            assert!(!result.error_ptr.is_null());
            free_extraction_result(result);
        }
    }
}
