//! FFI interface for C/C++ hosts
//!
//! Requests and results cross the boundary as JSON, see
//! [`ExtractionRequest`](crate::config::ExtractionRequest).

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use tracing::warn;

use crate::config::{extract_request, ExtractionRequest};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized `ExtractionResult` (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Run a JSON extraction request against HTML.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized ExtractionRequest (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(html) => html,
        Err(msg) => return make_error_result(msg),
    };

    if request_json.is_null() {
        return make_error_result("Request JSON is null");
    }
    let request_str = match CStr::from_ptr(request_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
    };

    let request = match ExtractionRequest::from_json(request_str) {
        Ok(r) => r,
        Err(e) => return make_error_result(&e.to_string()),
    };

    let result = match extract_request(html, &request) {
        Ok(result) => result,
        Err(e) => return make_error_result(&e.to_string()),
    };

    match serde_json::to_string(&result) {
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

/// Free an ExtractionResultFFI returned by extract_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_from_html`
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

unsafe fn read_html<'a>(html_ptr: *const c_char, html_len: usize) -> Result<&'a str, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok("");
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice).map_err(|_| "Invalid UTF-8 in HTML content")
}

fn make_error_result(msg: &str) -> ExtractionResultFFI {
    warn!(error = msg, "Extraction request failed");
    let error_cstr = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(html: &str, request: &str) -> (Option<String>, Option<String>) {
        let request = CString::new(request).unwrap();
        unsafe {
            let result = extract_from_html(html.as_ptr() as *const c_char, html.len(), request.as_ptr());
            let json = (!result.json_ptr.is_null())
                .then(|| CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned());
            let error = (!result.error_ptr.is_null())
                .then(|| CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned());
            free_extraction_result(result);
            (json, error)
        }
    }

    #[test]
    fn test_extract_from_html() {
        let html = r#"<ul><li><a href="https://www.example.org/a?x=1">A</a></li></ul>"#;
        let (json, error) = run(
            html,
            r#"{"specs": [{"key": "domain", "selector": "a", "nth": 0, "extract": "href_base_domain"}]}"#,
        );

        assert!(error.is_none());
        let value: serde_json::Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(value["values"]["domain"], "example.org");
    }

    #[test]
    fn test_errors_are_reported() {
        let (json, error) = run("<p>x</p>", r#"{"specs": [{"key": "p", "selector": "p["}]}"#);
        assert!(json.is_none());
        assert!(error.unwrap().contains("Failed to parse selector"));

        let (json, error) = run("<p>x</p>", "not json");
        assert!(json.is_none());
        assert!(error.unwrap().starts_with("Invalid specification config"));
    }
}
