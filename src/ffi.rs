//! FFI interface for C/C++ hosts
//!
//! Provides a C-compatible function that turns product page HTML into the
//! product record. The record crosses the boundary as JSON.

use std::ffi::{c_char, CString};
use std::ptr;
use std::sync::{Arc, OnceLock};

use crate::error::ExtractError;
use crate::pipeline::ProductExtractor;
use crate::snapshot::{SnapshotProvider, StaticSnapshotProvider};

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized product record (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Built once with the default configuration and reused by every call.
static EXTRACTOR: OnceLock<Result<ProductExtractor, String>> = OnceLock::new();

/// Extract the product record from rendered page HTML.
///
/// # Arguments
/// * `html_ptr` - Pointer to the product page HTML (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of the page HTML in bytes
/// * `panel_ptr` - Pointer to the page HTML after the offers panel was opened, or null
/// * `panel_len` - Length of the panel HTML in bytes
///
/// # Returns
/// ExtractionResultFFI with either json_ptr set (success) or error_ptr set (failure).
/// Missing page HTML is reported as an error, never as an empty record.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `panel_ptr`, when not null, must point to valid memory of at least `panel_len` bytes
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_product_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    panel_ptr: *const c_char,
    panel_len: usize,
) -> ExtractionResultFFI {
    let html = match read_utf8(html_ptr, html_len) {
        Ok(Some(s)) => s,
        Ok(None) => return make_error_result(&ExtractError::unavailable("page HTML is empty").to_string()),
        Err(msg) => return make_error_result(msg),
    };

    let panel = match read_utf8(panel_ptr, panel_len) {
        Ok(panel) => panel,
        Err(_) => return make_error_result("Invalid UTF-8 in panel HTML"),
    };

    let extractor = match EXTRACTOR.get_or_init(|| ProductExtractor::with_defaults().map_err(|e| e.to_string())) {
        Ok(extractor) => extractor,
        Err(msg) => return make_error_result(msg),
    };

    let provider: Option<Arc<dyn SnapshotProvider>> = panel.map(|panel| {
        Arc::new(StaticSnapshotProvider::new(html).with_revealed(panel)) as Arc<dyn SnapshotProvider>
    });

    let record = match extractor.extract_markup(Some(html), provider) {
        Ok(record) => record,
        Err(e) => return make_error_result(&e.to_string()),
    };

    // Serialize result to JSON
    match serde_json::to_string(&record) {
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

/// Free an ExtractionResultFFI returned by extract_product_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_product_from_html`
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

// Borrow a UTF-8 buffer; null or zero length reads as None
unsafe fn read_utf8<'a>(data: *const c_char, len: usize) -> Result<Option<&'a str>, &'static str> {
    if data.is_null() || len == 0 {
        return Ok(None);
    }
    let slice = std::slice::from_raw_parts(data as *const u8, len);
    std::str::from_utf8(slice)
        .map(Some)
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
    use std::ffi::CStr;

    unsafe fn take(result: ExtractionResultFFI) -> (Option<String>, Option<String>) {
        let json = (!result.json_ptr.is_null())
            .then(|| CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned());
        let error = (!result.error_ptr.is_null())
            .then(|| CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned());
        free_extraction_result(result);
        (json, error)
    }

    #[test]
    fn test_record_as_json() {
        let html = r#"<span id="productTitle">Acme TV</span><span class="a-price-whole">19,999</span>"#;
        let (json, error) = unsafe {
            take(extract_product_from_html(
                html.as_ptr() as *const c_char,
                html.len(),
                ptr::null(),
                0,
            ))
        };
        assert!(error.is_none());
        let value: serde_json::Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(value["product_name"], "Acme TV");
        assert_eq!(value["selling_price"], 19999.0);
        assert!(value["bank_offers"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_panel_html_feeds_offers() {
        let html = r#"<span id="productTitle">Acme TV</span>"#;
        let panel = r#"<div id="InstantBankDiscount-sideSheet">
            <div class="a-section a-spacing-mini">Flat ₹1,000 Instant Discount on Axis Bank cards</div>
        </div>"#;
        let (json, _) = unsafe {
            take(extract_product_from_html(
                html.as_ptr() as *const c_char,
                html.len(),
                panel.as_ptr() as *const c_char,
                panel.len(),
            ))
        };
        let value: serde_json::Value = serde_json::from_str(&json.unwrap()).unwrap();
        assert_eq!(value["bank_offers"][0]["bank_name"], "Axis");
        assert_eq!(value["bank_offers"][0]["discount_amount"], 1000.0);
    }

    #[test]
    fn test_missing_html_is_an_error() {
        let (json, error) = unsafe { take(extract_product_from_html(ptr::null(), 0, ptr::null(), 0)) };
        assert!(json.is_none());
        assert!(error.unwrap().starts_with("snapshot unavailable"));
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = [0xffu8, 0xfe, 0xfd];
        let (_, error) = unsafe {
            take(extract_product_from_html(bytes.as_ptr() as *const c_char, bytes.len(), ptr::null(), 0))
        };
        assert_eq!(error.as_deref(), Some("Invalid UTF-8 in HTML content"));
    }
}
