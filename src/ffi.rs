//! C FFI layer for embedding the transforms in other runtimes.
//!
//! Every string crossing the boundary is NUL-terminated UTF-8. Strings
//! returned in a [`TexureResult`] are owned by the caller and must be
//! released with [`texure_free_string`] or [`texure_free_result`].

use crate::log::summarize_latex_log;
use crate::parser::latex_to_html;
use crate::render::html_to_latex;
use crate::render::math::{create_renderer, MathBackend};
use crate::sanitize::{maybe_sanitize, sanitize};
use libc::{c_char, c_int};
use std::ffi::{CStr, CString};
use std::ptr;

/// Conversion options.
#[repr(C)]
pub struct TexureConfig {
    /// Math backend: 0 = none (placeholders), 1 = MathML
    pub math_backend: c_int,
}

impl Default for TexureConfig {
    fn default() -> Self {
        Self { math_backend: 0 }
    }
}

impl TexureConfig {
    fn backend(&self) -> MathBackend {
        match self.math_backend {
            1 => MathBackend::MathMl,
            _ => MathBackend::None,
        }
    }
}

/// Result type for FFI operations.
#[repr(C)]
pub struct TexureResult {
    /// Pointer to result string (caller must free with texure_free_string)
    pub data: *mut c_char,
    /// Error message if data is null (caller must free with texure_free_string)
    pub error: *mut c_char,
}

/// Interior NUL bytes cannot cross the boundary and are dropped.
fn to_c_string(s: String) -> CString {
    CString::new(s.replace('\0', "")).unwrap_or_default()
}

impl TexureResult {
    fn ok(data: String) -> Self {
        Self {
            data: to_c_string(data).into_raw(),
            error: ptr::null_mut(),
        }
    }

    fn err(error: &str) -> Self {
        Self {
            data: ptr::null_mut(),
            error: to_c_string(error.to_string()).into_raw(),
        }
    }
}

/// Borrow a C string argument.
unsafe fn read_input<'a>(input: *const c_char) -> Result<&'a str, TexureResult> {
    if input.is_null() {
        return Err(TexureResult::err("Null input pointer"));
    }
    CStr::from_ptr(input)
        .to_str()
        .map_err(|_| TexureResult::err("Invalid UTF-8 input"))
}

/// Apply a string transform to a C string argument.
unsafe fn transform(input: *const c_char, f: impl FnOnce(&str) -> String) -> TexureResult {
    match read_input(input) {
        Ok(s) => TexureResult::ok(f(s)),
        Err(e) => e,
    }
}

/// Convert LaTeX to editable-document markup.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - `config` must be null or point to a valid `TexureConfig`.
/// - The returned strings must be freed with `texure_free_string`.
#[no_mangle]
pub unsafe extern "C" fn texure_latex_to_html(
    input: *const c_char,
    config: *const TexureConfig,
) -> TexureResult {
    let backend = if config.is_null() {
        TexureConfig::default().backend()
    } else {
        (*config).backend()
    };
    let renderer = create_renderer(backend);
    transform(input, |latex| latex_to_html(latex, renderer.as_deref()))
}

/// Convert editable-document markup to LaTeX.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `texure_free_string`.
#[no_mangle]
pub unsafe extern "C" fn texure_html_to_latex(input: *const c_char) -> TexureResult {
    transform(input, html_to_latex)
}

/// Sanitize markup unconditionally.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `texure_free_string`.
#[no_mangle]
pub unsafe extern "C" fn texure_sanitize(input: *const c_char) -> TexureResult {
    transform(input, sanitize)
}

/// Sanitize markup only when it carries a suspicious signature.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `texure_free_string`.
#[no_mangle]
pub unsafe extern "C" fn texure_maybe_sanitize(input: *const c_char) -> TexureResult {
    transform(input, |markup| maybe_sanitize(markup).into_owned())
}

/// Summarize a compile log to one line.
///
/// # Safety
///
/// - `input` must be a valid null-terminated UTF-8 string.
/// - The returned strings must be freed with `texure_free_string`.
#[no_mangle]
pub unsafe extern "C" fn texure_summarize_log(input: *const c_char) -> TexureResult {
    transform(input, summarize_latex_log)
}

/// Free a string returned by texure functions.
///
/// # Safety
///
/// - `s` must be a pointer returned by a texure function, or null.
#[no_mangle]
pub unsafe extern "C" fn texure_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Free both strings of a result struct.
///
/// # Safety
///
/// - `result` must be a valid TexureResult that was not freed before.
#[no_mangle]
pub unsafe extern "C" fn texure_free_result(result: TexureResult) {
    texure_free_string(result.data);
    texure_free_string(result.error);
}

/// Get the library version.
///
/// The returned string is static and must not be freed.
#[no_mangle]
pub extern "C" fn texure_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// ```c
/// // texure.h
/// #ifndef TEXURE_H
/// #define TEXURE_H
///
/// typedef struct {
///     int math_backend;  // 0 = none, 1 = MathML
/// } TexureConfig;
///
/// typedef struct {
///     char* data;
///     char* error;
/// } TexureResult;
///
/// TexureResult texure_latex_to_html(const char* input, const TexureConfig* config);
/// TexureResult texure_html_to_latex(const char* input);
/// TexureResult texure_sanitize(const char* input);
/// TexureResult texure_maybe_sanitize(const char* input);
/// TexureResult texure_summarize_log(const char* input);
/// void texure_free_string(char* s);
/// void texure_free_result(TexureResult result);
/// const char* texure_version(void);
///
/// #endif
/// ```
const _: () = ();

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    unsafe fn take(result: TexureResult) -> (Option<String>, Option<String>) {
        let read = |p: *mut c_char| {
            (!p.is_null()).then(|| CStr::from_ptr(p).to_string_lossy().into_owned())
        };
        let out = (read(result.data), read(result.error));
        texure_free_result(result);
        out
    }

    #[test]
    fn test_latex_to_html_roundtrip() {
        let input = CString::new(r"\textbf{hi}").unwrap();
        unsafe {
            let (html, err) = take(texure_latex_to_html(input.as_ptr(), ptr::null()));
            assert_eq!(html.as_deref(), Some("<b>hi</b>"));
            assert!(err.is_none());

            let markup = CString::new("<b>hi</b>").unwrap();
            let (latex, _) = take(texure_html_to_latex(markup.as_ptr()));
            assert_eq!(latex.as_deref(), Some(r"\textbf{hi}"));
        }
    }

    #[test]
    fn test_null_input() {
        unsafe {
            let (data, err) = take(texure_sanitize(ptr::null()));
            assert!(data.is_none());
            assert_eq!(err.as_deref(), Some("Null input pointer"));
        }
    }

    #[test]
    fn test_log_and_gate() {
        let log = CString::new("! Missing $ inserted.\nl.3 x").unwrap();
        let markup = CString::new("<p onclick=\"x\">a</p>").unwrap();
        unsafe {
            let (summary, _) = take(texure_summarize_log(log.as_ptr()));
            assert_eq!(summary.as_deref(), Some("Missing $ inserted. at line 3"));
            let (clean, _) = take(texure_maybe_sanitize(markup.as_ptr()));
            assert_eq!(clean.as_deref(), Some("<p>a</p>"));
        }
    }

    #[test]
    fn test_version() {
        let version = unsafe { CStr::from_ptr(texure_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
