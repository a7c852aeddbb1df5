//! WebAssembly bindings for the browser editor.
//!
//! ```javascript
//! import init, { latexToHtml, htmlToLatex, maybeSanitizeHtml, EditorOptions } from 'texure';
//!
//! await init();
//!
//! const options = new EditorOptions();
//! options.setMathBackend('mathml');
//! editor.innerHTML = latexToHtml(source, options);
//!
//! // On paste
//! const clean = maybeSanitizeHtml(clipboardHtml);
//!
//! // On save
//! const latex = htmlToLatex(editor.innerHTML);
//! ```

#![cfg(feature = "wasm")]

use crate::log::summarize_latex_log;
use crate::parser::latex_to_html;
use crate::preamble::infer_required_packages;
use crate::render::html_to_latex;
use crate::render::math::{create_renderer, MathBackend};
use crate::sanitize::{maybe_sanitize, sanitize};
use std::str::FromStr;
use wasm_bindgen::prelude::*;

// ============================================================================
// Options
// ============================================================================

/// Conversion options for the LaTeX to markup direction.
#[wasm_bindgen]
pub struct EditorOptions {
    math_backend: MathBackend,
}

#[wasm_bindgen]
impl EditorOptions {
    /// Create a new options object with defaults.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            math_backend: MathBackend::None,
        }
    }

    /// Set the math preview backend: "none" or "mathml".
    #[wasm_bindgen(js_name = setMathBackend)]
    pub fn set_math_backend(&mut self, backend: &str) -> Result<(), JsError> {
        self.math_backend = MathBackend::from_str(backend).map_err(|e| JsError::new(&e.to_string()))?;
        Ok(())
    }
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// Convert a LaTeX document or fragment to editable markup.
#[wasm_bindgen(js_name = latexToHtml)]
pub fn latex_to_html_js(input: &str, options: Option<EditorOptions>) -> String {
    let backend = options.unwrap_or_default().math_backend;
    let renderer = create_renderer(backend);
    latex_to_html(input, renderer.as_deref())
}

/// Convert editable markup back to a LaTeX body.
#[wasm_bindgen(js_name = htmlToLatex)]
pub fn html_to_latex_js(markup: &str) -> String {
    html_to_latex(markup)
}

/// Sanitize markup unconditionally.
#[wasm_bindgen(js_name = sanitizeHtml)]
pub fn sanitize_html(markup: &str) -> String {
    sanitize(markup)
}

/// Sanitize markup only when it carries a suspicious signature.
#[wasm_bindgen(js_name = maybeSanitizeHtml)]
pub fn maybe_sanitize_html(markup: &str) -> String {
    maybe_sanitize(markup).into_owned()
}

// ============================================================================
// Document helpers
// ============================================================================

/// Packages a body's commands need, as an array of names.
#[wasm_bindgen(js_name = inferRequiredPackages)]
pub fn infer_required_packages_js(body: &str) -> js_sys::Array {
    infer_required_packages(body)
        .into_iter()
        .map(JsValue::from_str)
        .collect()
}

/// Summarize a compile log to one line.
#[wasm_bindgen(js_name = summarizeLatexLog)]
pub fn summarize_latex_log_js(log: &str) -> String {
    summarize_latex_log(log)
}

/// Get the library version.
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// TypeScript type definitions for documentation
/// ```typescript
/// // texure.d.ts
///
/// export function latexToHtml(input: string, options?: EditorOptions): string;
/// export function htmlToLatex(markup: string): string;
/// export function sanitizeHtml(markup: string): string;
/// export function maybeSanitizeHtml(markup: string): string;
/// export function inferRequiredPackages(body: string): string[];
/// export function summarizeLatexLog(log: string): string;
/// export function getVersion(): string;
///
/// export class EditorOptions {
///   constructor();
///   /** Throws on an unknown backend name. */
///   setMathBackend(backend: 'none' | 'mathml'): void;
/// }
/// ```
const _: () = ();
