//! # texure
//!
//! Conversion engine for a visual LaTeX editor: LaTeX source becomes
//! editable rich-document markup, edited markup becomes LaTeX again, and
//! markup pasted from outside is sanitized on the way in.
//!
//! ## Quick Start
//!
//! ```rust
//! use texure::{html_to_latex, latex_to_html};
//!
//! let markup = latex_to_html(r"\section{Intro} Some \textbf{bold} text.", None);
//! assert!(markup.starts_with("<h1>Intro</h1>"));
//!
//! let latex = html_to_latex("<h1>Intro</h1><p>Some <b>bold</b> text.</p>");
//! assert!(latex.contains(r"\section{Intro}"));
//! assert!(latex.contains(r"\textbf{bold}"));
//! ```
//!
//! ## Widgets
//!
//! Constructs the editor cannot edit as plain rich text become opaque
//! widgets carrying their source: math formulas, code blocks, inline code,
//! spacing commands and images. Their payloads are percent-encoded in
//! `data-*` attributes so they survive the trip through the editor
//! unchanged. See [`render::html::vocab`] for the attribute vocabulary.
//!
//! ## Math
//!
//! Math previews come from an optional [`MathRenderer`]. Without one the
//! widgets show the formula source as a placeholder; the `mathml` feature
//! provides a MathML backend.
//!
//! ## Sanitizing
//!
//! [`sanitize`] reduces arbitrary markup to the editor's vocabulary.
//! [`maybe_sanitize`] only does so when the markup carries a suspicious
//! signature, which keeps pasting ordinary text cheap.
//!
//! ## Features
//!
//! - `mathml`: Enable the MathML rendering backend (requires `latex2mathml`)
//! - `wasm`: Enable WebAssembly bindings (requires `wasm-bindgen`)

pub mod ast;
pub mod config;
pub mod error;
pub mod escape;
pub mod log;
pub mod markup;
pub mod parser;
pub mod preamble;
pub mod render;
pub mod sanitize;
pub mod style;

// FFI module (always compiled for cdylib)
pub mod ffi;

// WASM module (only with feature)
#[cfg(feature = "wasm")]
pub mod wasm;

// Convenience re-exports
pub use config::{EditorConfig, FeatureFlags, ToolbarButton, ToolbarGroup};
pub use error::{ConfigError, Error, RenderError, Result};
pub use log::summarize_latex_log;
pub use parser::latex_to_html;
pub use preamble::{ensure_packages, infer_required_packages, split_document, DocumentParts};
pub use render::{create_renderer, html_to_latex, MathBackend, MathRenderer};
pub use sanitize::{maybe_sanitize, sanitize};

/// Write edited markup back into a LaTeX document.
///
/// The body of `source` is replaced by the LaTeX for `markup`, and the
/// preamble gains a `\usepackage` line for every package the new body needs
/// that is not loaded yet.
///
/// # Example
///
/// ```rust
/// use texure::apply_visual_edit;
///
/// let source = "\\documentclass{article}\n\\begin{document}\nold\n\\end{document}";
/// let updated = apply_visual_edit(source, r#"<p><a href="https://x.org">x</a></p>"#);
/// assert!(updated.contains("\\usepackage{hyperref}\n\\begin{document}"));
/// assert!(updated.contains(r"\href{https://x.org}{x}"));
/// ```
pub fn apply_visual_edit(source: &str, markup: &str) -> String {
    let parts = split_document(source);
    let body = html_to_latex(markup);
    let preamble = ensure_packages(&parts.preamble, &infer_required_packages(&body));
    DocumentParts { preamble, ..parts }.assemble(&body)
}
